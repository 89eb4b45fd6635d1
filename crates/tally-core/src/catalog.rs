//! # Catalog Snapshot
//!
//! Read-only view of the variants and product discounts the register
//! resolves codes against.
//!
//! ## Refresh Model
//! ```text
//! fetch #1 ──► CatalogSnapshot A ──┐
//!                                  │  (read-only between refreshes)
//! fetch #2 ──► CatalogSnapshot B ──┴─► replaces A wholesale
//! fetch #3 ✗  (failed)             ──► B stays, caller gets a notice
//! ```
//!
//! The snapshot itself is plain data; swapping it is the caller's job.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{DiscountDescriptor, Variant};

/// Variants plus product-linked discounts at one point in time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    variants: Vec<Variant>,
    /// Keyed by product id.
    discounts: HashMap<String, DiscountDescriptor>,
    fetched_at: Option<DateTime<Utc>>,
}

impl CatalogSnapshot {
    /// Builds a snapshot from freshly fetched data.
    pub fn new(
        variants: Vec<Variant>,
        discounts: HashMap<String, DiscountDescriptor>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        CatalogSnapshot {
            variants,
            discounts,
            fetched_at: Some(fetched_at),
        }
    }

    /// Empty snapshot used before the first fetch completes.
    pub fn empty() -> Self {
        CatalogSnapshot::default()
    }

    /// Finds the variant for a scanned or typed code.
    ///
    /// Exact barcode matches win over SKU matches, so a SKU that happens to
    /// equal another variant's barcode never shadows the scan.
    pub fn find_by_code(&self, code: &str) -> Option<&Variant> {
        self.variants
            .iter()
            .find(|v| v.barcode.as_deref() == Some(code))
            .or_else(|| self.variants.iter().find(|v| v.sku.eq_ignore_ascii_case(code)))
    }

    pub fn find_by_variant_id(&self, variant_id: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.variant_id == variant_id)
    }

    /// Discount linked to a product, if any.
    pub fn discount_for(&self, product_id: &str) -> Option<&DiscountDescriptor> {
        self.discounts.get(product_id)
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    pub fn is_loaded(&self) -> bool {
        self.fetched_at.is_some()
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(id: &str, sku: &str, barcode: Option<&str>) -> Variant {
        Variant {
            variant_id: id.into(),
            sku: sku.into(),
            barcode: barcode.map(Into::into),
            product_id: format!("p-{}", id),
            product_name: format!("Product {}", id),
            brand: None,
            category: None,
            selling_price_cents: 100,
            cost_price_cents: None,
            quantity: 1,
            threshold: 0,
            taxable: false,
            images: vec![],
        }
    }

    #[test]
    fn test_barcode_beats_sku() {
        let snapshot = CatalogSnapshot::new(
            vec![variant("a", "12345678", None), variant("b", "B-1", Some("12345678"))],
            HashMap::new(),
            Utc::now(),
        );

        assert_eq!(snapshot.find_by_code("12345678").unwrap().variant_id, "b");
        assert_eq!(snapshot.find_by_code("b-1").unwrap().variant_id, "b");
        assert!(snapshot.find_by_code("nope").is_none());
    }

    #[test]
    fn test_empty_snapshot_is_not_loaded() {
        let snapshot = CatalogSnapshot::empty();
        assert!(!snapshot.is_loaded());
        assert!(snapshot.is_empty());
        assert!(snapshot.find_by_variant_id("a").is_none());
    }
}
