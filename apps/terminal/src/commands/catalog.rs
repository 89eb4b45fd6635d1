//! # Catalog Commands
//!
//! ## Refresh
//! ```text
//! fetch_variants ─┐
//!                 ├─ both ok ──► new CatalogSnapshot ──► replace (last write wins)
//! fetch_links ────┘
//!                 └─ either fails ──► keep last snapshot, return a notice
//! ```
//!
//! Lines already in the cart keep the price and ceiling they were added
//! with; a refresh only affects later adds.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use tally_core::{CatalogSnapshot, DiscountDescriptor, Variant};

use crate::state::CatalogState;
use crate::upstream::{BackOffice, ProductDiscount};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRefreshResponse {
    pub loaded: bool,
    pub variants: usize,
    pub fetched_at: Option<DateTime<Utc>>,
    /// Set when the refresh failed and the previous snapshot is in use.
    pub notice: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub variant: Variant,
    pub low_stock: bool,
    pub discount: Option<DiscountDescriptor>,
}

/// Keys discounts by product. The first link for a product wins.
fn discount_map(links: Vec<ProductDiscount>) -> HashMap<String, DiscountDescriptor> {
    let mut map = HashMap::with_capacity(links.len());
    for link in links {
        if map.contains_key(&link.product_id) {
            debug!(product_id = %link.product_id, discount_id = %link.discount.id, "Ignoring extra discount link");
            continue;
        }
        map.insert(link.product_id, link.discount);
    }
    map
}

/// Refetches variants and discount links and swaps in a new snapshot.
pub async fn refresh_catalog(
    back_office: &dyn BackOffice,
    catalog: &CatalogState,
) -> CatalogRefreshResponse {
    let fetched = tokio::try_join!(back_office.fetch_variants(), back_office.fetch_discount_links());

    let notice = match fetched {
        Ok((variants, links)) => {
            let snapshot = CatalogSnapshot::new(variants, discount_map(links), Utc::now());
            info!(variants = snapshot.len(), "Catalog refreshed");
            catalog.replace(snapshot);
            None
        }
        Err(e) => {
            warn!(error = %e, "Catalog refresh failed, keeping last snapshot");
            Some(format!("Catalog unavailable: {}", e))
        }
    };

    let current = catalog.snapshot();
    CatalogRefreshResponse {
        loaded: current.is_loaded(),
        variants: current.len(),
        fetched_at: current.fetched_at(),
        notice,
    }
}

/// Variants whose name, SKU or barcode contains `query` (case-insensitive).
/// An empty query lists everything.
pub fn search_catalog(catalog: &CatalogState, query: &str) -> Vec<CatalogEntry> {
    let snapshot = catalog.snapshot();
    let needle = query.trim().to_lowercase();

    snapshot
        .variants()
        .iter()
        .filter(|v| {
            needle.is_empty()
                || v.product_name.to_lowercase().contains(&needle)
                || v.sku.to_lowercase().contains(&needle)
                || v.barcode.as_deref().is_some_and(|b| b.contains(&needle))
        })
        .map(|v| CatalogEntry {
            variant: v.clone(),
            low_stock: v.is_low_stock(),
            discount: snapshot.discount_for(&v.product_id).cloned(),
        })
        .collect()
}
