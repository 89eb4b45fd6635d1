//! # Tax Engine and Cart Totals
//!
//! Tax is charged on taxable lines only, at one register-wide rate, on the
//! pre-discount line price.
//!
//! ## Totals Composition
//! ```text
//! subtotal    = Σ unit_price × quantity            (all lines)
//! tax         = Σ round(line subtotal × rate)      (taxable lines)
//! total       = subtotal + tax
//! discount    = DiscountBreakdown.total            (auto or manual)
//! final_total = max(0, total − discount)
//! ```
//!
//! Discount and tax are computed independently against the raw subtotal.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::Cart;
use crate::discount::DiscountBreakdown;
use crate::money::Money;
use crate::types::TaxRate;

/// Tax over the taxable subset of the cart, rounded per line.
pub fn compute_tax(cart: &Cart, rate: TaxRate) -> Money {
    cart.lines()
        .iter()
        .filter(|line| line.taxable)
        .map(|line| line.subtotal().calculate_tax(rate))
        .sum()
}

/// Everything the register displays and checkout consumes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartTotals {
    /// Distinct lines.
    pub item_count: usize,
    pub total_quantity: i64,
    pub subtotal: Money,
    pub tax_rate_bps: u32,
    pub tax: Money,
    /// Subtotal plus tax.
    pub total: Money,
    pub discount: Money,
    /// Never negative.
    pub final_total: Money,
}

impl CartTotals {
    /// Derives the totals from the cart, the rate and a discount breakdown.
    ///
    /// ```rust
    /// use chrono::Utc;
    /// use tally_core::cart::Cart;
    /// use tally_core::discount::DiscountBreakdown;
    /// use tally_core::tax::CartTotals;
    /// use tally_core::types::TaxRate;
    ///
    /// let cart = Cart::new(Utc::now());
    /// let totals = CartTotals::compute(&cart, TaxRate::from_bps(750), &DiscountBreakdown::default());
    /// assert!(totals.final_total.is_zero());
    /// ```
    pub fn compute(cart: &Cart, rate: TaxRate, discount: &DiscountBreakdown) -> Self {
        let subtotal = cart.subtotal();
        let tax = compute_tax(cart, rate);
        let total = subtotal + tax;

        CartTotals {
            item_count: cart.len(),
            total_quantity: cart.total_quantity(),
            subtotal,
            tax_rate_bps: rate.bps(),
            tax,
            total,
            discount: discount.total,
            final_total: total.saturating_sub_floor_zero(discount.total),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogSnapshot;
    use crate::discount::{compute_discount, DiscountMode};
    use crate::types::{DiscountDescriptor, DiscountValue, ManualDiscount, Variant};
    use chrono::{Duration, Utc};
    use std::collections::HashMap;

    fn variant(id: &str, price: i64, taxable: bool) -> Variant {
        Variant {
            variant_id: id.into(),
            sku: id.to_uppercase(),
            barcode: Some(format!("000{}", id)),
            product_id: format!("p-{}", id),
            product_name: id.into(),
            brand: None,
            category: None,
            selling_price_cents: price,
            cost_price_cents: None,
            quantity: 5,
            threshold: 1,
            taxable,
            images: vec![],
        }
    }

    #[test]
    fn test_only_taxable_lines_are_taxed() {
        let now = Utc::now();
        let mut cart = Cart::new(now);
        cart.add_variant(&variant("a", 1000, true), None, now).unwrap();
        cart.add_variant(&variant("b", 4000, false), None, now).unwrap();

        assert_eq!(compute_tax(&cart, TaxRate::from_bps(750)).cents(), 75);
        assert!(compute_tax(&cart, TaxRate::zero()).is_zero());
    }

    #[test]
    fn test_tax_rounds_per_line() {
        let now = Utc::now();
        let mut cart = Cart::new(now);
        // 0.5 cents each line, rounded up per line
        cart.add_variant(&variant("a", 10, true), None, now).unwrap();
        cart.add_variant(&variant("b", 10, true), None, now).unwrap();

        assert_eq!(compute_tax(&cart, TaxRate::from_bps(500)).cents(), 2);
    }

    #[test]
    fn test_example_sale_totals() {
        let now = Utc::now();
        let tea = Variant {
            barcode: Some("5901234123457".into()),
            ..variant("tea", 1000, true)
        };
        let mut discounts = HashMap::new();
        discounts.insert(
            "p-tea".to_string(),
            DiscountDescriptor {
                id: "d-10".into(),
                name: "10% off".into(),
                value: DiscountValue::percentage_bps(1000),
                starts_at: now - Duration::days(1),
                ends_at: now + Duration::days(1),
            },
        );
        let catalog = CatalogSnapshot::new(vec![tea], discounts, now);

        let mut cart = Cart::new(now);
        cart.resolve_and_add("5901234123457", &catalog, now).unwrap();
        cart.toggle_discount("p-tea:tea").unwrap();

        let breakdown = compute_discount(&cart, &DiscountMode::Auto, now);
        let totals = CartTotals::compute(&cart, TaxRate::from_bps(750), &breakdown);

        assert_eq!(totals.item_count, 1);
        assert_eq!(totals.subtotal.cents(), 1000);
        assert_eq!(totals.tax.cents(), 75);
        assert_eq!(totals.total.cents(), 1075);
        assert_eq!(totals.discount.cents(), 100);
        assert_eq!(totals.final_total.cents(), 975);
    }

    #[test]
    fn test_tax_ignores_discount() {
        let now = Utc::now();
        let mut cart = Cart::new(now);
        cart.add_variant(&variant("a", 1000, true), None, now).unwrap();

        let mode = DiscountMode::Manual {
            discount: ManualDiscount::new(DiscountValue::fixed_cents(1000)),
        };
        let breakdown = compute_discount(&cart, &mode, now);
        let totals = CartTotals::compute(&cart, TaxRate::from_bps(1000), &breakdown);

        assert_eq!(totals.tax.cents(), 100);
        assert_eq!(totals.discount.cents(), 1000);
        assert_eq!(totals.final_total.cents(), 100);
    }
}
