//! # Cart State Manager
//!
//! The single owner of the in-progress sale's lines.
//!
//! ## Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Cart Operations                                    │
//! │                                                                         │
//! │  Input                    Operation               Line Change           │
//! │  ─────                    ─────────               ───────────           │
//! │                                                                         │
//! │  Scanned code ──────────► resolve_and_add() ───► push or qty += 1      │
//! │                                                                         │
//! │  Quantity edit ─────────► set_quantity() ──────► qty = n, or removed   │
//! │                                                                         │
//! │  Remove ────────────────► remove() ────────────► lines.remove(i)       │
//! │                                                                         │
//! │  Checkout / abandon ────► reset() ─────────────► lines + toggles clear │
//! │                                                                         │
//! │  NOTE: every rejected call returns before touching any field.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `line_id` (a repeat scan bumps quantity)
//! - `1 <= quantity <= stock_ceiling` for every line
//! - At most [`MAX_CART_LINES`](crate::MAX_CART_LINES) lines

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::CatalogSnapshot;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::scanner::{ManualEntry, ScanSummary};
use crate::types::{CartLine, DiscountDescriptor, Draft, Variant};
use crate::validation::validate_cart_size;
use crate::MAX_CART_LINES;

// =============================================================================
// Outcomes
// =============================================================================

/// What a successful add did to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "outcome", rename_all = "snake_case")]
#[ts(export)]
pub enum AddOutcome {
    /// A new line was created with quantity one.
    Added { line_id: String },
    /// An existing line's quantity went up by one.
    Incremented { line_id: String, quantity: i64 },
}

impl AddOutcome {
    pub fn line_id(&self) -> &str {
        match self {
            AddOutcome::Added { line_id } | AddOutcome::Incremented { line_id, .. } => line_id,
        }
    }
}

/// What a successful quantity edit did to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "outcome", rename_all = "snake_case")]
#[ts(export)]
pub enum QuantityOutcome {
    Updated { line_id: String, quantity: i64 },
    /// The requested quantity was below one.
    Removed { line_id: String },
}

// =============================================================================
// Cart
// =============================================================================

/// The in-progress sale.
///
/// Fields are private: all changes go through the operation methods so the
/// invariants above hold after every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    lines: Vec<CartLine>,
    /// Line ids whose attached discount the cashier switched on.
    discount_toggles: BTreeSet<String>,
    created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new(now: DateTime<Utc>) -> Self {
        Cart {
            lines: Vec::new(),
            discount_toggles: BTreeSet::new(),
            created_at: now,
        }
    }

    // -------------------------------------------------------------------------
    // Adding
    // -------------------------------------------------------------------------

    /// Looks up a scanned or typed code and adds the matching variant.
    ///
    /// ## Errors
    /// - `CodeNotFound` when nothing in the snapshot matches
    /// - anything [`Cart::add_variant`] returns
    pub fn resolve_and_add(
        &mut self,
        code: &str,
        catalog: &CatalogSnapshot,
        now: DateTime<Utc>,
    ) -> CoreResult<AddOutcome> {
        let variant = catalog
            .find_by_code(code)
            .ok_or_else(|| CoreError::CodeNotFound(code.to_string()))?;
        let discount = catalog.discount_for(&variant.product_id).cloned();
        self.add_variant(variant, discount, now)
    }

    /// Adds every code of a manual entry, in order.
    ///
    /// Each code succeeds or fails on its own; failures leave the cart as
    /// the previous code left it.
    pub fn add_codes(
        &mut self,
        entry: ManualEntry,
        catalog: &CatalogSnapshot,
        now: DateTime<Utc>,
    ) -> ScanSummary {
        let mut summary = ScanSummary::with_rejected(entry.rejected);
        for code in &entry.codes {
            match self.resolve_and_add(code, catalog, now) {
                Ok(AddOutcome::Added { .. }) => summary.record_success(code, "added"),
                Ok(AddOutcome::Incremented { quantity, .. }) => {
                    summary.record_success(code, format!("quantity {}", quantity))
                }
                Err(e) => summary.record_failure(code, e.to_string()),
            }
        }
        summary
    }

    /// Adds a variant picked by id (product grid, search results).
    pub fn add_by_variant_id(
        &mut self,
        variant_id: &str,
        catalog: &CatalogSnapshot,
        now: DateTime<Utc>,
    ) -> CoreResult<AddOutcome> {
        let variant = catalog
            .find_by_variant_id(variant_id)
            .ok_or_else(|| CoreError::VariantNotFound(variant_id.to_string()))?;
        let discount = catalog.discount_for(&variant.product_id).cloned();
        self.add_variant(variant, discount, now)
    }

    /// Adds one unit of `variant`.
    ///
    /// ## Behavior
    /// - Variant with nothing on hand: `OutOfStock`, cart unchanged
    /// - Line already present: quantity + 1, bounded by the line's ceiling
    /// - Otherwise: new line, price/tax flag/ceiling frozen from `variant`
    pub fn add_variant(
        &mut self,
        variant: &Variant,
        discount: Option<DiscountDescriptor>,
        now: DateTime<Utc>,
    ) -> CoreResult<AddOutcome> {
        if !variant.is_in_stock() {
            return Err(CoreError::OutOfStock {
                sku: variant.sku.clone(),
                name: variant.product_name.clone(),
            });
        }

        let line_id = CartLine::line_id_for(&variant.product_id, &variant.variant_id);

        if let Some(line) = self.lines.iter_mut().find(|l| l.line_id == line_id) {
            let requested = line.quantity + 1;
            if requested > line.stock_ceiling {
                return Err(CoreError::InsufficientStock {
                    sku: line.sku.clone(),
                    available: line.stock_ceiling,
                    requested,
                });
            }
            line.quantity = requested;
            return Ok(AddOutcome::Incremented {
                line_id,
                quantity: requested,
            });
        }

        validate_cart_size(self.lines.len())
            .map_err(|_| CoreError::CartTooLarge { max: MAX_CART_LINES })?;

        self.lines
            .push(CartLine::from_variant(variant, discount, now));
        Ok(AddOutcome::Added { line_id })
    }

    // -------------------------------------------------------------------------
    // Editing
    // -------------------------------------------------------------------------

    /// Sets a line's quantity.
    ///
    /// ## Behavior
    /// - `quantity < 1`: the line is removed
    /// - `quantity > stock_ceiling`: `InsufficientStock`, prior quantity kept
    /// - otherwise: updated
    pub fn set_quantity(&mut self, line_id: &str, quantity: i64) -> CoreResult<QuantityOutcome> {
        let index = self
            .position(line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))?;

        if quantity < 1 {
            self.remove(line_id);
            return Ok(QuantityOutcome::Removed {
                line_id: line_id.to_string(),
            });
        }

        let line = &mut self.lines[index];
        if quantity > line.stock_ceiling {
            return Err(CoreError::InsufficientStock {
                sku: line.sku.clone(),
                available: line.stock_ceiling,
                requested: quantity,
            });
        }

        line.quantity = quantity;
        Ok(QuantityOutcome::Updated {
            line_id: line_id.to_string(),
            quantity,
        })
    }

    /// Removes a line unconditionally. Returns it if it was present.
    pub fn remove(&mut self, line_id: &str) -> Option<CartLine> {
        let index = self.position(line_id)?;
        self.discount_toggles.remove(line_id);
        Some(self.lines.remove(index))
    }

    /// Clears every line and every discount toggle.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.lines.clear();
        self.discount_toggles.clear();
        self.created_at = now;
    }

    // -------------------------------------------------------------------------
    // Discount toggles
    // -------------------------------------------------------------------------

    /// Flips the toggle on a line's attached discount. Returns the new state.
    pub fn toggle_discount(&mut self, line_id: &str) -> CoreResult<bool> {
        let enabled = !self.discount_toggles.contains(line_id);
        self.set_discount_toggle(line_id, enabled)?;
        Ok(enabled)
    }

    /// Switches a line's attached discount on or off.
    pub fn set_discount_toggle(&mut self, line_id: &str, enabled: bool) -> CoreResult<()> {
        let line = self
            .line(line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))?;
        if line.discount.is_none() {
            return Err(CoreError::NoDiscountAttached(line_id.to_string()));
        }

        if enabled {
            self.discount_toggles.insert(line_id.to_string());
        } else {
            self.discount_toggles.remove(line_id);
        }
        Ok(())
    }

    pub fn is_discount_toggled(&self, line_id: &str) -> bool {
        self.discount_toggles.contains(line_id)
    }

    /// Toggled line ids in stable order (for drafts).
    pub fn toggled_line_ids(&self) -> Vec<String> {
        self.discount_toggles.iter().cloned().collect()
    }

    // -------------------------------------------------------------------------
    // Drafts
    // -------------------------------------------------------------------------

    /// Replaces the whole cart with a draft's lines and toggles.
    ///
    /// Rejects an unrestorable draft without touching the cart.
    pub fn restore_from_draft(&mut self, draft: &Draft) -> CoreResult<()> {
        if !draft.is_restorable() {
            return Err(CoreError::InvalidDraft(draft.id.clone()));
        }

        let lines = draft.lines.clone();
        let toggles = draft
            .discount_toggles
            .iter()
            .filter(|id| {
                lines
                    .iter()
                    .any(|l| &l.line_id == *id && l.discount.is_some())
            })
            .cloned()
            .collect();

        self.lines = lines;
        self.discount_toggles = toggles;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, line_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.line_id == line_id)
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantities across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of line subtotals, before tax and discount.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn position(&self, line_id: &str) -> Option<usize> {
        self.lines.iter().position(|l| l.line_id == line_id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Customer, DiscountValue};
    use chrono::Duration;
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn tea(quantity: i64) -> Variant {
        Variant {
            variant_id: "v-tea".into(),
            sku: "TEA-GRN-250".into(),
            barcode: Some("5901234123457".into()),
            product_id: "p-tea".into(),
            product_name: "Green Tea".into(),
            brand: None,
            category: None,
            selling_price_cents: 1000,
            cost_price_cents: Some(600),
            quantity,
            threshold: 2,
            taxable: true,
            images: vec!["tea.png".into()],
        }
    }

    fn promo(now: DateTime<Utc>) -> DiscountDescriptor {
        DiscountDescriptor {
            id: "d-10".into(),
            name: "Tea week".into(),
            value: DiscountValue::percentage_bps(1000),
            starts_at: now - Duration::hours(1),
            ends_at: now + Duration::hours(1),
        }
    }

    fn catalog(stock: i64, now: DateTime<Utc>) -> CatalogSnapshot {
        let mut discounts = HashMap::new();
        discounts.insert("p-tea".to_string(), promo(now));
        CatalogSnapshot::new(vec![tea(stock)], discounts, now)
    }

    #[test]
    fn test_scan_creates_then_increments() {
        let now = Utc::now();
        let catalog = catalog(5, now);
        let mut cart = Cart::new(now);

        let first = cart.resolve_and_add("5901234123457", &catalog, now).unwrap();
        assert_eq!(
            first,
            AddOutcome::Added {
                line_id: "p-tea:v-tea".into()
            }
        );

        for _ in 0..3 {
            cart.resolve_and_add("5901234123457", &catalog, now).unwrap();
        }

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].quantity, 4);
        assert_eq!(cart.lines()[0].stock_ceiling, 5);
        assert!(cart.lines()[0].discount.is_some());
    }

    #[test]
    fn test_unknown_code_leaves_cart_untouched() {
        let now = Utc::now();
        let mut cart = Cart::new(now);

        let err = cart.resolve_and_add("0000", &catalog(5, now), now).unwrap_err();
        assert_eq!(err, CoreError::CodeNotFound("0000".into()));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_out_of_stock_is_rejected() {
        let now = Utc::now();
        let mut cart = Cart::new(now);

        let err = cart.resolve_and_add("TEA-GRN-250", &catalog(0, now), now).unwrap_err();
        assert!(matches!(err, CoreError::OutOfStock { .. }));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_respects_ceiling() {
        let now = Utc::now();
        let mut cart = Cart::new(now);
        cart.resolve_and_add("5901234123457", &catalog(5, now), now).unwrap();

        let err = cart.set_quantity("p-tea:v-tea", 6).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientStock {
                sku: "TEA-GRN-250".into(),
                available: 5,
                requested: 6
            }
        );
        assert_eq!(cart.lines()[0].quantity, 1);

        cart.set_quantity("p-tea:v-tea", 5).unwrap();
        assert_eq!(cart.lines()[0].quantity, 5);
    }

    #[test]
    fn test_deep_stock_has_no_fixed_quantity_cap() {
        let now = Utc::now();
        let catalog = catalog(2000, now);
        let mut cart = Cart::new(now);
        cart.resolve_and_add("5901234123457", &catalog, now).unwrap();

        cart.set_quantity("p-tea:v-tea", 1000).unwrap();
        assert_eq!(cart.lines()[0].quantity, 1000);

        let bumped = cart.resolve_and_add("5901234123457", &catalog, now).unwrap();
        assert_eq!(
            bumped,
            AddOutcome::Incremented {
                line_id: "p-tea:v-tea".into(),
                quantity: 1001
            }
        );

        assert!(cart.set_quantity("p-tea:v-tea", 2001).is_err());
        assert_eq!(cart.lines()[0].quantity, 1001);
    }

    #[test]
    fn test_increment_past_ceiling_is_rejected() {
        let now = Utc::now();
        let catalog = catalog(2, now);
        let mut cart = Cart::new(now);

        cart.resolve_and_add("5901234123457", &catalog, now).unwrap();
        cart.resolve_and_add("5901234123457", &catalog, now).unwrap();
        let err = cart.resolve_and_add("5901234123457", &catalog, now).unwrap_err();

        assert!(matches!(err, CoreError::InsufficientStock { requested: 3, .. }));
        assert_eq!(cart.lines()[0].quantity, 2);
    }

    #[test]
    fn test_set_quantity_below_one_removes() {
        let now = Utc::now();
        let mut cart = Cart::new(now);
        cart.resolve_and_add("5901234123457", &catalog(5, now), now).unwrap();
        cart.toggle_discount("p-tea:v-tea").unwrap();

        let outcome = cart.set_quantity("p-tea:v-tea", 0).unwrap();
        assert!(matches!(outcome, QuantityOutcome::Removed { .. }));
        assert!(cart.is_empty());
        assert!(!cart.is_discount_toggled("p-tea:v-tea"));
    }

    #[test]
    fn test_set_quantity_unknown_line() {
        let mut cart = Cart::new(Utc::now());
        assert!(matches!(
            cart.set_quantity("nope", 2),
            Err(CoreError::LineNotFound(_))
        ));
    }

    #[test]
    fn test_toggle_requires_attached_discount() {
        let now = Utc::now();
        let mut cart = Cart::new(now);
        cart.add_variant(&tea(5), None, now).unwrap();

        assert_eq!(
            cart.toggle_discount("p-tea:v-tea"),
            Err(CoreError::NoDiscountAttached("p-tea:v-tea".into()))
        );
    }

    #[test]
    fn test_reset_clears_lines_and_toggles() {
        let now = Utc::now();
        let mut cart = Cart::new(now);
        cart.resolve_and_add("5901234123457", &catalog(5, now), now).unwrap();
        assert!(cart.toggle_discount("p-tea:v-tea").unwrap());

        cart.reset(now);
        assert!(cart.is_empty());
        assert!(cart.toggled_line_ids().is_empty());
    }

    #[test]
    fn test_line_limit() {
        let now = Utc::now();
        let mut cart = Cart::new(now);
        for i in 0..MAX_CART_LINES {
            let mut v = tea(5);
            v.variant_id = format!("v-{}", i);
            cart.add_variant(&v, None, now).unwrap();
        }

        let mut extra = tea(5);
        extra.variant_id = "v-extra".into();
        assert_eq!(
            cart.add_variant(&extra, None, now),
            Err(CoreError::CartTooLarge { max: MAX_CART_LINES })
        );
    }

    #[test]
    fn test_add_codes_summarizes_each_token() {
        let now = Utc::now();
        let mut cart = Cart::new(now);
        let entry = crate::scanner::parse_manual_entry("5901234123457 tea-grn-250, 9999 12", 4).unwrap();

        let summary = cart.add_codes(entry, &catalog(5, now), now);
        assert_eq!(summary.added, 2);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.rejected_tokens, vec!["12"]);
        assert_eq!(summary.results.len(), 3);
        assert!(!summary.results[2].success);
        assert_eq!(cart.lines()[0].quantity, 2);
    }

    #[test]
    fn test_restore_rejects_empty_draft() {
        let now = Utc::now();
        let mut cart = Cart::new(now);
        cart.add_variant(&tea(5), None, now).unwrap();

        let draft = Draft {
            id: "d".into(),
            customer: Customer {
                id: "walk-in-local".into(),
                name: "Walk-in Customer".into(),
                email: None,
                phone: None,
                is_walk_in: true,
            },
            lines: vec![],
            discount_toggles: vec![],
            discount_mode: crate::discount::DiscountMode::Auto,
            subtotal_cents: 0,
            tax_cents: 0,
            total_cents: 0,
            created_at: now,
        };

        assert_eq!(
            cart.restore_from_draft(&draft),
            Err(CoreError::InvalidDraft("d".into()))
        );
        assert_eq!(cart.len(), 1);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add,
        Set(i64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![Just(Op::Add), (-2i64..15).prop_map(Op::Set)]
    }

    proptest! {
        #[test]
        fn prop_quantity_stays_within_ceiling(
            stock in 1i64..10,
            ops in prop::collection::vec(op(), 1..40),
        ) {
            let now = Utc::now();
            let variant = tea(stock);
            let mut cart = Cart::new(now);

            for op in ops {
                let _ = match op {
                    Op::Add => cart.add_variant(&variant, None, now).map(|_| ()),
                    Op::Set(q) => cart.set_quantity("p-tea:v-tea", q).map(|_| ()),
                };

                prop_assert!(cart.len() <= 1);
                if let Some(line) = cart.line("p-tea:v-tea") {
                    prop_assert!(line.quantity >= 1);
                    prop_assert!(line.quantity <= line.stock_ceiling);
                    prop_assert_eq!(line.stock_ceiling, stock);
                }
            }
        }
    }
}
