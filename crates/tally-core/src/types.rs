//! # Domain Types
//!
//! Core domain types shared by the register engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Variant      │   │    CartLine     │   │     Draft       │       │
//! │  │  (read-only,    │──►│  price frozen   │──►│  snapshot of    │       │
//! │  │   catalog)      │   │  stock ceiling  │   │  lines+customer │       │
//! │  └─────────────────┘   └────────┬────────┘   └─────────────────┘       │
//! │                                 │                                       │
//! │  ┌─────────────────┐   ┌────────▼────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │ Discount        │   │    Customer     │       │
//! │  │  bps (u32)      │   │ Descriptor      │   │  walk-in flag   │       │
//! │  │  750 = 7.5%     │   │ window+value    │   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A `CartLine` copies price, tax flag and available stock from the
//! `Variant` at the moment it is added. Later catalog refreshes never
//! reprice a line that is already in the cart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 750 bps = 7.5%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (operator input, env vars).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round().max(0.0) as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Variant (catalog, read-only)
// =============================================================================

/// A sellable stock-keeping unit as reported by the inventory service.
///
/// The register never mutates a variant; it only reads the snapshot that
/// was current when a code was resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Variant {
    pub variant_id: String,
    pub sku: String,
    /// EAN-13, UPC-A, or any in-house code printed on the label.
    pub barcode: Option<String>,
    pub product_id: String,
    pub product_name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub selling_price_cents: i64,
    pub cost_price_cents: Option<i64>,
    /// Units available right now.
    pub quantity: i64,
    /// Low-stock warning threshold.
    pub threshold: i64,
    pub taxable: bool,
    #[serde(default)]
    pub images: Vec<String>,
}

impl Variant {
    /// Returns the selling price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }

    #[inline]
    pub fn is_in_stock(&self) -> bool {
        self.quantity > 0
    }

    /// True when stock is positive but at or below the threshold.
    pub fn is_low_stock(&self) -> bool {
        self.is_in_stock() && self.quantity <= self.threshold
    }

    /// Matches a scanned or typed code: exact barcode, or SKU ignoring case.
    pub fn matches_code(&self, code: &str) -> bool {
        self.barcode.as_deref() == Some(code) || self.sku.eq_ignore_ascii_case(code)
    }
}

// =============================================================================
// Discounts
// =============================================================================

/// How much a discount takes off.
///
/// Percentages are basis points (1000 = 10%), fixed amounts are money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum DiscountValue {
    Percentage { bps: u32 },
    Fixed { amount: Money },
}

impl DiscountValue {
    /// Percentage discount from basis points.
    pub const fn percentage_bps(bps: u32) -> Self {
        DiscountValue::Percentage { bps }
    }

    /// Fixed-amount discount in cents.
    pub const fn fixed_cents(cents: i64) -> Self {
        DiscountValue::Fixed {
            amount: Money::from_cents(cents),
        }
    }

    /// Amount taken off `base`, clamped to `0..=base`.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    /// use tally_core::types::DiscountValue;
    ///
    /// let base = Money::from_cents(1000);
    /// assert_eq!(DiscountValue::percentage_bps(1000).amount_off(base).cents(), 100);
    /// assert_eq!(DiscountValue::fixed_cents(2500).amount_off(base).cents(), 1000);
    /// ```
    pub fn amount_off(&self, base: Money) -> Money {
        if !base.is_positive() {
            return Money::zero();
        }
        let raw = match self {
            DiscountValue::Percentage { bps } => base.apply_bps(*bps),
            DiscountValue::Fixed { amount } => *amount,
        };
        raw.capped_at(base)
    }
}

/// Derived state of a discount window. Never stored, always computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum DiscountStatus {
    Active,
    Expired,
}

/// A product-linked discount offered by the back office.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DiscountDescriptor {
    pub id: String,
    pub name: String,
    pub value: DiscountValue,
    #[ts(as = "String")]
    pub starts_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub ends_at: DateTime<Utc>,
}

impl DiscountDescriptor {
    /// Status at `now`. Outside `[starts_at, ends_at]` counts as expired.
    pub fn status_at(&self, now: DateTime<Utc>) -> DiscountStatus {
        if self.starts_at <= now && now <= self.ends_at {
            DiscountStatus::Active
        } else {
            DiscountStatus::Expired
        }
    }

    #[inline]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status_at(now) == DiscountStatus::Active
    }
}

/// A cart-wide discount typed in by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ManualDiscount {
    pub value: DiscountValue,
}

impl ManualDiscount {
    pub const fn new(value: DiscountValue) -> Self {
        ManualDiscount { value }
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer the sale is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Canonical anonymous customer. At most one backend record carries it.
    #[serde(default)]
    pub is_walk_in: bool,
}

// =============================================================================
// Cart Line
// =============================================================================

/// A line in the in-progress sale.
///
/// ## Frozen Fields
/// `unit_price_cents`, `taxable` and `stock_ceiling` are copied from the
/// variant when the line is created and never re-read from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    /// `{product_id}:{variant_id}`
    pub line_id: String,
    pub product_id: String,
    pub variant_id: String,
    pub product_name: String,
    pub sku: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub taxable: bool,
    pub discount: Option<DiscountDescriptor>,
    pub image: Option<String>,
    /// Variant quantity at add-time; upper bound for quantity edits.
    pub stock_ceiling: i64,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Builds the composite line identifier.
    pub fn line_id_for(product_id: &str, variant_id: &str) -> String {
        format!("{}:{}", product_id, variant_id)
    }

    /// Creates a quantity-one line from a variant.
    pub fn from_variant(
        variant: &Variant,
        discount: Option<DiscountDescriptor>,
        added_at: DateTime<Utc>,
    ) -> Self {
        CartLine {
            line_id: Self::line_id_for(&variant.product_id, &variant.variant_id),
            product_id: variant.product_id.clone(),
            variant_id: variant.variant_id.clone(),
            product_name: variant.product_name.clone(),
            sku: variant.sku.clone(),
            unit_price_cents: variant.selling_price_cents,
            quantity: 1,
            taxable: variant.taxable,
            discount,
            image: variant.images.first().cloned(),
            stock_ceiling: variant.quantity,
            added_at,
        }
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Unit price × quantity, before tax and discount.
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Draft
// =============================================================================

/// A parked sale.
///
/// Totals are captured for the draft list only; a restore recomputes them
/// from the lines, the toggles and the discount mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Draft {
    pub id: String,
    pub customer: Customer,
    pub lines: Vec<CartLine>,
    /// Line ids whose attached discount was toggled on.
    #[serde(default)]
    pub discount_toggles: Vec<String>,
    /// Drafts parked before the mode was recorded restore in auto mode.
    #[serde(default)]
    pub discount_mode: crate::discount::DiscountMode,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Draft {
    /// True when the draft has something to restore.
    pub fn is_restorable(&self) -> bool {
        !self.lines.is_empty() && self.lines.iter().all(|l| l.quantity >= 1)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer pays at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on external terminal.
    ExternalCard,
    /// Bank or mobile transfer confirmed by the cashier.
    Transfer,
}

impl std::str::FromStr for PaymentMethod {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" | "external_card" => Ok(PaymentMethod::ExternalCard),
            "transfer" => Ok(PaymentMethod::Transfer),
            _ => Err(crate::error::ValidationError::NotAllowed {
                field: "payment method".to_string(),
                allowed: vec!["cash".into(), "card".into(), "transfer".into()],
            }),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn window(now: DateTime<Utc>) -> DiscountDescriptor {
        DiscountDescriptor {
            id: "d-1".into(),
            name: "Weekend".into(),
            value: DiscountValue::percentage_bps(1000),
            starts_at: now - Duration::days(1),
            ends_at: now + Duration::days(1),
        }
    }

    #[test]
    fn test_tax_rate_from_percentage() {
        assert_eq!(TaxRate::from_percentage(7.5).bps(), 750);
        assert_eq!(TaxRate::from_percentage(8.25).bps(), 825);
        assert!((TaxRate::from_bps(750).percentage() - 7.5).abs() < 0.001);
    }

    #[test]
    fn test_discount_status_is_derived_from_now() {
        let now = Utc::now();
        let d = window(now);

        assert_eq!(d.status_at(now), DiscountStatus::Active);
        assert_eq!(d.status_at(now + Duration::days(2)), DiscountStatus::Expired);
        assert_eq!(d.status_at(now - Duration::days(2)), DiscountStatus::Expired);
    }

    #[test]
    fn test_discount_value_clamps() {
        let base = Money::from_cents(500);
        assert_eq!(DiscountValue::fixed_cents(200).amount_off(base).cents(), 200);
        assert_eq!(DiscountValue::fixed_cents(900).amount_off(base).cents(), 500);
        assert_eq!(DiscountValue::percentage_bps(10_000).amount_off(base).cents(), 500);
        assert_eq!(DiscountValue::percentage_bps(2500).amount_off(Money::zero()).cents(), 0);
    }

    #[test]
    fn test_variant_matches_code() {
        let v = Variant {
            variant_id: "v1".into(),
            sku: "TEA-GRN-250".into(),
            barcode: Some("5901234123457".into()),
            product_id: "p1".into(),
            product_name: "Green Tea".into(),
            brand: None,
            category: None,
            selling_price_cents: 1000,
            cost_price_cents: None,
            quantity: 5,
            threshold: 2,
            taxable: true,
            images: vec![],
        };

        assert!(v.matches_code("5901234123457"));
        assert!(v.matches_code("tea-grn-250"));
        assert!(!v.matches_code("590123412345"));
        assert!(!v.is_low_stock());
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!("Card".parse::<PaymentMethod>().unwrap(), PaymentMethod::ExternalCard);
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_discount_value_serde_shape() {
        let json = serde_json::to_string(&DiscountValue::percentage_bps(1000)).unwrap();
        assert_eq!(json, r#"{"kind":"percentage","bps":1000}"#);
    }
}
