//! # Discount Engine
//!
//! Computes how much comes off the cart under exactly one mode.
//!
//! ## Modes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Auto                                                                   │
//! │    for each line:                                                       │
//! │      attached descriptor? ── toggled on? ── active at `now`?            │
//! │             │ no                 │ no             │ no                  │
//! │             └────────────────────┴────────────────┴──► contributes 0    │
//! │      all yes ──► value.amount_off(line subtotal)                        │
//! │    total = Σ lines                                                      │
//! │                                                                         │
//! │  Manual                                                                 │
//! │    total = value.amount_off(cart subtotal)                              │
//! │    per-line descriptors are ignored                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is cached: a window that lapses between two calls stops counting
//! on the second one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::Cart;
use crate::money::Money;
use crate::types::ManualDiscount;

/// Which discount source applies to the sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(tag = "mode", rename_all = "snake_case")]
#[ts(export)]
pub enum DiscountMode {
    /// Per-line product discounts, each switched on by the cashier.
    #[default]
    Auto,
    /// One cart-wide discount typed in by the operator.
    Manual { discount: ManualDiscount },
}

/// One line's contribution in auto mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineDiscount {
    pub line_id: String,
    pub discount_id: String,
    pub name: String,
    pub amount: Money,
}

/// Result of a discount computation, kept itemised for checkout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DiscountBreakdown {
    pub mode: DiscountMode,
    /// Auto mode only.
    pub lines: Vec<LineDiscount>,
    /// Always within `0..=subtotal`.
    pub total: Money,
}

/// Computes the cart discount at `now`.
///
/// ```rust
/// use chrono::Utc;
/// use tally_core::cart::Cart;
/// use tally_core::discount::{compute_discount, DiscountMode};
///
/// let cart = Cart::new(Utc::now());
/// let breakdown = compute_discount(&cart, &DiscountMode::Auto, Utc::now());
/// assert!(breakdown.total.is_zero());
/// ```
pub fn compute_discount(cart: &Cart, mode: &DiscountMode, now: DateTime<Utc>) -> DiscountBreakdown {
    let subtotal = cart.subtotal();

    match mode {
        DiscountMode::Auto => {
            let lines: Vec<LineDiscount> = cart
                .lines()
                .iter()
                .filter(|line| cart.is_discount_toggled(&line.line_id))
                .filter_map(|line| {
                    let descriptor = line.discount.as_ref()?;
                    if !descriptor.is_active_at(now) {
                        return None;
                    }
                    Some(LineDiscount {
                        line_id: line.line_id.clone(),
                        discount_id: descriptor.id.clone(),
                        name: descriptor.name.clone(),
                        amount: descriptor.value.amount_off(line.subtotal()),
                    })
                })
                .filter(|d| d.amount.is_positive())
                .collect();

            let total = lines.iter().map(|d| d.amount).sum::<Money>().capped_at(subtotal);
            DiscountBreakdown {
                mode: *mode,
                lines,
                total,
            }
        }
        DiscountMode::Manual { discount } => DiscountBreakdown {
            mode: *mode,
            lines: Vec::new(),
            total: discount.value.amount_off(subtotal),
        },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
