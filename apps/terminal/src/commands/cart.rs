//! # Cart Commands
//!
//! Commands for cart manipulation.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│ Checkout │────►│   Sale   │       │
//! │  │  Cart    │     │          │     │          │     │ accepted │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │       ▲                │  │                               │             │
//! │       │          scan_code│                               │             │
//! │       │          update_quantity                          │             │
//! │       │          remove_line                              │             │
//! │       │                   │                               │             │
//! │       │                   ▼                               │             │
//! │       │             save_draft ──► parked                 │             │
//! │       │                   │                               │             │
//! │       └───────────────────┴───── clear_cart ◄─────────────┘             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use tally_core::{
    compute_discount, AddOutcome, CartLine, CartTotals, DiscountBreakdown, QuantityOutcome,
    TaxRate,
};

use crate::error::ApiError;
use crate::state::{CartSession, CartState, CatalogState, TaxState};

/// Cart response including lines, discount and totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub lines: Vec<CartLine>,
    pub discount_toggles: Vec<String>,
    pub discount: DiscountBreakdown,
    pub totals: CartTotals,
}

impl CartResponse {
    /// Prices the session at `now`.
    pub fn build(session: &CartSession, rate: TaxRate, now: DateTime<Utc>) -> Self {
        let discount = compute_discount(&session.cart, &session.discount_mode, now);
        let totals = CartTotals::compute(&session.cart, rate, &discount);

        CartResponse {
            lines: session.cart.lines().to_vec(),
            discount_toggles: session.cart.toggled_line_ids(),
            discount,
            totals,
        }
    }
}

/// Current cart, priced now.
pub(crate) fn snapshot(cart: &CartState, tax: &TaxState) -> CartResponse {
    let rate = tax.current();
    cart.with_session(|s| CartResponse::build(s, rate, Utc::now()))
}

/// A line change and the cart after it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddResponse {
    pub outcome: AddOutcome,
    pub cart: CartResponse,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityResponse {
    pub outcome: QuantityOutcome,
    pub cart: CartResponse,
}

/// Gets the current cart contents.
///
/// ## Returns
/// Current cart with lines, discount breakdown and totals
pub fn get_cart(cart: &CartState, tax: &TaxState) -> CartResponse {
    debug!("get_cart command");
    snapshot(cart, tax)
}

/// Adds a variant picked by id (search results, product grid).
///
/// ## Behavior
/// - Line already in cart: quantity increases, bounded by its stock ceiling
/// - Line not in cart: added with price and ceiling frozen from the catalog
pub fn add_variant(
    catalog: &CatalogState,
    cart: &CartState,
    tax: &TaxState,
    variant_id: &str,
) -> Result<AddResponse, ApiError> {
    debug!(variant_id = %variant_id, "add_variant command");

    let snapshot_now = catalog.snapshot();
    let outcome = cart.with_session_mut(|s| {
        s.cart.add_by_variant_id(variant_id, &snapshot_now, Utc::now())
    })?;

    Ok(AddResponse {
        outcome,
        cart: snapshot(cart, tax),
    })
}

/// Sets the quantity of a line.
///
/// ## Behavior
/// - Quantity below 1: removes the line
/// - Quantity above the line's stock ceiling: `INSUFFICIENT_STOCK`, no change
pub fn update_quantity(
    cart: &CartState,
    tax: &TaxState,
    line_id: &str,
    quantity: i64,
) -> Result<QuantityResponse, ApiError> {
    debug!(line_id = %line_id, quantity = %quantity, "update_quantity command");

    let outcome = cart.with_session_mut(|s| s.cart.set_quantity(line_id, quantity))?;

    Ok(QuantityResponse {
        outcome,
        cart: snapshot(cart, tax),
    })
}

/// Removes a line. Removing an absent line is not an error.
pub fn remove_line(cart: &CartState, tax: &TaxState, line_id: &str) -> CartResponse {
    debug!(line_id = %line_id, "remove_line command");

    let removed = cart.with_session_mut(|s| s.cart.remove(line_id));
    if removed.is_none() {
        debug!(line_id = %line_id, "Line was not in cart");
    }

    snapshot(cart, tax)
}

/// Clears all lines and returns to auto discounts.
///
/// ## When Used
/// - Cashier cancels the sale
/// - After a checkout is accepted
pub fn clear_cart(cart: &CartState, tax: &TaxState) -> CartResponse {
    debug!("clear_cart command");

    cart.with_session_mut(|s| s.reset(Utc::now()));
    snapshot(cart, tax)
}
