//! # Discount Commands
//!
//! Exactly one discount mode applies at a time. Switching to manual keeps
//! the per-line toggles so switching back restores them.

use serde::Serialize;
use tracing::debug;

use tally_core::validation::validate_discount_value;
use tally_core::{DiscountMode, DiscountValue, ManualDiscount};

use crate::commands::cart::{snapshot, CartResponse};
use crate::error::ApiError;
use crate::state::{CartState, TaxState};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub line_id: String,
    pub enabled: bool,
    pub cart: CartResponse,
}

/// Flips the product discount attached to one line.
///
/// ## Errors
/// - `NOT_FOUND` when the line is not in the cart
/// - `DISCOUNT_ERROR` when the line has no discount attached
pub fn toggle_line_discount(
    cart: &CartState,
    tax: &TaxState,
    line_id: &str,
) -> Result<ToggleResponse, ApiError> {
    let enabled = cart.with_session_mut(|s| s.cart.toggle_discount(line_id))?;
    debug!(line_id = %line_id, enabled, "toggle_line_discount command");

    Ok(ToggleResponse {
        line_id: line_id.to_string(),
        enabled,
        cart: snapshot(cart, tax),
    })
}

/// Switches to one cart-wide discount typed in by the operator.
pub fn set_manual_discount(
    cart: &CartState,
    tax: &TaxState,
    value: DiscountValue,
) -> Result<CartResponse, ApiError> {
    validate_discount_value(&value)?;
    debug!(?value, "set_manual_discount command");

    cart.with_session_mut(|s| {
        s.discount_mode = DiscountMode::Manual {
            discount: ManualDiscount::new(value),
        }
    });
    Ok(snapshot(cart, tax))
}

/// Returns to per-line auto discounts.
pub fn use_auto_discounts(cart: &CartState, tax: &TaxState) -> CartResponse {
    debug!("use_auto_discounts command");

    cart.with_session_mut(|s| s.discount_mode = DiscountMode::Auto);
    snapshot(cart, tax)
}
