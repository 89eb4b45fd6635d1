//! # Checkout Command
//!
//! Hands the finalized sale to the back office.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Price the session (discount, tax, final total)                      │
//! │  2. Check tenders cover the final total                                 │
//! │  3. submit_checkout ──── error ──► UPSTREAM_ERROR, cart untouched       │
//! │         │                                                               │
//! │         ▼ ok                                                            │
//! │  4. Reset cart, re-select walk-in                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No lock is held while the request is in flight.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use tally_core::{CoreError, Money, ValidationError};

use crate::commands::cart::CartResponse;
use crate::error::ApiError;
use crate::state::{CartState, CustomerState, TaxState};
use crate::upstream::{BackOffice, CheckoutLine, CheckoutPayload, CheckoutReceipt, PaymentEntry};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub receipt: CheckoutReceipt,
    pub final_total: Money,
    pub tendered: Money,
    pub change_due: Money,
}

/// Builds the payload the back office receives for the current sale.
pub fn build_payload(
    cart: &CartState,
    customers: &CustomerState,
    tax: &TaxState,
    payments: Vec<PaymentEntry>,
) -> Result<CheckoutPayload, ApiError> {
    if payments.is_empty() {
        return Err(ValidationError::Required {
            field: "payment".to_string(),
        }
        .into());
    }
    if payments.iter().any(|p| !p.amount.is_positive()) {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        }
        .into());
    }

    let rate = tax.current();
    let priced = cart.with_session(|s| CartResponse::build(s, rate, Utc::now()));
    if priced.lines.is_empty() {
        return Err(CoreError::EmptyCart.into());
    }

    let tendered: Money = payments.iter().map(|p| p.amount).sum();
    let final_total = priced.totals.final_total;
    if tendered < final_total {
        return Err(ApiError::payment(format!(
            "Tendered {} is less than the total {}",
            tendered, final_total
        )));
    }

    let (customer, placeholder) =
        customers.with_resolver(|r| (r.selected().clone(), r.is_placeholder()));
    // the local placeholder id means nothing to the back office
    let customer_id = if customer.is_walk_in && placeholder {
        None
    } else {
        Some(customer.id.clone())
    };

    Ok(CheckoutPayload {
        customer_id,
        customer_name: customer.name,
        is_walk_in: customer.is_walk_in,
        lines: priced
            .lines
            .iter()
            .map(|l| CheckoutLine {
                line_id: l.line_id.clone(),
                variant_id: l.variant_id.clone(),
                product_id: l.product_id.clone(),
                sku: l.sku.clone(),
                product_name: l.product_name.clone(),
                quantity: l.quantity,
                unit_price: l.unit_price(),
                subtotal: l.subtotal(),
                taxable: l.taxable,
            })
            .collect(),
        subtotal: priced.totals.subtotal,
        tax_rate_bps: priced.totals.tax_rate_bps,
        tax: priced.totals.tax,
        discount: priced.discount,
        final_total,
        payments,
        change_due: tendered - final_total,
    })
}

/// Submits the sale and starts a fresh one on success.
pub async fn checkout(
    back_office: &dyn BackOffice,
    cart: &CartState,
    customers: &CustomerState,
    tax: &TaxState,
    payments: Vec<PaymentEntry>,
) -> Result<CheckoutResponse, ApiError> {
    let payload = build_payload(cart, customers, tax, payments)?;
    debug!(lines = payload.lines.len(), total = %payload.final_total, "checkout command");

    let receipt = back_office.submit_checkout(&payload).await?;

    cart.with_session_mut(|s| s.reset(Utc::now()));
    customers.with_resolver_mut(|r| r.reset_to_walk_in());

    let tendered = payload.payments.iter().map(|p| p.amount).sum();
    info!(sale_id = %receipt.sale_id, total = %payload.final_total, "Sale accepted");

    Ok(CheckoutResponse {
        receipt,
        final_total: payload.final_total,
        tendered,
        change_due: payload.change_due,
    })
}
