//! # Draft Commands
//!
//! Park a sale, bring it back later.
//!
//! ## Restore Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  restore_draft(id)                                                      │
//! │                                                                         │
//! │  0. id must be a UUID ─────────────────────► VALIDATION_ERROR           │
//! │  1. drafts().get(id) ────────── missing ──► NOT_FOUND                   │
//! │  2. rebuild cart off to the side ── empty/invalid ──► DRAFT_ERROR       │
//! │        (draft stays stored, live cart and customer untouched)           │
//! │  3. drafts().take(id) ──────── gone meanwhile ──► NOT_FOUND             │
//! │  4. swap in cart and discount mode, restore customer                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing touches the live session until the store has committed.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use tally_core::validation::validate_uuid;
use tally_core::{CoreError, Customer, Draft};

use crate::commands::cart::{snapshot, CartResponse};
use crate::error::ApiError;
use crate::state::{CartSession, CartState, CustomerState, DbState, TaxState};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreResponse {
    pub draft_id: String,
    pub customer: Customer,
    pub cart: CartResponse,
}

/// Parks the current sale and starts a fresh one.
///
/// The live cart is reset and the walk-in re-selected only after the draft
/// is stored.
pub async fn save_draft(
    db: &DbState,
    cart: &CartState,
    customers: &CustomerState,
    tax: &TaxState,
) -> Result<Draft, ApiError> {
    let rate = tax.current();
    let (lines, toggles, mode, totals) = cart.with_session(|s| {
        let priced = CartResponse::build(s, rate, Utc::now());
        (priced.lines, priced.discount_toggles, s.discount_mode, priced.totals)
    });

    if lines.is_empty() {
        return Err(CoreError::EmptyCart.into());
    }

    let customer = customers.with_resolver(|r| r.selected().clone());
    let draft = db
        .inner()
        .drafts()
        .save(customer, lines, toggles, mode, &totals)
        .await?;

    cart.with_session_mut(|s| s.reset(Utc::now()));
    customers.with_resolver_mut(|r| r.reset_to_walk_in());

    info!(draft_id = %draft.id, lines = draft.lines.len(), total = draft.total_cents, "Draft saved");
    Ok(draft)
}

/// Lists parked sales, newest first.
pub async fn list_drafts(db: &DbState) -> Result<Vec<Draft>, ApiError> {
    debug!("list_drafts command");
    Ok(db.inner().drafts().list().await?)
}

/// Replaces the live sale with a parked one and removes it from the store.
pub async fn restore_draft(
    db: &DbState,
    cart: &CartState,
    customers: &CustomerState,
    tax: &TaxState,
    draft_id: &str,
) -> Result<RestoreResponse, ApiError> {
    debug!(draft_id = %draft_id, "restore_draft command");
    validate_uuid(draft_id)?;

    let drafts = db.inner().drafts();
    let draft = drafts
        .get(draft_id)
        .await?
        .ok_or_else(|| CoreError::DraftNotFound(draft_id.to_string()))?;

    let mut restored = CartSession::new(Utc::now());
    restored.cart.restore_from_draft(&draft)?;
    restored.discount_mode = draft.discount_mode;

    let taken = drafts
        .take(draft_id)
        .await?
        .ok_or_else(|| CoreError::DraftNotFound(draft_id.to_string()))?;

    cart.with_session_mut(|s| *s = restored);
    let customer = customers.with_resolver_mut(|r| {
        r.restore(taken.customer);
        r.selected().clone()
    });

    info!(draft_id = %draft_id, customer = %customer.id, "Draft restored");
    Ok(RestoreResponse {
        draft_id: draft_id.to_string(),
        customer,
        cart: snapshot(cart, tax),
    })
}

/// Discards a parked sale. Returns false if it was already gone.
pub async fn delete_draft(db: &DbState, draft_id: &str) -> Result<bool, ApiError> {
    validate_uuid(draft_id)?;
    let deleted = db.inner().drafts().delete(draft_id).await?;
    debug!(draft_id = %draft_id, deleted, "delete_draft command");
    Ok(deleted)
}

