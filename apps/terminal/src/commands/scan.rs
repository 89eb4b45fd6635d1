//! # Scan Commands
//!
//! The two ways a code reaches the cart.
//!
//! ```text
//! scanner burst ──► ScannerListener ──► scan_code(code)           one code
//! typed / pasted ──────────────────────► submit_manual_entry(line) many codes
//! ```
//!
//! A failed scan is reported and leaves the cart as it was.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use tally_core::{parse_manual_entry, AddOutcome, ScanSummary};

use crate::commands::cart::{snapshot, CartResponse};
use crate::error::ApiError;
use crate::state::{CartState, CatalogState, ConfigState, TaxState};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub code: String,
    pub outcome: AddOutcome,
    pub cart: CartResponse,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualEntryResponse {
    pub summary: ScanSummary,
    pub cart: CartResponse,
}

/// Adds the variant matching one scanned code.
pub fn scan_code(
    catalog: &CatalogState,
    cart: &CartState,
    tax: &TaxState,
    code: &str,
) -> Result<ScanResponse, ApiError> {
    debug!(code = %code, "scan_code command");

    let catalog = catalog.snapshot();
    let outcome = cart
        .with_session_mut(|s| s.cart.resolve_and_add(code, &catalog, Utc::now()))
        .map_err(|e| {
            info!(code = %code, error = %e, "Scan rejected");
            e
        })?;

    Ok(ScanResponse {
        code: code.to_string(),
        outcome,
        cart: snapshot(cart, tax),
    })
}

/// Adds every code typed into the manual entry field.
///
/// Tokens are split on whitespace and commas. Short tokens are counted as
/// rejected; each remaining code succeeds or fails on its own. Only an
/// empty line is an error.
pub fn submit_manual_entry(
    config: &ConfigState,
    catalog: &CatalogState,
    cart: &CartState,
    tax: &TaxState,
    input: &str,
) -> Result<ManualEntryResponse, ApiError> {
    let entry = parse_manual_entry(input, config.scanner.min_code_length)?;
    debug!(codes = entry.codes.len(), rejected = entry.rejected.len(), "submit_manual_entry command");

    let catalog = catalog.snapshot();
    let summary = cart.with_session_mut(|s| s.cart.add_codes(entry, &catalog, Utc::now()));

    if summary.failed > 0 {
        info!(added = summary.added, failed = summary.failed, "Manual entry partly rejected");
    }

    Ok(ManualEntryResponse {
        summary,
        cart: snapshot(cart, tax),
    })
}
