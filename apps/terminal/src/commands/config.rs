//! # Config Commands
//!
//! Read-only configuration, plus the one setting an operator can change at
//! the register: the tax rate.

use serde::Serialize;
use tracing::{debug, info};

use tally_core::validation::validate_tax_rate_bps;
use tally_core::{TaxRate, ValidationError};

use crate::error::ApiError;
use crate::state::{ConfigState, DbState, TaxState};

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxRateResponse {
    pub bps: u32,
    pub percentage: f64,
}

impl From<TaxRate> for TaxRateResponse {
    fn from(rate: TaxRate) -> Self {
        TaxRateResponse {
            bps: rate.bps(),
            percentage: rate.percentage(),
        }
    }
}

/// Gets the register configuration.
///
/// ## Returns
/// Configuration including store name, currency settings and scanner timing
pub fn get_config(config: &ConfigState) -> ConfigState {
    debug!("get_config command");
    config.clone()
}

pub fn get_tax_rate(tax: &TaxState) -> TaxRateResponse {
    tax.current().into()
}

/// Sets and persists the tax rate.
///
/// ## Arguments
/// * `percentage` - 0 to 100, e.g. `7.5`
pub async fn set_tax_rate(
    db: &DbState,
    tax: &TaxState,
    percentage: f64,
) -> Result<TaxRateResponse, ApiError> {
    if !percentage.is_finite() || percentage < 0.0 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 100,
        }
        .into());
    }

    let rate = TaxRate::from_percentage(percentage);
    validate_tax_rate_bps(rate.bps())?;

    db.inner().settings().set_tax_rate(rate).await?;
    tax.set(rate);

    info!(bps = rate.bps(), "Tax rate updated");
    Ok(rate.into())
}
