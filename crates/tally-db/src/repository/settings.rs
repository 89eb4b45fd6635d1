//! # Settings Repository
//!
//! Register settings that outlive a session. Currently the tax rate only.

use sqlx::SqlitePool;
use tally_core::TaxRate;
use tracing::{debug, warn};

use crate::error::DbResult;
use crate::repository::kv::{read_value, write_value};

/// Storage key of the tax rate, in basis points.
pub const TAX_RATE_KEY: &str = "tax_rate_bps";

/// Repository for persisted settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Stored tax rate, if one was ever set.
    ///
    /// An unreadable value is logged and ignored so the configured default
    /// applies.
    pub async fn tax_rate(&self) -> DbResult<Option<TaxRate>> {
        let mut conn = self.pool.acquire().await?;
        let Some(raw) = read_value(&mut conn, TAX_RATE_KEY).await? else {
            return Ok(None);
        };

        match raw.trim().parse::<u32>() {
            Ok(bps) => Ok(Some(TaxRate::from_bps(bps))),
            Err(e) => {
                warn!(value = %raw, error = %e, "Stored tax rate is unreadable, ignoring");
                Ok(None)
            }
        }
    }

    pub async fn set_tax_rate(&self, rate: TaxRate) -> DbResult<()> {
        debug!(bps = rate.bps(), "Persisting tax rate");
        let mut conn = self.pool.acquire().await?;
        write_value(&mut conn, TAX_RATE_KEY, &rate.bps().to_string()).await
    }
}
