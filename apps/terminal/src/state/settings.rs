//! # Tax Rate State
//!
//! The rate applied to taxable lines. Seeded from the local store when an
//! operator has set one, otherwise from configuration; written back to the
//! store on every change.

use std::sync::{Arc, PoisonError, RwLock};

use tally_core::TaxRate;
use tally_db::{Database, DbResult};
use tracing::info;

#[derive(Debug, Clone)]
pub struct TaxState {
    rate: Arc<RwLock<TaxRate>>,
}

impl TaxState {
    pub fn new(rate: TaxRate) -> Self {
        TaxState {
            rate: Arc::new(RwLock::new(rate)),
        }
    }

    /// Loads the persisted rate, falling back to `default`.
    pub async fn load(db: &Database, default: TaxRate) -> DbResult<Self> {
        let rate = match db.settings().tax_rate().await? {
            Some(stored) => {
                info!(bps = stored.bps(), "Using stored tax rate");
                stored
            }
            None => default,
        };
        Ok(TaxState::new(rate))
    }

    pub fn current(&self) -> TaxRate {
        *self.rate.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set(&self, rate: TaxRate) {
        *self.rate.write().unwrap_or_else(PoisonError::into_inner) = rate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_db::DbConfig;

    #[tokio::test]
    async fn test_load_prefers_stored_rate() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let state = TaxState::load(&db, TaxRate::from_bps(750)).await.unwrap();
        assert_eq!(state.current(), TaxRate::from_bps(750));

        db.settings().set_tax_rate(TaxRate::from_bps(500)).await.unwrap();
        let state = TaxState::load(&db, TaxRate::from_bps(750)).await.unwrap();
        assert_eq!(state.current(), TaxRate::from_bps(500));
    }
}
