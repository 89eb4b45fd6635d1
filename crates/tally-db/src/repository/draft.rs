//! # Draft Repository
//!
//! Parked sales, stored as one JSON array under the `pos_drafts` key.
//!
//! ## Read-Modify-Write
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   SINGLE TRANSACTION                                    │
//! │                                                                         │
//! │  1. SELECT value FROM kv_store WHERE key = 'pos_drafts'                │
//! │  2. parse JSON  (unparseable ──► warn!, treat as [])                   │
//! │  3. push / remove one draft                                            │
//! │  4. UPSERT kv_store                                                    │
//! │                                                                         │
//! │  COMMIT ← a save appends exactly one record or nothing                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tally_core::{CartLine, CartTotals, Customer, DiscountMode, Draft};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::kv::{read_value, write_value};

/// Storage key of the draft collection.
pub const DRAFTS_KEY: &str = "pos_drafts";

/// Parses the stored collection, falling back to empty on corruption.
fn parse_drafts(raw: Option<String>) -> Vec<Draft> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    match serde_json::from_str::<Vec<Draft>>(&raw) {
        Ok(drafts) => drafts,
        Err(e) => {
            warn!(error = %e, bytes = raw.len(), "Stored drafts are unreadable, treating as empty");
            Vec::new()
        }
    }
}

/// Repository for parked sales.
#[derive(Debug, Clone)]
pub struct DraftRepository {
    pool: SqlitePool,
}

impl DraftRepository {
    /// Creates a new DraftRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DraftRepository { pool }
    }

    /// Parks a sale under a fresh id.
    ///
    /// ## Arguments
    /// * `customer` - Customer selected when the sale was parked
    /// * `lines` - Cart lines, in cart order
    /// * `discount_toggles` - Line ids with their discount switched on
    /// * `discount_mode` - Auto or the operator's manual discount
    /// * `totals` - Totals at capture time (display only)
    pub async fn save(
        &self,
        customer: Customer,
        lines: Vec<CartLine>,
        discount_toggles: Vec<String>,
        discount_mode: DiscountMode,
        totals: &CartTotals,
    ) -> DbResult<Draft> {
        let draft = Draft {
            id: Uuid::new_v4().to_string(),
            customer,
            lines,
            discount_toggles,
            discount_mode,
            subtotal_cents: totals.subtotal.cents(),
            tax_cents: totals.tax.cents(),
            total_cents: totals.final_total.cents(),
            created_at: Utc::now(),
        };

        let mut tx = self.pool.begin().await?;
        let mut drafts = parse_drafts(read_value(&mut tx, DRAFTS_KEY).await?);
        drafts.push(draft.clone());
        let encoded = serde_json::to_string(&drafts)?;
        write_value(&mut tx, DRAFTS_KEY, &encoded).await?;
        tx.commit().await?;

        debug!(
            draft_id = %draft.id,
            lines = draft.lines.len(),
            stored = drafts.len(),
            "Draft saved"
        );

        Ok(draft)
    }

    /// Lists every draft, newest first.
    pub async fn list(&self) -> DbResult<Vec<Draft>> {
        let mut conn = self.pool.acquire().await?;
        let mut drafts = parse_drafts(read_value(&mut conn, DRAFTS_KEY).await?);
        drafts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(drafts)
    }

    /// Finds one draft by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<Draft>> {
        let mut conn = self.pool.acquire().await?;
        let drafts = parse_drafts(read_value(&mut conn, DRAFTS_KEY).await?);
        Ok(drafts.into_iter().find(|d| d.id == id))
    }

    /// Removes a draft. Returns true if it was stored.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        Ok(self.take(id).await?.is_some())
    }

    /// Removes a draft and hands it back, in one transaction.
    ///
    /// `None` when no draft has this id; the collection is not rewritten.
    pub async fn take(&self, id: &str) -> DbResult<Option<Draft>> {
        let mut tx = self.pool.begin().await?;
        let mut drafts = parse_drafts(read_value(&mut tx, DRAFTS_KEY).await?);

        let taken = match drafts.iter().position(|d| d.id == id) {
            Some(index) => {
                let draft = drafts.remove(index);
                let encoded = serde_json::to_string(&drafts)?;
                write_value(&mut tx, DRAFTS_KEY, &encoded).await?;
                Some(draft)
            }
            None => None,
        };
        tx.commit().await?;

        debug!(draft_id = %id, removed = taken.is_some(), remaining = drafts.len(), "Draft take");
        Ok(taken)
    }

    /// Number of stored drafts.
    pub async fn count(&self) -> DbResult<usize> {
        let mut conn = self.pool.acquire().await?;
        Ok(parse_drafts(read_value(&mut conn, DRAFTS_KEY).await?).len())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
