//! # Catalog State
//!
//! The in-memory catalog snapshot. Read by every scan, replaced wholesale
//! by a successful refresh (last write wins). Readers hold an `Arc` to the
//! snapshot they started with, so a refresh never changes data under a
//! running lookup.

use std::sync::{Arc, PoisonError, RwLock};

use tally_core::CatalogSnapshot;

#[derive(Debug, Clone)]
pub struct CatalogState {
    snapshot: Arc<RwLock<Arc<CatalogSnapshot>>>,
}

impl CatalogState {
    /// Starts with an empty, never-loaded snapshot.
    pub fn new() -> Self {
        CatalogState {
            snapshot: Arc::new(RwLock::new(Arc::new(CatalogSnapshot::empty()))),
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        let guard = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replaces the snapshot.
    pub fn replace(&self, snapshot: CatalogSnapshot) {
        let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(snapshot);
    }
}

impl Default for CatalogState {
    fn default() -> Self {
        Self::new()
    }
}
