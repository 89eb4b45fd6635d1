//! # Customer State
//!
//! Shared handle to the walk-in aware customer resolver.

use std::sync::{Arc, Mutex, PoisonError};

use tally_core::CustomerResolver;

#[derive(Debug, Clone, Default)]
pub struct CustomerState {
    resolver: Arc<Mutex<CustomerResolver>>,
}

impl CustomerState {
    /// Starts with the local walk-in placeholder selected.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolver<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&CustomerResolver) -> R,
    {
        let resolver = self.resolver.lock().unwrap_or_else(PoisonError::into_inner);
        f(&resolver)
    }

    pub fn with_resolver_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut CustomerResolver) -> R,
    {
        let mut resolver = self.resolver.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut resolver)
    }
}
