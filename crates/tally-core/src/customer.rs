//! # Customer Resolver
//!
//! Keeps a valid customer selected at all times, defaulting to walk-in.
//!
//! ## Lifecycle
//! ```text
//! session start ──► placeholder walk-in (id "walk-in-local")
//!                          │
//!        directory fetch   │
//!        ┌─────────────────┼──────────────────┐
//!        ▼ ok              │                  ▼ failed
//!  backend walk-in record  │          placeholder (or last known
//!  REPLACES placeholder    │          directory) stays
//!        │                 │
//!        ▼                 │
//!  selected customer gone from directory? ──► back to walk-in
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::Customer;
use crate::{WALK_IN_NAME, WALK_IN_PLACEHOLDER_ID};

/// Where the directory currently comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum DirectoryStatus {
    /// No fetch has completed yet.
    Pending,
    /// The last fetch succeeded.
    Loaded,
    /// The last fetch failed; last known data stays in use.
    Unavailable,
}

/// Walk-in aware customer selection.
#[derive(Debug, Clone)]
pub struct CustomerResolver {
    walk_in: Customer,
    directory: Vec<Customer>,
    selected: Customer,
    status: DirectoryStatus,
}

impl CustomerResolver {
    /// Starts with the local placeholder selected.
    pub fn new() -> Self {
        let walk_in = Self::placeholder();
        CustomerResolver {
            selected: walk_in.clone(),
            walk_in,
            directory: Vec::new(),
            status: DirectoryStatus::Pending,
        }
    }

    /// The synthetic walk-in used until the backend record is known.
    pub fn placeholder() -> Customer {
        Customer {
            id: WALK_IN_PLACEHOLDER_ID.to_string(),
            name: WALK_IN_NAME.to_string(),
            email: None,
            phone: None,
            is_walk_in: true,
        }
    }

    /// True for the flagged record, or a name that reads "walk-in".
    pub fn looks_like_walk_in(customer: &Customer) -> bool {
        if customer.is_walk_in {
            return true;
        }
        let name = customer.name.to_lowercase();
        name.contains("walk-in") || name.contains("walk in")
    }

    /// Replaces the directory with a fresh backend list.
    ///
    /// An explicitly flagged record wins over a name match. The chosen
    /// record replaces the current walk-in identity outright; a list with no
    /// walk-in puts the local placeholder back. A selected customer missing
    /// from the new list falls back to the walk-in.
    pub fn apply_directory(&mut self, customers: Vec<Customer>) {
        let canonical = customers
            .iter()
            .find(|c| c.is_walk_in)
            .or_else(|| customers.iter().find(|c| Self::looks_like_walk_in(c)))
            .map(|c| c.id.clone());

        self.directory = customers
            .into_iter()
            .map(|mut c| {
                c.is_walk_in = canonical.as_deref() == Some(c.id.as_str());
                c
            })
            .collect();

        self.walk_in = canonical
            .and_then(|id| self.directory.iter().find(|c| c.id == id).cloned())
            .unwrap_or_else(Self::placeholder);

        self.status = DirectoryStatus::Loaded;
        self.reconcile_selection();
    }

    /// Records a failed fetch. Whatever was known before stays selected.
    pub fn mark_unavailable(&mut self) {
        self.status = DirectoryStatus::Unavailable;
    }

    /// Selects a customer by id.
    pub fn select(&mut self, customer_id: &str) -> CoreResult<&Customer> {
        let customer = if customer_id == self.walk_in.id {
            self.walk_in.clone()
        } else {
            self.directory
                .iter()
                .find(|c| c.id == customer_id)
                .cloned()
                .ok_or_else(|| CoreError::CustomerNotFound(customer_id.to_string()))?
        };
        self.selected = customer;
        Ok(&self.selected)
    }

    /// Re-selects a customer captured in a draft.
    ///
    /// A captured walk-in maps to the current walk-in identity, which may
    /// have been reconciled since the draft was saved.
    pub fn restore(&mut self, customer: Customer) {
        if customer.is_walk_in {
            self.selected = self.walk_in.clone();
            return;
        }

        self.selected = match self.status {
            DirectoryStatus::Loaded => self
                .directory
                .iter()
                .find(|c| c.id == customer.id)
                .cloned()
                .unwrap_or_else(|| self.walk_in.clone()),
            _ => customer,
        };
    }

    pub fn reset_to_walk_in(&mut self) {
        self.selected = self.walk_in.clone();
    }

    pub fn selected(&self) -> &Customer {
        &self.selected
    }

    pub fn walk_in(&self) -> &Customer {
        &self.walk_in
    }

    /// True while the walk-in is still the local placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.walk_in.id == WALK_IN_PLACEHOLDER_ID
    }

    pub fn status(&self) -> DirectoryStatus {
        self.status
    }

    /// Selectable customers, walk-in first.
    pub fn customers(&self) -> Vec<&Customer> {
        std::iter::once(&self.walk_in)
            .chain(self.directory.iter().filter(|c| c.id != self.walk_in.id))
            .collect()
    }

    fn reconcile_selection(&mut self) {
        if self.selected.is_walk_in {
            self.selected = self.walk_in.clone();
            return;
        }
        match self.directory.iter().find(|c| c.id == self.selected.id) {
            Some(current) => self.selected = current.clone(),
            None => self.selected = self.walk_in.clone(),
        }
    }
}

impl Default for CustomerResolver {
    fn default() -> Self {
        CustomerResolver::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
