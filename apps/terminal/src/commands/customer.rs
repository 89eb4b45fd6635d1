//! # Customer Commands
//!
//! A sale always has a customer: the canonical walk-in until the cashier
//! picks someone else.

use serde::Serialize;
use tracing::{debug, info, warn};

use tally_core::{Customer, DirectoryStatus};

use crate::error::ApiError;
use crate::state::CustomerState;
use crate::upstream::BackOffice;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerListResponse {
    /// Walk-in first.
    pub customers: Vec<Customer>,
    pub selected: Customer,
    pub status: DirectoryStatus,
    /// True while the walk-in is the local placeholder.
    pub placeholder: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRefreshResponse {
    pub status: DirectoryStatus,
    pub count: usize,
    pub selected: Customer,
    pub placeholder: bool,
    /// Set when the directory could not be fetched.
    pub notice: Option<String>,
}

pub fn list_customers(customers: &CustomerState) -> CustomerListResponse {
    debug!("list_customers command");
    customers.with_resolver(|r| CustomerListResponse {
        customers: r.customers().into_iter().cloned().collect(),
        selected: r.selected().clone(),
        status: r.status(),
        placeholder: r.is_placeholder(),
    })
}

/// Attributes the sale to a customer.
pub fn select_customer(customers: &CustomerState, customer_id: &str) -> Result<Customer, ApiError> {
    debug!(customer_id = %customer_id, "select_customer command");
    let selected = customers.with_resolver_mut(|r| r.select(customer_id).cloned())?;
    Ok(selected)
}

/// Refetches the customer directory.
///
/// A failed fetch is not an error: the walk-in (placeholder or last known)
/// stays selectable and the response carries a notice.
pub async fn refresh_customers(
    back_office: &dyn BackOffice,
    customers: &CustomerState,
) -> CustomerRefreshResponse {
    let notice = match back_office.fetch_customers().await {
        Ok(list) => {
            let count = list.len();
            customers.with_resolver_mut(|r| r.apply_directory(list));
            info!(count, "Customer directory refreshed");
            None
        }
        Err(e) => {
            warn!(error = %e, "Customer directory unavailable, keeping walk-in");
            customers.with_resolver_mut(|r| r.mark_unavailable());
            Some(format!("Customer list unavailable: {}", e))
        }
    };

    customers.with_resolver(|r| CustomerRefreshResponse {
        status: r.status(),
        count: r.customers().len(),
        selected: r.selected().clone(),
        placeholder: r.is_placeholder(),
        notice,
    })
}
