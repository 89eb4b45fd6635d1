//! # Back Office
//!
//! The services the register reads from and hands sales to.
//!
//! ```text
//! ┌───────────────────────┐   fetch_variants        ┌──────────────────────┐
//! │                       │ ──────────────────────► │                      │
//! │   register session    │   fetch_customers       │     back office      │
//! │   (catalog refresh,   │ ──────────────────────► │   (inventory, CRM,   │
//! │    customer refresh,  │   fetch_discount_links  │    discounts, sales) │
//! │    checkout)          │ ──────────────────────► │                      │
//! │                       │   submit_checkout       │                      │
//! │                       │ ──────────────────────► │                      │
//! └───────────────────────┘                         └──────────────────────┘
//! ```
//!
//! The trait speaks domain types. Wire records live in [`http`] and are
//! converted at the edge, so a fake back office in tests needs no JSON.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tally_core::{
    Customer, DiscountBreakdown, DiscountDescriptor, Money, PaymentMethod, Variant,
};
use thiserror::Error;

pub use http::{BackOfficeConfig, HttpBackOffice};

/// A discount descriptor and the product it applies to.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDiscount {
    pub product_id: String,
    pub discount: DiscountDescriptor,
}

// =============================================================================
// Checkout Payload
// =============================================================================

/// One tender toward the sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEntry {
    pub method: PaymentMethod,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLine {
    pub line_id: String,
    pub variant_id: String,
    pub product_id: String,
    pub sku: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
    pub taxable: bool,
}

/// The finalized sale as submitted to the back office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
    /// `None` while the walk-in is the local placeholder.
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub is_walk_in: bool,
    pub lines: Vec<CheckoutLine>,
    pub subtotal: Money,
    pub tax_rate_bps: u32,
    pub tax: Money,
    pub discount: DiscountBreakdown,
    pub final_total: Money,
    pub payments: Vec<PaymentEntry>,
    pub change_due: Money,
}

/// What the back office answers for an accepted sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub sale_id: String,
    #[serde(default)]
    pub receipt_number: Option<String>,
}

// =============================================================================
// Trait
// =============================================================================

#[async_trait]
pub trait BackOffice: Send + Sync {
    /// Every sellable variant with its current stock.
    async fn fetch_variants(&self) -> Result<Vec<Variant>, UpstreamError>;

    async fn fetch_customers(&self) -> Result<Vec<Customer>, UpstreamError>;

    /// Product-linked discounts. Records that fail validation are dropped.
    async fn fetch_discount_links(&self) -> Result<Vec<ProductDiscount>, UpstreamError>;

    async fn submit_checkout(
        &self,
        payload: &CheckoutPayload,
    ) -> Result<CheckoutReceipt, UpstreamError>;
}

/// Errors that can occur when talking to the back office.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The back office returned a non-2xx response or unexpected body.
    #[error("unexpected response from back office: {0}")]
    UnexpectedResponse(String),
}
