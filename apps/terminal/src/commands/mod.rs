//! # Register Commands
//!
//! Every operation the register exposes. The REPL parses operator input
//! into one of these calls and prints the JSON reply.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (exports)
//! ├── scan.rs      ◄─── Scanned codes and manual entry
//! ├── cart.rs      ◄─── Add, quantity, remove, clear
//! ├── discount.rs  ◄─── Per-line toggles, manual discount
//! ├── draft.rs     ◄─── Save, list, restore, delete parked sales
//! ├── customer.rs  ◄─── Directory refresh and selection
//! ├── catalog.rs   ◄─── Snapshot refresh and search
//! ├── checkout.rs  ◄─── Submit the finished sale
//! └── config.rs    ◄─── Configuration and tax rate
//! ```
//!
//! ## State Injection
//! Each command takes only the state it needs:
//! ```rust,ignore
//! // Only needs the cart
//! fn get_cart(cart: &CartState, tax: &TaxState)
//!
//! // Catalog lookup into the cart
//! fn scan_code(catalog: &CatalogState, cart: &CartState, tax: &TaxState, code: &str)
//!
//! // Local store and session
//! async fn save_draft(db: &DbState, cart: &CartState, customers: &CustomerState, tax: &TaxState)
//! ```
//!
//! Fallible commands return `Result<_, ApiError>`; refreshes never fail and
//! report upstream trouble as a `notice` instead.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod customer;
pub mod discount;
pub mod draft;
pub mod scan;

#[cfg(test)]
mod session_tests;
