//! # tally-core: Register Engine for Tally POS
//!
//! This crate turns scanner bursts, typed codes and cashier edits into a
//! priced, taxed, discounted cart. It has zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/terminal (register session)                │   │
//! │  │  scanner task ──► commands ──► back office (HTTP) / tally-db    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  scanner  │  │   cart    │  │ discount  │  │    tax    │  │   │
//! │  │   │ classify  │─►│  stock    │─►│ auto or   │  │ taxable   │  │   │
//! │  │   │  cadence  │  │  ceiling  │  │  manual   │  │ lines     │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  catalog  │  │ customer  │  │   money   │  │validation │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • NO CLOCK READS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-db (local store)                       │   │
//! │  │              drafts and settings in SQLite                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Variant, CartLine, Draft, Customer, ...)
//! - [`money`] - Integer money and basis-point rounding
//! - [`catalog`] - Read-only catalog snapshot and code lookup
//! - [`scanner`] - Scanner vs. human keystroke classifier, manual entry parsing
//! - [`cart`] - Cart state manager
//! - [`discount`] - Auto and manual discount engine
//! - [`tax`] - Tax engine and cart totals
//! - [`customer`] - Walk-in aware customer resolver
//! - [`error`] - Domain error types
//! - [`validation`] - Input rules
//!
//! ## Time
//!
//! Nothing in here reads a clock. Operations that depend on time take `now`
//! (wall clock) or an `Instant` (key events) from the caller, which keeps
//! every function deterministic under test.
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::money::Money;
//! use tally_core::types::TaxRate;
//!
//! let price = Money::from_cents(1000);
//! let tax = price.calculate_tax(TaxRate::from_bps(750)); // 7.5%
//! assert_eq!(tax.cents(), 75);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod customer;
pub mod discount;
pub mod error;
pub mod money;
pub mod scanner;
pub mod tax;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{AddOutcome, Cart, QuantityOutcome};
pub use catalog::CatalogSnapshot;
pub use customer::{CustomerResolver, DirectoryStatus};
pub use discount::{compute_discount, DiscountBreakdown, DiscountMode, LineDiscount};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use scanner::{
    parse_manual_entry, BarcodeClassifier, FocusContext, FocusTarget, KeyEvent, KeyInput,
    ManualEntry, ScanResult, ScanSummary, ScannerConfig,
};
pub use tax::{compute_tax, CartTotals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Shortest buffer the classifier emits as a code.
pub const MIN_CODE_LENGTH: usize = 4;

/// Largest gap between scanner keystrokes, in milliseconds.
pub const INTER_KEY_THRESHOLD_MS: u64 = 50;

/// Idle time after which a half-filled buffer is dropped, in milliseconds.
pub const IDLE_TIMEOUT_MS: u64 = 100;

/// Synthetic id of the local walk-in placeholder.
pub const WALK_IN_PLACEHOLDER_ID: &str = "walk-in-local";

/// Display name of the local walk-in placeholder.
pub const WALK_IN_NAME: &str = "Walk-in Customer";
