//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Expected register outcomes (not found, stock)  │
//! │  └── ValidationError  - Malformed input                                │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - Local store failures                           │
//! │                                                                         │
//! │  terminal app errors                                                   │
//! │  ├── UpstreamError    - Back-office HTTP failures                      │
//! │  └── ApiError         - What the front end sees (serialized)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `CoreError` leaves the cart exactly as it was before the call.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Recoverable register outcomes, reported back to the cashier.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A scanned or typed code matches no variant in the loaded catalog.
    #[error("No product matches code {0}")]
    CodeNotFound(String),

    /// A variant id is not in the loaded catalog.
    #[error("Variant not found: {0}")]
    VariantNotFound(String),

    /// The matched variant has nothing on hand.
    #[error("{name} ({sku}) is out of stock")]
    OutOfStock { sku: String, name: String },

    /// A quantity change would exceed the stock captured for the line.
    ///
    /// ## User Workflow
    /// ```text
    /// Line: Green Tea, ceiling = 5
    ///      │
    ///      ▼
    /// set quantity 6
    ///      │
    ///      ▼
    /// InsufficientStock { sku: "TEA", available: 5, requested: 6 }
    ///      │
    ///      ▼
    /// UI shows: "Only 5 TEA in stock", quantity stays where it was
    /// ```
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// The line id is not in the cart.
    #[error("Cart line not found: {0}")]
    LineNotFound(String),

    /// The line has no discount to toggle.
    #[error("Cart line {0} has no discount attached")]
    NoDiscountAttached(String),

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// The operation needs at least one line.
    #[error("Cart is empty")]
    EmptyCart,

    /// No draft with this id exists.
    #[error("Draft not found: {0}")]
    DraftNotFound(String),

    /// The stored draft has no restorable lines.
    #[error("Draft {0} is empty or invalid and cannot be restored")]
    InvalidDraft(String),

    /// Selected customer id is unknown.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, stray characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            sku: "TEA-GRN-250".to_string(),
            available: 5,
            requested: 6,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for TEA-GRN-250: available 5, requested 6"
        );

        let err = CoreError::CodeNotFound("0000".into());
        assert_eq!(err.to_string(), "No product matches code 0000");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "code".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
