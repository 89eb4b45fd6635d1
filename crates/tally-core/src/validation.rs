//! # Validation Module
//!
//! Input validation for codes, rates and identifiers.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: Scanner / manual entry                                       │
//! │  └── code length floor, token splitting                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Commands (terminal app)                                      │
//! │  └── THIS MODULE: rate, discount and id checks                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Cart manager                                                 │
//! │  └── stock ceiling, line limits                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::DiscountValue;
use crate::MAX_CART_LINES;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest code the register accepts (GS1-128 tops out at 48).
pub const MAX_CODE_LENGTH: usize = 64;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a scanned or typed code.
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at least `min_len` characters
/// - Must not contain whitespace or control characters
///
/// ## Returns
/// The trimmed code.
///
/// ```rust
/// use tally_core::validation::validate_code;
///
/// assert_eq!(validate_code(" 5901234123457 ", 4).unwrap(), "5901234123457");
/// assert!(validate_code("12", 4).is_err());
/// assert!(validate_code("   ", 4).is_err());
/// ```
pub fn validate_code(code: &str, min_len: usize) -> ValidationResult<String> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    let len = code.chars().count();
    if len < min_len {
        return Err(ValidationError::TooShort {
            field: "code".to_string(),
            min: min_len,
        });
    }

    if len > MAX_CODE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: MAX_CODE_LENGTH,
        });
    }

    if code.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must not contain spaces or control characters".to_string(),
        });
    }

    Ok(code.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a tax rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

/// Validates a discount value.
///
/// ## Rules
/// - Percentage: 0 to 10000 bps (0% to 100%)
/// - Fixed: non-negative amount
///
/// ```rust
/// use tally_core::types::DiscountValue;
/// use tally_core::validation::validate_discount_value;
///
/// assert!(validate_discount_value(&DiscountValue::percentage_bps(1500)).is_ok());
/// assert!(validate_discount_value(&DiscountValue::percentage_bps(10_001)).is_err());
/// assert!(validate_discount_value(&DiscountValue::fixed_cents(-1)).is_err());
/// ```
pub fn validate_discount_value(value: &DiscountValue) -> ValidationResult<()> {
    match value {
        DiscountValue::Percentage { bps } if *bps > 10_000 => Err(ValidationError::OutOfRange {
            field: "discount percentage".to_string(),
            min: 0,
            max: 100,
        }),
        DiscountValue::Fixed { amount } if amount.is_negative() => {
            Err(ValidationError::MustBePositive {
                field: "discount amount".to_string(),
            })
        }
        _ => Ok(()),
    }
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates that one more line fits in the cart.
pub fn validate_cart_size(current_lines: usize) -> ValidationResult<()> {
    if current_lines >= MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "cart lines".to_string(),
            min: 0,
            max: MAX_CART_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format (draft identifiers).
///
/// ```rust
/// use tally_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id.trim()).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
