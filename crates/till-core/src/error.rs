//! # Error Types
//!
//! Validation errors for the pure domain layer.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  till-core (this file)                                                 │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  till-store (separate crate)                                           │
//! │  └── StoreError       - Storage operation failures                     │
//! │                                                                         │
//! │  till-engine (separate crate)                                          │
//! │  └── CheckoutError    - Checkout taxonomy (wraps both of the above)    │
//! │                                                                         │
//! │  apps/server                                                           │
//! │  └── ApiError         - What HTTP clients see (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → CheckoutError → ApiError → client             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field name, limits)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Validation always runs before any store access, so a failing input
/// never produces side effects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// A computed amount exceeds what an i64 of cents can hold.
    #[error("{field} exceeds the representable amount")]
    AmountOverflow { field: String },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");

        let err = ValidationError::AmountOverflow {
            field: "subtotal".to_string(),
        };
        assert_eq!(err.to_string(), "subtotal exceeds the representable amount");
    }
}
