//! # Validation Module
//!
//! Input validation utilities for the Mizan dashboard.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (TypeScript)                                        │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Field-level rules (length, sign, format)                          │
//! │  └── Runs before any business logic                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Business rules (ledger, sales builder, audit)                │
//! │  └── Stock availability, payment consistency, state machine            │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use mizan_core::validation::{validate_box_quantity, validate_reason};
//!
//! // Validate quantities before building a restock
//! validate_box_quantity(5).unwrap();
//!
//! // Validate the stated reason before a damage report
//! validate_reason("dropped pallet, crushed cartons").unwrap();
//! ```

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::{MAX_CLIENT_NAME_LEN, MAX_REASON_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a box quantity.
///
/// ## Rules
/// - Must be non-negative; zero is allowed because a movement may be
///   kilograms-only
pub fn validate_box_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "boxes_quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a kilogram quantity.
///
/// ## Rules
/// - Must be non-negative; fractional values are fine (loose weight)
pub fn validate_kg_quantity(kg: Decimal) -> ValidationResult<()> {
    if kg < Decimal::ZERO {
        return Err(ValidationError::MustBeNonNegative {
            field: "kg_quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a box-to-kilogram conversion ratio.
///
/// ## Rules
/// - Must be strictly positive; every per-kg figure is derived by
///   dividing by this ratio
///
/// ## Example
/// ```rust
/// use mizan_core::validation::validate_ratio;
/// use rust_decimal_macros::dec;
///
/// assert!(validate_ratio(dec!(20)).is_ok());
/// assert!(validate_ratio(dec!(0)).is_err());
/// ```
pub fn validate_ratio(ratio: Decimal) -> ValidationResult<()> {
    if ratio <= Decimal::ZERO {
        return Err(ValidationError::MustBePositive {
            field: "box_to_kg_ratio".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a stated reason (damage report, edit/delete proposal,
/// correction).
///
/// ## Rules
/// - Must not be empty: every sensitive operation records why
/// - Maximum 500 characters
pub fn validate_reason(reason: &str) -> ValidationResult<()> {
    let reason = reason.trim();

    if reason.is_empty() {
        return Err(ValidationError::Required {
            field: "reason".to_string(),
        });
    }

    if reason.len() > MAX_REASON_LEN {
        return Err(ValidationError::TooLong {
            field: "reason".to_string(),
            max: MAX_REASON_LEN,
        });
    }

    Ok(())
}

/// Validates a client name.
///
/// ## Rules
/// - Can be empty for settled sales; pending-payment mandates are
///   enforced by the sales builder, not here
/// - Maximum 120 characters
pub fn validate_client_name(name: &str) -> ValidationResult<()> {
    if name.trim().len() > MAX_CLIENT_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "client_name".to_string(),
            max: MAX_CLIENT_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a phone number.
///
/// ## Rules
/// - Can be empty for settled sales
/// - When present: digits, spaces, hyphens, and a leading `+` only
/// - Maximum 32 characters
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();

    if phone.len() > 32 {
        return Err(ValidationError::TooLong {
            field: "phone_number".to_string(),
            max: 32,
        });
    }

    if !phone
        .chars()
        .enumerate()
        .all(|(i, c)| c.is_ascii_digit() || c == ' ' || c == '-' || (c == '+' && i == 0))
    {
        return Err(ValidationError::InvalidFormat {
            field: "phone_number".to_string(),
            reason: "must contain only digits, spaces, hyphens, and a leading +".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use mizan_core::validation::validate_uuid;
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

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
