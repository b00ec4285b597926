//! # Error Types
//!
//! Domain-specific error types for mizan-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  mizan-core errors (this file)                                         │
//! │  ├── LedgerError      - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  mizan-store errors (separate crate)                                   │
//! │  ├── StoreError       - Record store failures                          │
//! │  └── ServiceError     - What the dashboard sees (Ledger ∪ Store)       │
//! │                                                                         │
//! │  Flow: ValidationError → LedgerError → ServiceError → Frontend         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Every rejection names the specific field/quantity that caused it -
//!    multiple independent checks can each fail, and the UI must say which
//! 3. Errors are enum variants, never String

use rust_decimal::Decimal;
use thiserror::Error;

use crate::money::Money;
use crate::permissions::{Feature, PermissionAction};
use crate::types::StockUnit;

// =============================================================================
// Ledger Error
// =============================================================================

/// Business rule violations in the stock ledger, sales builder, audit
/// workflow, and permission gate.
///
/// All variants are detected *before* any mutation is issued; a failed
/// operation leaves every quantity unchanged.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Requested more of one unit than is on hand.
    ///
    /// ## When This Occurs
    /// - A sale requests more boxes or kilograms than current stock
    /// - A damage report is approved after stock was already depleted
    ///
    /// The two units are checked independently: a product out of boxes but
    /// holding loose kilograms is still sellable by the kilogram.
    #[error("insufficient {unit} stock: available {available}, requested {requested}")]
    InsufficientStock {
        unit: StockUnit,
        available: Decimal,
        requested: Decimal,
    },

    /// Box → kilogram conversion ratio is zero or negative.
    ///
    /// Division by the ratio derives every per-kg figure, so a non-positive
    /// ratio is rejected before any derivation runs.
    #[error("invalid box-to-kg ratio {ratio}: must be greater than zero")]
    InvalidRatio { ratio: Decimal },

    /// A stock correction would drive a quantity below zero.
    ///
    /// Only raised under [`CorrectionPolicy::Reject`]; the clamping policy
    /// floors the quantity at zero instead.
    ///
    /// [`CorrectionPolicy::Reject`]: crate::config::CorrectionPolicy
    #[error("correction would drive {unit} below zero: current {current}, adjustment {adjustment}")]
    InvalidCorrection {
        unit: StockUnit,
        current: Decimal,
        adjustment: Decimal,
    },

    /// Declared amount paid is larger than the computed sale total.
    #[error("amount paid {declared} exceeds sale total {total}")]
    AmountExceedsTotal { declared: Money, total: Money },

    /// A "Half Paid" sale declared an amount that settles the full total.
    ///
    /// Within [`AMOUNT_TOLERANCE`](crate::AMOUNT_TOLERANCE) of the total the
    /// sale should have been submitted as "Paid".
    #[error("declared amount {declared} settles the total {total}: submit as Paid instead")]
    AmbiguousStatus { declared: Money, total: Money },

    /// A pending-payment sale is missing mandatory client contact details.
    #[error("{field} is required for a pending-payment sale")]
    MissingClientInfo { field: &'static str },

    /// An audit decision was attempted on a record that is no longer pending.
    ///
    /// `approved` and `rejected` are terminal: no transition leaves them,
    /// and a second decision performs no mutation.
    #[error("audit record {id} is {state}, expected pending")]
    InvalidState { id: String, state: &'static str },

    /// The acting staff member may not perform this operation.
    #[error("permission denied: {action} on {feature}")]
    PermissionDenied {
        feature: Feature,
        action: PermissionAction,
    },

    /// Referenced product does not exist.
    #[error("product not found: {0}")]
    ProductNotFound(String),

    /// Referenced sale does not exist.
    #[error("sale not found: {0}")]
    SaleNotFound(String),

    /// Validation error (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid phone number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with LedgerError.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Unit Tests
// =============================================================================
