//! # Store Error Types
//!
//! Error types for the record store and the service layer above it.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  StoreError (record store)      LedgerError (mizan-core)               │
//! │       │                              │                                  │
//! │       └──────────┬───────────────────┘                                  │
//! │                  ▼                                                      │
//! │            ServiceError ← What the dashboard sees                      │
//! │                  │                                                      │
//! │                  ▼                                                      │
//! │  Frontend displays user-friendly message                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use mizan_core::LedgerError;

// =============================================================================
// Store Error
// =============================================================================

/// Record store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity not found in the store.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// An insert collided with an existing record ID.
    #[error("duplicate {entity} id: {id}")]
    Duplicate { entity: &'static str, id: String },
}

impl StoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

/// Result type for record store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Service Error
// =============================================================================

/// What a dashboard call can fail with: a business rule violation from
/// mizan-core, or a record store failure.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Business rule violation (insufficient stock, permission denied, ...).
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Record store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<mizan_core::ValidationError> for ServiceError {
    fn from(err: mizan_core::ValidationError) -> Self {
        ServiceError::Ledger(err.into())
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
