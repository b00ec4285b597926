//! # mizan-store: Record Store + Ledger Service for Mizan
//!
//! This crate owns everything mizan-core is forbidden from touching: record
//! storage and the permission-gated service API the dashboard calls.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mizan Data Flow                                  │
//! │                                                                         │
//! │  Dashboard call (record_sale, decide_audit, ...)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    mizan-store (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ LedgerService │    │ Repositories  │    │  Record      │  │   │
//! │  │   │ (service.rs)  │    │ (repository/) │    │  Store       │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ permission    │───►│ ProductRepo   │───►│ RwLock over  │  │   │
//! │  │   │ gate + rules  │    │ SaleRepo      │    │ HashMaps     │  │   │
//! │  │   │ from core     │    │ AuditRepo ... │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  The in-memory store stands in for the hosted data platform; the       │
//! │  repository seam is where a network-backed implementation plugs in.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`error`] - Store and service error types
//! - [`repository`] - One repository per entity
//! - [`service`] - `LedgerService`: the permission-gated operations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mizan_store::{Actor, LedgerService};
//! use mizan_core::LedgerConfig;
//!
//! let service = LedgerService::new(LedgerConfig::default());
//! let owner = Actor::owner("owner-1");
//!
//! let product = service.create_product(&owner, new_product).await?;
//! service.restock(&owner, &product.id, 10, dec!(20), None).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{ServiceError, ServiceResult, StoreError, StoreResult};
pub use service::{Actor, LedgerService, NewProduct};

// Repository re-exports for convenience
pub use repository::{
    AuditRepository, DamageRepository, MovementRepository, ProductRepository, SaleRepository,
};
