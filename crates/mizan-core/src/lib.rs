//! # mizan-core: Pure Business Logic for Mizan
//!
//! This crate is the **heart** of Mizan. It contains the inventory stock
//! ledger, the approval-gated mutation workflow, and the permission gate
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Mizan Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Dashboard Frontend (forms & tables)            │   │
//! │  │    Inventory ──► Sales ──► Damage ──► Audits ──► Staff         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ in-process calls                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    mizan-store (LedgerService)                  │   │
//! │  │    restock, record_sale, report_damage, propose/decide, ...    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ mizan-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  ledger   │  │   audit   │  │permissions│  │   │
//! │  │   │  Product  │  │ restock   │  │  propose  │  │  masters  │  │   │
//! │  │   │   Sale    │  │ sell      │  │  decide   │  │  gating   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO RECORD STORE • NO NETWORK • PURE FUNCTIONS       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, StockMovement, etc.)
//! - [`money`] - Decimal-backed money type with tolerance comparison
//! - [`units`] - Box ↔ kilogram conversion and per-unit pricing
//! - [`ledger`] - Stock ledger mutations (restock, sell, damage, correction)
//! - [`audit`] - Pending → approved/rejected proposal state machine
//! - [`sales`] - Sale total / payment status computation
//! - [`permissions`] - Typed permission keys and the permission gate
//! - [`validation`] - Business rule validation
//! - [`config`] - Explicit configuration objects (no ambient globals)
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - callers pass `now`
//! 2. **No I/O**: Record store, network, file system access is FORBIDDEN here
//! 3. **Decimal Money**: Monetary values and kilogram quantities use exact
//!    decimal arithmetic (per-kg prices are per-box prices divided by the
//!    box→kg ratio, which integer cents cannot represent)
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use mizan_core::money::Money;
//! use mizan_core::units::UnitPricing;
//! use rust_decimal_macros::dec;
//!
//! // A product sold at $100 per box, 10 kg per box
//! let pricing = UnitPricing::derive(
//!     Money::new(dec!(80)),  // cost per box
//!     Money::new(dec!(100)), // price per box
//!     dec!(10),              // box → kg ratio
//! ).unwrap();
//!
//! assert_eq!(pricing.price_per_kg, Money::new(dec!(10)));
//! assert_eq!(pricing.profit_per_box, Money::new(dec!(20)));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod audit;
pub mod config;
pub mod error;
pub mod ledger;
pub mod money;
pub mod permissions;
pub mod sales;
pub mod types;
pub mod units;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use mizan_core::Money` instead of
// `use mizan_core::money::Money`

pub use audit::{AuditKind, AuditPayload, AuditRecord, ValueChange};
pub use config::{CorrectionPolicy, CurrencyFormat, LedgerConfig};
pub use error::{LedgerError, LedgerResult, ValidationError};
pub use ledger::StockLedger;
pub use money::Money;
pub use permissions::{Feature, PermissionAction, PermissionKey, PermissionModule, PermissionSet};
pub use sales::{ClientInfo, RequestedPayment, SaleDraft};
pub use types::*;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Tolerance below which a declared amount is treated as equal to the total.
///
/// ## Business Reason
/// A "Half Paid" sale whose declared amount matches the computed total within
/// one cent should have been submitted as "Paid" - the builder rejects it as
/// ambiguous instead of silently recording a zero remainder.
pub const AMOUNT_TOLERANCE: Decimal = dec!(0.01);

/// Maximum length of a free-text reason (damage reports, corrections, audits).
///
/// ## Business Reason
/// Reasons are shown in approval queues and audit trails; unbounded text
/// breaks table rendering and invites paste accidents.
pub const MAX_REASON_LEN: usize = 500;

/// Maximum length of a client name on a sale.
pub const MAX_CLIENT_NAME_LEN: usize = 120;
