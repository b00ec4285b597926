//! # Domain Types
//!
//! Core domain types used throughout Mizan.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │ StockMovement   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  quantity_box   │   │  total_amount   │   │  movement_type  │       │
//! │  │  quantity_kg    │   │  amount_paid    │   │  old/new values │       │
//! │  │  box_to_kg_ratio│   │  payment_status │   │  status         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ ApprovalState   │   │ PaymentStatus   │   │ MovementType    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Pending        │   │  Pending        │   │  Restock        │       │
//! │  │  Approved{..}   │   │  Partial        │   │  Sale           │       │
//! │  │  Rejected{..}   │   │  Completed      │   │  Damage         │       │
//! │  └─────────────────┘   └─────────────────┘   │  Correction     │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Unit Stock Pattern
//! Every product tracks **two correlated on-hand quantities**: whole boxes
//! (`i64`) and loose kilograms (`Decimal`). They are linked by
//! `box_to_kg_ratio` for pricing, but depleted independently - partial-kg
//! sales and damage desynchronize them by design, and correction proposals
//! exist to reconcile the drift.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::units;

// =============================================================================
// Stock Unit
// =============================================================================

/// Which of the two correlated on-hand units an error or delta refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockUnit {
    /// Whole boxes.
    Boxes,
    /// Loose kilograms.
    Kilograms,
}

impl fmt::Display for StockUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockUnit::Boxes => write!(f, "boxes"),
            StockUnit::Kilograms => write!(f, "kg"),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product tracked in the inventory stock ledger.
///
/// ## Invariants
/// - `quantity_box >= 0` and `quantity_kg >= 0` after any operation sequence
/// - `box_to_kg_ratio > 0` (enforced at derivation time)
/// - `quantity_kg` is NOT `quantity_box * box_to_kg_ratio`: the two units
///   drift apart through partial-kg sales and damage, and corrections
///   reconcile them
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown in the inventory table.
    pub name: String,

    /// Optional category grouping.
    pub category: Option<String>,

    /// Current on-hand whole boxes.
    pub quantity_box: i64,

    /// Current on-hand loose kilograms.
    #[ts(as = "String")]
    pub quantity_kg: Decimal,

    /// Kilograms per box (> 0). Links the two units for pricing.
    #[ts(as = "String")]
    pub box_to_kg_ratio: Decimal,

    /// Cost per box.
    pub cost_per_box: Money,

    /// Cost per kilogram (derived: cost_per_box / ratio).
    pub cost_per_kg: Money,

    /// Selling price per box.
    pub price_per_box: Money,

    /// Selling price per kilogram (derived: price_per_box / ratio).
    pub price_per_kg: Money,

    /// Boxes at or below which the product is flagged low-stock.
    pub low_stock_threshold: i64,

    /// Expiry date of the current stock, if tracked.
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<DateTime<Utc>>,

    /// When the product was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Profit per box (price − cost). Derived, never stored.
    #[inline]
    pub fn profit_per_box(&self) -> Money {
        self.price_per_box - self.cost_per_box
    }

    /// Profit per kilogram (price − cost). Derived, never stored.
    #[inline]
    pub fn profit_per_kg(&self) -> Money {
        self.price_per_kg - self.cost_per_kg
    }

    /// Low-stock flag, derived from the box count only.
    ///
    /// Loose kilograms are leftovers from opened boxes and do not count
    /// toward replenishment decisions.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.quantity_box <= self.low_stock_threshold
    }

    /// Whole days until expiry (ceiling), negative once expired.
    ///
    /// Callers display/flag negative values; this layer does not clamp.
    pub fn days_left(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expiry_date.map(|expiry| units::days_left(expiry, now))
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// What kind of operation changed a product's on-hand quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Delivery received; both units incremented.
    Restock,
    /// Sale recorded; both units decremented.
    Sale,
    /// Approved damage write-off.
    Damage,
    /// Approved manual correction (signed, either direction).
    Correction,
}

/// Lifecycle of a stock movement record.
///
/// Direct operations (restock, sale) are logged `completed` immediately.
/// Audited operations (damage, correction, sale edit/delete) stage their
/// movement `pending` when the approved mutation runs and complete it once
/// the approval record is stamped applied. A rejected proposal never
/// produces a movement, so rejection discards nothing but the proposal
/// itself. A movement left `pending` marks an approval whose finalization
/// was interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementStatus {
    Pending,
    Completed,
}

/// An immutable-once-finalized record of a single applied stock change.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    pub movement_type: MovementType,
    /// Boxes before the change.
    pub old_boxes: i64,
    /// Boxes after the change.
    pub new_boxes: i64,
    /// Kilograms before the change.
    #[ts(as = "String")]
    pub old_kg: Decimal,
    /// Kilograms after the change.
    #[ts(as = "String")]
    pub new_kg: Decimal,
    /// Free-text reason (mandatory for damage and correction).
    pub reason: Option<String>,
    /// Staff member who performed or requested the change.
    pub performed_by: String,
    pub status: MovementStatus,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Approval State
// =============================================================================

/// The decision taken on a pending record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}

/// Single tagged approval state shared by audit records and damage reports.
///
/// ## State Machine
/// ```text
/// pending ──approve──► approved { applied_at: None ──apply──► Some(t) }
///    │
///    └────reject────► rejected { reason }
/// ```
/// `approved` and `rejected` are terminal; `decide` on either fails with
/// `InvalidState`. An `approved` record with `applied_at == None` is the
/// crash-recovery marker: the transition was durably written but the
/// downstream mutation has not run yet, so it must be re-processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ApprovalState {
    /// Awaiting a decision; the only non-terminal state.
    Pending,
    /// Approved; the wrapped mutation is applied after this is durable.
    Approved {
        decided_by: String,
        #[ts(as = "String")]
        decided_at: DateTime<Utc>,
        /// Stamped once the downstream mutation has been applied.
        #[ts(as = "Option<String>")]
        applied_at: Option<DateTime<Utc>>,
    },
    /// Rejected; the proposed payload is discarded, the reason retained.
    Rejected {
        decided_by: String,
        #[ts(as = "String")]
        decided_at: DateTime<Utc>,
        reason: String,
    },
}

impl ApprovalState {
    /// Checks if the record is still awaiting a decision.
    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self, ApprovalState::Pending)
    }

    /// Checks if the record has been approved but the mutation not applied.
    #[inline]
    pub fn is_unapplied(&self) -> bool {
        matches!(
            self,
            ApprovalState::Approved {
                applied_at: None,
                ..
            }
        )
    }

    /// Short label for error messages and logs.
    pub fn label(&self) -> &'static str {
        match self {
            ApprovalState::Pending => "pending",
            ApprovalState::Approved { .. } => "approved",
            ApprovalState::Rejected { .. } => "rejected",
        }
    }
}

impl Default for ApprovalState {
    fn default() -> Self {
        ApprovalState::Pending
    }
}

// =============================================================================
// Damaged Product Record
// =============================================================================

/// A damage report awaiting approval.
///
/// Stock is **not** decremented at report time; the decrement runs when the
/// report is approved, using the same availability checks as a sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DamagedProductRecord {
    pub id: String,
    pub product_id: String,
    pub damaged_boxes: i64,
    #[ts(as = "String")]
    pub damaged_kg: Decimal,
    pub reason: String,
    #[ts(as = "String")]
    pub damage_date: DateTime<Utc>,
    /// Write-off value at cost: boxes·cost_per_box + kg·cost_per_kg.
    pub loss_value: Money,
    pub approval: ApprovalState,
    pub reported_by: String,
    /// Opaque reference to evidence imagery held in blob storage.
    pub evidence_ref: Option<String>,
}

// =============================================================================
// Payment Status
// =============================================================================

/// Settlement state of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Nothing paid; client contact details are mandatory.
    Pending,
    /// Partially paid; a remainder is outstanding.
    Partial,
    /// Fully settled.
    Completed,
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale transaction.
///
/// Created only after the stock decrement succeeded; amended exclusively
/// through the audit workflow (edit/delete proposals).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub product_id: String,
    pub boxes_quantity: i64,
    #[ts(as = "String")]
    pub kg_quantity: Decimal,
    /// Unit price per box at time of sale (frozen).
    pub box_price: Money,
    /// Unit price per kilogram at time of sale (frozen).
    pub kg_price: Money,
    /// boxes·box_price + kg·kg_price.
    pub total_amount: Money,
    pub amount_paid: Money,
    /// total_amount − amount_paid.
    pub remaining_amount: Money,
    pub payment_status: PaymentStatus,
    pub client_name: Option<String>,
    pub phone_number: Option<String>,
    pub performed_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Profit on this sale against the product's costs at recording time.
    pub fn profit(&self, cost_per_box: Money, cost_per_kg: Money) -> Money {
        let cost = cost_per_box * self.boxes_quantity + cost_per_kg * self.kg_quantity;
        self.total_amount - cost
    }
}

// =============================================================================
// Staff Permission (raw key row)
// =============================================================================

/// A raw permission row as stored by the identity collaborator.
///
/// The string `permission_key` is parsed once into a typed
/// [`PermissionKey`](crate::permissions::PermissionKey) when building a
/// [`PermissionSet`](crate::permissions::PermissionSet); the rest of the
/// codebase never matches on raw strings.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StaffPermission {
    pub staff_id: String,
    pub permission_key: String,
    pub is_enabled: bool,
}

// =============================================================================
// Unit Tests
// =============================================================================
