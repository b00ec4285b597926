//! # Audit Workflow
//!
//! Generic pending → approved/rejected state machine wrapping a proposed
//! mutation. Sensitive operations (sale edits, sale deletions, stock
//! corrections) never touch their target directly - they pass through here.
//!
//! ## Proposal Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Audit Workflow Lifecycle                            │
//! │                                                                         │
//! │  propose(payload, reason, requested_by)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────┐   decide(Approve)   ┌────────────────────────┐            │
//! │  │ pending ├────────────────────►│ approved               │            │
//! │  │         │                     │  applied_at: None      │            │
//! │  └────┬────┘                     └──────────┬─────────────┘            │
//! │       │                                     │ downstream mutation      │
//! │       │ decide(Reject)                      ▼ runs, then               │
//! │       ▼                          ┌────────────────────────┐            │
//! │  ┌──────────────────┐            │ approved               │            │
//! │  │ rejected         │            │  applied_at: Some(t)   │            │
//! │  │  reason retained │            └────────────────────────┘            │
//! │  └──────────────────┘                                                  │
//! │                                                                         │
//! │  ORDERING: the record is durably created before any UI success, and    │
//! │  the approved transition is durably written BEFORE the downstream      │
//! │  mutation runs. A crash between the two leaves applied_at == None,     │
//! │  which reprocessing picks up - an approved change is never silently    │
//! │  lost.                                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult};
use crate::money::Money;
use crate::types::{ApprovalState, Decision};

// =============================================================================
// Value Change
// =============================================================================

/// A before/after pair recorded on an edit proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueChange<T> {
    pub before: T,
    pub after: T,
}

impl<T> ValueChange<T> {
    pub fn new(before: T, after: T) -> Self {
        ValueChange { before, after }
    }
}

// =============================================================================
// Audit Payload
// =============================================================================

/// The proposed mutation carried by an audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditPayload {
    /// Change quantities (and optionally the amount paid) on an existing
    /// sale. Stock moves by the quantity difference on approval.
    SaleEdit {
        sale_id: String,
        boxes: ValueChange<i64>,
        kg: ValueChange<Decimal>,
        amount_paid: Option<ValueChange<Money>>,
    },
    /// Remove a sale entirely; its quantities return to stock on approval.
    SaleDelete { sale_id: String },
    /// Signed reconciliation of a product's on-hand quantities.
    StockCorrection {
        product_id: String,
        box_adjustment: i64,
        kg_adjustment: Decimal,
    },
}

impl AuditPayload {
    /// The kind tag, for filtering and logs.
    pub fn kind(&self) -> AuditKind {
        match self {
            AuditPayload::SaleEdit { .. } => AuditKind::SaleEdit,
            AuditPayload::SaleDelete { .. } => AuditKind::SaleDelete,
            AuditPayload::StockCorrection { .. } => AuditKind::StockCorrection,
        }
    }

    /// ID of the entity the proposal targets (sale or product).
    pub fn target_id(&self) -> &str {
        match self {
            AuditPayload::SaleEdit { sale_id, .. } => sale_id,
            AuditPayload::SaleDelete { sale_id } => sale_id,
            AuditPayload::StockCorrection { product_id, .. } => product_id,
        }
    }
}

/// Discriminant of [`AuditPayload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    SaleEdit,
    SaleDelete,
    StockCorrection,
}

impl fmt::Display for AuditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditKind::SaleEdit => write!(f, "sale_edit"),
            AuditKind::SaleDelete => write!(f, "sale_delete"),
            AuditKind::StockCorrection => write!(f, "stock_correction"),
        }
    }
}

// =============================================================================
// Audit Record
// =============================================================================

/// One proposal instance moving through the state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: String,
    pub payload: AuditPayload,
    /// Why the requester wants the change.
    pub reason: String,
    pub requested_by: String,
    pub state: ApprovalState,
    /// Stock movement logged at approval time, if the payload moves stock.
    pub movement_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Creates a record in `pending`. Does not mutate the target entity.
    pub fn propose(
        payload: AuditPayload,
        reason: impl Into<String>,
        requested_by: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        AuditRecord {
            id: Uuid::new_v4().to_string(),
            payload,
            reason: reason.into(),
            requested_by: requested_by.into(),
            state: ApprovalState::Pending,
            movement_id: None,
            created_at: now,
        }
    }

    /// Takes the decision on a pending record.
    ///
    /// Fails with `InvalidState` when the record is already terminal -
    /// deciding twice performs no mutation. Approval only transitions the
    /// state; applying the payload (and stamping `applied_at`) is the
    /// caller's next, separately-durable step.
    pub fn decide(
        &mut self,
        decision: Decision,
        decided_by: impl Into<String>,
        reject_reason: Option<String>,
        now: DateTime<Utc>,
    ) -> LedgerResult<()> {
        if !self.state.is_pending() {
            return Err(LedgerError::InvalidState {
                id: self.id.clone(),
                state: self.state.label(),
            });
        }

        self.state = match decision {
            Decision::Approve => ApprovalState::Approved {
                decided_by: decided_by.into(),
                decided_at: now,
                applied_at: None,
            },
            Decision::Reject => ApprovalState::Rejected {
                decided_by: decided_by.into(),
                decided_at: now,
                reason: reject_reason.unwrap_or_default(),
            },
        };
        Ok(())
    }

    /// Stamps `applied_at` after the downstream mutation has run.
    ///
    /// Fails with `InvalidState` unless the record is approved.
    pub fn mark_applied(&mut self, now: DateTime<Utc>) -> LedgerResult<()> {
        match &mut self.state {
            ApprovalState::Approved { applied_at, .. } => {
                *applied_at = Some(now);
                Ok(())
            }
            other => Err(LedgerError::InvalidState {
                id: self.id.clone(),
                state: other.label(),
            }),
        }
    }

    /// Approved but the downstream mutation has not been applied yet -
    /// the record a crash-recovery pass must pick up.
    #[inline]
    pub fn needs_apply(&self) -> bool {
        self.state.is_unapplied()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
