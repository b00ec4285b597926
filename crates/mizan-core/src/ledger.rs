//! # Stock Ledger
//!
//! Owns the rules for every change to a product's on-hand quantities.
//!
//! ## Operation → Stock Effect
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Ledger Operations                              │
//! │                                                                         │
//! │  Operation      Effect            When Applied        Movement         │
//! │  ─────────      ──────            ────────────        ────────         │
//! │  restock        + boxes, + kg     immediately         completed        │
//! │  sell           − boxes, − kg     immediately         completed        │
//! │  report damage  (none)            on approval         pending→completed│
//! │  correction     ± boxes, ± kg     on approval         pending→completed│
//! │                                                                         │
//! │  INVARIANT: quantity_box >= 0 and quantity_kg >= 0 after every         │
//! │  operation. Checks run BEFORE any field is touched, so a failed        │
//! │  operation never leaves a partial decrement.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutation here is check-then-act over one product; the store layer
//! serializes concurrent mutations per product so the check and the act
//! happen without an interleaving write.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::{CorrectionPolicy, LedgerConfig};
use crate::error::{LedgerError, LedgerResult, ValidationError};
use crate::types::{
    DamagedProductRecord, MovementStatus, MovementType, Product, StockMovement, StockUnit,
};

// =============================================================================
// Stock Ledger
// =============================================================================

/// Applies deltas from restock, sale, damage, and correction operations.
///
/// Pure with respect to time: callers pass `now` in, so every mutation is
/// deterministic and testable without a clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct StockLedger {
    config: LedgerConfig,
}

impl StockLedger {
    /// Creates a ledger with the given configuration.
    pub fn new(config: LedgerConfig) -> Self {
        StockLedger { config }
    }

    // -------------------------------------------------------------------------
    // Restock
    // -------------------------------------------------------------------------

    /// Increments both quantities unconditionally (no upper bound) and
    /// refreshes the product's expiry date from the delivery.
    ///
    /// Records a `completed` movement - restock is a direct operation, it
    /// never passes through the approval queue.
    pub fn restock(
        &self,
        product: &mut Product,
        boxes_added: i64,
        kg_added: Decimal,
        expiry_date: Option<DateTime<Utc>>,
        performed_by: &str,
        now: DateTime<Utc>,
    ) -> LedgerResult<StockMovement> {
        ensure_non_negative(boxes_added, kg_added)?;

        let old_boxes = product.quantity_box;
        let old_kg = product.quantity_kg;

        product.quantity_box += boxes_added;
        product.quantity_kg += kg_added;
        if expiry_date.is_some() {
            product.expiry_date = expiry_date;
        }
        product.updated_at = now;

        Ok(self.movement(
            product,
            MovementType::Restock,
            old_boxes,
            old_kg,
            None,
            performed_by,
            MovementStatus::Completed,
            now,
        ))
    }

    // -------------------------------------------------------------------------
    // Sell
    // -------------------------------------------------------------------------

    /// Checks that both requested quantities are on hand.
    ///
    /// The units are checked **independently**: a product fully out of one
    /// unit is still sellable in the other as long as the caller requests
    /// zero of the depleted unit. Boxes are checked first, so when both are
    /// short the error names the box shortfall.
    pub fn ensure_available(
        &self,
        product: &Product,
        boxes_requested: i64,
        kg_requested: Decimal,
    ) -> LedgerResult<()> {
        if boxes_requested > product.quantity_box {
            return Err(LedgerError::InsufficientStock {
                unit: StockUnit::Boxes,
                available: Decimal::from(product.quantity_box),
                requested: Decimal::from(boxes_requested),
            });
        }
        if kg_requested > product.quantity_kg {
            return Err(LedgerError::InsufficientStock {
                unit: StockUnit::Kilograms,
                available: product.quantity_kg,
                requested: kg_requested,
            });
        }
        Ok(())
    }

    /// Decrements both quantities for a sale.
    ///
    /// Fails with `InsufficientStock` before touching either field; on
    /// failure the product is unchanged (no partial decrement).
    pub fn sell(
        &self,
        product: &mut Product,
        boxes_requested: i64,
        kg_requested: Decimal,
        performed_by: &str,
        now: DateTime<Utc>,
    ) -> LedgerResult<StockMovement> {
        ensure_non_negative(boxes_requested, kg_requested)?;
        self.ensure_available(product, boxes_requested, kg_requested)?;

        let old_boxes = product.quantity_box;
        let old_kg = product.quantity_kg;

        product.quantity_box -= boxes_requested;
        product.quantity_kg -= kg_requested;
        product.updated_at = now;

        Ok(self.movement(
            product,
            MovementType::Sale,
            old_boxes,
            old_kg,
            None,
            performed_by,
            MovementStatus::Completed,
            now,
        ))
    }

    /// Returns previously sold quantities to stock (sale deletion, or a
    /// sale edit that reduced the quantities).
    pub fn return_to_stock(
        &self,
        product: &mut Product,
        boxes_returned: i64,
        kg_returned: Decimal,
        reason: &str,
        performed_by: &str,
        now: DateTime<Utc>,
    ) -> LedgerResult<StockMovement> {
        ensure_non_negative(boxes_returned, kg_returned)?;

        let old_boxes = product.quantity_box;
        let old_kg = product.quantity_kg;

        product.quantity_box += boxes_returned;
        product.quantity_kg += kg_returned;
        product.updated_at = now;

        Ok(self.movement(
            product,
            MovementType::Sale,
            old_boxes,
            old_kg,
            Some(reason.to_string()),
            performed_by,
            MovementStatus::Completed,
            now,
        ))
    }

    // -------------------------------------------------------------------------
    // Damage
    // -------------------------------------------------------------------------

    /// Creates a pending damage report.
    ///
    /// Stock is **not** decremented here; the write-off happens in
    /// [`apply_damage`](Self::apply_damage) once the report is approved.
    /// The loss value is priced at cost, frozen at report time.
    pub fn report_damage(
        &self,
        product: &Product,
        damaged_boxes: i64,
        damaged_kg: Decimal,
        reason: &str,
        reported_by: &str,
        evidence_ref: Option<String>,
        now: DateTime<Utc>,
    ) -> LedgerResult<DamagedProductRecord> {
        ensure_non_negative(damaged_boxes, damaged_kg)?;
        ensure_some_quantity(damaged_boxes, damaged_kg)?;
        if reason.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "reason".to_string(),
            }
            .into());
        }

        let loss_value = product.cost_per_box * damaged_boxes + product.cost_per_kg * damaged_kg;

        Ok(DamagedProductRecord {
            id: Uuid::new_v4().to_string(),
            product_id: product.id.clone(),
            damaged_boxes,
            damaged_kg,
            reason: reason.trim().to_string(),
            damage_date: now,
            loss_value,
            approval: crate::types::ApprovalState::Pending,
            reported_by: reported_by.to_string(),
            evidence_ref,
        })
    }

    /// Applies an approved damage report: decrements both units with the
    /// same availability checks as a sale.
    pub fn apply_damage(
        &self,
        product: &mut Product,
        record: &DamagedProductRecord,
        now: DateTime<Utc>,
    ) -> LedgerResult<StockMovement> {
        self.ensure_available(product, record.damaged_boxes, record.damaged_kg)?;

        let old_boxes = product.quantity_box;
        let old_kg = product.quantity_kg;

        product.quantity_box -= record.damaged_boxes;
        product.quantity_kg -= record.damaged_kg;
        product.updated_at = now;

        Ok(self.movement(
            product,
            MovementType::Damage,
            old_boxes,
            old_kg,
            Some(record.reason.clone()),
            &record.reported_by,
            MovementStatus::Completed,
            now,
        ))
    }

    // -------------------------------------------------------------------------
    // Correction
    // -------------------------------------------------------------------------

    /// Checks whether a signed correction can be applied under the
    /// configured policy, without mutating anything.
    pub fn check_correction(
        &self,
        product: &Product,
        box_adjustment: i64,
        kg_adjustment: Decimal,
    ) -> LedgerResult<()> {
        if self.config.correction_policy == CorrectionPolicy::ClampToZero {
            return Ok(());
        }

        if product.quantity_box + box_adjustment < 0 {
            return Err(LedgerError::InvalidCorrection {
                unit: StockUnit::Boxes,
                current: Decimal::from(product.quantity_box),
                adjustment: Decimal::from(box_adjustment),
            });
        }
        if product.quantity_kg + kg_adjustment < Decimal::ZERO {
            return Err(LedgerError::InvalidCorrection {
                unit: StockUnit::Kilograms,
                current: product.quantity_kg,
                adjustment: kg_adjustment,
            });
        }
        Ok(())
    }

    /// Applies an approved signed correction to both fields.
    ///
    /// Under `CorrectionPolicy::Reject` (the default) an adjustment that
    /// would drive a quantity below zero fails with `InvalidCorrection`
    /// naming the unit; under `ClampToZero` the quantity floors at zero.
    pub fn apply_correction(
        &self,
        product: &mut Product,
        box_adjustment: i64,
        kg_adjustment: Decimal,
        reason: &str,
        performed_by: &str,
        now: DateTime<Utc>,
    ) -> LedgerResult<StockMovement> {
        self.check_correction(product, box_adjustment, kg_adjustment)?;

        let old_boxes = product.quantity_box;
        let old_kg = product.quantity_kg;

        product.quantity_box = (product.quantity_box + box_adjustment).max(0);
        product.quantity_kg = (product.quantity_kg + kg_adjustment).max(Decimal::ZERO);
        product.updated_at = now;

        Ok(self.movement(
            product,
            MovementType::Correction,
            old_boxes,
            old_kg,
            Some(reason.to_string()),
            performed_by,
            MovementStatus::Completed,
            now,
        ))
    }

    // -------------------------------------------------------------------------
    // Movement construction
    // -------------------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    fn movement(
        &self,
        product: &Product,
        movement_type: MovementType,
        old_boxes: i64,
        old_kg: Decimal,
        reason: Option<String>,
        performed_by: &str,
        status: MovementStatus,
        now: DateTime<Utc>,
    ) -> StockMovement {
        StockMovement {
            id: Uuid::new_v4().to_string(),
            product_id: product.id.clone(),
            movement_type,
            old_boxes,
            new_boxes: product.quantity_box,
            old_kg,
            new_kg: product.quantity_kg,
            reason,
            performed_by: performed_by.to_string(),
            status,
            timestamp: now,
        }
    }
}

// =============================================================================
// Input guards
// =============================================================================

fn ensure_non_negative(boxes: i64, kg: Decimal) -> LedgerResult<()> {
    if boxes < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "boxes".to_string(),
        }
        .into());
    }
    if kg < Decimal::ZERO {
        return Err(ValidationError::MustBeNonNegative {
            field: "kg".to_string(),
        }
        .into());
    }
    Ok(())
}

fn ensure_some_quantity(boxes: i64, kg: Decimal) -> LedgerResult<()> {
    if boxes == 0 && kg.is_zero() {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into());
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
