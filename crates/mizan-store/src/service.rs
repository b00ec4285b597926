//! # Ledger Service
//!
//! The permission-gated operations the dashboard calls. Every mutation
//! resolves the acting staff member's permission gate first, then delegates
//! the business rules to mizan-core, then persists the outcome.
//!
//! ## Durable Approve-Then-Apply Ordering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Approving an Audited Mutation                           │
//! │                                                                         │
//! │  decide_audit(Approve)                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. Permission gate resolved for the payload's kind                    │
//! │  2. Record transitions pending → approved { applied_at: None }         │
//! │  3. Transition WRITTEN BACK to the store  ◄── durable point            │
//! │  4. Mutation applied; its movement staged with status `pending`        │
//! │  5. applied_at stamped and written back                                │
//! │  6. Staged movement marked `completed`                                 │
//! │                                                                         │
//! │  A crash between 3 and 5 leaves an approved record with                │
//! │  applied_at == None. reprocess_approved() picks those up on the        │
//! │  next start - an approved change is never silently lost, and           │
//! │  applying is idempotent because step 4 runs at most once per record.   │
//! │  A movement still `pending` marks an approval whose finalization was   │
//! │  cut short. Rejected records never reach step 4, so rejection leaves   │
//! │  no movement behind.                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::error::ServiceResult;
use crate::repository::{
    AuditRepository, DamageRepository, MovementRepository, ProductRepository, SaleRepository,
};
use mizan_core::{
    sales, validation, ApprovalState, AuditPayload, AuditRecord, ClientInfo, DamagedProductRecord,
    Decision, Feature, LedgerConfig, LedgerError, LedgerResult, Money, MovementStatus,
    PermissionAction, PermissionSet, Product, RequestedPayment, Sale, StockLedger, StockMovement,
    ValidationError, ValueChange,
};
use uuid::Uuid;

// =============================================================================
// Actor
// =============================================================================

/// The staff member issuing a request, with their resolved permission set.
///
/// Built fresh per request so a permission change takes effect on the very
/// next call - capabilities are never cached past a change.
#[derive(Debug, Clone)]
pub struct Actor {
    pub staff_id: String,
    permissions: PermissionSet,
}

impl Actor {
    /// Creates an actor from a resolved permission set.
    ///
    /// Raw keys the parser did not recognize are logged and skipped - an
    /// unknown key never grants anything.
    pub fn new(staff_id: impl Into<String>, permissions: PermissionSet) -> Self {
        let staff_id = staff_id.into();
        if !permissions.unknown_keys().is_empty() {
            warn!(
                staff_id = %staff_id,
                keys = ?permissions.unknown_keys(),
                "skipping unknown permission keys"
            );
        }
        Actor {
            staff_id,
            permissions,
        }
    }

    /// An actor holding every permission (owner accounts).
    pub fn owner(staff_id: impl Into<String>) -> Self {
        Actor {
            staff_id: staff_id.into(),
            permissions: PermissionSet::allow_all(),
        }
    }

    fn check(&self, feature: Feature, action: PermissionAction) -> LedgerResult<()> {
        self.permissions.check(feature, action)
    }
}

// =============================================================================
// New Product
// =============================================================================

/// Input for creating a product; per-kg figures are derived, never supplied.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub category: Option<String>,
    pub quantity_box: i64,
    pub quantity_kg: Decimal,
    pub box_to_kg_ratio: Decimal,
    pub cost_per_box: Money,
    pub price_per_box: Money,
    pub low_stock_threshold: i64,
    pub expiry_date: Option<DateTime<Utc>>,
}

// =============================================================================
// Ledger Service
// =============================================================================

/// The service layer wiring the stock ledger to the record store.
#[derive(Debug, Clone, Default)]
pub struct LedgerService {
    ledger: StockLedger,
    products: ProductRepository,
    sales: SaleRepository,
    movements: MovementRepository,
    audits: AuditRepository,
    damages: DamageRepository,
}

impl LedgerService {
    /// Creates a service over an empty store.
    pub fn new(config: LedgerConfig) -> Self {
        LedgerService {
            ledger: StockLedger::new(config),
            ..Default::default()
        }
    }

    // -------------------------------------------------------------------------
    // Inventory
    // -------------------------------------------------------------------------

    /// Creates a product. Per-kg cost and price are derived from the per-box
    /// figures and the box→kg ratio.
    pub async fn create_product(&self, actor: &Actor, new: NewProduct) -> ServiceResult<Product> {
        actor.check(Feature::ManageInventory, PermissionAction::Create)?;

        let name = new.name.trim();
        if name.is_empty() {
            return Err(ValidationError::Required {
                field: "name".to_string(),
            }
            .into());
        }
        validation::validate_box_quantity(new.quantity_box)?;
        validation::validate_kg_quantity(new.quantity_kg)?;
        validation::validate_ratio(new.box_to_kg_ratio)?;

        let pricing = mizan_core::units::UnitPricing::derive(
            new.cost_per_box,
            new.price_per_box,
            new.box_to_kg_ratio,
        )?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            category: new.category,
            quantity_box: new.quantity_box,
            quantity_kg: new.quantity_kg,
            box_to_kg_ratio: new.box_to_kg_ratio,
            cost_per_box: new.cost_per_box,
            cost_per_kg: pricing.cost_per_kg,
            price_per_box: new.price_per_box,
            price_per_kg: pricing.price_per_kg,
            low_stock_threshold: new.low_stock_threshold,
            expiry_date: new.expiry_date,
            created_at: now,
            updated_at: now,
        };

        self.products.insert(product.clone()).await?;
        info!(product_id = %product.id, name = %product.name, "product created");
        Ok(product)
    }

    /// Restocks a product: both units incremented, expiry refreshed from the
    /// delivery. Direct operation - no approval queue.
    pub async fn restock(
        &self,
        actor: &Actor,
        product_id: &str,
        boxes_added: i64,
        kg_added: Decimal,
        expiry_date: Option<DateTime<Utc>>,
    ) -> ServiceResult<StockMovement> {
        actor.check(Feature::ManageInventory, PermissionAction::Edit)?;

        let now = Utc::now();
        let staff = actor.staff_id.clone();
        let ledger = self.ledger;
        let movement = self
            .products
            .mutate(product_id, |product| {
                ledger.restock(product, boxes_added, kg_added, expiry_date, &staff, now)
            })
            .await?;

        self.movements.insert(movement.clone()).await?;
        info!(
            product_id = %product_id,
            boxes = boxes_added,
            kg = %kg_added,
            staff_id = %actor.staff_id,
            "restock recorded"
        );
        Ok(movement)
    }

    // -------------------------------------------------------------------------
    // Sales
    // -------------------------------------------------------------------------

    /// Records a sale: computes the totals, decrements stock, persists the
    /// sale. One logical transaction - a failed decrement persists nothing.
    #[allow(clippy::too_many_arguments)]
    pub async fn record_sale(
        &self,
        actor: &Actor,
        product_id: &str,
        boxes_qty: i64,
        kg_qty: Decimal,
        amount_declared: Option<Money>,
        requested: RequestedPayment,
        client: ClientInfo,
    ) -> ServiceResult<Sale> {
        actor.check(Feature::ManageSales, PermissionAction::Create)?;

        if let Some(name) = &client.name {
            validation::validate_client_name(name)?;
        }
        if let Some(phone) = &client.phone {
            validation::validate_phone(phone)?;
        }

        let now = Utc::now();
        let staff = actor.staff_id.clone();
        let ledger = self.ledger;
        let (draft, movement) = self
            .products
            .mutate(product_id, |product| {
                let draft =
                    sales::build(product, boxes_qty, kg_qty, amount_declared, requested, &client)?;
                let movement = ledger.sell(product, boxes_qty, kg_qty, &staff, now)?;
                Ok((draft, movement))
            })
            .await?;

        let sale = draft.into_sale(&actor.staff_id, now);
        self.movements.insert(movement).await?;
        self.sales.insert(sale.clone()).await?;
        info!(
            sale_id = %sale.id,
            product_id = %product_id,
            total = %sale.total_amount,
            status = ?sale.payment_status,
            "sale recorded"
        );
        Ok(sale)
    }

    // -------------------------------------------------------------------------
    // Damage Reports
    // -------------------------------------------------------------------------

    /// Files a damage report. Stock is untouched until the report is
    /// approved.
    pub async fn report_damage(
        &self,
        actor: &Actor,
        product_id: &str,
        damaged_boxes: i64,
        damaged_kg: Decimal,
        reason: &str,
        evidence_ref: Option<String>,
    ) -> ServiceResult<DamagedProductRecord> {
        actor.check(Feature::DamageReports, PermissionAction::Create)?;
        validation::validate_reason(reason)?;

        let product = self.products.get(product_id).await?;
        let record = self.ledger.report_damage(
            &product,
            damaged_boxes,
            damaged_kg,
            reason,
            &actor.staff_id,
            evidence_ref,
            Utc::now(),
        )?;

        self.damages.insert(record.clone()).await?;
        info!(
            damage_id = %record.id,
            product_id = %product_id,
            loss = %record.loss_value,
            "damage report filed"
        );
        Ok(record)
    }

    /// Decides a pending damage report.
    ///
    /// Approval writes the transition back durably, then runs the write-off
    /// with the same availability checks as a sale. Rejection leaves stock
    /// untouched and retains the reviewer's reason.
    pub async fn decide_damage(
        &self,
        actor: &Actor,
        damage_id: &str,
        decision: Decision,
        reject_reason: Option<String>,
    ) -> ServiceResult<DamagedProductRecord> {
        actor.check(Feature::DamageReports, PermissionAction::Edit)?;

        let mut record = self.damages.get(damage_id).await?;
        if !record.approval.is_pending() {
            return Err(LedgerError::InvalidState {
                id: record.id.clone(),
                state: record.approval.label(),
            }
            .into());
        }

        let now = Utc::now();
        match decision {
            Decision::Reject => {
                record.approval = ApprovalState::Rejected {
                    decided_by: actor.staff_id.clone(),
                    decided_at: now,
                    reason: reject_reason.unwrap_or_default(),
                };
                self.damages.update(record.clone()).await?;
                info!(damage_id = %damage_id, "damage report rejected");
                Ok(record)
            }
            Decision::Approve => {
                record.approval = ApprovalState::Approved {
                    decided_by: actor.staff_id.clone(),
                    decided_at: now,
                    applied_at: None,
                };
                // Durable point: the approval survives a crash before the
                // write-off below has run.
                self.damages.update(record.clone()).await?;
                self.apply_damage(&mut record).await?;
                info!(damage_id = %damage_id, "damage report approved and applied");
                Ok(record)
            }
        }
    }

    /// Runs the stock write-off for an approved damage report, stamps
    /// `applied_at` and completes the staged movement.
    async fn apply_damage(&self, record: &mut DamagedProductRecord) -> ServiceResult<()> {
        let now = Utc::now();
        let ledger = self.ledger;
        let snapshot = record.clone();
        let movement = self
            .products
            .mutate(&record.product_id, |product| {
                ledger.apply_damage(product, &snapshot, now)
            })
            .await?;
        let movement_id = self.stage_movement(movement).await?;

        if let ApprovalState::Approved { applied_at, .. } = &mut record.approval {
            *applied_at = Some(now);
        }
        self.damages.update(record.clone()).await?;
        self.movements.complete(&movement_id).await?;
        Ok(())
    }

    /// Inserts an audited movement with status `pending`; the caller
    /// completes it once the approval record is stamped applied.
    async fn stage_movement(&self, mut movement: StockMovement) -> ServiceResult<String> {
        movement.status = MovementStatus::Pending;
        let id = movement.id.clone();
        self.movements.insert(movement).await?;
        Ok(id)
    }

    // -------------------------------------------------------------------------
    // Audit Proposals
    // -------------------------------------------------------------------------

    /// Proposes an edit to a recorded sale's quantities (and optionally its
    /// amount paid). Nothing changes until the proposal is approved.
    #[allow(clippy::too_many_arguments)]
    pub async fn propose_sale_edit(
        &self,
        actor: &Actor,
        sale_id: &str,
        new_boxes: i64,
        new_kg: Decimal,
        new_amount_paid: Option<Money>,
        reason: &str,
    ) -> ServiceResult<AuditRecord> {
        actor.check(Feature::ManageSales, PermissionAction::Edit)?;
        validation::validate_reason(reason)?;
        validation::validate_box_quantity(new_boxes)?;
        validation::validate_kg_quantity(new_kg)?;
        if new_boxes == 0 && new_kg.is_zero() {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        let sale = self.sales.get(sale_id).await?;

        // Same consistency rule as recording a sale: the paid amount may
        // never exceed what the edited quantities will total.
        if let Some(paid) = new_amount_paid {
            if paid.is_negative() {
                return Err(ValidationError::MustBeNonNegative {
                    field: "amount_paid".to_string(),
                }
                .into());
            }
            let new_total = sale.box_price * new_boxes + sale.kg_price * new_kg;
            if paid > new_total {
                return Err(LedgerError::AmountExceedsTotal {
                    declared: paid,
                    total: new_total,
                }
                .into());
            }
        }

        let payload = AuditPayload::SaleEdit {
            sale_id: sale.id.clone(),
            boxes: ValueChange::new(sale.boxes_quantity, new_boxes),
            kg: ValueChange::new(sale.kg_quantity, new_kg),
            amount_paid: new_amount_paid.map(|after| ValueChange::new(sale.amount_paid, after)),
        };
        self.propose(payload, reason, actor).await
    }

    /// Proposes deleting a recorded sale; its quantities return to stock on
    /// approval.
    pub async fn propose_sale_delete(
        &self,
        actor: &Actor,
        sale_id: &str,
        reason: &str,
    ) -> ServiceResult<AuditRecord> {
        actor.check(Feature::ManageSales, PermissionAction::Delete)?;
        validation::validate_reason(reason)?;

        let sale = self.sales.get(sale_id).await?;
        self.propose(AuditPayload::SaleDelete { sale_id: sale.id }, reason, actor)
            .await
    }

    /// Proposes a signed correction to a product's on-hand quantities.
    pub async fn propose_correction(
        &self,
        actor: &Actor,
        product_id: &str,
        box_adjustment: i64,
        kg_adjustment: Decimal,
        reason: &str,
    ) -> ServiceResult<AuditRecord> {
        actor.check(Feature::ManageInventory, PermissionAction::Edit)?;
        validation::validate_reason(reason)?;
        if box_adjustment == 0 && kg_adjustment.is_zero() {
            return Err(ValidationError::MustBePositive {
                field: "adjustment".to_string(),
            }
            .into());
        }

        let product = self.products.get(product_id).await?;
        self.propose(
            AuditPayload::StockCorrection {
                product_id: product.id,
                box_adjustment,
                kg_adjustment,
            },
            reason,
            actor,
        )
        .await
    }

    async fn propose(
        &self,
        payload: AuditPayload,
        reason: &str,
        actor: &Actor,
    ) -> ServiceResult<AuditRecord> {
        let record =
            AuditRecord::propose(payload, reason.trim(), actor.staff_id.as_str(), Utc::now());
        self.audits.insert(record.clone()).await?;
        info!(
            audit_id = %record.id,
            kind = %record.payload.kind(),
            target = %record.payload.target_id(),
            requested_by = %actor.staff_id,
            "audit proposal filed"
        );
        Ok(record)
    }

    /// Decides a pending audit record.
    ///
    /// The permission gate is resolved against the payload's kind: a sale
    /// edit needs sales edit rights, a deletion sales delete rights, a
    /// correction inventory edit rights. On approval the transition is
    /// written back durably before the payload is applied.
    pub async fn decide_audit(
        &self,
        actor: &Actor,
        audit_id: &str,
        decision: Decision,
        reject_reason: Option<String>,
    ) -> ServiceResult<AuditRecord> {
        let mut record = self.audits.get(audit_id).await?;

        let (feature, action) = match record.payload {
            AuditPayload::SaleEdit { .. } => (Feature::ManageSales, PermissionAction::Edit),
            AuditPayload::SaleDelete { .. } => (Feature::ManageSales, PermissionAction::Delete),
            AuditPayload::StockCorrection { .. } => {
                (Feature::ManageInventory, PermissionAction::Edit)
            }
        };
        actor.check(feature, action)?;

        let now = Utc::now();
        record.decide(decision, actor.staff_id.as_str(), reject_reason, now)?;
        // Durable point for approvals; terminal state for rejections.
        self.audits.update(record.clone()).await?;

        if record.needs_apply() {
            let staged = self.apply_audit(&mut record).await?;
            record.mark_applied(Utc::now())?;
            self.audits.update(record.clone()).await?;
            for movement_id in &staged {
                self.movements.complete(movement_id).await?;
            }
            info!(audit_id = %audit_id, kind = %record.payload.kind(), "audit approved and applied");
        } else {
            info!(audit_id = %audit_id, kind = %record.payload.kind(), "audit rejected");
        }
        Ok(record)
    }

    /// Applies an approved payload: moves stock and rewrites or removes the
    /// target record. Sets `movement_id` on the audit record and returns the
    /// staged movement ids for the caller to complete.
    async fn apply_audit(&self, record: &mut AuditRecord) -> ServiceResult<Vec<String>> {
        let now = Utc::now();
        let ledger = self.ledger;
        let reason = record.reason.clone();
        let requested_by = record.requested_by.clone();

        match &record.payload {
            AuditPayload::StockCorrection {
                product_id,
                box_adjustment,
                kg_adjustment,
            } => {
                let (boxes, kg) = (*box_adjustment, *kg_adjustment);
                let movement = self
                    .products
                    .mutate(product_id, |product| {
                        ledger.apply_correction(product, boxes, kg, &reason, &requested_by, now)
                    })
                    .await?;
                let staged = self.stage_movement(movement).await?;
                record.movement_id = Some(staged.clone());
                Ok(vec![staged])
            }

            AuditPayload::SaleDelete { sale_id } => {
                let sale = self.sales.get(sale_id).await?;
                let movement = self
                    .products
                    .mutate(&sale.product_id, |product| {
                        ledger.return_to_stock(
                            product,
                            sale.boxes_quantity,
                            sale.kg_quantity,
                            &reason,
                            &requested_by,
                            now,
                        )
                    })
                    .await?;
                let staged = self.stage_movement(movement).await?;
                record.movement_id = Some(staged.clone());
                self.sales.remove(sale_id).await?;
                Ok(vec![staged])
            }

            AuditPayload::SaleEdit {
                sale_id,
                boxes,
                kg,
                amount_paid,
            } => {
                let mut sale = self.sales.get(sale_id).await?;
                // Deltas against the stored sale, not the proposal's
                // `before` snapshot, in case an earlier edit landed between
                // proposal and approval.
                let box_delta = boxes.after - sale.boxes_quantity;
                let kg_delta = kg.after - sale.kg_quantity;

                let extra_boxes = box_delta.max(0);
                let extra_kg = kg_delta.max(Decimal::ZERO);
                let returned_boxes = (-box_delta).max(0);
                let returned_kg = (-kg_delta).max(Decimal::ZERO);

                let moved = self
                    .products
                    .mutate(&sale.product_id, |product| {
                        let mut moved = Vec::new();
                        if extra_boxes > 0 || extra_kg > Decimal::ZERO {
                            moved.push(ledger.sell(
                                product,
                                extra_boxes,
                                extra_kg,
                                &requested_by,
                                now,
                            )?);
                        }
                        if returned_boxes > 0 || returned_kg > Decimal::ZERO {
                            moved.push(ledger.return_to_stock(
                                product,
                                returned_boxes,
                                returned_kg,
                                &reason,
                                &requested_by,
                                now,
                            )?);
                        }
                        Ok(moved)
                    })
                    .await?;

                sale.boxes_quantity = boxes.after;
                sale.kg_quantity = kg.after;
                if let Some(change) = amount_paid {
                    sale.amount_paid = change.after;
                }
                sales::recompute(&mut sale, now);
                self.sales.update(sale).await?;

                let mut staged = Vec::with_capacity(moved.len());
                for movement in moved {
                    staged.push(self.stage_movement(movement).await?);
                }
                record.movement_id = staged.first().cloned();
                Ok(staged)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Reprocessing
    // -------------------------------------------------------------------------

    /// Re-applies approved records whose mutation never ran (crash between
    /// the durable approval and the apply step). Returns how many were
    /// applied; records that still cannot apply (e.g. stock sold out in the
    /// meantime) are left unapplied and logged.
    pub async fn reprocess_approved(&self) -> usize {
        let mut applied = 0;

        for mut record in self.damages.list_unapplied().await {
            match self.apply_damage(&mut record).await {
                Ok(()) => applied += 1,
                Err(err) => {
                    warn!(damage_id = %record.id, error = %err, "damage write-off still unappliable");
                }
            }
        }

        for mut record in self.audits.list_unapplied().await {
            let result = self.apply_audit(&mut record).await;
            match result {
                Ok(staged) => {
                    if record.mark_applied(Utc::now()).is_ok()
                        && self.audits.update(record.clone()).await.is_ok()
                    {
                        for movement_id in &staged {
                            if let Err(err) = self.movements.complete(movement_id).await {
                                warn!(movement_id = %movement_id, error = %err, "staged movement not found");
                            }
                        }
                        applied += 1;
                    }
                }
                Err(err) => {
                    warn!(audit_id = %record.id, error = %err, "audit payload still unappliable");
                }
            }
        }

        if applied > 0 {
            info!(count = applied, "reprocessed approved records");
        }
        applied
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Fetches one product.
    pub async fn get_product(&self, actor: &Actor, id: &str) -> ServiceResult<Product> {
        actor.check(Feature::ManageInventory, PermissionAction::View)?;
        Ok(self.products.get(id).await?)
    }

    /// All products, sorted by name.
    pub async fn list_products(&self, actor: &Actor) -> ServiceResult<Vec<Product>> {
        actor.check(Feature::ManageInventory, PermissionAction::View)?;
        Ok(self.products.list().await)
    }

    /// Products at or below their low-stock threshold.
    pub async fn low_stock_products(&self, actor: &Actor) -> ServiceResult<Vec<Product>> {
        actor.check(Feature::ManageInventory, PermissionAction::View)?;
        Ok(self.products.list_low_stock().await)
    }

    /// Movement history for one product, oldest first.
    pub async fn movements_for_product(
        &self,
        actor: &Actor,
        product_id: &str,
    ) -> ServiceResult<Vec<StockMovement>> {
        actor.check(Feature::ManageInventory, PermissionAction::View)?;
        Ok(self.movements.list_for_product(product_id).await)
    }

    /// Fetches one sale.
    pub async fn get_sale(&self, actor: &Actor, id: &str) -> ServiceResult<Sale> {
        actor.check(Feature::ManageSales, PermissionAction::View)?;
        Ok(self.sales.get(id).await?)
    }

    /// All sales, newest first.
    pub async fn list_sales(&self, actor: &Actor) -> ServiceResult<Vec<Sale>> {
        actor.check(Feature::ManageSales, PermissionAction::View)?;
        Ok(self.sales.list().await)
    }

    /// Sales with an outstanding remainder, newest first.
    pub async fn unsettled_sales(&self, actor: &Actor) -> ServiceResult<Vec<Sale>> {
        actor.check(Feature::ManageSales, PermissionAction::View)?;
        Ok(self.sales.list_unsettled().await)
    }

    /// Damage reports awaiting a decision, oldest first.
    pub async fn pending_damages(
        &self,
        actor: &Actor,
    ) -> ServiceResult<Vec<DamagedProductRecord>> {
        actor.check(Feature::DamageReports, PermissionAction::View)?;
        Ok(self.damages.list_pending().await)
    }

    /// Audit proposals awaiting a decision, oldest first.
    pub async fn pending_audits(&self, actor: &Actor) -> ServiceResult<Vec<AuditRecord>> {
        actor.check(Feature::ManageInventory, PermissionAction::View)?;
        Ok(self.audits.list_pending().await)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use mizan_core::{PaymentStatus, StaffPermission};
    use rust_decimal_macros::dec;

    fn service() -> LedgerService {
        LedgerService::new(LedgerConfig::default())
    }

    /// Product with price_per_box=100, price_per_kg=10, starting at
    /// (10 boxes, 20 kg).
    async fn seed_product(service: &LedgerService) -> Product {
        service
            .create_product(
                &Actor::owner("owner"),
                NewProduct {
                    name: "Frozen Tilapia".to_string(),
                    category: Some("fish".to_string()),
                    quantity_box: 10,
                    quantity_kg: dec!(20),
                    box_to_kg_ratio: dec!(10),
                    cost_per_box: Money::new(dec!(80)),
                    price_per_box: Money::new(dec!(100)),
                    low_stock_threshold: 5,
                    expiry_date: None,
                },
            )
            .await
            .unwrap()
    }

    fn row(key: &str) -> StaffPermission {
        StaffPermission {
            staff_id: "staff-1".to_string(),
            permission_key: key.to_string(),
            is_enabled: true,
        }
    }

    fn cashier() -> Actor {
        Actor::new(
            "cashier-1",
            PermissionSet::from_raw(&[
                row("staff_sales_master"),
                row("manage_sales_view"),
                row("manage_sales_create"),
            ]),
        )
    }

    #[tokio::test]
    async fn test_create_product_derives_per_kg_figures() {
        let service = service();
        let product = seed_product(&service).await;

        assert_eq!(product.cost_per_kg, Money::new(dec!(8)));
        assert_eq!(product.price_per_kg, Money::new(dec!(10)));
    }

    #[tokio::test]
    async fn test_permission_gate_blocks_before_any_effect() {
        let service = service();
        let product = seed_product(&service).await;

        // Cashier may create sales but not restock
        let err = service
            .restock(&cashier(), &product.id, 5, dec!(0), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Ledger(LedgerError::PermissionDenied { .. })
        ));

        let owner = Actor::owner("owner");
        let unchanged = service.get_product(&owner, &product.id).await.unwrap();
        assert_eq!(unchanged.quantity_box, 10);
        assert!(service
            .movements_for_product(&owner, &product.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_record_sale_decrements_and_persists() {
        let service = service();
        let product = seed_product(&service).await;

        let sale = service
            .record_sale(
                &cashier(),
                &product.id,
                2,
                dec!(3.5),
                None,
                RequestedPayment::Paid,
                ClientInfo::default(),
            )
            .await
            .unwrap();

        // 2·100 + 3.5·10 = 235
        assert_eq!(sale.total_amount, Money::new(dec!(235)));
        assert_eq!(sale.payment_status, PaymentStatus::Completed);

        let owner = Actor::owner("owner");
        let product = service.get_product(&owner, &product.id).await.unwrap();
        assert_eq!(product.quantity_box, 8);
        assert_eq!(product.quantity_kg, dec!(16.5));
        assert_eq!(
            service
                .movements_for_product(&owner, &product.id)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_failed_sale_persists_nothing() {
        let service = service();
        let product = seed_product(&service).await;
        let owner = Actor::owner("owner");

        let err = service
            .record_sale(
                &cashier(),
                &product.id,
                99,
                dec!(0),
                None,
                RequestedPayment::Paid,
                ClientInfo::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Ledger(LedgerError::InsufficientStock { .. })
        ));

        assert!(service.list_sales(&owner).await.unwrap().is_empty());
        assert!(service
            .movements_for_product(&owner, &product.id)
            .await
            .unwrap()
            .is_empty());
        let product = service.get_product(&owner, &product.id).await.unwrap();
        assert_eq!(product.quantity_box, 10);
    }

    #[tokio::test]
    async fn test_damage_approval_applies_write_off() {
        let service = service();
        let product = seed_product(&service).await;
        let owner = Actor::owner("owner");

        let report = service
            .report_damage(&owner, &product.id, 2, dec!(1), "freezer failure", None)
            .await
            .unwrap();
        // Report alone never touches stock
        assert_eq!(
            service.get_product(&owner, &product.id).await.unwrap().quantity_box,
            10
        );

        let decided = service
            .decide_damage(&owner, &report.id, Decision::Approve, None)
            .await
            .unwrap();
        assert!(matches!(
            decided.approval,
            ApprovalState::Approved {
                applied_at: Some(_),
                ..
            }
        ));

        let product = service.get_product(&owner, &product.id).await.unwrap();
        assert_eq!(product.quantity_box, 8);
        assert_eq!(product.quantity_kg, dec!(19));

        let movements = service
            .movements_for_product(&owner, &product.id)
            .await
            .unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].status, MovementStatus::Completed);
    }

    #[tokio::test]
    async fn test_damage_rejection_leaves_stock_and_keeps_reason() {
        let service = service();
        let product = seed_product(&service).await;
        let owner = Actor::owner("owner");

        let report = service
            .report_damage(&owner, &product.id, 2, dec!(0), "crushed cartons", None)
            .await
            .unwrap();
        let decided = service
            .decide_damage(
                &owner,
                &report.id,
                Decision::Reject,
                Some("no evidence attached".to_string()),
            )
            .await
            .unwrap();

        assert!(matches!(
            decided.approval,
            ApprovalState::Rejected { ref reason, .. } if reason == "no evidence attached"
        ));
        assert_eq!(
            service.get_product(&owner, &product.id).await.unwrap().quantity_box,
            10
        );

        // Terminal: a second decision performs no mutation
        let err = service
            .decide_damage(&owner, &report.id, Decision::Approve, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Ledger(LedgerError::InvalidState { .. })
        ));
    }

    #[tokio::test]
    async fn test_correction_proposal_applies_on_approval() {
        let service = service();
        let product = seed_product(&service).await;
        let owner = Actor::owner("owner");

        let proposal = service
            .propose_correction(&owner, &product.id, 5, dec!(-2), "recount after stocktake")
            .await
            .unwrap();
        // Pending proposal leaves stock alone
        assert_eq!(
            service.get_product(&owner, &product.id).await.unwrap().quantity_box,
            10
        );

        let decided = service
            .decide_audit(&owner, &proposal.id, Decision::Approve, None)
            .await
            .unwrap();
        assert!(decided.movement_id.is_some());

        let product = service.get_product(&owner, &product.id).await.unwrap();
        assert_eq!(product.quantity_box, 15);
        assert_eq!(product.quantity_kg, dec!(18));

        // The staged movement is finalized once the approval is stamped
        let movements = service
            .movements_for_product(&owner, &product.id)
            .await
            .unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].status, MovementStatus::Completed);
    }

    #[tokio::test]
    async fn test_sale_edit_moves_only_the_delta() {
        let service = service();
        let product = seed_product(&service).await;
        let owner = Actor::owner("owner");

        let sale = service
            .record_sale(
                &owner,
                &product.id,
                4,
                dec!(2),
                None,
                RequestedPayment::Paid,
                ClientInfo::default(),
            )
            .await
            .unwrap();
        // Stock now (6, 18)

        let proposal = service
            .propose_sale_edit(
                &owner,
                &sale.id,
                2,
                dec!(5),
                Some(Money::new(dec!(250))),
                "client changed the order",
            )
            .await
            .unwrap();
        service
            .decide_audit(&owner, &proposal.id, Decision::Approve, None)
            .await
            .unwrap();

        // Boxes went down by 2 (returned), kg up by 3 (sold extra)
        let product = service.get_product(&owner, &product.id).await.unwrap();
        assert_eq!(product.quantity_box, 8);
        assert_eq!(product.quantity_kg, dec!(15));

        let sale = service.get_sale(&owner, &sale.id).await.unwrap();
        assert_eq!(sale.boxes_quantity, 2);
        assert_eq!(sale.kg_quantity, dec!(5));
        // 2·100 + 5·10 = 250, fully settled by the edited amount
        assert_eq!(sale.total_amount, Money::new(dec!(250)));
        assert_eq!(sale.remaining_amount, Money::zero());
        assert_eq!(sale.payment_status, PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn test_sale_delete_returns_quantities() {
        let service = service();
        let product = seed_product(&service).await;
        let owner = Actor::owner("owner");

        let sale = service
            .record_sale(
                &owner,
                &product.id,
                3,
                dec!(4),
                None,
                RequestedPayment::Paid,
                ClientInfo::default(),
            )
            .await
            .unwrap();
        let proposal = service
            .propose_sale_delete(&owner, &sale.id, "duplicate entry")
            .await
            .unwrap();
        service
            .decide_audit(&owner, &proposal.id, Decision::Approve, None)
            .await
            .unwrap();

        let product = service.get_product(&owner, &product.id).await.unwrap();
        assert_eq!(product.quantity_box, 10);
        assert_eq!(product.quantity_kg, dec!(20));
        assert!(matches!(
            service.get_sale(&owner, &sale.id).await,
            Err(ServiceError::Store(crate::error::StoreError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_double_decide_is_rejected() {
        let service = service();
        let product = seed_product(&service).await;
        let owner = Actor::owner("owner");

        let proposal = service
            .propose_correction(&owner, &product.id, 1, dec!(0), "recount")
            .await
            .unwrap();
        service
            .decide_audit(&owner, &proposal.id, Decision::Approve, None)
            .await
            .unwrap();

        let err = service
            .decide_audit(&owner, &proposal.id, Decision::Reject, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Ledger(LedgerError::InvalidState {
                state: "approved",
                ..
            })
        ));
        // The correction ran exactly once
        assert_eq!(
            service.get_product(&owner, &product.id).await.unwrap().quantity_box,
            11
        );
    }

    #[tokio::test]
    async fn test_reprocess_picks_up_unapplied_approvals() {
        let service = service();
        let product = seed_product(&service).await;
        let owner = Actor::owner("owner");

        // Simulate a crash after the durable approval, before the apply:
        // an approved record lands in the store with applied_at == None.
        let mut record = AuditRecord::propose(
            AuditPayload::StockCorrection {
                product_id: product.id.clone(),
                box_adjustment: 5,
                kg_adjustment: dec!(0),
            },
            "recount",
            "manager",
            Utc::now(),
        );
        record
            .decide(Decision::Approve, "manager", None, Utc::now())
            .unwrap();
        service.audits.insert(record.clone()).await.unwrap();

        let applied = service.reprocess_approved().await;
        assert_eq!(applied, 1);

        let product = service.get_product(&owner, &product.id).await.unwrap();
        assert_eq!(product.quantity_box, 15);
        let record = service.audits.get(&record.id).await.unwrap();
        assert!(!record.needs_apply());

        // A second pass finds nothing to do
        assert_eq!(service.reprocess_approved().await, 0);
    }

    #[tokio::test]
    async fn test_reprocess_applies_unapplied_damage_write_off() {
        let service = service();
        let product = seed_product(&service).await;
        let owner = Actor::owner("owner");

        let report = service
            .report_damage(&owner, &product.id, 2, dec!(1), "freezer failure", None)
            .await
            .unwrap();

        // Simulate a crash after the durable approval, before the write-off
        let mut record = service.damages.get(&report.id).await.unwrap();
        record.approval = ApprovalState::Approved {
            decided_by: "manager".to_string(),
            decided_at: Utc::now(),
            applied_at: None,
        };
        service.damages.update(record).await.unwrap();
        assert_eq!(
            service.get_product(&owner, &product.id).await.unwrap().quantity_box,
            10
        );

        assert_eq!(service.reprocess_approved().await, 1);

        let product_after = service.get_product(&owner, &product.id).await.unwrap();
        assert_eq!(product_after.quantity_box, 8);
        assert_eq!(product_after.quantity_kg, dec!(19));

        let record = service.damages.get(&report.id).await.unwrap();
        assert!(matches!(
            record.approval,
            ApprovalState::Approved {
                applied_at: Some(_),
                ..
            }
        ));
        let movements = service
            .movements_for_product(&owner, &product.id)
            .await
            .unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].status, MovementStatus::Completed);

        // The write-off ran exactly once
        assert_eq!(service.reprocess_approved().await, 0);
        assert_eq!(
            service.get_product(&owner, &product.id).await.unwrap().quantity_box,
            8
        );
    }

    #[tokio::test]
    async fn test_low_stock_listing() {
        let service = service();
        let product = seed_product(&service).await;
        let owner = Actor::owner("owner");

        assert!(service.low_stock_products(&owner).await.unwrap().is_empty());

        service
            .record_sale(
                &owner,
                &product.id,
                6,
                dec!(0),
                None,
                RequestedPayment::Paid,
                ClientInfo::default(),
            )
            .await
            .unwrap();

        // 4 boxes left, threshold 5
        let low = service.low_stock_products(&owner).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, product.id);
    }
}
