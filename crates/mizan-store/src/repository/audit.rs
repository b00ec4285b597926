//! # Audit & Damage Repositories
//!
//! Record store operations for the two approval-gated queues: audit records
//! (sale edits, sale deletions, stock corrections) and damage reports.
//!
//! Both queues share the same durability contract: state transitions are
//! written back through `update` **before** the downstream mutation runs,
//! and `list_unapplied` surfaces approved-but-unapplied records for the
//! reprocessing pass.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use mizan_core::{AuditRecord, DamagedProductRecord};

// =============================================================================
// Audit Repository
// =============================================================================

/// Repository for audit records (sale edit/delete, stock correction).
#[derive(Debug, Clone, Default)]
pub struct AuditRepository {
    records: Arc<RwLock<HashMap<String, AuditRecord>>>,
}

impl AuditRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a freshly proposed record.
    pub async fn insert(&self, record: AuditRecord) -> StoreResult<()> {
        let mut guard = self.records.write().await;
        if guard.contains_key(&record.id) {
            return Err(StoreError::Duplicate {
                entity: "audit record",
                id: record.id.clone(),
            });
        }
        guard.insert(record.id.clone(), record);
        Ok(())
    }

    /// Fetches a record by ID.
    pub async fn get(&self, id: &str) -> StoreResult<AuditRecord> {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("audit record", id))
    }

    /// Writes back a state transition.
    pub async fn update(&self, record: AuditRecord) -> StoreResult<()> {
        let mut guard = self.records.write().await;
        if !guard.contains_key(&record.id) {
            return Err(StoreError::not_found("audit record", &record.id));
        }
        guard.insert(record.id.clone(), record);
        Ok(())
    }

    /// Lists records still awaiting a decision, oldest first.
    pub async fn list_pending(&self) -> Vec<AuditRecord> {
        let mut records: Vec<AuditRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.state.is_pending())
            .cloned()
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        records
    }

    /// Lists approved records whose mutation has not been applied.
    pub async fn list_unapplied(&self) -> Vec<AuditRecord> {
        let mut records: Vec<AuditRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.needs_apply())
            .cloned()
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        records
    }
}

// =============================================================================
// Damage Repository
// =============================================================================

/// Repository for damage reports.
#[derive(Debug, Clone, Default)]
pub struct DamageRepository {
    records: Arc<RwLock<HashMap<String, DamagedProductRecord>>>,
}

impl DamageRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a freshly reported record.
    pub async fn insert(&self, record: DamagedProductRecord) -> StoreResult<()> {
        let mut guard = self.records.write().await;
        if guard.contains_key(&record.id) {
            return Err(StoreError::Duplicate {
                entity: "damage report",
                id: record.id.clone(),
            });
        }
        guard.insert(record.id.clone(), record);
        Ok(())
    }

    /// Fetches a report by ID.
    pub async fn get(&self, id: &str) -> StoreResult<DamagedProductRecord> {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("damage report", id))
    }

    /// Writes back a state transition.
    pub async fn update(&self, record: DamagedProductRecord) -> StoreResult<()> {
        let mut guard = self.records.write().await;
        if !guard.contains_key(&record.id) {
            return Err(StoreError::not_found("damage report", &record.id));
        }
        guard.insert(record.id.clone(), record);
        Ok(())
    }

    /// Lists reports still awaiting a decision, oldest first.
    pub async fn list_pending(&self) -> Vec<DamagedProductRecord> {
        let mut records: Vec<DamagedProductRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.approval.is_pending())
            .cloned()
            .collect();
        records.sort_by(|a, b| a.damage_date.cmp(&b.damage_date));
        records
    }

    /// Lists approved reports whose write-off has not been applied.
    pub async fn list_unapplied(&self) -> Vec<DamagedProductRecord> {
        let mut records: Vec<DamagedProductRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.approval.is_unapplied())
            .cloned()
            .collect();
        records.sort_by(|a, b| a.damage_date.cmp(&b.damage_date));
        records
    }
}
