//! # Sale Repository
//!
//! Record store operations for sales.
//!
//! Sales are inserted by the service only after the stock decrement
//! succeeded, and amended only through approved audit records - there is
//! deliberately no direct `update quantities` entry point here.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use mizan_core::{PaymentStatus, Sale};

/// Repository for sale records.
#[derive(Debug, Clone, Default)]
pub struct SaleRepository {
    records: Arc<RwLock<HashMap<String, Sale>>>,
}

impl SaleRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a recorded sale.
    pub async fn insert(&self, sale: Sale) -> StoreResult<()> {
        let mut guard = self.records.write().await;
        if guard.contains_key(&sale.id) {
            return Err(StoreError::Duplicate {
                entity: "sale",
                id: sale.id.clone(),
            });
        }
        debug!(sale_id = %sale.id, product_id = %sale.product_id, "inserting sale");
        guard.insert(sale.id.clone(), sale);
        Ok(())
    }

    /// Fetches a sale by ID.
    pub async fn get(&self, id: &str) -> StoreResult<Sale> {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("sale", id))
    }

    /// Overwrites an existing sale (approved edits only).
    pub async fn update(&self, sale: Sale) -> StoreResult<()> {
        let mut guard = self.records.write().await;
        if !guard.contains_key(&sale.id) {
            return Err(StoreError::not_found("sale", &sale.id));
        }
        guard.insert(sale.id.clone(), sale);
        Ok(())
    }

    /// Removes a sale (approved deletions only). Returns the removed record.
    pub async fn remove(&self, id: &str) -> StoreResult<Sale> {
        self.records
            .write()
            .await
            .remove(id)
            .ok_or_else(|| StoreError::not_found("sale", id))
    }

    /// Lists all sales, newest first.
    pub async fn list(&self) -> Vec<Sale> {
        let mut sales: Vec<Sale> = self.records.read().await.values().cloned().collect();
        sales.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sales
    }

    /// Lists sales with an outstanding remainder, newest first.
    pub async fn list_unsettled(&self) -> Vec<Sale> {
        let mut sales: Vec<Sale> = self
            .records
            .read()
            .await
            .values()
            .filter(|s| s.payment_status != PaymentStatus::Completed)
            .cloned()
            .collect();
        sales.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sales
    }
}
