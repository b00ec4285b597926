//! # Movement Repository
//!
//! Append-mostly store for stock movement records. Movements are the audit
//! trail of every quantity change; finalized movements are never edited.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use mizan_core::{MovementStatus, StockMovement};

/// Repository for stock movement records.
#[derive(Debug, Clone, Default)]
pub struct MovementRepository {
    records: Arc<RwLock<HashMap<String, StockMovement>>>,
}

impl MovementRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a movement record.
    pub async fn insert(&self, movement: StockMovement) -> StoreResult<()> {
        let mut guard = self.records.write().await;
        if guard.contains_key(&movement.id) {
            return Err(StoreError::Duplicate {
                entity: "movement",
                id: movement.id.clone(),
            });
        }
        guard.insert(movement.id.clone(), movement);
        Ok(())
    }

    /// Marks a pending movement completed.
    pub async fn complete(&self, id: &str) -> StoreResult<()> {
        let mut guard = self.records.write().await;
        let movement = guard
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("movement", id))?;
        movement.status = MovementStatus::Completed;
        Ok(())
    }

    /// Lists movements for one product, oldest first.
    pub async fn list_for_product(&self, product_id: &str) -> Vec<StockMovement> {
        let mut movements: Vec<StockMovement> = self
            .records
            .read()
            .await
            .values()
            .filter(|m| m.product_id == product_id)
            .cloned()
            .collect();
        movements.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        movements
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mizan_core::MovementType;
    use rust_decimal_macros::dec;

    fn pending_movement(id: &str) -> StockMovement {
        StockMovement {
            id: id.to_string(),
            product_id: "product-1".to_string(),
            movement_type: MovementType::Correction,
            old_boxes: 10,
            new_boxes: 12,
            old_kg: dec!(20),
            new_kg: dec!(20),
            reason: Some("recount".to_string()),
            performed_by: "manager".to_string(),
            status: MovementStatus::Pending,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_complete_finalizes_pending_movement() {
        let repo = MovementRepository::new();
        repo.insert(pending_movement("m-1")).await.unwrap();

        repo.complete("m-1").await.unwrap();

        let movements = repo.list_for_product("product-1").await;
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].status, MovementStatus::Completed);
    }

    #[tokio::test]
    async fn test_complete_unknown_movement_fails() {
        let repo = MovementRepository::new();
        let err = repo.complete("missing").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "movement", .. }));
    }
}
