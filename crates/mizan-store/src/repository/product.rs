//! # Product Repository
//!
//! Record store operations for products.
//!
//! ## Atomic Mutation Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                How mutate() Keeps Stock Consistent                      │
//! │                                                                         │
//! │  mutate(product_id, |product| ledger.sell(product, 2, 3.5, ...))       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. Take the WRITE lock (serializes concurrent mutations)              │
//! │  2. Clone the stored product into a staging copy                       │
//! │  3. Run the closure against the staging copy                           │
//! │       │                                                                 │
//! │       ├── Err? → staging copy dropped, stored record UNTOUCHED         │
//! │       │                                                                 │
//! │       └── Ok? → staging copy written back atomically                   │
//! │                                                                         │
//! │  The check inside the closure and the write-back happen under one      │
//! │  lock acquisition, so two concurrent sales can never both pass the     │
//! │  availability check against the same stock.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use mizan_core::{LedgerResult, Product};

/// Repository for product records.
#[derive(Debug, Clone, Default)]
pub struct ProductRepository {
    records: Arc<RwLock<HashMap<String, Product>>>,
}

impl ProductRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new product. Fails on an ID collision.
    pub async fn insert(&self, product: Product) -> StoreResult<()> {
        let mut guard = self.records.write().await;
        if guard.contains_key(&product.id) {
            return Err(StoreError::Duplicate {
                entity: "product",
                id: product.id.clone(),
            });
        }
        debug!(product_id = %product.id, name = %product.name, "inserting product");
        guard.insert(product.id.clone(), product);
        Ok(())
    }

    /// Fetches a product by ID.
    pub async fn get(&self, id: &str) -> StoreResult<Product> {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("product", id))
    }

    /// Lists all products, sorted by name.
    pub async fn list(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self.records.read().await.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        products
    }

    /// Lists products whose box count is at or below their threshold.
    pub async fn list_low_stock(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self
            .records
            .read()
            .await
            .values()
            .filter(|p| p.is_low_stock())
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        products
    }

    /// Runs a ledger mutation against one product atomically.
    ///
    /// The closure operates on a staging copy under the write lock; on
    /// `Err` the stored record is untouched, on `Ok` the copy is written
    /// back before the lock is released.
    pub async fn mutate<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Product) -> LedgerResult<T>,
    ) -> Result<T, crate::error::ServiceError> {
        let mut guard = self.records.write().await;
        let stored = guard
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("product", id))?;

        let mut staged = stored.clone();
        let out = f(&mut staged)?;
        *stored = staged;
        Ok(out)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mizan_core::{LedgerError, Money, StockUnit};
    use rust_decimal_macros::dec;

    fn test_product(id: &str, boxes: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            category: None,
            quantity_box: boxes,
            quantity_kg: dec!(10),
            box_to_kg_ratio: dec!(10),
            cost_per_box: Money::new(dec!(80)),
            cost_per_kg: Money::new(dec!(8)),
            price_per_box: Money::new(dec!(100)),
            price_per_kg: Money::new(dec!(10)),
            low_stock_threshold: 5,
            expiry_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = ProductRepository::new();
        repo.insert(test_product("p-1", 10)).await.unwrap();

        let fetched = repo.get("p-1").await.unwrap();
        assert_eq!(fetched.quantity_box, 10);

        assert!(matches!(
            repo.get("missing").await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            repo.insert(test_product("p-1", 3)).await,
            Err(StoreError::Duplicate { .. })
        ));
    }

    #[tokio::test]
    async fn test_mutate_failure_leaves_record_untouched() {
        let repo = ProductRepository::new();
        repo.insert(test_product("p-1", 10)).await.unwrap();

        let result = repo
            .mutate("p-1", |product| {
                // Partial mutation before the failure must not leak out
                product.quantity_box = 0;
                Err::<(), _>(LedgerError::InsufficientStock {
                    unit: StockUnit::Boxes,
                    available: dec!(10),
                    requested: dec!(99),
                })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(repo.get("p-1").await.unwrap().quantity_box, 10);
    }

    #[tokio::test]
    async fn test_list_low_stock() {
        let repo = ProductRepository::new();
        repo.insert(test_product("p-1", 3)).await.unwrap();
        repo.insert(test_product("p-2", 50)).await.unwrap();

        let low = repo.list_low_stock().await;
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, "p-1");
    }
}
