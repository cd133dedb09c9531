//! Postgres-backed inventory store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | InventoryError | Scenario |
//! |------------|----------------------|----------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | Racing insert of the same (sku, hub) pair |
//! | Database (check constraint violation) | `23514` | `Validation` | Negative unit price |
//! | Database (other) | Any other | `Store` | Other database errors |
//! | PoolClosed / Io / Other | N/A | `Store` | Connection failures |
//!
//! ## Locking
//!
//! `lock_quantity` issues `SELECT … FOR UPDATE` inside the transaction opened
//! by `begin_stock_transaction`, so the row lock is held until the returned
//! [`StockTransaction`] is committed, rolled back or dropped.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use ims_core::{HubId, SkuId};
use ims_inventory::{
    InventoryError, InventoryKey, InventoryRecord, InventoryResult, InventoryStore,
    StockTransaction,
};

#[derive(Debug, Clone)]
pub struct PostgresInventoryStore {
    pool: Arc<PgPool>,
}

impl PostgresInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl InventoryStore for PostgresInventoryStore {
    #[instrument(skip(self), fields(sku_id = %key.sku_id, hub_id = %key.hub_id), err)]
    async fn find(&self, key: InventoryKey) -> InventoryResult<Option<InventoryRecord>> {
        let row = sqlx::query(
            r#"
            SELECT sku_id, hub_id, quantity, unit_price
            FROM inventory
            WHERE sku_id = $1 AND hub_id = $2
            "#,
        )
        .bind(key.sku_id.get())
        .bind(key.hub_id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find", e))?;

        row.as_ref()
            .map(record_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("decode_inventory", e))
    }

    #[instrument(
        skip(self, record),
        fields(sku_id = %record.sku_id, hub_id = %record.hub_id, quantity = record.quantity),
        err
    )]
    async fn insert(&self, record: &InventoryRecord) -> InventoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO inventory (sku_id, hub_id, quantity, unit_price)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(record.sku_id.get())
        .bind(record.hub_id.get())
        .bind(record.quantity)
        .bind(record.unit_price)
        .execute(&*self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                InventoryError::conflict(format!(
                    "inventory for {} was created concurrently",
                    record.key()
                ))
            } else {
                map_sqlx_error("insert", e)
            }
        })?;

        Ok(())
    }

    #[instrument(
        skip(self, record),
        fields(sku_id = %record.sku_id, hub_id = %record.hub_id, quantity = record.quantity),
        err
    )]
    async fn overwrite(&self, record: &InventoryRecord) -> InventoryResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET quantity = $3, unit_price = $4
            WHERE sku_id = $1 AND hub_id = $2
            "#,
        )
        .bind(record.sku_id.get())
        .bind(record.hub_id.get())
        .bind(record.quantity)
        .bind(record.unit_price)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("overwrite", e))?;

        if result.rows_affected() == 0 {
            return Err(InventoryError::NotFound {
                sku_id: record.sku_id,
                hub_id: record.hub_id,
            });
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list_all(&self) -> InventoryResult<Vec<InventoryRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT sku_id, hub_id, quantity, unit_price
            FROM inventory
            ORDER BY sku_id, hub_id
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_all", e))?;

        decode_rows(&rows)
    }

    #[instrument(skip(self), fields(hub_id = %hub_id), err)]
    async fn list_by_hub(&self, hub_id: HubId) -> InventoryResult<Vec<InventoryRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT sku_id, hub_id, quantity, unit_price
            FROM inventory
            WHERE hub_id = $1
            ORDER BY sku_id
            "#,
        )
        .bind(hub_id.get())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_by_hub", e))?;

        decode_rows(&rows)
    }

    #[instrument(skip(self), fields(sku_id = %sku_id), err)]
    async fn list_by_sku(&self, sku_id: SkuId) -> InventoryResult<Vec<InventoryRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT sku_id, hub_id, quantity, unit_price
            FROM inventory
            WHERE sku_id = $1
            ORDER BY hub_id
            "#,
        )
        .bind(sku_id.get())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_by_sku", e))?;

        decode_rows(&rows)
    }

    #[instrument(skip(self), err)]
    async fn begin_stock_transaction(&self) -> InventoryResult<Box<dyn StockTransaction>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(Box::new(PostgresStockTransaction { tx }))
    }
}

/// An open Postgres transaction. Dropping it without commit rolls back.
pub struct PostgresStockTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StockTransaction for PostgresStockTransaction {
    #[instrument(skip(self), fields(sku_id = %key.sku_id, hub_id = %key.hub_id), err)]
    async fn lock_quantity(&mut self, key: InventoryKey) -> InventoryResult<i64> {
        let quantity: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT quantity
            FROM inventory
            WHERE sku_id = $1 AND hub_id = $2
            FOR UPDATE
            "#,
        )
        .bind(key.sku_id.get())
        .bind(key.hub_id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("lock_quantity", e))?;

        quantity.ok_or(InventoryError::NotFound {
            sku_id: key.sku_id,
            hub_id: key.hub_id,
        })
    }

    #[instrument(skip(self), fields(sku_id = %key.sku_id, hub_id = %key.hub_id), err)]
    async fn write_quantity(&mut self, key: InventoryKey, quantity: i64) -> InventoryResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET quantity = $3
            WHERE sku_id = $1 AND hub_id = $2
            "#,
        )
        .bind(key.sku_id.get())
        .bind(key.hub_id.get())
        .bind(quantity)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("write_quantity", e))?;

        if result.rows_affected() == 0 {
            return Err(InventoryError::NotFound {
                sku_id: key.sku_id,
                hub_id: key.hub_id,
            });
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> InventoryResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    async fn rollback(self: Box<Self>) -> InventoryResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }
}

fn record_from_row(row: &PgRow) -> Result<InventoryRecord, sqlx::Error> {
    Ok(InventoryRecord::new(
        SkuId::new(row.try_get("sku_id")?),
        HubId::new(row.try_get("hub_id")?),
        row.try_get("quantity")?,
        row.try_get("unit_price")?,
    ))
}

fn decode_rows(rows: &[PgRow]) -> InventoryResult<Vec<InventoryRecord>> {
    rows.iter()
        .map(record_from_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| map_sqlx_error("decode_inventory", e))
}

/// Map SQLx errors to inventory errors with operation context.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> InventoryError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => InventoryError::Conflict(msg),
                Some("23514") => InventoryError::Validation(msg),
                _ => InventoryError::Store(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            InventoryError::store(format!("connection pool closed in {}", operation))
        }
        _ => InventoryError::store(format!("sqlx error in {}: {}", operation, err)),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}
