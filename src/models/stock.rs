use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use utoipa::ToSchema;

use super::DatabaseError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StockItem {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub supplier_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateStockItemRequest {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default)]
    pub supplier_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateStockItemRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub unit_price: Option<f64>,
    #[serde(default)]
    pub supplier_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdjustStockRequest {
    pub delta: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListStockQuery {
    pub supplier_id: Option<i64>,
    /// Only items whose quantity is at or below this threshold.
    pub low_stock: Option<i64>,
}

/// Upper bound for a stored quantity and for a single adjustment.
pub const MAX_QUANTITY: i64 = 1_000_000_000;

/// Outcome of an atomic quantity adjustment.
#[derive(Debug)]
pub enum StockAdjustment {
    Applied(StockItem),
    Insufficient { available: i64 },
    OverCapacity { available: i64 },
    NotFound,
}

const STOCK_COLUMNS: &str = "id, sku, name, quantity, unit_price, supplier_id, created_at, updated_at";

impl StockItem {
    pub async fn create(pool: &SqlitePool, req: &CreateStockItemRequest) -> Result<StockItem, DatabaseError> {
        let item = sqlx::query_as::<_, StockItem>(&format!(
            r#"
            INSERT INTO stock_items (sku, name, quantity, unit_price, supplier_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            RETURNING {STOCK_COLUMNS}
            "#
        ))
        .bind(req.sku.trim())
        .bind(req.name.trim())
        .bind(req.quantity)
        .bind(req.unit_price)
        .bind(req.supplier_id)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;
        Ok(item)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<StockItem>, DatabaseError> {
        let item = sqlx::query_as::<_, StockItem>(&format!(
            "SELECT {STOCK_COLUMNS} FROM stock_items WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(item)
    }

    pub async fn find_by_sku(pool: &SqlitePool, sku: &str) -> Result<Option<StockItem>, DatabaseError> {
        let item = sqlx::query_as::<_, StockItem>(&format!(
            "SELECT {STOCK_COLUMNS} FROM stock_items WHERE sku = ?"
        ))
        .bind(sku.trim())
        .fetch_optional(pool)
        .await?;
        Ok(item)
    }

    pub async fn list(pool: &SqlitePool, filter: &ListStockQuery) -> Result<Vec<StockItem>, DatabaseError> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {STOCK_COLUMNS} FROM stock_items WHERE 1 = 1"));
        if let Some(supplier_id) = filter.supplier_id {
            query.push(" AND supplier_id = ").push_bind(supplier_id);
        }
        if let Some(threshold) = filter.low_stock {
            query.push(" AND quantity <= ").push_bind(threshold);
        }
        query.push(" ORDER BY name");

        let items = query.build_query_as::<StockItem>().fetch_all(pool).await?;
        Ok(items)
    }

    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        req: &UpdateStockItemRequest,
    ) -> Result<Option<StockItem>, DatabaseError> {
        let item = sqlx::query_as::<_, StockItem>(&format!(
            r#"
            UPDATE stock_items
            SET name = COALESCE(?, name),
                quantity = COALESCE(?, quantity),
                unit_price = COALESCE(?, unit_price),
                supplier_id = COALESCE(?, supplier_id),
                updated_at = ?
            WHERE id = ?
            RETURNING {STOCK_COLUMNS}
            "#
        ))
        .bind(req.name.as_deref().map(str::trim))
        .bind(req.quantity)
        .bind(req.unit_price)
        .bind(req.supplier_id)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(item)
    }

    /// Adds `delta` to the quantity in a single statement, keeping it within `0..=MAX_QUANTITY`.
    pub async fn adjust(pool: &SqlitePool, id: i64, delta: i64) -> Result<StockAdjustment, DatabaseError> {
        // Stored quantities are bounded, so the sum cannot leave SQLite's integer range
        if !(-MAX_QUANTITY..=MAX_QUANTITY).contains(&delta) {
            return Ok(match Self::find_by_id(pool, id).await? {
                Some(item) => StockAdjustment::OverCapacity {
                    available: item.quantity,
                },
                None => StockAdjustment::NotFound,
            });
        }

        let updated = sqlx::query_as::<_, StockItem>(&format!(
            r#"
            UPDATE stock_items
            SET quantity = quantity + ?1, updated_at = ?2
            WHERE id = ?3 AND quantity + ?1 >= 0 AND quantity + ?1 <= ?4
            RETURNING {STOCK_COLUMNS}
            "#
        ))
        .bind(delta)
        .bind(Utc::now())
        .bind(id)
        .bind(MAX_QUANTITY)
        .fetch_optional(pool)
        .await?;

        if let Some(item) = updated {
            return Ok(StockAdjustment::Applied(item));
        }

        Ok(match Self::find_by_id(pool, id).await? {
            Some(item) if item.quantity + delta < 0 => StockAdjustment::Insufficient {
                available: item.quantity,
            },
            Some(item) => StockAdjustment::OverCapacity {
                available: item.quantity,
            },
            None => StockAdjustment::NotFound,
        })
    }

    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM stock_items WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
