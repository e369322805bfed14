use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use utoipa::ToSchema;

use super::DatabaseError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateSupplierRequest {
    pub name: String,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateSupplierRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

const SUPPLIER_COLUMNS: &str = "id, name, contact_email, phone, address, created_at, updated_at";

impl Supplier {
    pub async fn create(pool: &SqlitePool, req: &CreateSupplierRequest) -> Result<Supplier, DatabaseError> {
        let now = Utc::now();
        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            r#"
            INSERT INTO suppliers (name, contact_email, phone, address, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            RETURNING {SUPPLIER_COLUMNS}
            "#
        ))
        .bind(req.name.trim())
        .bind(&req.contact_email)
        .bind(&req.phone)
        .bind(&req.address)
        .bind(now)
        .fetch_one(pool)
        .await?;
        Ok(supplier)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Supplier>, DatabaseError> {
        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(supplier)
    }

    pub async fn find_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Supplier>, DatabaseError> {
        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE name = ?"
        ))
        .bind(name.trim())
        .fetch_optional(pool)
        .await?;
        Ok(supplier)
    }

    pub async fn list(pool: &SqlitePool) -> Result<Vec<Supplier>, DatabaseError> {
        let suppliers = sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers ORDER BY name"
        ))
        .fetch_all(pool)
        .await?;
        Ok(suppliers)
    }

    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        req: &UpdateSupplierRequest,
    ) -> Result<Option<Supplier>, DatabaseError> {
        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            r#"
            UPDATE suppliers
            SET name = COALESCE(?, name),
                contact_email = COALESCE(?, contact_email),
                phone = COALESCE(?, phone),
                address = COALESCE(?, address),
                updated_at = ?
            WHERE id = ?
            RETURNING {SUPPLIER_COLUMNS}
            "#
        ))
        .bind(req.name.as_deref().map(str::trim))
        .bind(&req.contact_email)
        .bind(&req.phone)
        .bind(&req.address)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(supplier)
    }

    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn stock_item_count(pool: &SqlitePool, id: i64) -> Result<i64, DatabaseError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM stock_items WHERE supplier_id = ?")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
