use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool, Type};
use std::fmt;
use utoipa::ToSchema;

use super::DatabaseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
pub enum OrderStatus {
    Pending,
    Processing,
    #[sqlx(rename = "In Transit")]
    #[serde(rename = "In Transit")]
    InTransit,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn can_transition_to(&self, target: &OrderStatus) -> bool {
        match (self, target) {
            (OrderStatus::Pending, OrderStatus::Processing) => true,
            (OrderStatus::Pending, OrderStatus::Cancelled) => true,

            (OrderStatus::Processing, OrderStatus::InTransit) => true,
            (OrderStatus::Processing, OrderStatus::Cancelled) => true,

            (OrderStatus::InTransit, OrderStatus::Delivered) => true,

            // Delivered and Cancelled are terminal, and no state moves to itself
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processing => "Processing",
            OrderStatus::InTransit => "In Transit",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub courier_id: Option<i64>,
    pub shipping_address: String,
    pub consignment_weight: f64,
    #[sqlx(json)]
    pub order_items: Vec<String>,
    pub shipping_cost: f64,
    pub delivery_date: Option<NaiveDate>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub shipping_address: String,
    pub consignment_weight: f64,
    pub order_items: Vec<String>,
    #[serde(default)]
    pub shipping_cost: Option<f64>,
    #[serde(default)]
    pub delivery_date: Option<NaiveDate>,
    /// Only honoured for administrators; customers always order for themselves.
    #[serde(default)]
    pub customer_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateOrderRequest {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub courier_id: Option<i64>,
    #[serde(default)]
    pub delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub shipping_address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<OrderStatus>,
    pub courier_id: Option<i64>,
    pub customer_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub courier_id: Option<i64>,
    pub customer_id: Option<i64>,
}

/// Already-validated column changes for a single order.
#[derive(Debug, Clone, Default)]
pub struct OrderChanges {
    pub status: Option<OrderStatus>,
    pub courier_id: Option<i64>,
    pub delivery_date: Option<NaiveDate>,
    pub shipping_address: Option<String>,
}

/// Row values for a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: i64,
    pub shipping_address: String,
    pub consignment_weight: f64,
    pub order_items: Vec<String>,
    pub shipping_cost: f64,
    pub delivery_date: Option<NaiveDate>,
}

const ORDER_COLUMNS: &str = "id, customer_id, courier_id, shipping_address, consignment_weight, \
     order_items, shipping_cost, delivery_date, status, created_at, updated_at";

impl Order {
    pub async fn create(pool: &SqlitePool, new_order: NewOrder) -> Result<Order, DatabaseError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders (
                customer_id, shipping_address, consignment_weight, order_items,
                shipping_cost, delivery_date, status, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(new_order.customer_id)
        .bind(&new_order.shipping_address)
        .bind(new_order.consignment_weight)
        .bind(Json(&new_order.order_items))
        .bind(new_order.shipping_cost)
        .bind(new_order.delivery_date)
        .bind(OrderStatus::Pending)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;
        Ok(order)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Order>, DatabaseError> {
        let order = sqlx::query_as::<_, Order>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(order)
    }

    pub async fn find_all(pool: &SqlitePool, filter: &OrderFilter) -> Result<Vec<Order>, DatabaseError> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders WHERE 1 = 1"));
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        if let Some(courier_id) = filter.courier_id {
            query.push(" AND courier_id = ").push_bind(courier_id);
        }
        if let Some(customer_id) = filter.customer_id {
            query.push(" AND customer_id = ").push_bind(customer_id);
        }
        query.push(" ORDER BY created_at DESC, id DESC");

        let orders = query.build_query_as::<Order>().fetch_all(pool).await?;
        Ok(orders)
    }

    /// Applies `changes` only if the order is still in `expected_status`.
    ///
    /// Returns `None` when the row is missing or its status moved underneath us.
    pub async fn apply_changes(
        pool: &SqlitePool,
        id: i64,
        expected_status: OrderStatus,
        changes: &OrderChanges,
    ) -> Result<Option<Order>, DatabaseError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            UPDATE orders
            SET status = COALESCE(?, status),
                courier_id = COALESCE(?, courier_id),
                delivery_date = COALESCE(?, delivery_date),
                shipping_address = COALESCE(?, shipping_address),
                updated_at = ?
            WHERE id = ? AND status = ?
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(changes.status)
        .bind(changes.courier_id)
        .bind(changes.delivery_date)
        .bind(changes.shipping_address.as_deref())
        .bind(Utc::now())
        .bind(id)
        .bind(expected_status)
        .fetch_optional(pool)
        .await?;
        Ok(order)
    }

    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
