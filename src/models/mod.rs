use std::sync::Arc;

use sqlx::{Pool, Sqlite};
use thiserror::Error;

use crate::auth::LoginManager;
use crate::config::AppConfig;

pub mod order;
pub mod stock;
pub mod supplier;
pub mod user;

pub use order::{
    CreateOrderRequest, ListOrdersQuery, NewOrder, Order, OrderChanges, OrderFilter, OrderStatus,
    UpdateOrderRequest,
};
pub use stock::{
    AdjustStockRequest, CreateStockItemRequest, ListStockQuery, StockAdjustment, StockItem,
    UpdateStockItemRequest, MAX_QUANTITY,
};
pub use supplier::{CreateSupplierRequest, Supplier, UpdateSupplierRequest};
pub use user::{NewUser, Role, User};

// Database errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DatabaseError {
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DatabaseError::Connection(sqlx::Error::Database(e)) => e.is_unique_violation(),
            _ => false,
        }
    }

    /// A delete or update refused because another row still references this one.
    pub fn is_foreign_key_violation(&self) -> bool {
        match self {
            DatabaseError::Connection(sqlx::Error::Database(e)) => e.is_foreign_key_violation(),
            _ => false,
        }
    }
}

// Application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Pool<Sqlite>>,
    pub config: Arc<AppConfig>,
    pub login_manager: LoginManager,
}
