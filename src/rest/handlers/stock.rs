use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::models::{
    AdjustStockRequest, AppState, CreateStockItemRequest, ListStockQuery, StockAdjustment, StockItem,
    Supplier, UpdateStockItemRequest, MAX_QUANTITY,
};
use crate::rbac::permissions;
use crate::rest::error::{ApiError, ApiResult};
use crate::rest::extract::ApiJson;
use crate::rest::handlers::{require_non_negative, require_text};
use crate::rest::middleware::{auth_middleware, AuthContext};

#[derive(Debug, Serialize, ToSchema)]
pub struct StockItemResponse {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub supplier_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<StockItem> for StockItemResponse {
    fn from(item: StockItem) -> Self {
        Self {
            id: item.id,
            sku: item.sku,
            name: item.name,
            quantity: item.quantity,
            unit_price: item.unit_price,
            supplier_id: item.supplier_id,
            created_at: item.created_at.to_rfc3339(),
            updated_at: item.updated_at.to_rfc3339(),
        }
    }
}

/// Routes mounted under `/api/stock`.
pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_stock).post(create_stock_item))
        .route("/{id}", get(get_stock_item).put(update_stock_item).delete(delete_stock_item))
        .route("/{id}/adjust", post(adjust_stock))
        .layer(middleware::from_fn_with_state(state, auth_middleware))
}

async fn ensure_supplier_exists(state: &AppState, supplier_id: Option<i64>) -> ApiResult<()> {
    if let Some(id) = supplier_id {
        if Supplier::find_by_id(&state.db, id).await?.is_none() {
            return Err(ApiError::BadRequest(format!("Supplier {id} does not exist")));
        }
    }
    Ok(())
}

fn require_quantity(quantity: i64) -> ApiResult<i64> {
    if quantity < 0 {
        return Err(ApiError::BadRequest("quantity must not be negative".to_string()));
    }
    if quantity > MAX_QUANTITY {
        return Err(ApiError::BadRequest(format!("quantity must not exceed {MAX_QUANTITY}")));
    }
    Ok(quantity)
}

fn require_delta(delta: i64) -> ApiResult<i64> {
    if delta == 0 {
        return Err(ApiError::BadRequest("delta must not be zero".to_string()));
    }
    if !(-MAX_QUANTITY..=MAX_QUANTITY).contains(&delta) {
        return Err(ApiError::BadRequest(format!(
            "delta must be between -{MAX_QUANTITY} and {MAX_QUANTITY}"
        )));
    }
    Ok(delta)
}

pub async fn list_stock(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListStockQuery>,
) -> ApiResult<Json<Vec<StockItemResponse>>> {
    let items = StockItem::list(&state.db, &query).await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

pub async fn get_stock_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<StockItemResponse>> {
    let item = StockItem::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Stock item not found".to_string()))?;
    Ok(Json(item.into()))
}

pub async fn create_stock_item(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateStockItemRequest>,
) -> ApiResult<(StatusCode, Json<StockItemResponse>)> {
    permissions::stock_managers().require(&auth.identity)?;

    let sku = require_text("sku", &req.sku)?;
    require_text("name", &req.name)?;
    require_quantity(req.quantity)?;
    require_non_negative("unit_price", req.unit_price)?;
    ensure_supplier_exists(&state, req.supplier_id).await?;

    if StockItem::find_by_sku(&state.db, sku).await?.is_some() {
        return Err(ApiError::Conflict(format!("SKU {sku} already exists")));
    }

    let item = StockItem::create(&state.db, &req).await?;
    info!(stock_id = item.id, sku = %item.sku, quantity = item.quantity, "Stock item created");
    Ok((StatusCode::CREATED, Json(item.into())))
}

pub async fn update_stock_item(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<UpdateStockItemRequest>,
) -> ApiResult<Json<StockItemResponse>> {
    permissions::stock_managers().require(&auth.identity)?;

    if let Some(name) = req.name.as_deref() {
        require_text("name", name)?;
    }
    if let Some(quantity) = req.quantity {
        require_quantity(quantity)?;
    }
    if let Some(unit_price) = req.unit_price {
        require_non_negative("unit_price", unit_price)?;
    }
    ensure_supplier_exists(&state, req.supplier_id).await?;

    let item = StockItem::update(&state.db, id, &req)
        .await?
        .ok_or(ApiError::NotFound("Stock item not found".to_string()))?;
    Ok(Json(item.into()))
}

pub async fn adjust_stock(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<AdjustStockRequest>,
) -> ApiResult<Json<StockItemResponse>> {
    permissions::stock_managers().require(&auth.identity)?;

    let delta = require_delta(req.delta)?;

    match StockItem::adjust(&state.db, id, delta).await? {
        StockAdjustment::Applied(item) => {
            info!(stock_id = id, delta, quantity = item.quantity, "Stock adjusted");
            Ok(Json(item.into()))
        }
        StockAdjustment::Insufficient { available } => {
            warn!(stock_id = id, delta, available, "Refused stock adjustment");
            Err(ApiError::Conflict(format!(
                "Insufficient stock: {available} available"
            )))
        }
        StockAdjustment::OverCapacity { available } => {
            warn!(stock_id = id, delta, available, "Refused stock adjustment above capacity");
            Err(ApiError::BadRequest(format!(
                "quantity must not exceed {MAX_QUANTITY}, {available} in stock"
            )))
        }
        StockAdjustment::NotFound => Err(ApiError::NotFound("Stock item not found".to_string())),
    }
}

pub async fn delete_stock_item(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    permissions::admin().require(&auth.identity)?;

    if !StockItem::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Stock item not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
