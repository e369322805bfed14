use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    middleware,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::models::{AppState, CreateSupplierRequest, ListStockQuery, StockItem, Supplier, UpdateSupplierRequest};
use crate::rbac::permissions;
use crate::rest::error::{ApiError, ApiResult};
use crate::rest::extract::ApiJson;
use crate::rest::handlers::require_text;
use crate::rest::handlers::stock::StockItemResponse;
use crate::rest::middleware::{auth_middleware, AuthContext};

#[derive(Debug, Serialize, ToSchema)]
pub struct SupplierResponse {
    pub id: i64,
    pub name: String,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Supplier> for SupplierResponse {
    fn from(supplier: Supplier) -> Self {
        Self {
            id: supplier.id,
            name: supplier.name,
            contact_email: supplier.contact_email,
            phone: supplier.phone,
            address: supplier.address,
            created_at: supplier.created_at.to_rfc3339(),
            updated_at: supplier.updated_at.to_rfc3339(),
        }
    }
}

/// Routes mounted under `/api/suppliers`.
pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_suppliers).post(create_supplier))
        .route("/{id}", get(get_supplier).put(update_supplier).delete(delete_supplier))
        .route("/{id}/stock", get(list_supplier_stock))
        .layer(middleware::from_fn_with_state(state, auth_middleware))
}

pub async fn list_suppliers(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<SupplierResponse>>> {
    let suppliers = Supplier::list(&state.db).await?;
    Ok(Json(suppliers.into_iter().map(Into::into).collect()))
}

pub async fn get_supplier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<SupplierResponse>> {
    let supplier = Supplier::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Supplier not found".to_string()))?;
    Ok(Json(supplier.into()))
}

pub async fn create_supplier(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateSupplierRequest>,
) -> ApiResult<(StatusCode, Json<SupplierResponse>)> {
    permissions::admin().require(&auth.identity)?;

    let name = require_text("name", &req.name)?;
    if Supplier::find_by_name(&state.db, name).await?.is_some() {
        return Err(ApiError::Conflict("Supplier already exists".to_string()));
    }

    let supplier = Supplier::create(&state.db, &req).await?;
    info!(supplier_id = supplier.id, name = %supplier.name, "Supplier created");
    Ok((StatusCode::CREATED, Json(supplier.into())))
}

pub async fn update_supplier(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<UpdateSupplierRequest>,
) -> ApiResult<Json<SupplierResponse>> {
    permissions::admin().require(&auth.identity)?;

    if let Some(name) = req.name.as_deref() {
        let name = require_text("name", name)?;
        if let Some(existing) = Supplier::find_by_name(&state.db, name).await? {
            if existing.id != id {
                return Err(ApiError::Conflict("Supplier already exists".to_string()));
            }
        }
    }

    let supplier = Supplier::update(&state.db, id, &req)
        .await?
        .ok_or(ApiError::NotFound("Supplier not found".to_string()))?;
    Ok(Json(supplier.into()))
}

pub async fn delete_supplier(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    permissions::admin().require(&auth.identity)?;

    let stocked = Supplier::stock_item_count(&state.db, id).await?;
    if stocked > 0 {
        return Err(ApiError::Conflict(format!(
            "Supplier still provides {stocked} stock item(s)"
        )));
    }

    if !Supplier::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Supplier not found".to_string()));
    }

    info!(supplier_id = id, "Supplier deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_supplier_stock(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<StockItemResponse>>> {
    Supplier::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Supplier not found".to_string()))?;

    let filter = ListStockQuery {
        supplier_id: Some(id),
        ..ListStockQuery::default()
    };
    let items = StockItem::list(&state.db, &filter).await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}
