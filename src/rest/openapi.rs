use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use crate::models::{
    AdjustStockRequest, CreateOrderRequest, CreateStockItemRequest, CreateSupplierRequest, OrderStatus,
    Role, UpdateOrderRequest, UpdateStockItemRequest, UpdateSupplierRequest,
};
use crate::rest::{
    auth::{LoginRequest, LoginResponse, RegisterRequest, UpdateUserRequest, UserResponse},
    error::{ErrorDetails, ErrorResponse},
    handlers::{orders::OrderResponse, stock::StockItemResponse, suppliers::SupplierResponse},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::rest::openapi::health,
        crate::rest::openapi::register,
        crate::rest::openapi::login,
        crate::rest::openapi::logout,
        crate::rest::openapi::me,
        crate::rest::openapi::list_users,
        crate::rest::openapi::update_user,
        crate::rest::openapi::list_orders,
        crate::rest::openapi::get_order,
        crate::rest::openapi::create_order,
        crate::rest::openapi::update_order,
        crate::rest::openapi::delete_order,
        crate::rest::openapi::list_suppliers,
        crate::rest::openapi::get_supplier,
        crate::rest::openapi::create_supplier,
        crate::rest::openapi::update_supplier,
        crate::rest::openapi::delete_supplier,
        crate::rest::openapi::list_supplier_stock,
        crate::rest::openapi::list_stock,
        crate::rest::openapi::get_stock_item,
        crate::rest::openapi::create_stock_item,
        crate::rest::openapi::update_stock_item,
        crate::rest::openapi::adjust_stock,
        crate::rest::openapi::delete_stock_item,
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UpdateUserRequest,
            UserResponse,
            Role,
            OrderStatus,
            CreateOrderRequest,
            UpdateOrderRequest,
            OrderResponse,
            CreateSupplierRequest,
            UpdateSupplierRequest,
            SupplierResponse,
            CreateStockItemRequest,
            UpdateStockItemRequest,
            AdjustStockRequest,
            StockItemResponse,
            ErrorResponse,
            ErrorDetails,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Auth", description = "Registration, login and user administration"),
        (name = "Orders", description = "Shipping orders"),
        (name = "Suppliers", description = "Supplier directory"),
        (name = "Stock", description = "Inventory"),
    ),
    info(
        title = "RapidXcel Logistics API",
        version = "0.1.0",
        description = "Orders, suppliers and stock for the RapidXcel logistics platform",
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("session"))),
            );
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
)]
#[allow(dead_code)]
pub async fn health() {}

// Auth endpoints
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Role cannot be self-registered", body = ErrorResponse),
        (status = 409, description = "Username or email taken", body = ErrorResponse),
    ),
)]
#[allow(dead_code)]
pub async fn register() {}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; session cookie set", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
    ),
)]
#[allow(dead_code)]
pub async fn login() {}

#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Session cookie cleared"),
    ),
)]
#[allow(dead_code)]
pub async fn logout() {}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
    ),
    security(("session_cookie" = []), ("bearer_auth" = [])),
)]
#[allow(dead_code)]
pub async fn me() {}

#[utoipa::path(
    get,
    path = "/auth/users",
    tag = "Auth",
    responses(
        (status = 200, description = "All users", body = Vec<UserResponse>),
        (status = 403, description = "Administrators only", body = ErrorResponse),
    ),
    security(("session_cookie" = []), ("bearer_auth" = [])),
)]
#[allow(dead_code)]
pub async fn list_users() {}

#[utoipa::path(
    put,
    path = "/auth/users/{id}",
    tag = "Auth",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Invalid update", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    ),
    security(("session_cookie" = []), ("bearer_auth" = [])),
)]
#[allow(dead_code)]
pub async fn update_user() {}

// Order endpoints
#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Orders",
    params(
        ("status" = Option<OrderStatus>, Query, description = "Filter by status"),
        ("courier_id" = Option<i64>, Query, description = "Filter by assigned courier"),
        ("customer_id" = Option<i64>, Query, description = "Filter by customer"),
    ),
    responses(
        (status = 200, description = "Orders visible to the caller, newest first", body = Vec<OrderResponse>),
    ),
    security(("session_cookie" = []), ("bearer_auth" = [])),
)]
#[allow(dead_code)]
pub async fn list_orders() {}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "Orders",
    params(("id" = i64, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order", body = OrderResponse),
        (status = 403, description = "Not visible to the caller", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
    ),
    security(("session_cookie" = []), ("bearer_auth" = [])),
)]
#[allow(dead_code)]
pub async fn get_order() {}

#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "Orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "Invalid order", body = ErrorResponse),
    ),
    security(("session_cookie" = []), ("bearer_auth" = [])),
)]
#[allow(dead_code)]
pub async fn create_order() {}

#[utoipa::path(
    put,
    path = "/api/orders/{id}",
    tag = "Orders",
    params(("id" = i64, Path, description = "Order ID")),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Order updated", body = OrderResponse),
        (status = 409, description = "Illegal status transition", body = ErrorResponse),
    ),
    security(("session_cookie" = []), ("bearer_auth" = [])),
)]
#[allow(dead_code)]
pub async fn update_order() {}

#[utoipa::path(
    delete,
    path = "/api/orders/{id}",
    tag = "Orders",
    params(("id" = i64, Path, description = "Order ID")),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 404, description = "Order not found", body = ErrorResponse),
    ),
    security(("session_cookie" = []), ("bearer_auth" = [])),
)]
#[allow(dead_code)]
pub async fn delete_order() {}

// Supplier endpoints
#[utoipa::path(
    get,
    path = "/api/suppliers",
    tag = "Suppliers",
    responses(
        (status = 200, description = "Suppliers by name", body = Vec<SupplierResponse>),
    ),
    security(("session_cookie" = []), ("bearer_auth" = [])),
)]
#[allow(dead_code)]
pub async fn list_suppliers() {}

#[utoipa::path(
    get,
    path = "/api/suppliers/{id}",
    tag = "Suppliers",
    params(("id" = i64, Path, description = "Supplier ID")),
    responses(
        (status = 200, description = "Supplier", body = SupplierResponse),
        (status = 404, description = "Supplier not found", body = ErrorResponse),
    ),
    security(("session_cookie" = []), ("bearer_auth" = [])),
)]
#[allow(dead_code)]
pub async fn get_supplier() {}

#[utoipa::path(
    post,
    path = "/api/suppliers",
    tag = "Suppliers",
    request_body = CreateSupplierRequest,
    responses(
        (status = 201, description = "Supplier created", body = SupplierResponse),
        (status = 409, description = "Name already taken", body = ErrorResponse),
    ),
    security(("session_cookie" = []), ("bearer_auth" = [])),
)]
#[allow(dead_code)]
pub async fn create_supplier() {}

#[utoipa::path(
    put,
    path = "/api/suppliers/{id}",
    tag = "Suppliers",
    params(("id" = i64, Path, description = "Supplier ID")),
    request_body = UpdateSupplierRequest,
    responses(
        (status = 200, description = "Supplier updated", body = SupplierResponse),
        (status = 404, description = "Supplier not found", body = ErrorResponse),
    ),
    security(("session_cookie" = []), ("bearer_auth" = [])),
)]
#[allow(dead_code)]
pub async fn update_supplier() {}

#[utoipa::path(
    delete,
    path = "/api/suppliers/{id}",
    tag = "Suppliers",
    params(("id" = i64, Path, description = "Supplier ID")),
    responses(
        (status = 204, description = "Supplier deleted"),
        (status = 409, description = "Supplier still referenced by stock", body = ErrorResponse),
    ),
    security(("session_cookie" = []), ("bearer_auth" = [])),
)]
#[allow(dead_code)]
pub async fn delete_supplier() {}

#[utoipa::path(
    get,
    path = "/api/suppliers/{id}/stock",
    tag = "Suppliers",
    params(("id" = i64, Path, description = "Supplier ID")),
    responses(
        (status = 200, description = "Stock items from this supplier", body = Vec<StockItemResponse>),
    ),
    security(("session_cookie" = []), ("bearer_auth" = [])),
)]
#[allow(dead_code)]
pub async fn list_supplier_stock() {}

// Stock endpoints
#[utoipa::path(
    get,
    path = "/api/stock",
    tag = "Stock",
    params(
        ("supplier_id" = Option<i64>, Query, description = "Filter by supplier"),
        ("low_stock" = Option<i64>, Query, description = "Only items at or below this quantity"),
    ),
    responses(
        (status = 200, description = "Stock items", body = Vec<StockItemResponse>),
    ),
    security(("session_cookie" = []), ("bearer_auth" = [])),
)]
#[allow(dead_code)]
pub async fn list_stock() {}

#[utoipa::path(
    get,
    path = "/api/stock/{id}",
    tag = "Stock",
    params(("id" = i64, Path, description = "Stock item ID")),
    responses(
        (status = 200, description = "Stock item", body = StockItemResponse),
        (status = 404, description = "Stock item not found", body = ErrorResponse),
    ),
    security(("session_cookie" = []), ("bearer_auth" = [])),
)]
#[allow(dead_code)]
pub async fn get_stock_item() {}

#[utoipa::path(
    post,
    path = "/api/stock",
    tag = "Stock",
    request_body = CreateStockItemRequest,
    responses(
        (status = 201, description = "Stock item created", body = StockItemResponse),
        (status = 409, description = "SKU already exists", body = ErrorResponse),
    ),
    security(("session_cookie" = []), ("bearer_auth" = [])),
)]
#[allow(dead_code)]
pub async fn create_stock_item() {}

#[utoipa::path(
    put,
    path = "/api/stock/{id}",
    tag = "Stock",
    params(("id" = i64, Path, description = "Stock item ID")),
    request_body = UpdateStockItemRequest,
    responses(
        (status = 200, description = "Stock item updated", body = StockItemResponse),
        (status = 404, description = "Stock item not found", body = ErrorResponse),
    ),
    security(("session_cookie" = []), ("bearer_auth" = [])),
)]
#[allow(dead_code)]
pub async fn update_stock_item() {}

#[utoipa::path(
    post,
    path = "/api/stock/{id}/adjust",
    tag = "Stock",
    params(("id" = i64, Path, description = "Stock item ID")),
    request_body = AdjustStockRequest,
    responses(
        (status = 200, description = "Quantity adjusted", body = StockItemResponse),
        (status = 409, description = "Insufficient stock", body = ErrorResponse),
    ),
    security(("session_cookie" = []), ("bearer_auth" = [])),
)]
#[allow(dead_code)]
pub async fn adjust_stock() {}

#[utoipa::path(
    delete,
    path = "/api/stock/{id}",
    tag = "Stock",
    params(("id" = i64, Path, description = "Stock item ID")),
    responses(
        (status = 204, description = "Stock item deleted"),
        (status = 404, description = "Stock item not found", body = ErrorResponse),
    ),
    security(("session_cookie" = []), ("bearer_auth" = [])),
)]
#[allow(dead_code)]
pub async fn delete_stock_item() {}
