use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    middleware,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::models::{
    AppState, CreateOrderRequest, ListOrdersQuery, NewOrder, Order, OrderChanges, OrderFilter,
    OrderStatus, Role, UpdateOrderRequest, User,
};
use crate::rbac::{permissions, Identity, Need, Permission};
use crate::rest::error::{ApiError, ApiResult};
use crate::rest::extract::ApiJson;
use crate::rest::handlers::{require_non_negative, require_text};
use crate::rest::middleware::{auth_middleware, AuthContext};

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: i64,
    pub customer_id: i64,
    pub courier_id: Option<i64>,
    pub shipping_address: String,
    pub consignment_weight: f64,
    pub order_items: Vec<String>,
    pub shipping_cost: f64,
    pub delivery_date: Option<String>,
    pub status: OrderStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            customer_id: order.customer_id,
            courier_id: order.courier_id,
            shipping_address: order.shipping_address,
            consignment_weight: order.consignment_weight,
            order_items: order.order_items,
            shipping_cost: order.shipping_cost,
            delivery_date: order.delivery_date.map(|d| d.format("%Y-%m-%d").to_string()),
            status: order.status,
            created_at: order.created_at.to_rfc3339(),
            updated_at: order.updated_at.to_rfc3339(),
        }
    }
}

/// Routes mounted under `/api/orders`.
pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/{id}", get(get_order).put(update_order).delete(delete_order))
        .layer(middleware::from_fn_with_state(state, auth_middleware))
}

fn order_readers() -> Permission {
    Permission::roles(&[Role::Admin, Role::Courier, Role::Customer])
}

/// The customer who placed the order, its courier, or an administrator.
fn order_viewers(order: &Order) -> Permission {
    let mut needs = vec![Need::User(order.customer_id)];
    if let Some(courier_id) = order.courier_id {
        needs.push(Need::User(courier_id));
    }
    Permission::new(needs).union(&permissions::admin())
}

/// Narrows a list query to what the caller may see.
pub fn scoped_filter(identity: &Identity, query: ListOrdersQuery) -> Result<OrderFilter, ApiError> {
    order_readers().require(identity)?;

    let mut filter = OrderFilter {
        status: query.status,
        courier_id: query.courier_id,
        customer_id: query.customer_id,
    };
    if identity.is_admin() {
        return Ok(filter);
    }

    let caller = identity.user_id.ok_or(ApiError::Unauthorized)?;
    if identity.has_role(Role::Courier) {
        if query.courier_id.is_some_and(|id| id != caller) {
            return Err(ApiError::Forbidden("Couriers can only list their own deliveries".to_string()));
        }
        filter.courier_id = Some(caller);
    } else {
        if query.customer_id.is_some_and(|id| id != caller) {
            return Err(ApiError::Forbidden("Customers can only list their own orders".to_string()));
        }
        filter.customer_id = Some(caller);
    }
    Ok(filter)
}

/// Validates an update against the caller's role and the order's current status.
///
/// Courier assignment still has to be checked against the database.
pub fn plan_update(
    order: &Order,
    identity: &Identity,
    req: UpdateOrderRequest,
) -> Result<OrderChanges, ApiError> {
    permissions::courier_or_admin().require(identity)?;

    if req.status.is_none()
        && req.courier_id.is_none()
        && req.delivery_date.is_none()
        && req.shipping_address.is_none()
    {
        return Err(ApiError::BadRequest("Nothing to update".to_string()));
    }

    if !identity.is_admin() {
        if order.courier_id.is_none() || order.courier_id != identity.user_id {
            return Err(ApiError::Forbidden("Order is not assigned to you".to_string()));
        }
        if req.courier_id.is_some() || req.delivery_date.is_some() || req.shipping_address.is_some() {
            return Err(ApiError::Forbidden("Couriers may only update the order status".to_string()));
        }
    }

    if order.status.is_terminal() {
        return Err(ApiError::Conflict(format!("Order is already {}", order.status)));
    }

    if let Some(target) = req.status {
        if !order.status.can_transition_to(&target) {
            return Err(ApiError::Conflict(format!(
                "Cannot move order from {} to {}",
                order.status, target
            )));
        }
    }

    let shipping_address = match req.shipping_address {
        Some(address) => Some(require_text("shipping_address", &address)?.to_string()),
        None => None,
    };

    Ok(OrderChanges {
        status: req.status,
        courier_id: req.courier_id,
        delivery_date: req.delivery_date,
        shipping_address,
    })
}

pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListOrdersQuery>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<OrderResponse>>> {
    let filter = scoped_filter(&auth.identity, query)?;
    let orders = Order::find_all(&state.db, &filter).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<OrderResponse>> {
    let order = Order::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Order not found".to_string()))?;

    order_viewers(&order).require(&auth.identity)?;
    Ok(Json(order.into()))
}

pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<OrderResponse>)> {
    permissions::order_creators().require(&auth.identity)?;

    let shipping_address = require_text("shipping_address", &req.shipping_address)?.to_string();
    if !req.consignment_weight.is_finite() || req.consignment_weight <= 0.0 {
        return Err(ApiError::BadRequest("consignment_weight must be greater than zero".to_string()));
    }
    if req.order_items.is_empty() {
        return Err(ApiError::BadRequest("order_items must not be empty".to_string()));
    }
    let order_items = req
        .order_items
        .iter()
        .map(|item| require_text("order_items", item).map(str::to_string))
        .collect::<Result<Vec<_>, _>>()?;

    let shipping_cost = match req.shipping_cost {
        Some(cost) => require_non_negative("shipping_cost", cost)?,
        None => state.config.shipping.quote(req.consignment_weight),
    };

    let customer_id = match req.customer_id {
        Some(id) if id != auth.user.id => {
            if !auth.identity.is_admin() {
                return Err(ApiError::Forbidden("Cannot place orders for other customers".to_string()));
            }
            let is_customer = User::find_by_id(&state.db, id)
                .await?
                .is_some_and(|user| user.role == Role::Customer);
            if !is_customer {
                return Err(ApiError::BadRequest(format!("User {id} is not a customer")));
            }
            id
        }
        _ => auth.user.id,
    };

    let order = Order::create(
        &state.db,
        NewOrder {
            customer_id,
            shipping_address,
            consignment_weight: req.consignment_weight,
            order_items,
            shipping_cost,
            delivery_date: req.delivery_date,
        },
    )
    .await?;

    info!(order_id = order.id, customer_id, shipping_cost, "Order created");
    Ok((StatusCode::CREATED, Json(order.into())))
}

pub async fn update_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<UpdateOrderRequest>,
) -> ApiResult<Json<OrderResponse>> {
    let order = Order::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Order not found".to_string()))?;

    let changes = plan_update(&order, &auth.identity, req)?;

    if let Some(courier_id) = changes.courier_id {
        let is_courier = User::find_by_id(&state.db, courier_id)
            .await?
            .is_some_and(|user| user.active && user.role == Role::Courier);
        if !is_courier {
            return Err(ApiError::BadRequest(format!("User {courier_id} is not an active courier")));
        }
    }

    // Guarded on the status we validated against
    let updated = Order::apply_changes(&state.db, id, order.status, &changes)
        .await?
        .ok_or_else(|| ApiError::Conflict("Order was modified concurrently, retry".to_string()))?;

    info!(
        order_id = updated.id,
        from = %order.status,
        to = %updated.status,
        user = %auth.user.username,
        "Order updated"
    );
    Ok(Json(updated.into()))
}

pub async fn delete_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    permissions::admin().require(&auth.identity)?;

    if !Order::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Order not found".to_string()));
    }

    info!(order_id = id, "Order deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: i64, role: Role) -> User {
        User {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
            password_hash: String::new(),
            role,
            active: true,
            created_at: Utc::now(),
            last_login_at: None,
        }
    }

    fn order(status: OrderStatus, courier_id: Option<i64>) -> Order {
        Order {
            id: 1,
            customer_id: 10,
            courier_id,
            shipping_address: "1 Dock Road".to_string(),
            consignment_weight: 2.5,
            order_items: vec!["pallet".to_string()],
            shipping_cost: 8.75,
            delivery_date: None,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn status_only(status: OrderStatus) -> UpdateOrderRequest {
        UpdateOrderRequest {
            status: Some(status),
            ..UpdateOrderRequest::default()
        }
    }

    #[test]
    fn customers_are_scoped_to_their_own_orders() {
        let customer = Identity::for_user(&user(10, Role::Customer));
        let filter = scoped_filter(&customer, ListOrdersQuery::default()).unwrap();
        assert_eq!(filter.customer_id, Some(10));

        let query = ListOrdersQuery {
            customer_id: Some(11),
            ..ListOrdersQuery::default()
        };
        assert!(matches!(scoped_filter(&customer, query), Err(ApiError::Forbidden(_))));
    }

    #[test]
    fn couriers_are_scoped_to_their_deliveries() {
        let courier = Identity::for_user(&user(3, Role::Courier));
        let query = ListOrdersQuery {
            status: Some(OrderStatus::InTransit),
            ..ListOrdersQuery::default()
        };
        let filter = scoped_filter(&courier, query).unwrap();
        assert_eq!(filter.courier_id, Some(3));
        assert_eq!(filter.status, Some(OrderStatus::InTransit));
        assert_eq!(filter.customer_id, None);
    }

    #[test]
    fn admins_keep_requested_filters_and_suppliers_are_refused() {
        let admin = Identity::for_user(&user(1, Role::Admin));
        let query = ListOrdersQuery {
            courier_id: Some(3),
            ..ListOrdersQuery::default()
        };
        let filter = scoped_filter(&admin, query).unwrap();
        assert_eq!(filter.courier_id, Some(3));
        assert_eq!(filter.customer_id, None);

        let supplier = Identity::for_user(&user(4, Role::Supplier));
        assert!(scoped_filter(&supplier, ListOrdersQuery::default()).is_err());
    }

    #[test]
    fn assigned_courier_may_advance_status() {
        let courier = Identity::for_user(&user(3, Role::Courier));
        let changes = plan_update(
            &order(OrderStatus::Processing, Some(3)),
            &courier,
            status_only(OrderStatus::InTransit),
        )
        .unwrap();
        assert_eq!(changes.status, Some(OrderStatus::InTransit));
    }

    #[test]
    fn unassigned_courier_is_refused() {
        let courier = Identity::for_user(&user(3, Role::Courier));
        let result = plan_update(
            &order(OrderStatus::Processing, Some(9)),
            &courier,
            status_only(OrderStatus::InTransit),
        );
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[test]
    fn courier_cannot_reassign_orders() {
        let courier = Identity::for_user(&user(3, Role::Courier));
        let req = UpdateOrderRequest {
            courier_id: Some(4),
            ..UpdateOrderRequest::default()
        };
        let result = plan_update(&order(OrderStatus::Pending, Some(3)), &courier, req);
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[test]
    fn illegal_transition_is_a_conflict() {
        let admin = Identity::for_user(&user(1, Role::Admin));
        let result = plan_update(
            &order(OrderStatus::Pending, None),
            &admin,
            status_only(OrderStatus::Delivered),
        );
        assert!(matches!(result, Err(ApiError::Conflict(_))));
    }

    #[test]
    fn terminal_orders_cannot_be_edited() {
        let admin = Identity::for_user(&user(1, Role::Admin));
        let req = UpdateOrderRequest {
            shipping_address: Some("2 Quay Street".to_string()),
            ..UpdateOrderRequest::default()
        };
        let result = plan_update(&order(OrderStatus::Delivered, None), &admin, req);
        assert!(matches!(result, Err(ApiError::Conflict(_))));
    }

    #[test]
    fn empty_update_is_a_bad_request() {
        let admin = Identity::for_user(&user(1, Role::Admin));
        let result = plan_update(
            &order(OrderStatus::Pending, None),
            &admin,
            UpdateOrderRequest::default(),
        );
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn customers_cannot_update_orders() {
        let customer = Identity::for_user(&user(10, Role::Customer));
        let result = plan_update(
            &order(OrderStatus::Pending, None),
            &customer,
            status_only(OrderStatus::Cancelled),
        );
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[test]
    fn viewers_are_customer_courier_and_admin() {
        let order = order(OrderStatus::InTransit, Some(3));
        let viewers = order_viewers(&order);
        assert!(viewers.allows(&Identity::for_user(&user(10, Role::Customer))));
        assert!(viewers.allows(&Identity::for_user(&user(3, Role::Courier))));
        assert!(viewers.allows(&Identity::for_user(&user(1, Role::Admin))));
        assert!(!viewers.allows(&Identity::for_user(&user(11, Role::Customer))));
    }
}
