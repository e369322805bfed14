use std::sync::Arc;

use axum::{
    http::{HeaderValue, StatusCode},
    middleware,
    response::Html,
    routing::get,
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::LoginManager;
use crate::config::{AppConfig, ConfigOverride, CorsResource};
use crate::database::init_database;
use crate::models::AppState;
use crate::rest::{
    auth, handlers, logging_middleware::request_logging_middleware, openapi::ApiDoc,
};

pub const SERVICE_NAME: &str = "rapidxcel-logistics";

/// A fully wired application: resolved config, shared state and the router serving it.
pub struct App {
    pub config: Arc<AppConfig>,
    pub state: Arc<AppState>,
    pub router: Router,
}

/// Builds the application.
///
/// With `test_config` the instance config file is not consulted and the
/// overrides are applied on top of defaults and environment instead.
pub async fn create_app(test_config: Option<ConfigOverride>) -> anyhow::Result<App> {
    let config = Arc::new(AppConfig::load(test_config)?);

    if let Err(e) = std::fs::create_dir_all(&config.instance_path) {
        warn!(
            path = %config.instance_path.display(),
            error = %e,
            "Could not create instance directory"
        );
    }

    let db = init_database(&config).await?;
    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        login_manager: LoginManager::new(&config),
    });

    let router = create_router(state.clone());
    info!(instance = %config.instance_path.display(), "Application created");

    Ok(App {
        config,
        state,
        router,
    })
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = &state.config.cors;

    let api_routes = Router::new()
        .nest("/orders", handlers::orders::router(state.clone()))
        .nest("/suppliers", handlers::suppliers::router(state.clone()))
        .nest("/stock", handlers::stock::router(state.clone()));
    let api_routes = with_cors(api_routes, cors.resource_for("/api"), cors.supports_credentials);

    let auth_routes = with_cors(
        auth::router(state.clone()),
        cors.resource_for("/auth"),
        cors.supports_credentials,
    );

    let routes = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .nest("/api", api_routes)
        .nest("/auth", auth_routes)
        .with_state(state.clone());

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn_with_state(state, request_logging_middleware))
        .layer(TraceLayer::new_for_http())
}

fn with_cors<S>(router: Router<S>, resource: Option<&CorsResource>, supports_credentials: bool) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    match resource {
        Some(resource) => router.layer(cors_layer(resource, supports_credentials)),
        None => router,
    }
}

/// CORS policy for one resource prefix.
///
/// A wildcard origin combined with credentials mirrors the request's origin,
/// methods and headers, since browsers refuse `*` on credentialed requests.
pub fn cors_layer(resource: &CorsResource, supports_credentials: bool) -> CorsLayer {
    let layer = if resource.allows_any_origin() {
        if supports_credentials {
            CorsLayer::new().allow_origin(AllowOrigin::mirror_request())
        } else {
            CorsLayer::new().allow_origin(AllowOrigin::any())
        }
    } else {
        let origins: Vec<HeaderValue> = resource
            .origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(prefix = %resource.prefix, origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        CorsLayer::new().allow_origin(AllowOrigin::list(origins))
    };

    if supports_credentials {
        layer
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        layer
            .allow_methods(AllowMethods::any())
            .allow_headers(AllowHeaders::any())
    }
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../templates/index.html"))
}

async fn health() -> StatusCode {
    StatusCode::OK
}
