use anyhow::Result;
use std::process;
use tracing::{error, info};

use crate::app::create_app;
use crate::database::seed_database;

/// Host/port given on the command line take precedence over configuration.
#[derive(Debug, Default)]
pub struct ServeOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
}

pub async fn run_server(options: ServeOptions) -> Result<()> {
    info!(
        r#"
 ____             _     ___  __         _
|  _ \ __ _ _ __ (_) __| \ \/ /___ ___| |
| |_) / _` | '_ \| |/ _` |\  // __/ _ \ |
|  _ < (_| | |_) | | (_| |/  \ (_|  __/ |
|_| \_\__,_| .__/|_|\__,_/_/\_\___\___|_|
           |_|
Starting RapidXcel logistics service...
PID: {}
"#,
        process::id()
    );

    let app = create_app(None).await.map_err(|e| {
        error!("Failed to create application: {e:#}");
        e
    })?;

    // Seed default accounts if the users table is empty
    if let Err(e) = seed_database(&app.state.db, app.config.password_hash_cost).await {
        error!("Failed to seed database: {e:#}");
    }

    let host = options.host.unwrap_or_else(|| app.config.host.clone());
    let port = options.port.unwrap_or(app.config.port);
    let bind_addr = format!("{host}:{port}");
    info!("Binding to: {bind_addr}");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("Server started successfully!");
    info!("API Endpoint: http://{bind_addr}/api");
    info!("Auth Endpoint: http://{bind_addr}/auth");
    info!("Swagger UI: http://{bind_addr}/swagger-ui/");
    info!("OpenAPI JSON: http://{bind_addr}/api-docs/openapi.json");
    info!("Ready to accept requests...");

    axum::serve(listener, app.router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    app.state.db.close().await;
    info!("Shutting down RapidXcel logistics service...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }
}
