// Lockwatch API server
// Decision: Device registry update precedes click correlation; no transaction spans the two stores
// Decision: Correlation failures are logged, never surfaced to the app

use std::sync::Arc;

use anyhow::{Context, Result};
use lockwatch_api::{build_router, ApiConfig, AppState};
use lockwatch_dynamo::DynamoDeviceRegistry;
use lockwatch_storage::{Database, DatabaseConfig, DbEventStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lockwatch_api=debug,lockwatch_core=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("lockwatch-api starting...");

    let api_config = ApiConfig::from_env().context("Invalid API configuration")?;

    // Initialize database
    let db_config = DatabaseConfig::from_env().context("Database configuration missing")?;
    let db = Database::connect(&db_config)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await.context("Failed to run migrations")?;
    tracing::info!(max_connections = db_config.max_connections, "Connected to database");

    let registry = DynamoDeviceRegistry::from_env().context("Device registry configuration missing")?;
    tracing::info!(table = %registry.table(), "Device registry configured");

    let state = AppState::new(Arc::new(registry), Arc::new(DbEventStore::new(db.clone())));
    let app = build_router(state, &api_config.confirmation_path);

    // Start server
    let addr = format!("0.0.0.0:{}", api_config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!(
        confirmation_path = %api_config.confirmation_path,
        "Listening on {}",
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    db.close().await;
    Ok(())
}
