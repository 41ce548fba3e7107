pub mod api;
pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod seed;
pub mod store;

// Export API types
pub use api::routes;
pub use api::{create_router, AppState};

pub use error::ApiError;

pub use logic::{OntologyMapper, OntologyModelService, VariableService};

// Export all model types
pub use model::*;

// Export store types
pub use store::{InMemoryMiddleware, Middleware};

use std::sync::Arc;

/// Build the middleware and router described by `config`
pub async fn build_app(config: &crate::config::AppConfig) -> anyhow::Result<axum::Router> {
    let store = Arc::new(InMemoryMiddleware::new(config.crops.names.clone()));

    if config.ontology.load_seed_data {
        seed::load_seed_data(&store).await?;
    }

    let mapper = OntologyMapper::new(config.ontology.date_format.clone());
    Ok(create_router(AppState::new(store, mapper)))
}

/// Load configuration, build the app and serve until the listener fails
pub async fn run_server() -> anyhow::Result<()> {
    use axum::serve;
    use tokio::net::TcpListener;

    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    let config = crate::config::AppConfig::load()?;
    log::info!(
        "Configuration loaded: server={}:{}, crops=[{}], seed data={}",
        config.server.host,
        config.server.port,
        config.crops.names.join(", "),
        config.ontology.load_seed_data
    );
    let app = build_app(&config).await?;

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    log::info!("bmsapi server running on http://{}", bind_address);

    serve(listener, app).await?;

    Ok(())
}
