use anyhow::Result;
use std::sync::Arc;
use tracing::info;

mod assistant;
mod bills;
mod error;
mod gst;
mod middleware;
mod models;
mod repositories;
mod routes;
mod state;
#[cfg(test)]
mod testing;

use common::{
    database::{self, DatabaseConfig},
    settings::ServerConfig,
    token::TokenVerifier,
};
use tokio::net::TcpListener;

use crate::{
    repositories::{
        MongoAdminRequestRepository, MongoMarketRatesRepository, MongoPortfolioRepository,
    },
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    common::init_tracing();

    info!("Starting API service");

    let server_config = ServerConfig::from_env("API", 3001)?;

    // Initialize database connection
    let db_config = DatabaseConfig::from_env()?;
    let db = database::init_database(&db_config).await?;

    // Check database connectivity
    if database::health_check(&db).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    database::ensure_indexes(&db).await?;

    let verifier = TokenVerifier::from_env()?;

    let app_state = AppState {
        market_rates: Arc::new(MongoMarketRatesRepository::new(&db)),
        admin_requests: Arc::new(MongoAdminRequestRepository::new(&db)),
        portfolio: Arc::new(MongoPortfolioRepository::new(&db)),
        verifier,
    };

    info!("API service initialized successfully");

    let app = routes::create_router(app_state)
        .layer(routes::cors_layer(server_config.allowed_origin.as_deref())?);

    let address = server_config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("API service listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
