use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

mod jwt;
mod rate_limiter;
mod repositories;
mod routes;
mod seed;
mod session;
#[cfg(test)]
mod testing;
mod validation;

use common::{
    cache::{RedisConfig, RedisPool},
    database::{self, DatabaseConfig},
    settings::ServerConfig,
};
use tokio::net::TcpListener;

use crate::{
    jwt::{JwtConfig, JwtService},
    rate_limiter::{RateLimiter, RateLimiterConfig},
    repositories::{MongoUserRepository, UserStore},
    session::SessionManager,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub sessions: SessionManager,
    pub jwt_service: JwtService,
    pub rate_limiter: RateLimiter,
}

#[derive(Parser)]
#[command(name = "auth", about = "Taxora authentication service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Replace all accounts with those listed in a JSON file
    Seed {
        #[arg(long, short)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    common::init_tracing();

    let cli = Cli::parse();

    let db_config = DatabaseConfig::from_env()?;
    let db = database::init_database(&db_config).await?;

    // Check database connectivity
    if database::health_check(&db).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Seed { file } => {
            seed::run_seed(&db, &file).await?;
            info!("Seeding finished");
            Ok(())
        }
        Command::Serve => serve(db).await,
    }
}

async fn serve(db: mongodb::Database) -> Result<()> {
    info!("Starting authentication service");

    database::ensure_indexes(&db).await?;

    let server_config = ServerConfig::from_env("AUTH", 3000)?;

    // Initialize JWT service
    let jwt_config = JwtConfig::from_env()?;
    let jwt_service = JwtService::new(jwt_config)?;

    // Initialize Redis connection pool
    let redis_config = RedisConfig::from_env()?;
    let redis_pool = RedisPool::new(&redis_config).await?;
    if !redis_pool.health_check().await? {
        anyhow::bail!("Failed to connect to Redis");
    }

    let rate_limiter = RateLimiter::new(RateLimiterConfig::default());
    info!(
        "Login attempts limited to {} per {}s",
        rate_limiter.config().max_attempts,
        rate_limiter.config().window_seconds
    );

    let app_state = AppState {
        users: Arc::new(MongoUserRepository::new(&db)),
        sessions: SessionManager::new(Arc::new(redis_pool), jwt_service.refresh_token_expiry()),
        jwt_service,
        rate_limiter,
    };

    let app = routes::create_router(app_state)
        .layer(routes::cors_layer(server_config.allowed_origin.as_deref())?);

    let address = server_config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Authentication service listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
