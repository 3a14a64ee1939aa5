//! Database module for handling MongoDB connections and operations
//!
//! This module provides client configuration, the collection names used by
//! the services, index setup and health checks for the MongoDB database.

use crate::error::{DatabaseError, DatabaseResult};
use mongodb::{
    Client, Database, IndexModel,
    bson::doc,
    options::{ClientOptions, IndexOptions},
};
use std::env;
use std::time::Duration;
use tracing::info;

/// Collection holding login accounts
pub const USERS: &str = "users";
/// Collection holding the market rates singleton
pub const MARKET_RATES: &str = "marketRates";
/// Collection holding user support requests
pub const ADMIN_REQUESTS: &str = "adminRequests";
/// Collection holding fixed and recurring deposits
pub const FDRD: &str = "fdrd";
/// Collection holding stock holdings
pub const STOCKS: &str = "stocks";
/// Collection holding HUF and pension balances
pub const HUF_PF: &str = "hufPf";

/// Database configuration struct
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// MongoDB connection URI
    pub uri: String,
    /// Name of the database holding all collections
    pub database: String,
    /// Server selection / connect timeout in seconds
    pub connect_timeout: u64,
}

impl DatabaseConfig {
    /// Create a new DatabaseConfig from environment variables
    ///
    /// # Environment Variables
    /// - `MONGODB_URI`: MongoDB connection URI (default: "mongodb://localhost:27017")
    /// - `MONGODB_DATABASE`: Database name (default: "taxora")
    /// - `MONGODB_CONNECT_TIMEOUT`: Connect timeout in seconds (default: 10)
    pub fn from_env() -> DatabaseResult<Self> {
        let uri =
            env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

        let database = env::var("MONGODB_DATABASE").unwrap_or_else(|_| "taxora".to_string());
        if database.is_empty() {
            return Err(DatabaseError::Configuration(
                "MONGODB_DATABASE must not be empty".to_string(),
            ));
        }

        let connect_timeout = env::var("MONGODB_CONNECT_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        Ok(Self {
            uri,
            database,
            connect_timeout,
        })
    }
}

/// Connect to MongoDB and select the configured database
///
/// The driver connects lazily, so this only fails on a malformed URI.
/// Use [`health_check`] to verify the server is reachable.
pub async fn init_database(config: &DatabaseConfig) -> DatabaseResult<Database> {
    let mut options = ClientOptions::parse(&config.uri)
        .await
        .map_err(|e| DatabaseError::Configuration(format!("Invalid MongoDB URI: {}", e)))?;
    options.app_name = Some("taxora".to_string());
    options.connect_timeout = Some(Duration::from_secs(config.connect_timeout));
    options.server_selection_timeout = Some(Duration::from_secs(config.connect_timeout));

    let client = Client::with_options(options).map_err(DatabaseError::Connection)?;
    info!("MongoDB client initialized for database: {}", config.database);

    Ok(client.database(&config.database))
}

/// Check database connectivity
///
/// # Returns
///
/// * `DatabaseResult<bool>` - True if the server answered the ping
pub async fn health_check(db: &Database) -> DatabaseResult<bool> {
    db.run_command(doc! { "ping": 1 })
        .await
        .map_err(DatabaseError::Connection)?;

    Ok(true)
}

/// Create the unique indexes the data model relies on
///
/// `users.email` is the login key and `hufPf.userId` holds at most one
/// document per user.
pub async fn ensure_indexes(db: &Database) -> DatabaseResult<()> {
    let unique = IndexOptions::builder().unique(true).build();

    db.collection::<mongodb::bson::Document>(USERS)
        .create_index(
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(unique.clone())
                .build(),
        )
        .await?;

    db.collection::<mongodb::bson::Document>(HUF_PF)
        .create_index(
            IndexModel::builder()
                .keys(doc! { "userId": 1 })
                .options(unique)
                .build(),
        )
        .await?;

    for name in [FDRD, STOCKS, ADMIN_REQUESTS] {
        db.collection::<mongodb::bson::Document>(name)
            .create_index(IndexModel::builder().keys(doc! { "userId": 1 }).build())
            .await?;
    }

    info!("MongoDB indexes ensured");
    Ok(())
}
