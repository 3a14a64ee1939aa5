//! Account seeding from a JSON file
//!
//! Accounts are never created over HTTP. Operators list them in a file
//! and run `auth seed --file users.json`, which replaces the whole
//! `users` collection.

use chrono::Utc;
use common::{
    database::{MARKET_RATES, ensure_indexes},
    error::{DatabaseError, is_duplicate_key},
    models::{MarketRates, NewUser, User},
};
use mongodb::{Database, bson::doc};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::{
    repositories::{MongoUserRepository, hash_password},
    validation::{validate_email, validate_name, validate_password},
};

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("seed file is not a valid account list: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid account {email}: {reason}")]
    Invalid { email: String, reason: String },

    #[error("email {0} appears more than once")]
    DuplicateEmail(String),

    #[error("failed to hash password: {0}")]
    Hash(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Validate accounts and hash their passwords
pub fn prepare_users(accounts: Vec<NewUser>) -> Result<Vec<User>, SeedError> {
    let mut seen = HashSet::new();
    let mut users = Vec::with_capacity(accounts.len());

    for account in accounts {
        let invalid = |reason: String| SeedError::Invalid {
            email: account.email.clone(),
            reason,
        };
        validate_email(&account.email).map_err(invalid)?;
        validate_name(&account.name).map_err(invalid)?;
        validate_password(&account.password).map_err(invalid)?;

        if !seen.insert(account.email.clone()) {
            return Err(SeedError::DuplicateEmail(account.email));
        }

        let password_hash =
            hash_password(&account.password).map_err(|e| SeedError::Hash(e.to_string()))?;

        users.push(User {
            id: Uuid::new_v4().to_string(),
            email: account.email,
            password_hash,
            name: account.name.trim().to_string(),
            role: account.role,
            created_at: Utc::now(),
        });
    }

    Ok(users)
}

/// Replace all accounts with those in `path` and make sure the market
/// rates singleton and indexes exist
pub async fn run_seed(db: &Database, path: &Path) -> Result<(), SeedError> {
    let raw = std::fs::read_to_string(path)?;
    let accounts: Vec<NewUser> = serde_json::from_str(&raw)?;
    let users = prepare_users(accounts)?;

    let repository = MongoUserRepository::new(db);
    let inserted = repository.replace_all(&users).await?;
    info!("Seeded {} users from {}", inserted, path.display());

    let rates = db.collection::<MarketRates>(MARKET_RATES);
    match rates.insert_one(MarketRates::initial(Utc::now())).await {
        Ok(_) => info!("Initialised market rates"),
        Err(e) if is_duplicate_key(&e) => info!("Market rates already present"),
        Err(e) => return Err(DatabaseError::Query(e).into()),
    }

    ensure_indexes(db).await?;

    Ok(())
}
