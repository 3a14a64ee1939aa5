//! User repository for database operations

use anyhow::Result;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use async_trait::async_trait;
use common::{
    database::USERS,
    error::{DatabaseError, DatabaseResult},
    models::User,
};
use mongodb::{Collection, Database, bson::doc};
use tracing::{error, info};

/// Read access to login accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by exact (case-sensitive) email
    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>>;

    /// Find a user by ID
    async fn find_by_id(&self, id: &str) -> DatabaseResult<Option<User>>;
}

/// User repository backed by the `users` collection
#[derive(Clone)]
pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    /// Create a new user repository
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(USERS),
        }
    }

    /// Replace every account with `users`
    pub async fn replace_all(&self, users: &[User]) -> DatabaseResult<u64> {
        let removed = self.collection.delete_many(doc! {}).await?;
        info!("Removed {} existing users", removed.deleted_count);

        if users.is_empty() {
            return Ok(0);
        }

        let inserted = self.collection.insert_many(users).await.map_err(|e| {
            if common::error::is_duplicate_key(&e) {
                DatabaseError::Conflict("duplicate email in seed data".to_string())
            } else {
                DatabaseError::Query(e)
            }
        })?;

        Ok(inserted.inserted_ids.len() as u64)
    }
}

#[async_trait]
impl UserStore for MongoUserRepository {
    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let user = self.collection.find_one(doc! { "email": email }).await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> DatabaseResult<Option<User>> {
        let user = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(user)
    }
}

/// Hash a password with Argon2id and a random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();

    Ok(hash)
}

/// Verify a password against a stored PHC hash.
///
/// The digest comparison inside `argon2` is constant-time. A malformed
/// stored hash counts as a mismatch.
pub fn verify_password(password_hash: &str, password: &str) -> bool {
    let parsed_hash = match PasswordHash::new(password_hash) {
        Ok(hash) => hash,
        Err(e) => {
            error!("Failed to parse password hash: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
