//! Session management
//!
//! One refresh-token session per user is kept under `session:{user_id}`.
//! Revoked tokens are remembered by their `jti` until they would have
//! expired anyway.

use anyhow::Result;
use async_trait::async_trait;
use common::cache::RedisPool;
use std::sync::Arc;
use tracing::info;

/// Key-value backend for sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn exists(&self, key: &str) -> Result<bool>;
    async fn remove(&self, key: &str) -> Result<()>;
}

#[async_trait]
impl SessionStore for RedisPool {
    async fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        self.set(key, value, Some(ttl_seconds)).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        RedisPool::get(self, key).await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        RedisPool::exists(self, key).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.delete(key).await
    }
}

/// Session manager for handling user sessions
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    session_ttl: u64,
}

impl SessionManager {
    /// Create a new session manager; sessions live as long as a refresh token
    pub fn new(store: Arc<dyn SessionStore>, session_ttl: u64) -> Self {
        Self { store, session_ttl }
    }

    fn session_key(user_id: &str) -> String {
        format!("session:{}", user_id)
    }

    fn revoked_key(jti: &str) -> String {
        format!("revoked_token:{}", jti)
    }

    /// Create or replace the session of a user
    pub async fn create_session(&self, user_id: &str, refresh_token: &str) -> Result<()> {
        info!("Creating session for user: {}", user_id);
        self.store
            .put(&Self::session_key(user_id), refresh_token, self.session_ttl)
            .await
    }

    /// Check that `refresh_token` is the one currently stored for the user
    pub async fn is_session_valid(&self, user_id: &str, refresh_token: &str) -> Result<bool> {
        let stored = self.store.get(&Self::session_key(user_id)).await?;
        Ok(stored.as_deref() == Some(refresh_token))
    }

    /// Delete the session of a user
    pub async fn delete_session(&self, user_id: &str) -> Result<()> {
        info!("Deleting session for user: {}", user_id);
        self.store.remove(&Self::session_key(user_id)).await
    }

    /// Remember a token id as revoked for `ttl_seconds`
    pub async fn revoke_token(&self, jti: &str, ttl_seconds: u64) -> Result<()> {
        self.store.put(&Self::revoked_key(jti), "1", ttl_seconds).await
    }

    /// Whether a token id has been revoked
    pub async fn is_token_revoked(&self, jti: &str) -> Result<bool> {
        self.store.exists(&Self::revoked_key(jti)).await
    }
}
