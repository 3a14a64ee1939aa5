//! In-memory stores and fixtures for unit tests

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use common::{
    error::DatabaseResult,
    models::{Role, User},
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{
    AppState,
    rate_limiter::{RateLimiter, RateLimiterConfig},
    repositories::{UserStore, hash_password},
    session::{SessionManager, SessionStore},
};

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Vec<User>,
}

impl InMemoryUserStore {
    pub fn with_user(mut self, email: &str, password: &str, name: &str, role: Role) -> Self {
        self.users.push(User {
            id: format!("user-{}", self.users.len() + 1),
            email: email.to_string(),
            password_hash: hash_password(password).unwrap(),
            name: name.to_string(),
            role,
            created_at: Utc::now(),
        });
        self
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        Ok(self.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: &str) -> DatabaseResult<Option<User>> {
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }
}

/// TTLs are ignored; entries live until removed
#[derive(Default)]
pub struct InMemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put(&self, key: &str, value: &str, _ttl_seconds: u64) -> Result<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.entries.lock().await.contains_key(key))
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

/// State with one admin and one regular user
pub fn test_state() -> AppState {
    let users = InMemoryUserStore::default()
        .with_user("admin@taxora.com", "Adm1n!pass", "Admin User", Role::Admin)
        .with_user("ganesh@taxora.com", "Pr@bu2025", "Ganesh Kumar", Role::User);
    let jwt_service = crate::jwt::tests::test_service();

    AppState {
        users: Arc::new(users),
        sessions: SessionManager::new(
            Arc::new(InMemorySessionStore::default()),
            jwt_service.refresh_token_expiry(),
        ),
        jwt_service,
        rate_limiter: RateLimiter::new(RateLimiterConfig::default()),
    }
}
