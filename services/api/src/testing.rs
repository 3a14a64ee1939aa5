//! In-memory stores and token helpers for router tests

use async_trait::async_trait;
use chrono::Utc;
use common::{
    error::{DatabaseError, DatabaseResult},
    models::{
        AdminRequest, FdRdEntry, HufPf, HufPfUpdate, MarketRates, Portfolio, PortfolioKind,
        RequestStatus, Role, StockHolding,
    },
    token::{Claims, TokenType, TokenVerifier},
};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    repositories::{AdminRequestStore, MarketRatesStore, PortfolioStore},
    state::AppState,
};

const PRIVATE_KEY: &str = include_str!("../../../libs/common/testdata/jwt_private.pem");
const PUBLIC_KEY: &str = include_str!("../../../libs/common/testdata/jwt_public.pem");

pub const ADMIN_ID: &str = "admin-1";
pub const USER_ID: &str = "user-1";
pub const OTHER_ID: &str = "user-2";

#[derive(Default)]
pub struct InMemoryMarketRatesStore {
    rates: Mutex<Option<MarketRates>>,
}

#[async_trait]
impl MarketRatesStore for InMemoryMarketRatesStore {
    async fn get(&self) -> DatabaseResult<Option<MarketRates>> {
        Ok(self.rates.lock().await.clone())
    }

    async fn save(&self, next: &MarketRates) -> DatabaseResult<()> {
        let mut rates = self.rates.lock().await;
        let stored_version = rates.as_ref().map(|r| r.version).unwrap_or(0);
        if stored_version != next.version - 1 {
            return Err(DatabaseError::Conflict("stale version".to_string()));
        }
        *rates = Some(next.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryAdminRequestStore {
    requests: Mutex<Vec<AdminRequest>>,
}

#[async_trait]
impl AdminRequestStore for InMemoryAdminRequestStore {
    async fn create(&self, request: &AdminRequest) -> DatabaseResult<()> {
        self.requests.lock().await.push(request.clone());
        Ok(())
    }

    async fn list_all(&self) -> DatabaseResult<Vec<AdminRequest>> {
        Ok(self.requests.lock().await.iter().rev().cloned().collect())
    }

    async fn list_for_user(&self, user_id: &str) -> DatabaseResult<Vec<AdminRequest>> {
        Ok(self
            .requests
            .lock()
            .await
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn resolve(&self, id: &str) -> DatabaseResult<bool> {
        let mut requests = self.requests.lock().await;
        match requests.iter_mut().find(|r| r.id == id && r.is_pending()) {
            Some(request) => {
                request.status = RequestStatus::Resolved;
                request.resolved_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct InMemoryPortfolioStore {
    fdrd: Mutex<Vec<FdRdEntry>>,
    stocks: Mutex<Vec<StockHolding>>,
    huf_pf: Mutex<Vec<HufPf>>,
}

#[async_trait]
impl PortfolioStore for InMemoryPortfolioStore {
    async fn get(&self, user_id: &str) -> DatabaseResult<Portfolio> {
        Ok(Portfolio {
            fdrd: self
                .fdrd
                .lock()
                .await
                .iter()
                .filter(|e| e.user_id == user_id)
                .cloned()
                .collect(),
            stocks: self
                .stocks
                .lock()
                .await
                .iter()
                .filter(|s| s.user_id == user_id)
                .cloned()
                .collect(),
            huf_pf: self
                .huf_pf
                .lock()
                .await
                .iter()
                .find(|h| h.user_id == user_id)
                .cloned(),
        })
    }

    async fn insert_fdrd(&self, entries: &[FdRdEntry]) -> DatabaseResult<()> {
        self.fdrd.lock().await.extend_from_slice(entries);
        Ok(())
    }

    async fn insert_stocks(&self, holdings: &[StockHolding]) -> DatabaseResult<()> {
        self.stocks.lock().await.extend_from_slice(holdings);
        Ok(())
    }

    async fn upsert_huf_pf(&self, user_id: &str, update: &HufPfUpdate) -> DatabaseResult<HufPf> {
        let mut records = self.huf_pf.lock().await;
        let index = match records.iter().position(|h| h.user_id == user_id) {
            Some(index) => index,
            None => {
                records.push(HufPf {
                    id: Uuid::new_v4().to_string(),
                    user_id: user_id.to_string(),
                    huf_pan: None,
                    huf_assets: None,
                    epf_balance: None,
                    nps_balance: None,
                });
                records.len() - 1
            }
        };

        update.apply_to(&mut records[index]);
        Ok(records[index].clone())
    }

    async fn delete(&self, user_id: &str, kind: PortfolioKind, id: &str) -> DatabaseResult<bool> {
        fn remove<T>(rows: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> bool {
            let before = rows.len();
            rows.retain(|row| !matches(row));
            rows.len() < before
        }

        let removed = match kind {
            PortfolioKind::Fdrd => remove(&mut *self.fdrd.lock().await, |e| {
                e.id == id && e.user_id == user_id
            }),
            PortfolioKind::Stocks => remove(&mut *self.stocks.lock().await, |s| {
                s.id == id && s.user_id == user_id
            }),
            PortfolioKind::HufPf => remove(&mut *self.huf_pf.lock().await, |h| {
                h.id == id && h.user_id == user_id
            }),
        };
        Ok(removed)
    }
}

/// State backed by empty in-memory stores
pub fn test_state() -> AppState {
    AppState {
        market_rates: Arc::new(InMemoryMarketRatesStore::default()),
        admin_requests: Arc::new(InMemoryAdminRequestStore::default()),
        portfolio: Arc::new(InMemoryPortfolioStore::default()),
        verifier: TokenVerifier::from_public_pem(PUBLIC_KEY).unwrap(),
    }
}

/// Sign a token the way the auth service does
pub fn token_for(id: &str, name: &str, role: Role, token_type: TokenType) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let claims = Claims {
        sub: id.to_string(),
        email: format!("{}@taxora.com", id),
        name: name.to_string(),
        role,
        iat: now,
        exp: now + 900,
        jti: Uuid::new_v4().to_string(),
        token_type,
    };

    encode(
        &Header::new(Algorithm::RS256),
        &claims,
        &EncodingKey::from_rsa_pem(PRIVATE_KEY.as_bytes()).unwrap(),
    )
    .unwrap()
}
