//! Repositories for database operations
//!
//! Handlers only see the store traits; the MongoDB implementations live in
//! the submodules.

use async_trait::async_trait;
use chrono::Utc;
use common::{
    error::DatabaseResult,
    models::{
        AdminRequest, FdRdEntry, HufPf, HufPfUpdate, MarketRates, MarketRatesUpdate, Portfolio,
        PortfolioKind, StockHolding,
    },
};

pub mod admin_requests;
pub mod market_rates;
pub mod portfolio;

pub use admin_requests::MongoAdminRequestRepository;
pub use market_rates::MongoMarketRatesRepository;
pub use portfolio::MongoPortfolioRepository;

/// Access to the market rates singleton
#[async_trait]
pub trait MarketRatesStore: Send + Sync {
    async fn get(&self) -> DatabaseResult<Option<MarketRates>>;

    /// Store `next`, which must be exactly one version ahead of the stored
    /// document. Fails with a conflict when another writer got there first.
    async fn save(&self, next: &MarketRates) -> DatabaseResult<()>;

    /// Merge `update` into the singleton, creating it if absent
    async fn set(&self, update: &MarketRatesUpdate) -> DatabaseResult<MarketRates> {
        let current = self.get().await?;
        let next = MarketRates::next(current.as_ref(), update, Utc::now())?;
        self.save(&next).await?;
        Ok(next)
    }
}

/// Support requests raised by users
#[async_trait]
pub trait AdminRequestStore: Send + Sync {
    async fn create(&self, request: &AdminRequest) -> DatabaseResult<()>;

    /// All requests, newest first
    async fn list_all(&self) -> DatabaseResult<Vec<AdminRequest>>;

    /// Requests raised by one user, newest first
    async fn list_for_user(&self, user_id: &str) -> DatabaseResult<Vec<AdminRequest>>;

    /// Mark a pending request as resolved. Returns false when no pending
    /// request has this id.
    async fn resolve(&self, id: &str) -> DatabaseResult<bool>;
}

/// Per-user holdings
#[async_trait]
pub trait PortfolioStore: Send + Sync {
    async fn get(&self, user_id: &str) -> DatabaseResult<Portfolio>;

    async fn insert_fdrd(&self, entries: &[FdRdEntry]) -> DatabaseResult<()>;

    async fn insert_stocks(&self, holdings: &[StockHolding]) -> DatabaseResult<()>;

    /// Write the present fields of `update`, creating the document if needed
    async fn upsert_huf_pf(&self, user_id: &str, update: &HufPfUpdate) -> DatabaseResult<HufPf>;

    /// Delete a row only when both id and owner match
    async fn delete(&self, user_id: &str, kind: PortfolioKind, id: &str) -> DatabaseResult<bool>;
}
