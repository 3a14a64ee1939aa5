//! Document models shared by the services

pub mod admin_request;
pub mod market_rates;
pub mod portfolio;
pub mod user;

// Re-export for convenience
pub use admin_request::{AdminRequest, RequestStatus};
pub use market_rates::{MARKET_RATES_ID, MarketRates, MarketRatesUpdate};
pub use portfolio::{
    DepositType, FdRdEntry, HufPf, HufPfUpdate, NewFdRd, NewStockHolding, Portfolio,
    PortfolioKind, PortfolioSummary, StockHolding,
};
pub use user::{NewUser, PublicUser, Role, User};
