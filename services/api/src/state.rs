//! Application state shared across handlers

use common::token::TokenVerifier;
use std::sync::Arc;

use crate::repositories::{AdminRequestStore, MarketRatesStore, PortfolioStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub market_rates: Arc<dyn MarketRatesStore>,
    pub admin_requests: Arc<dyn AdminRequestStore>,
    pub portfolio: Arc<dyn PortfolioStore>,
    pub verifier: TokenVerifier,
}
