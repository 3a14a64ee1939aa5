//! API models for request and response payloads

use common::models::{
    AdminRequest, FdRdEntry, HufPf, HufPfUpdate, MarketRates, MarketRatesUpdate, NewFdRd,
    NewStockHolding, PortfolioKind, PortfolioSummary, StockHolding,
};
use serde::{Deserialize, Serialize};

use crate::gst::FormCategory;

/// Body of `POST /api/market-rates`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketRatesRequest {
    pub gold_rate: Option<f64>,
    pub silver_rate: Option<f64>,
    pub market_index: Option<f64>,
    pub expected_version: Option<i64>,
}

impl MarketRatesRequest {
    /// All three rates are required on this endpoint
    pub fn into_update(self) -> Result<MarketRatesUpdate, String> {
        let (Some(gold_rate), Some(silver_rate), Some(market_index)) =
            (self.gold_rate, self.silver_rate, self.market_index)
        else {
            return Err("goldRate, silverRate and marketIndex are required".to_string());
        };

        for (field, value) in [
            ("goldRate", gold_rate),
            ("silverRate", silver_rate),
            ("marketIndex", market_index),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a non-negative number", field));
            }
        }

        Ok(MarketRatesUpdate {
            gold_rate: Some(gold_rate),
            silver_rate: Some(silver_rate),
            market_index: Some(market_index),
            expected_version: self.expected_version,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketRatesResponse {
    pub success: bool,
    pub market_rates: Option<MarketRates>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedRatesResponse {
    pub success: bool,
    pub updated_rates: MarketRates,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDataResponse {
    pub success: bool,
    pub market_rates: Option<MarketRates>,
    pub admin_requests: Vec<AdminRequest>,
}

/// A single object or a list of them
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

/// Body of `POST /api/portfolio`
#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum PortfolioCreateRequest {
    Fdrd(OneOrMany<NewFdRd>),
    Stocks(OneOrMany<NewStockHolding>),
    HufPf(HufPfUpdate),
}

/// Body of `DELETE /api/portfolio`
#[derive(Debug, Deserialize)]
pub struct PortfolioDeleteRequest {
    #[serde(rename = "type")]
    pub kind: PortfolioKind,
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioQuery {
    /// Admins may read another user's portfolio
    pub user_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioResponse {
    pub success: bool,
    pub fdrd: Vec<FdRdEntry>,
    pub stocks: Vec<StockHolding>,
    pub huf_pf: Option<HufPf>,
    pub summary: PortfolioSummary,
}

#[derive(Debug, Deserialize)]
pub struct CreateRequestBody {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequestBody {
    #[serde(alias = "requestId")]
    pub id: String,
}

#[derive(Serialize)]
pub struct AdminRequestResponse {
    pub success: bool,
    pub request: AdminRequest,
}

#[derive(Debug, Deserialize)]
pub struct AssistantRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct EscalateRequest {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GstFormsQuery {
    pub category: Option<FormCategory>,
}
