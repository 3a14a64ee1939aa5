//! Portfolio documents: deposits, stock holdings and HUF/pension balances
//!
//! Every document carries the `userId` of its owner. Creation payloads are
//! validated here so that both the MongoDB repositories and the in-memory
//! stores used in tests enforce the same invariants.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The three portfolio sub-resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PortfolioKind {
    Fdrd,
    Stocks,
    HufPf,
}

impl PortfolioKind {
    /// Backing MongoDB collection
    pub fn collection(&self) -> &'static str {
        match self {
            PortfolioKind::Fdrd => crate::database::FDRD,
            PortfolioKind::Stocks => crate::database::STOCKS,
            PortfolioKind::HufPf => crate::database::HUF_PF,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepositType {
    #[serde(rename = "FD")]
    Fd,
    #[serde(rename = "RD")]
    Rd,
}

/// Fixed or recurring deposit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FdRdEntry {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub deposit_type: DepositType,
    pub bank_name: String,
    pub principal: f64,
    pub interest_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investment_date: Option<NaiveDate>,
    pub maturity_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFdRd {
    #[serde(rename = "type")]
    pub deposit_type: DepositType,
    pub bank_name: String,
    pub principal: f64,
    pub interest_rate: f64,
    #[serde(default)]
    pub investment_date: Option<NaiveDate>,
    pub maturity_date: NaiveDate,
}

impl NewFdRd {
    pub fn validate(&self) -> Result<(), String> {
        if self.bank_name.trim().is_empty() {
            return Err("bankName is required".to_string());
        }
        non_negative("principal", self.principal)?;
        non_negative("interestRate", self.interest_rate)?;

        if let Some(invested) = self.investment_date {
            if invested > self.maturity_date {
                return Err("investmentDate must not be after maturityDate".to_string());
            }
        }

        Ok(())
    }

    pub fn into_entry(self, user_id: &str) -> FdRdEntry {
        FdRdEntry {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            deposit_type: self.deposit_type,
            bank_name: self.bank_name.trim().to_string(),
            principal: self.principal,
            interest_rate: self.interest_rate,
            investment_date: self.investment_date,
            maturity_date: self.maturity_date,
        }
    }
}

/// Equity holding. Holdings are never edited, only added or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockHolding {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub symbol: String,
    pub quantity: f64,
    pub avg_price: f64,
    pub current_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStockHolding {
    pub symbol: String,
    pub quantity: f64,
    pub avg_price: f64,
    pub current_price: f64,
}

impl NewStockHolding {
    pub fn validate(&self) -> Result<(), String> {
        if self.symbol.trim().is_empty() {
            return Err("symbol is required".to_string());
        }
        non_negative("quantity", self.quantity)?;
        non_negative("avgPrice", self.avg_price)?;
        non_negative("currentPrice", self.current_price)
    }

    pub fn into_holding(self, user_id: &str) -> StockHolding {
        StockHolding {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            symbol: self.symbol.trim().to_uppercase(),
            quantity: self.quantity,
            avg_price: self.avg_price,
            current_price: self.current_price,
        }
    }
}

/// HUF and pension balances, at most one document per user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HufPf {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub huf_pan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub huf_assets: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epf_balance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nps_balance: Option<f64>,
}

/// One field group of [`HufPf`]; only present fields are written
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HufPfUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub huf_pan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub huf_assets: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epf_balance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nps_balance: Option<f64>,
}

impl HufPfUpdate {
    pub fn validate(&self) -> Result<(), String> {
        if self.huf_pan.is_none()
            && self.huf_assets.is_none()
            && self.epf_balance.is_none()
            && self.nps_balance.is_none()
        {
            return Err("at least one HUF/PF field is required".to_string());
        }
        if let Some(pan) = &self.huf_pan {
            if pan.trim().is_empty() {
                return Err("hufPan must not be empty".to_string());
            }
        }
        for (field, value) in [
            ("hufAssets", self.huf_assets),
            ("epfBalance", self.epf_balance),
            ("npsBalance", self.nps_balance),
        ] {
            if let Some(value) = value {
                non_negative(field, value)?;
            }
        }
        Ok(())
    }

    /// Normalised copy suitable for writing
    pub fn normalized(&self) -> HufPfUpdate {
        HufPfUpdate {
            huf_pan: self.huf_pan.as_ref().map(|p| p.trim().to_uppercase()),
            ..self.clone()
        }
    }

    /// Apply the present fields on top of an existing document
    pub fn apply_to(&self, target: &mut HufPf) {
        let update = self.normalized();
        if update.huf_pan.is_some() {
            target.huf_pan = update.huf_pan;
        }
        if update.huf_assets.is_some() {
            target.huf_assets = update.huf_assets;
        }
        if update.epf_balance.is_some() {
            target.epf_balance = update.epf_balance;
        }
        if update.nps_balance.is_some() {
            target.nps_balance = update.nps_balance;
        }
    }
}

/// Everything a user holds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub fdrd: Vec<FdRdEntry>,
    pub stocks: Vec<StockHolding>,
    pub huf_pf: Option<HufPf>,
}

/// Totals shown above the portfolio tabs
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub fdrd_total: f64,
    pub fdrd_count: usize,
    pub stocks_value: f64,
    pub stocks_invested: f64,
    pub stocks_gain: f64,
}

impl Portfolio {
    pub fn summary(&self) -> PortfolioSummary {
        let fdrd_total = self.fdrd.iter().map(|e| e.principal).sum();
        let stocks_value: f64 = self
            .stocks
            .iter()
            .map(|s| s.quantity * s.current_price)
            .sum();
        let stocks_invested: f64 = self.stocks.iter().map(|s| s.quantity * s.avg_price).sum();

        PortfolioSummary {
            fdrd_total,
            fdrd_count: self.fdrd.len(),
            stocks_value,
            stocks_invested,
            stocks_gain: stocks_value - stocks_invested,
        }
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() {
        return Err(format!("{} must be a finite number", field));
    }
    if value < 0.0 {
        return Err(format!("{} must not be negative", field));
    }
    Ok(())
}
