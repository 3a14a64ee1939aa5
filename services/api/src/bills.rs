//! Utility bill anomaly detection
//!
//! Consumption is compared with what the sanctioned load should draw in a
//! month for the bill's sector. Bills are classified on request and never
//! stored.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sector {
    Residential,
    Commercial,
    Industrial,
}

impl Sector {
    pub const ALL: [Sector; 3] = [Sector::Residential, Sector::Commercial, Sector::Industrial];

    /// Expected monthly units per kW of sanctioned load
    pub fn expected_units_per_kw(&self) -> f64 {
        match self {
            Sector::Residential => 50.0,
            Sector::Commercial => 150.0,
            Sector::Industrial => 300.0,
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sector::Residential => "residential",
            Sector::Commercial => "commercial",
            Sector::Industrial => "industrial",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillType {
    Electricity,
    Water,
    Property,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    Normal,
    Warning,
    Fraud,
}

#[derive(Error, Debug, PartialEq)]
pub enum BillError {
    #[error("wattsSanctioned must be greater than zero")]
    NonPositiveLoad,

    #[error("unitsConsumed must be a non-negative number")]
    InvalidUnits,

    #[error("amount must be a non-negative number")]
    InvalidAmount,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub status: BillStatus,
    pub reason: Option<String>,
}

/// Usage above this multiple of the expected units is fraud
const FRAUD_FACTOR: f64 = 2.0;
/// Usage above this multiple is worth a warning
const WARNING_FACTOR: f64 = 1.5;

/// Classify a bill's consumption against its sanctioned load
pub fn classify(
    sector: Sector,
    units_consumed: f64,
    watts_sanctioned: f64,
) -> Result<Classification, BillError> {
    if !watts_sanctioned.is_finite() || watts_sanctioned <= 0.0 {
        return Err(BillError::NonPositiveLoad);
    }
    if !units_consumed.is_finite() || units_consumed < 0.0 {
        return Err(BillError::InvalidUnits);
    }

    let max_expected = (watts_sanctioned / 1000.0) * sector.expected_units_per_kw();

    if units_consumed > FRAUD_FACTOR * max_expected {
        let multiple = units_consumed / max_expected;
        return Ok(Classification {
            status: BillStatus::Fraud,
            reason: Some(format!(
                "Units consumed ({}) are {:.1}x the expected (~{:.0}) for {}W sanctioned load in {} sector. Possible meter tampering or unauthorized load.",
                units_consumed, multiple, max_expected, watts_sanctioned, sector
            )),
        });
    }

    if units_consumed > WARNING_FACTOR * max_expected {
        return Ok(Classification {
            status: BillStatus::Warning,
            reason: Some(format!(
                "High consumption detected. Units ({}) above normal range for your sector.",
                units_consumed
            )),
        });
    }

    Ok(Classification {
        status: BillStatus::Normal,
        reason: None,
    })
}

/// Bill as entered by the user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillDraft {
    pub sector: Sector,
    pub bill_type: BillType,
    pub amount: f64,
    pub units_consumed: f64,
    pub watts_sanctioned: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

/// Bill with its derived status
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    #[serde(flatten)]
    pub draft: BillDraft,
    pub status: BillStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fraud_reason: Option<String>,
}

impl BillDraft {
    pub fn classify(self) -> Result<Bill, BillError> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(BillError::InvalidAmount);
        }

        let classification = classify(self.sector, self.units_consumed, self.watts_sanctioned)?;
        Ok(Bill {
            draft: self,
            status: classification.status,
            fraud_reason: classification.reason,
        })
    }
}
