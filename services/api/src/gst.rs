//! GST reference data and tax calculator

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormCategory {
    Regular,
    Composition,
    Special,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GstForm {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: FormCategory,
    pub frequency: &'static str,
    /// Downloadable template, when one is published
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<&'static str>,
}

const fn form(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    category: FormCategory,
    frequency: &'static str,
) -> GstForm {
    GstForm {
        id,
        name,
        description,
        category,
        frequency,
        file_path: None,
    }
}

pub const FORMS: [GstForm; 14] = [
    GstForm {
        file_path: Some("/GST forms/GSTR1_Excel_Workbook_Template_V2.2.xlsx"),
        ..form(
            "gstr1",
            "GSTR-1",
            "Details of outward supplies (sales)",
            FormCategory::Regular,
            "Monthly/Quarterly",
        )
    },
    form(
        "gstr3b",
        "GSTR-3B",
        "Monthly summary return for sales, purchases, and tax payment",
        FormCategory::Regular,
        "Monthly",
    ),
    form(
        "gstr9",
        "GSTR-9",
        "Annual return consolidating all monthly/quarterly filings",
        FormCategory::Regular,
        "Annual",
    ),
    form(
        "gstr9c",
        "GSTR-9C",
        "Reconciliation statement for large taxpayers",
        FormCategory::Regular,
        "Annual",
    ),
    form(
        "cmp08",
        "CMP-08",
        "Quarterly payment and return for composition dealers",
        FormCategory::Composition,
        "Quarterly",
    ),
    form(
        "gstr4",
        "GSTR-4",
        "Annual return for composition scheme taxpayers",
        FormCategory::Composition,
        "Annual",
    ),
    form(
        "gstr5",
        "GSTR-5",
        "For Non-Resident Taxable Persons",
        FormCategory::Special,
        "Monthly",
    ),
    form(
        "gstr5a",
        "GSTR-5A",
        "For OIDAR Service Providers (Online Info & Database Access)",
        FormCategory::Special,
        "Monthly",
    ),
    form(
        "gstr6",
        "GSTR-6",
        "For Input Service Distributors (ISD)",
        FormCategory::Special,
        "Monthly",
    ),
    form(
        "gstr7",
        "GSTR-7",
        "For Tax Deducted at Source (TDS)",
        FormCategory::Special,
        "Monthly",
    ),
    GstForm {
        file_path: Some("/GST forms/GSTR-8.xlsx"),
        ..form(
            "gstr8",
            "GSTR-8",
            "For E-commerce Operators (TCS)",
            FormCategory::Special,
            "Monthly",
        )
    },
    form(
        "gstr10",
        "GSTR-10",
        "Final Return (upon registration cancellation)",
        FormCategory::Special,
        "Once",
    ),
    form(
        "gstr11",
        "GSTR-11",
        "For UIN Holders (Unique Identification Number)",
        FormCategory::Special,
        "Quarterly",
    ),
    form(
        "itc04",
        "ITC-04",
        "For movements of goods for job work",
        FormCategory::Special,
        "Half-yearly",
    ),
];

/// Forms in catalogue order, optionally restricted to one category
pub fn forms(category: Option<FormCategory>) -> Vec<&'static GstForm> {
    FORMS
        .iter()
        .filter(|f| category.is_none_or(|c| f.category == c))
        .collect()
}

fn default_sgst_rate() -> f64 {
    9.0
}

fn default_cgst_rate() -> f64 {
    9.0
}

fn default_igst_rate() -> f64 {
    18.0
}

/// Amount and percentage rates to apply
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxRequest {
    pub amount: f64,
    #[serde(default = "default_sgst_rate")]
    pub sgst_rate: f64,
    #[serde(default = "default_cgst_rate")]
    pub cgst_rate: f64,
    #[serde(default = "default_igst_rate")]
    pub igst_rate: f64,
    #[serde(default)]
    pub cess_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxBreakdown {
    pub sgst: f64,
    pub cgst: f64,
    pub igst: f64,
    pub cess: f64,
    /// Intra-state total: amount plus SGST and CGST
    pub total: f64,
}

pub fn calculate(request: &TaxRequest) -> Result<TaxBreakdown, String> {
    for (field, value) in [
        ("amount", request.amount),
        ("sgstRate", request.sgst_rate),
        ("cgstRate", request.cgst_rate),
        ("igstRate", request.igst_rate),
        ("cessRate", request.cess_rate),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("{} must be a non-negative number", field));
        }
    }

    let share = |rate: f64| request.amount * rate / 100.0;
    let sgst = share(request.sgst_rate);
    let cgst = share(request.cgst_rate);

    Ok(TaxBreakdown {
        sgst,
        cgst,
        igst: share(request.igst_rate),
        cess: share(request.cess_rate),
        total: request.amount + sgst + cgst,
    })
}
