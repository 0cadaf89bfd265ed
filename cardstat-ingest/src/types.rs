use cardstat_core::TxnKind;
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::summary::StatementSummary;

/// Known statement layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatementFormat {
    /// Chase layout with per-cardholder blocks closed by
    /// `TRANSACTIONS THIS CYCLE (CARD nnnn) $total` ("0801" statements)
    ChaseGrouped,
    /// Chase columnar layout: `Date of Transaction | Merchant Name | $ Amount`
    /// ("5136" statements)
    ChaseColumnar,
    /// Capital One: `Trans Date | Post Date | Description | Amount`
    CapitalOne,
}

impl StatementFormat {
    pub fn name(&self) -> &'static str {
        match self {
            StatementFormat::ChaseGrouped => "chase-grouped",
            StatementFormat::ChaseColumnar => "chase-columnar",
            StatementFormat::CapitalOne => "capital-one",
        }
    }
}

impl fmt::Display for StatementFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StatementFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chase-grouped" | "grouped" | "0801" => Ok(StatementFormat::ChaseGrouped),
            "chase-columnar" | "columnar" | "5136" => Ok(StatementFormat::ChaseColumnar),
            "capital-one" | "capitalone" => Ok(StatementFormat::CapitalOne),
            other => anyhow::bail!(
                "unknown statement format '{}' (expected chase-grouped, chase-columnar or capital-one)",
                other
            ),
        }
    }
}

/// Account-number suffixes whose layout is known up front
pub fn default_account_formats() -> HashMap<String, StatementFormat> {
    HashMap::from([
        ("0801".to_string(), StatementFormat::ChaseGrouped),
        ("5136".to_string(), StatementFormat::ChaseColumnar),
    ])
}

/// Normalized output of the line parsers (issuer-agnostic)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementTransaction {
    pub date: NaiveDate,
    pub post_date: Option<NaiveDate>,
    pub cardholder: String,
    pub description: String,
    /// Positive means charge; negative means credit/refund.
    pub amount: f64,
    pub kind: TxnKind,
}

/// A cardholder block closed by a printed subtotal (grouped layout)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardholderSection {
    pub cardholder: String,
    pub card_suffix: Option<String>,
    pub reported_total: Option<f64>,
}

/// Everything pulled out of one statement's text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedStatement {
    pub format: StatementFormat,
    pub account_suffix: Option<String>,
    pub summary: StatementSummary,
    pub transactions: Vec<StatementTransaction>,
    pub sections: Vec<CardholderSection>,
}

/// Caller-supplied knowledge the statement text does not carry
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// Owner of rows in layouts without cardholder groupings
    pub primary_cardholder: String,
    /// Year for `MM/DD` rows when the statement period cannot be read
    pub fallback_year: i32,
    /// Account suffix -> layout
    pub accounts: HashMap<String, StatementFormat>,
    /// Skip detection and parse with this layout
    pub format: Option<StatementFormat>,
}

impl Default for ParseContext {
    fn default() -> Self {
        Self {
            primary_cardholder: "PRIMARY".to_string(),
            fallback_year: Local::now().year(),
            accounts: default_account_formats(),
            format: None,
        }
    }
}
