//! Ledger record types shared by the ingest, finance and CLI crates

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a statement line represents
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TxnKind {
    #[serde(rename = "Purchase")]
    Purchase,
    #[serde(rename = "Fee")]
    Fee,
    /// Payments, refunds and other credits
    #[serde(rename = "Credit/Payment")]
    Credit,
    /// Cash advances and balance transfers. The statement summary prints
    /// these apart from purchases.
    #[serde(rename = "Cash Advance")]
    CashAdvance,
    /// Synthetic balancing entry, never printed on a statement
    #[serde(rename = "Adjustment")]
    Adjustment,
}

impl TxnKind {
    /// Label used in CSV reports
    pub fn label(&self) -> &'static str {
        match self {
            TxnKind::Purchase => "Purchase",
            TxnKind::Fee => "Fee",
            TxnKind::Credit => "Credit/Payment",
            TxnKind::CashAdvance => "Cash Advance",
            TxnKind::Adjustment => "Adjustment",
        }
    }

    /// Parse a CSV `type` column. Accepts the labels above plus a few spellings
    /// older reports used.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "purchase" => Some(TxnKind::Purchase),
            "fee" => Some(TxnKind::Fee),
            "credit/payment" | "credit" | "payment" => Some(TxnKind::Credit),
            "cash advance" | "balance transfer" => Some(TxnKind::CashAdvance),
            "adjustment" => Some(TxnKind::Adjustment),
            _ => None,
        }
    }

    /// Lines that add to the amount owed
    pub fn is_charge(&self) -> bool {
        !matches!(self, TxnKind::Credit)
    }
}

impl fmt::Display for TxnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Spending category. Open-ended: the master categorization file can name
/// any category it likes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub const OTHER: &'static str = "OTHER";
    pub const CC_FEES: &'static str = "CC FEES";
    pub const MISCELLANEOUS: &'static str = "MISCELLANEOUS";
    pub const MAINTENANCE: &'static str = "MAINTENANCE";
    pub const PAYMENT: &'static str = "PAYMENT";
    pub const REFUND: &'static str = "REFUND/CREDIT";
    pub const CASH_ADVANCE: &'static str = "CASH ADVANCE";

    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_string())
    }

    pub fn other() -> Self {
        Self::new(Self::OTHER)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_other(&self) -> bool {
        self.0 == Self::OTHER
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        Category::new(s)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// A categorized statement line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerRecord {
    pub date: NaiveDate,
    pub cardholder: String,
    pub merchant: String,
    /// Positive = charge, negative = credit
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TxnKind,
    pub category: Category,
    /// Category before master rules overrode it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_category: Option<Category>,
}

impl LedgerRecord {
    pub fn new(
        date: NaiveDate,
        cardholder: impl Into<String>,
        merchant: impl Into<String>,
        amount: f64,
        kind: TxnKind,
        category: Category,
    ) -> Self {
        Self {
            date,
            cardholder: cardholder.into(),
            merchant: merchant.into(),
            amount,
            kind,
            category,
            original_category: None,
        }
    }

    pub fn is_credit(&self) -> bool {
        self.kind == TxnKind::Credit
    }

    /// Category the built-in heuristics assigned, whether or not a master
    /// rule later replaced it
    pub fn base_category(&self) -> &Category {
        self.original_category.as_ref().unwrap_or(&self.category)
    }
}
