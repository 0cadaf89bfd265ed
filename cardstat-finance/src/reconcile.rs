//! Reconciliation of extracted lines against the statement's printed figures
//!
//! previous balance + purchases + fees - credits + interest + cash advances
//!   + balance transfers = new balance
//!
//! Cash advance rows found in the body are left out of the line total when
//! the summary prints the cash advance and balance transfer figures, so they
//! are counted once.

use cardstat_core::{cents_eq, round_cents, Category, LedgerRecord, TxnKind};
use cardstat_ingest::{CardholderSection, StatementSummary};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const DEFAULT_TOLERANCE: f64 = 1.00;
pub const ADJUSTMENT_CARDHOLDER: &str = "SYSTEM";
pub const ADJUSTMENT_MERCHANT: &str = "MISC BALANCE ADJUSTMENT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Purchases,
    Fees,
    PaymentsCredits,
    NewBalance,
    /// Purchases + fees against the new balance, used when no purchases
    /// figure is printed
    ChargesVsNewBalance,
    Cardholder(String),
}

impl CheckKind {
    pub fn label(&self) -> String {
        match self {
            CheckKind::Purchases => "Purchases".to_string(),
            CheckKind::Fees => "Fees".to_string(),
            CheckKind::PaymentsCredits => "Payments/Credits".to_string(),
            CheckKind::NewBalance => "New balance".to_string(),
            CheckKind::ChargesVsNewBalance => "Charges vs new balance".to_string(),
            CheckKind::Cardholder(name) => format!("Cardholder {name}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckStatus {
    Match,
    /// calculated - printed
    Mismatch { difference: f64 },
    /// The statement does not print this figure
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileCheck {
    pub kind: CheckKind,
    pub calculated: f64,
    pub printed: Option<f64>,
    pub status: CheckStatus,
}

impl ReconcileCheck {
    fn new(kind: CheckKind, calculated: f64, printed: Option<f64>) -> Self {
        let calculated = round_cents(calculated);
        let status = match printed {
            None => CheckStatus::Unavailable,
            Some(p) if cents_eq(calculated, p) => CheckStatus::Match,
            Some(p) => CheckStatus::Mismatch {
                difference: round_cents(calculated - p),
            },
        };
        Self {
            kind,
            calculated,
            printed,
            status,
        }
    }

    pub fn is_match(&self) -> bool {
        self.status == CheckStatus::Match
    }

    pub fn difference(&self) -> Option<f64> {
        match self.status {
            CheckStatus::Mismatch { difference } => Some(difference),
            _ => None,
        }
    }
}

fn sum_where(records: &[LedgerRecord], pred: impl Fn(&LedgerRecord) -> bool) -> f64 {
    records.iter().filter(|r| pred(r)).map(|r| r.amount).sum()
}

fn purchase_like(r: &LedgerRecord) -> bool {
    matches!(r.kind, TxnKind::Purchase | TxnKind::Adjustment)
}

/// Run every check the statement has figures for
pub fn reconcile(
    records: &[LedgerRecord],
    summary: &StatementSummary,
    sections: &[CardholderSection],
) -> Vec<ReconcileCheck> {
    let purchases = sum_where(records, purchase_like);
    let fees = sum_where(records, |r| r.kind == TxnKind::Fee);
    let credits = sum_where(records, |r| r.kind == TxnKind::Credit);
    let advances = sum_where(records, |r| r.kind == TxnKind::CashAdvance);
    let all_lines = sum_where(records, |_| true);

    let printed_advances = match (summary.cash_advances, summary.balance_transfers) {
        (None, None) => None,
        (cash, transfers) => Some(cash.unwrap_or(0.0) + transfers.unwrap_or(0.0)),
    };

    let mut checks = vec![
        ReconcileCheck::new(CheckKind::Purchases, purchases, summary.purchases),
        ReconcileCheck::new(CheckKind::Fees, fees, summary.fees_charged),
        ReconcileCheck::new(
            CheckKind::PaymentsCredits,
            credits.abs(),
            summary.total_credits().map(f64::abs),
        ),
    ];

    let expected_new = summary.previous_balance.map(|prev| {
        prev + (all_lines - advances)
            + summary.interest_charged.unwrap_or(0.0)
            + printed_advances.unwrap_or(advances)
    });
    checks.push(match expected_new {
        Some(expected) => ReconcileCheck::new(CheckKind::NewBalance, expected, summary.new_balance),
        None => ReconcileCheck::new(CheckKind::NewBalance, all_lines, None),
    });

    checks.push(ReconcileCheck::new(
        CheckKind::ChargesVsNewBalance,
        purchases + fees,
        summary.new_balance,
    ));

    // A cardholder with several cards has one section per card. The printed
    // total is the net of the block, payments included.
    let mut by_cardholder: Vec<(String, f64)> = Vec::new();
    for section in sections {
        let Some(total) = section.reported_total else {
            continue;
        };
        match by_cardholder.iter_mut().find(|(name, _)| *name == section.cardholder) {
            Some((_, sum)) => *sum += total,
            None => by_cardholder.push((section.cardholder.clone(), total)),
        }
    }
    for (name, printed) in by_cardholder {
        let calculated = sum_where(records, |r| {
            !matches!(r.kind, TxnKind::Fee | TxnKind::Adjustment) && r.cardholder == name
        });
        checks.push(ReconcileCheck::new(CheckKind::Cardholder(name), calculated, Some(printed)));
    }

    checks
}

/// The check auto-balancing targets: purchases when printed, else charges
/// against the new balance
pub fn primary_check(checks: &[ReconcileCheck]) -> Option<&ReconcileCheck> {
    let purchases = checks.iter().find(|c| c.kind == CheckKind::Purchases);
    match purchases {
        Some(c) if c.status != CheckStatus::Unavailable => Some(c),
        _ => checks
            .iter()
            .find(|c| c.kind == CheckKind::ChargesVsNewBalance && c.status != CheckStatus::Unavailable),
    }
}

/// Synthetic line that absorbs a small discrepancy
pub fn adjustment_record(date: NaiveDate, amount: f64) -> LedgerRecord {
    LedgerRecord::new(
        date,
        ADJUSTMENT_CARDHOLDER,
        ADJUSTMENT_MERCHANT,
        round_cents(amount),
        TxnKind::Adjustment,
        Category::new(Category::MISCELLANEOUS),
    )
}

fn append_adjustment(records: &mut Vec<LedgerRecord>, amount: f64) -> LedgerRecord {
    let date = records
        .last()
        .map(|r| r.date)
        .unwrap_or_else(|| Local::now().date_naive());
    let mut adjustment = adjustment_record(date, amount);
    // Keep the original_category column complete once master rules ran
    if records.iter().any(|r| r.original_category.is_some()) {
        adjustment.original_category = Some(adjustment.category.clone());
    }
    records.push(adjustment.clone());
    adjustment
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub checks: Vec<ReconcileCheck>,
    pub adjustment: Option<LedgerRecord>,
}

/// Reconcile, and when the primary check is off by less than `tolerance`,
/// append an adjustment line and reconcile again
pub fn reconcile_and_balance(
    records: &mut Vec<LedgerRecord>,
    summary: &StatementSummary,
    sections: &[CardholderSection],
    tolerance: f64,
    auto_balance: bool,
) -> Reconciliation {
    let checks = reconcile(records, summary, sections);

    let gap = primary_check(&checks).and_then(|c| Some((c.kind.clone(), c.difference()?)));
    let Some((kind, difference)) = gap else {
        return Reconciliation {
            checks,
            adjustment: None,
        };
    };

    if !auto_balance || difference.abs() >= tolerance {
        warn!(check = %kind.label(), difference, "statement does not reconcile");
        return Reconciliation {
            checks,
            adjustment: None,
        };
    }

    // printed - calculated
    let adjustment = append_adjustment(records, -difference);
    info!(amount = adjustment.amount, check = %kind.label(), "added balance adjustment");

    Reconciliation {
        checks: reconcile(records, summary, sections),
        adjustment: Some(adjustment),
    }
}

/// Bring the sum of `records` to `target` with an adjustment line when it is
/// off by a non-zero amount smaller than `tolerance`
pub fn balance_against(
    records: &mut Vec<LedgerRecord>,
    target: f64,
    tolerance: f64,
) -> Option<LedgerRecord> {
    let total = round_cents(sum_where(records, |_| true));
    let gap = round_cents(target - total);
    if gap == 0.0 || gap.abs() >= tolerance {
        return None;
    }
    let adjustment = append_adjustment(records, gap);
    info!(amount = adjustment.amount, target, "added balance adjustment");
    Some(adjustment)
}
