//! Printed account-summary figures (Previous Balance, Purchases, New Balance...)
//!
//! Every field is optional: a statement that does not print a figure leaves it
//! `None` rather than zero, so reconciliation can tell "not printed" from "$0.00".

use anyhow::Result;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dates::month_from_abbrev;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementPeriod {
    pub opening: NaiveDate,
    pub closing: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementSummary {
    pub previous_balance: Option<f64>,
    /// Printed as a negative figure; stored as its magnitude
    pub payments_credits: Option<f64>,
    /// Capital One prints refunds on their own `Other Credits` line
    pub other_credits: Option<f64>,
    pub purchases: Option<f64>,
    pub cash_advances: Option<f64>,
    pub balance_transfers: Option<f64>,
    pub fees_charged: Option<f64>,
    pub interest_charged: Option<f64>,
    pub new_balance: Option<f64>,
    pub minimum_payment_due: Option<f64>,
    pub payment_due_date: Option<NaiveDate>,
    pub period: Option<StatementPeriod>,
}

impl StatementSummary {
    /// Payments plus any separately printed credits
    pub fn total_credits(&self) -> Option<f64> {
        match (self.payments_credits, self.other_credits) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(0.0) + b.unwrap_or(0.0)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.purchases.is_none() && self.new_balance.is_none() && self.previous_balance.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    PreviousBalance,
    PaymentsCredits,
    OtherCredits,
    Purchases,
    CashAdvances,
    BalanceTransfers,
    FeesCharged,
    InterestCharged,
    NewBalance,
    MinimumPayment,
}

/// Label regexes, anchored at line start. Order matters only for readability;
/// each field takes the first line that matches it.
const FIELD_LABELS: &[(Field, &str)] = &[
    (Field::PreviousBalance, r"previous\s+balance"),
    (
        Field::PaymentsCredits,
        r"payments?(?:\s*(?:,|/|and)?\s*(?:other\s+)?credits?)?",
    ),
    (Field::OtherCredits, r"other\s+credits?"),
    (Field::Purchases, r"(?:purchases?|transactions)"),
    (Field::CashAdvances, r"cash\s+advances?"),
    (Field::BalanceTransfers, r"balance\s+transfers?"),
    (Field::FeesCharged, r"fees\s+charged"),
    (Field::InterestCharged, r"interest\s+charged"),
    (Field::NewBalance, r"new\s+balance"),
    (Field::MinimumPayment, r"minimum\s+payment\s+due"),
];

fn field_regex(label: &str) -> Result<Regex> {
    Ok(Regex::new(&format!(
        r"(?i)^\s*{label}[^\d\-]*?(?P<neg>-)?\s*\$?\s*(?P<amt>\d[\d,]*\.\d{{2}})"
    ))?)
}

/// Lines a field must never be read from (APR tables, year-to-date totals,
/// cardholder subtotals)
fn excluded(field: Field, line: &str) -> bool {
    let upper = line.to_uppercase();
    match field {
        Field::Purchases => {
            upper.contains('%')
                || upper.contains("TOTAL")
                || upper.contains("THIS CYCLE")
                || upper.contains("IMPORTANT")
        }
        Field::FeesCharged | Field::InterestCharged => upper.contains("TOTAL") || upper.contains('%'),
        _ => false,
    }
}

pub fn parse_statement_summary(text: &str) -> Result<StatementSummary> {
    let matchers: Vec<(Field, Regex)> = FIELD_LABELS
        .iter()
        .map(|(field, label)| Ok((*field, field_regex(label)?)))
        .collect::<Result<_>>()?;

    let mut summary = StatementSummary::default();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        for (field, re) in &matchers {
            if slot(&mut summary, *field).is_some() || excluded(*field, line) {
                continue;
            }
            let Some(caps) = re.captures(line) else {
                continue;
            };
            let Ok(mut amount) = caps["amt"].replace(',', "").parse::<f64>() else {
                continue;
            };
            let is_credit = matches!(field, Field::PaymentsCredits | Field::OtherCredits);
            if caps.name("neg").is_some() && !is_credit {
                amount = -amount;
            }
            debug!(field = ?field, amount, line, "summary figure");
            *slot(&mut summary, *field) = Some(amount);
            break;
        }
    }

    summary.period = parse_period(text)?;
    summary.payment_due_date = parse_due_date(text)?;

    if summary.is_empty() {
        warn!("no statement summary figures found; layout may be unsupported");
    }

    Ok(summary)
}

fn slot(summary: &mut StatementSummary, field: Field) -> &mut Option<f64> {
    match field {
        Field::PreviousBalance => &mut summary.previous_balance,
        Field::PaymentsCredits => &mut summary.payments_credits,
        Field::OtherCredits => &mut summary.other_credits,
        Field::Purchases => &mut summary.purchases,
        Field::CashAdvances => &mut summary.cash_advances,
        Field::BalanceTransfers => &mut summary.balance_transfers,
        Field::FeesCharged => &mut summary.fees_charged,
        Field::InterestCharged => &mut summary.interest_charged,
        Field::NewBalance => &mut summary.new_balance,
        Field::MinimumPayment => &mut summary.minimum_payment_due,
    }
}

fn parse_numeric_date(s: &str) -> Option<NaiveDate> {
    let fmt = if s.len() > 8 { "%m/%d/%Y" } else { "%m/%d/%y" };
    NaiveDate::parse_from_str(s, fmt).ok()
}

fn parse_period(text: &str) -> Result<Option<StatementPeriod>> {
    let numeric = Regex::new(r"(\d{2}/\d{2}/\d{2,4})\s*-\s*(\d{2}/\d{2}/\d{2,4})")?;
    if let Some(caps) = numeric.captures(text) {
        if let (Some(opening), Some(closing)) =
            (parse_numeric_date(&caps[1]), parse_numeric_date(&caps[2]))
        {
            return Ok(Some(StatementPeriod { opening, closing }));
        }
    }

    let spelled = Regex::new(
        r"([A-Z][a-z]{2})[a-z]*\.?\s+(\d{1,2}),\s*(\d{4})\s*-\s*([A-Z][a-z]{2})[a-z]*\.?\s+(\d{1,2}),\s*(\d{4})",
    )?;
    if let Some(caps) = spelled.captures(text) {
        let date = |m: usize, d: usize, y: usize| -> Option<NaiveDate> {
            NaiveDate::from_ymd_opt(
                caps[y].parse().ok()?,
                month_from_abbrev(&caps[m])?,
                caps[d].parse().ok()?,
            )
        };
        if let (Some(opening), Some(closing)) = (date(1, 2, 3), date(4, 5, 6)) {
            return Ok(Some(StatementPeriod { opening, closing }));
        }
    }

    Ok(None)
}

fn parse_due_date(text: &str) -> Result<Option<NaiveDate>> {
    let re = Regex::new(r"(?i)payment\s+due\s+date:?\s*(\d{2}/\d{2}/\d{2,4})")?;
    Ok(re.captures(text).and_then(|c| parse_numeric_date(&c[1])))
}
