//! Chase statements grouped by cardholder ("0801" layout)
//!
//! Each cardholder's rows are followed by a footer:
//!
//! ```text
//!   06/25 RESTAURANT DEPOT PORTLAND OR 1,615.60
//!   07/02 INDIA SUPERMARKET BEAVERTON OR 75.32
//!   JORDAN LEE
//!   TRANSACTIONS THIS CYCLE (CARD 7172) $12355.20
//! ```
//!
//! The name line right above `TRANSACTIONS THIS CYCLE` owns every row seen
//! since the previous footer. Rows after the last footer belong to the last
//! cardholder seen.
//!
//! The footer total is the net of the whole block, payments included. A net
//! credit prints with a trailing minus and an extra line:
//!
//! ```text
//!   CASEY LEE
//!   TRANSACTIONS THIS CYCLE (CARD 0801) $17033.62-
//!   INCLUDING PAYMENTS RECEIVED
//! ```

use anyhow::Result;
use cardstat_core::{parse_amount, TxnKind};
use regex::Regex;
use tracing::{debug, warn};

use super::{chase_row_regex, contains_any, match_chase_row, row_kind, FeeSection};
use crate::dates::YearResolver;
use crate::types::{CardholderSection, ParseContext, StatementTransaction};

/// Summary and header lines that can never be transaction rows
const SKIP_MARKERS: &[&str] = &[
    "ACCOUNT SUMMARY",
    "PREVIOUS BALANCE",
    "BALANCE TRANSFERS",
    "CASH ADVANCES",
    "INTEREST CHARGE",
    "NEW BALANCE",
    "MINIMUM PAYMENT DUE",
    "PAYMENT DUE DATE",
    "INCLUDING PAYMENTS RECEIVED",
];

fn is_cardholder_name(line: &str, name_re: &Regex) -> bool {
    name_re.is_match(line) && line.contains(' ') && !line.to_uppercase().contains("ACCOUNT")
}

pub fn parse_chase_grouped_text(
    text: &str,
    ctx: &ParseContext,
    years: &YearResolver,
) -> Result<(Vec<StatementTransaction>, Vec<CardholderSection>)> {
    let row_re = chase_row_regex()?;
    let cycle_re = Regex::new(r"(?i)transactions?\s+this\s+cycle")?;
    let footer_re = Regex::new(
        r"(?i)transactions?\s+this\s+cycle\s*(?:\(card\s+(?P<card>\d{4})\))?\s*(?:(?P<total>-?\$?[\d,]+\.\d{2})(?P<trail>-)?)?",
    )?;
    let name_re = Regex::new(r"^[A-Z][A-Z .'\-]*[A-Z]$")?;

    let lines: Vec<&str> = text.lines().map(str::trim).collect();

    let mut out = Vec::new();
    let mut sections = Vec::new();
    let mut pending: Vec<StatementTransaction> = Vec::new();
    let mut current: Option<String> = None;
    let mut fees = FeeSection::default();

    for (i, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }

        if cycle_re.is_match(line) {
            let caps = footer_re.captures(line);
            let cardholder = current
                .clone()
                .unwrap_or_else(|| ctx.primary_cardholder.clone());
            let section = CardholderSection {
                cardholder,
                card_suffix: caps
                    .as_ref()
                    .and_then(|c| c.name("card"))
                    .map(|m| m.as_str().to_string()),
                reported_total: caps.as_ref().and_then(|c| {
                    let total = parse_amount(c.name("total")?.as_str())?;
                    Some(if c.name("trail").is_some() { -total } else { total })
                }),
            };
            debug!(?section, "cardholder footer");
            sections.push(section);
            continue;
        }

        let next = lines.get(i + 1).copied().unwrap_or("");
        if cycle_re.is_match(next) && is_cardholder_name(line, &name_re) {
            let name = line.to_string();
            for mut txn in pending.drain(..) {
                if txn.cardholder.is_empty() {
                    txn.cardholder = name.clone();
                }
                out.push(txn);
            }
            current = Some(name);
            continue;
        }

        if fees.observe(line) || contains_any(line, SKIP_MARKERS) {
            continue;
        }

        let Some(row) = match_chase_row(&row_re, line) else {
            continue;
        };
        let Some(date) = years.parse_mm_dd(row.date) else {
            warn!(line, "row date does not resolve to a calendar date");
            continue;
        };

        let kind = row_kind(row.description, row.amount, fees.active());
        // Fees are account-level, not part of any cardholder block
        let cardholder = if kind == TxnKind::Fee {
            ctx.primary_cardholder.clone()
        } else {
            String::new()
        };

        pending.push(StatementTransaction {
            date,
            post_date: None,
            cardholder,
            description: row.description.to_string(),
            amount: row.amount,
            kind,
        });
    }

    let trailing_owner = current.unwrap_or_else(|| ctx.primary_cardholder.clone());
    for mut txn in pending {
        if txn.cardholder.is_empty() {
            txn.cardholder = trailing_owner.clone();
        }
        out.push(txn);
    }

    Ok((out, sections))
}
