//! Chase columnar layout ("5136" style)
//!
//! One flat `Date of Transaction | Merchant Name | $ Amount` table with no
//! per-cardholder grouping, followed by the `FEES CHARGED` block.

use anyhow::Result;
use regex::Regex;
use tracing::{debug, warn};

use super::{chase_row_regex, contains_any, match_chase_row, row_kind, FeeSection};
use crate::dates::YearResolver;
use crate::types::{ParseContext, StatementTransaction};

const SKIP_MARKERS: &[&str] = &[
    "DATE OF",
    "MERCHANT NAME",
    "$ AMOUNT",
    "ACCOUNT SUMMARY",
    "PREVIOUS BALANCE",
    "NEW BALANCE",
    "MINIMUM PAYMENT",
    "PAYMENT DUE",
    "INTEREST",
    "TOTAL FEES",
];

pub fn parse_chase_columnar_text(
    text: &str,
    ctx: &ParseContext,
    years: &YearResolver,
) -> Result<Vec<StatementTransaction>> {
    let row_re = chase_row_regex()?;
    // Column headers sometimes land on a line of their own
    let header_re = Regex::new(r"(?i)^transaction$")?;

    let mut out = Vec::new();
    let mut fees = FeeSection::default();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if fees.observe(line) {
            continue;
        }
        if header_re.is_match(line) || contains_any(line, SKIP_MARKERS) {
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
        debug!(date = %date, kind = %kind, amount = row.amount, "columnar row");

        out.push(StatementTransaction {
            date,
            post_date: None,
            cardholder: ctx.primary_cardholder.clone(),
            description: row.description.to_string(),
            amount: row.amount,
            kind,
        });
    }

    Ok(out)
}
