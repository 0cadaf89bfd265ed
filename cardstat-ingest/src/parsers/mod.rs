//! Layout-specific line parsers and the dispatch that ties detection, summary
//! and line parsing together.

pub mod capital_one_us;
pub mod chase_columnar;
pub mod chase_grouped;

use anyhow::Result;
use cardstat_core::{parse_amount, TxnKind};
use regex::Regex;
use tracing::info;

use crate::dates::YearResolver;
use crate::detect::{detect_format, DetectedBy, Detection};
use crate::summary::parse_statement_summary;
use crate::types::{ParseContext, ParsedStatement, StatementFormat};

/// Parse a statement's extracted text with whichever layout it uses
pub fn parse_statement_text(text: &str, ctx: &ParseContext) -> Result<ParsedStatement> {
    let detection = match ctx.format {
        Some(format) => Detection {
            format,
            account_suffix: crate::detect::account_suffix(text)?,
            detected_by: DetectedBy::Override,
        },
        None => detect_format(text, &ctx.accounts)?,
    };

    let summary = parse_statement_summary(text)?;
    let years = YearResolver::new(summary.period.map(|p| p.closing), ctx.fallback_year);

    let (transactions, sections) = match detection.format {
        StatementFormat::ChaseGrouped => chase_grouped::parse_chase_grouped_text(text, ctx, &years)?,
        StatementFormat::ChaseColumnar => {
            (chase_columnar::parse_chase_columnar_text(text, ctx, &years)?, Vec::new())
        }
        StatementFormat::CapitalOne => {
            (capital_one_us::parse_capital_one_us_text(text, ctx, &years)?, Vec::new())
        }
    };

    info!(
        format = %detection.format,
        transactions = transactions.len(),
        sections = sections.len(),
        "statement parsed"
    );

    Ok(ParsedStatement {
        format: detection.format,
        account_suffix: detection.account_suffix,
        summary,
        transactions,
        sections,
    })
}

/// `MM/DD  merchant  amount` row shared by the Chase layouts
pub(crate) fn chase_row_regex() -> Result<Regex> {
    Ok(Regex::new(concat!(
        r"^(?P<date>\d{2}/\d{2})\s+",
        r"(?P<desc>.+?)\s+",
        r"(?P<amt>-?\$?(?:\d{1,3}(?:,\d{3})+|\d+)\.\d{2})$"
    ))?)
}

/// A matched row before cardholder/kind are settled
pub(crate) struct RawRow<'a> {
    pub date: &'a str,
    pub description: &'a str,
    pub amount: f64,
}

pub(crate) fn match_chase_row<'a>(re: &Regex, line: &'a str) -> Option<RawRow<'a>> {
    let caps = re.captures(line)?;
    let description = caps.name("desc")?.as_str().trim();
    if !usable_description(description) {
        return None;
    }
    Some(RawRow {
        date: caps.name("date")?.as_str(),
        description,
        amount: parse_amount(caps.name("amt")?.as_str())?,
    })
}

/// Descriptions too short to be a merchant, or that are really total rows
pub(crate) fn usable_description(desc: &str) -> bool {
    if desc.chars().count() < 3 {
        return false;
    }
    !matches!(
        desc.to_uppercase().as_str(),
        "TOTAL" | "SUBTOTAL" | "BALANCE"
    )
}

/// Payments and refunds: negative amounts or payment wording
pub(crate) fn is_credit(description: &str, amount: f64) -> bool {
    let lower = description.to_lowercase();
    amount < 0.0 || lower.contains("payment") || lower.contains("thank you")
}

/// Rows the summary counts under cash advances or balance transfers
pub(crate) fn is_cash_advance(description: &str) -> bool {
    let upper = description.to_uppercase();
    upper.contains("CASH ADVANCE") || upper.contains("BALANCE TRANSFER")
}

pub(crate) fn row_kind(description: &str, amount: f64, in_fees: bool) -> TxnKind {
    if in_fees {
        TxnKind::Fee
    } else if is_credit(description, amount) {
        TxnKind::Credit
    } else if is_cash_advance(description) {
        TxnKind::CashAdvance
    } else {
        TxnKind::Purchase
    }
}

/// Tracks whether the parser is inside the `FEES CHARGED` block
#[derive(Debug, Default)]
pub(crate) struct FeeSection {
    active: bool,
}

impl FeeSection {
    pub fn active(&self) -> bool {
        self.active
    }

    /// Feed one line; returns true when it was a section boundary to skip.
    ///
    /// The summary line `Fees Charged $0.00` carries digits and is not a
    /// section title.
    pub fn observe(&mut self, line: &str) -> bool {
        let upper = line.to_uppercase();
        let has_digits = upper.chars().any(|c| c.is_ascii_digit());

        if !has_digits && (upper.starts_with("FEES CHARGED") || upper == "FEES") {
            self.active = true;
            return true;
        }
        if self.active
            && (upper.contains("INTEREST CHARGE") || upper.contains("TOTAL FEES"))
        {
            self.active = false;
            return true;
        }
        false
    }
}

/// True when the line contains any of the (uppercase) markers
pub(crate) fn contains_any(line: &str, markers: &[&str]) -> bool {
    let upper = line.to_uppercase();
    markers.iter().any(|m| upper.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_regex_amount_shapes() {
        let re = chase_row_regex().unwrap();
        let row = match_chase_row(&re, "06/11 RESTAURANT DEPOT PORTLAND OR 3,493.67").unwrap();
        assert_eq!(row.date, "06/11");
        assert_eq!(row.description, "RESTAURANT DEPOT PORTLAND OR");
        assert_eq!(row.amount, 3493.67);

        let row = match_chase_row(&re, "06/28 Payment Thank You-Mobile -19,000.00").unwrap();
        assert_eq!(row.amount, -19000.0);

        let row = match_chase_row(&re, "07/01 WIRE FEE 19000.00").unwrap();
        assert_eq!(row.amount, 19000.0);

        assert!(match_chase_row(&re, "06/11 OR 3.00").is_none());
        assert!(match_chase_row(&re, "06/11 TOTAL 3.00").is_none());
        assert!(match_chase_row(&re, "Previous Balance $22,898.07").is_none());
    }

    #[test]
    fn test_fee_section_ignores_summary_line() {
        let mut fees = FeeSection::default();
        assert!(!fees.observe("Fees Charged $39.00"));
        assert!(!fees.active());
        assert!(fees.observe("FEES CHARGED"));
        assert!(fees.active());
        assert!(!fees.observe("07/05 LATE FEE 39.00"));
        assert!(fees.observe("TOTAL FEES FOR THIS PERIOD $39.00"));
        assert!(!fees.active());
    }

    #[test]
    fn test_credit_wording() {
        assert!(is_credit("Payment Thank You-Mobile", 10.0));
        assert!(is_credit("AMZNMktplace amazon.co.uk", -11.33));
        assert!(!is_credit("COSTCO WHSE #0692", 41.95));
        assert_eq!(row_kind("LATE FEE", 39.0, true), TxnKind::Fee);
    }

    #[test]
    fn test_cash_advance_rows() {
        assert_eq!(row_kind("CASH ADVANCE CHASE BRANCH 0412", 200.0, false), TxnKind::CashAdvance);
        assert_eq!(row_kind("Balance Transfer from card 4410", 1250.0, false), TxnKind::CashAdvance);
        assert_eq!(row_kind("CASH ADVANCE FEE", 10.0, true), TxnKind::Fee);
        assert_eq!(row_kind("COSTCO WHSE #0692", 41.95, false), TxnKind::Purchase);
    }
}
