//! Capital One US statements
//!
//! Rows follow the column header and carry both a transaction and a posting
//! date:
//!   Trans Date     Post Date      Description                                         Amount
//!   Jul 20         Jul 22         H-E-B #455SAN MARCOSTX                                $5.82
//!   Jul 28         Jul 29         WALMART.COMWALMART.COMAR                            - $14.05
//!
//! Accounts with several cards print a `NAME #1234: Transactions` heading
//! above each card's rows.

use anyhow::Result;
use regex::Regex;
use tracing::{debug, warn};

use super::{row_kind, usable_description, FeeSection};
use crate::dates::YearResolver;
use crate::types::{ParseContext, StatementTransaction};

pub fn parse_capital_one_us_text(
    text: &str,
    ctx: &ParseContext,
    years: &YearResolver,
) -> Result<Vec<StatementTransaction>> {
    let header_re = Regex::new(r"(?i)trans\s+date\s+post\s+date\s+description\s+amount")?;
    let card_re = Regex::new(
        r"^(?P<name>[A-Z][A-Z .'\-]*[A-Z])\s+#(?P<card>\d{4}):\s*(?:[Pp]ayments|[Tt]ransactions)",
    )?;
    let txn_re = Regex::new(concat!(
        r"^\s*(?P<trans>[A-Za-z]{3}\s+\d{1,2})\s+",
        r"(?P<post>[A-Za-z]{3}\s+\d{1,2})\s+",
        r"(?P<desc>.+?)\s+",
        r"(?P<polarity>-)?\s*\$(?P<amt>\d{1,3}(?:,\d{3})*\.\d{2})\s*$"
    ))?;

    let mut in_section = false;
    let mut cardholder = ctx.primary_cardholder.clone();
    let mut fees = FeeSection::default();
    let mut out = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(caps) = card_re.captures(line) {
            cardholder = caps["name"].to_string();
            debug!(cardholder = %cardholder, card = &caps["card"], "card block");
            continue;
        }

        if !in_section {
            if header_re.is_match(line) {
                in_section = true;
            }
            continue;
        }

        if fees.observe(line) {
            continue;
        }

        let Some(caps) = txn_re.captures(line) else {
            continue;
        };
        let description = caps["desc"].trim();
        if !usable_description(description) {
            continue;
        }
        let Some(date) = years.parse_mmm_dd(&caps["trans"]) else {
            warn!(line, "row date does not resolve to a calendar date");
            continue;
        };
        let Ok(magnitude) = caps["amt"].replace(',', "").parse::<f64>() else {
            continue;
        };
        let amount = if caps.name("polarity").is_some() {
            -magnitude
        } else {
            magnitude
        };

        out.push(StatementTransaction {
            date,
            post_date: years.parse_mmm_dd(&caps["post"]),
            cardholder: cardholder.clone(),
            description: description.to_string(),
            amount,
            kind: row_kind(description, amount, fees.active()),
        });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardstat_core::TxnKind;
    use chrono::NaiveDate;

    fn years() -> YearResolver {
        YearResolver::new(NaiveDate::from_ymd_opt(2024, 8, 4), 1999)
    }

    #[test]
    fn test_parses_basic_rows() {
        let text = r#"
Trans Date     Post Date      Description                                         Amount
Jul 20         Jul 22         H-E-B #455SAN MARCOSTX                                $5.82
Jul 28         Jul 29         WALMART.COMWALMART.COMAR                            - $14.05
"#;

        let txns = parse_capital_one_us_text(text, &ParseContext::default(), &years()).unwrap();
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].amount, 5.82);
        assert_eq!(txns[0].kind, TxnKind::Purchase);
        assert_eq!(txns[0].date, NaiveDate::from_ymd_opt(2024, 7, 20).unwrap());
        assert_eq!(txns[0].post_date, NaiveDate::from_ymd_opt(2024, 7, 22));
        assert_eq!(txns[1].amount, -14.05);
        assert_eq!(txns[1].kind, TxnKind::Credit);
        assert!(txns[0].description.contains("H-E-B"));
    }

    #[test]
    fn test_rows_before_header_are_ignored() {
        let text = "Jul 20 Jul 22 SOMETHING ELSE $5.82\n";
        let txns = parse_capital_one_us_text(text, &ParseContext::default(), &years()).unwrap();
        assert!(txns.is_empty());
    }

    #[test]
    fn test_card_blocks_and_fees() {
        let text = r#"
JORDAN LEE #4421: Payments, Credits and Adjustments
Trans Date     Post Date      Description                                         Amount
Jul 14         Jul 14         CAPITAL ONE MOBILE PYMT                           - $120.00
CASEY LEE #9012: Transactions
Trans Date     Post Date      Description                                         Amount
Jul 30         Jul 31         SPOTIFY USA                                          $11.99
Fees
Aug 04         Aug 04         PAST DUE FEE                                         $25.00
Total Fees for This Period $25.00
"#;
        let ctx = ParseContext {
            primary_cardholder: "JORDAN LEE".to_string(),
            ..ParseContext::default()
        };
        let txns = parse_capital_one_us_text(text, &ctx, &years()).unwrap();
        assert_eq!(txns.len(), 3);
        assert_eq!(txns[0].cardholder, "JORDAN LEE");
        assert_eq!(txns[0].kind, TxnKind::Credit);
        assert_eq!(txns[1].cardholder, "CASEY LEE");
        assert_eq!(txns[2].kind, TxnKind::Fee);
        assert_eq!(txns[2].amount, 25.0);
    }
}
