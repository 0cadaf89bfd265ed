//! Statement layout detection

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

use crate::types::StatementFormat;

/// Account numbers are printed near the top; only this many lines are searched
const HEADER_LINES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectedBy {
    AccountNumber,
    LayoutMarker,
    Default,
    Override,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    pub format: StatementFormat,
    pub account_suffix: Option<String>,
    pub detected_by: DetectedBy,
}

/// Last four digits of the `Account Number:` line, if printed
pub fn account_suffix(text: &str) -> Result<Option<String>> {
    let re = Regex::new(r"(?i)account\s+number:?[^\n]*?(\d{4})\D*$")?;
    for line in text.lines().take(HEADER_LINES) {
        if let Some(caps) = re.captures(line.trim()) {
            return Ok(Some(caps[1].to_string()));
        }
    }
    Ok(None)
}

/// Decide which layout the text uses: account suffix table first, then
/// layout markers, then the columnar layout.
pub fn detect_format(text: &str, accounts: &HashMap<String, StatementFormat>) -> Result<Detection> {
    let suffix = account_suffix(text)?;

    if let Some(format) = suffix.as_ref().and_then(|s| accounts.get(s)) {
        info!(format = %format, account = ?suffix, "layout detected from account number");
        return Ok(Detection {
            format: *format,
            account_suffix: suffix,
            detected_by: DetectedBy::AccountNumber,
        });
    }

    let markers: [(Regex, StatementFormat); 3] = [
        (
            Regex::new(r"(?i)date\s+of\s+transaction")?,
            StatementFormat::ChaseColumnar,
        ),
        (
            Regex::new(r"(?i)transactions?\s+this\s+cycle")?,
            StatementFormat::ChaseGrouped,
        ),
        (
            Regex::new(r"(?i)trans\s+date\s+post\s+date\s+description\s+amount")?,
            StatementFormat::CapitalOne,
        ),
    ];

    for (re, format) in &markers {
        if re.is_match(text) {
            info!(format = %format, account = ?suffix, "layout detected from markers");
            return Ok(Detection {
                format: *format,
                account_suffix: suffix,
                detected_by: DetectedBy::LayoutMarker,
            });
        }
    }

    info!(account = ?suffix, "no layout markers; assuming chase-columnar");
    Ok(Detection {
        format: StatementFormat::ChaseColumnar,
        account_suffix: suffix,
        detected_by: DetectedBy::Default,
    })
}
