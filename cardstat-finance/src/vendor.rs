//! Vendor keys: the short merchant name new master rules are registered under.
//!
//! `COSTCO WHSE #0692 HILLSBORO OR` -> `COSTCO WHSE`,
//! `SHELL OIL 57444 PORTLAND OR` -> `SHELL OIL`.

use anyhow::Result;
use regex::Regex;

pub const AMAZON_KEY: &str = "AMAZON";

/// Merchants sold through Amazon's many billing names
pub fn is_amazon(merchant: &str) -> bool {
    let upper = merchant.to_uppercase();
    upper.contains("AMAZON") || upper.contains("AMZN")
}

#[derive(Debug, Clone)]
pub struct VendorKeyer {
    /// Applied in order; each strips a trailing chunk
    strip: [Regex; 4],
}

impl VendorKeyer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            strip: [
                // phone number and everything after it
                Regex::new(r"\s+\d{3}-\d{3}-\d{4}.*$")?,
                // state code
                Regex::new(r"\s+[A-Z]{2}$")?,
                // store number
                Regex::new(r"\s+#\d+.*$")?,
                // trailing numbers
                Regex::new(r"\s+\d+.*$")?,
            ],
        })
    }

    pub fn key(&self, merchant: &str) -> String {
        let upper = merchant.trim().to_uppercase();
        if is_amazon(&upper) {
            return AMAZON_KEY.to_string();
        }

        let mut cleaned = upper;
        for re in &self.strip {
            cleaned = re.replace(&cleaned, "").into_owned();
        }

        let words: Vec<&str> = cleaned.split_whitespace().collect();
        // every strip pattern needs leading whitespace, so only a blank
        // merchant ends up with an empty key
        if words.len() > 3 {
            let meaningful: Vec<&str> = words[..3]
                .iter()
                .copied()
                .filter(|w| w.chars().count() > 2 && !w.chars().all(|c| c.is_ascii_digit()))
                .take(2)
                .collect();
            if meaningful.is_empty() {
                words[0].to_string()
            } else {
                meaningful.join(" ")
            }
        } else {
            words.join(" ")
        }
    }
}
