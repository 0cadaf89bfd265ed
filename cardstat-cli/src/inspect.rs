//! `cardstat inspect`: a look at what the parsers see, for tuning layouts

use anyhow::Result;
use cardstat_core::format_usd;
use cardstat_ingest::{detect_format, parse_statement_summary, parse_statement_text, read_statement_text};
use regex::Regex;
use std::path::Path;

use crate::config::Config;

/// Lines that end in a money amount, the raw material of every row parser
pub fn candidate_lines(text: &str) -> Result<Vec<(usize, &str)>> {
    let money = Regex::new(r"-?\s*\$?\s*[\d,]+\.\d{2}\s*$")?;
    Ok(text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| money.is_match(l))
        .collect())
}

fn show(label: &str, value: Option<f64>) {
    match value {
        Some(v) => println!("  {:<20} {:>12}", label, format_usd(v)),
        None => println!("  {:<20} {:>12}", label, "-"),
    }
}

pub fn run(pdf: &Path, cfg: &Config) -> Result<()> {
    let text = read_statement_text(pdf)?;
    let ctx = cfg.parse_context(None);

    let detection = detect_format(&text, &ctx.accounts)?;
    println!("File:     {}", pdf.display());
    println!(
        "Layout:   {} (by {:?})",
        detection.format, detection.detected_by
    );
    if let Some(suffix) = &detection.account_suffix {
        println!("Account:  ...{suffix}");
    }

    let summary = parse_statement_summary(&text)?;
    println!("\nSummary figures:");
    if let Some(period) = summary.period {
        println!("  {:<20} {} - {}", "Period", period.opening, period.closing);
    }
    show("Previous balance", summary.previous_balance);
    show("Payments/credits", summary.payments_credits);
    show("Other credits", summary.other_credits);
    show("Purchases", summary.purchases);
    show("Cash advances", summary.cash_advances);
    show("Balance transfers", summary.balance_transfers);
    show("Fees charged", summary.fees_charged);
    show("Interest charged", summary.interest_charged);
    show("New balance", summary.new_balance);
    show("Minimum payment", summary.minimum_payment_due);

    let candidates = candidate_lines(&text)?;
    println!("\nLines ending in an amount ({}):", candidates.len());
    for (n, line) in &candidates {
        println!("  {n:>5}: {line}");
    }

    let parsed = parse_statement_text(&text, &ctx)?;
    println!("\nParsed transactions: {}", parsed.transactions.len());
    for section in &parsed.sections {
        let total = section
            .reported_total
            .map(format_usd)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  section {} card {} printed {}",
            section.cardholder,
            section.card_suffix.as_deref().unwrap_or("????"),
            total
        );
    }

    Ok(())
}
