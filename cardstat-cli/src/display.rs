//! Console output for `analyze` and `totals`

use cardstat_core::{format_usd, LedgerRecord};
use cardstat_finance::pipeline::MasterReport;
use cardstat_finance::report::{
    cardholder_summary, category_breakdown, CategoryChange, CategoryTotal,
};
use cardstat_finance::{CheckStatus, ReconcileCheck, ReportFilter, StatementAnalysis};

const RULE_WIDTH: usize = 80;

fn rule(c: char) -> String {
    c.to_string().repeat(RULE_WIDTH)
}

pub fn check_line(check: &ReconcileCheck) -> String {
    let printed = check
        .printed
        .map(format_usd)
        .unwrap_or_else(|| "n/a".to_string());
    let status = match check.status {
        CheckStatus::Match => "MATCH".to_string(),
        CheckStatus::Mismatch { difference } => format!("MISMATCH ({})", format_usd(difference)),
        CheckStatus::Unavailable => "not printed".to_string(),
    };
    format!(
        "{:<28} calculated {:>12}  statement {:>12}  {}",
        check.kind.label(),
        format_usd(check.calculated),
        printed,
        status
    )
}

pub fn render_category_table(rows: &[CategoryTotal]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<25} {:<8} {:>14} {:>11}\n", "Category", "Count", "Amount", "% of Total"));
    out.push_str(&format!("{}\n", rule('-')));

    let mut count = 0;
    let mut total = 0.0;
    for row in rows {
        count += row.count;
        total += row.total;
        out.push_str(&format!(
            "{:<25} {:<8} {:>14} {:>10.1}%\n",
            row.category.as_str(),
            row.count,
            format_usd(row.total),
            row.percent,
        ));
    }

    out.push_str(&format!("{}\n", rule('-')));
    out.push_str(&format!("{:<25} {:<8} {:>14} {:>10.1}%\n", "TOTAL", count, format_usd(total), 100.0));
    out
}

pub fn render_comparison(changes: &[CategoryChange]) -> String {
    let mut out = String::new();
    for c in changes {
        let delta = c.change();
        let sign = if delta > 0.0 { "+" } else { "" };
        out.push_str(&format!(
            "{:<25} {:>12} -> {:>12} ({}{})\n",
            c.category.as_str(),
            format_usd(c.original_total),
            format_usd(c.final_total),
            sign,
            format_usd(delta),
        ));
    }
    out
}

pub fn print_master_report(report: &MasterReport) {
    println!("\nMaster categorization file: {}", report.path.display());
    println!("  rules loaded:        {}", report.summary.rules_loaded);
    println!("  recategorized:       {}", report.summary.recategorized);
    println!("  new vendors added:   {}", report.summary.new_vendors.len());
    for (vendor, category) in &report.summary.new_vendors {
        println!("    {vendor} -> {category}");
    }
}

fn print_checks(analysis: &StatementAnalysis) {
    println!("{}", rule('='));
    println!("VERIFICATION SUMMARY");
    println!("{}", rule('='));
    for check in &analysis.reconciliation.checks {
        println!("{}", check_line(check));
    }
    if let Some(adj) = &analysis.reconciliation.adjustment {
        println!("\nAdded {} of {} on {}", adj.merchant, format_usd(adj.amount), adj.date);
    }
    println!(
        "\nOverall: {}",
        if analysis.is_reconciled() {
            "statement reconciles"
        } else {
            "statement does NOT reconcile"
        }
    );
}

fn print_cardholders(records: &[LedgerRecord]) {
    println!("SUMMARY BY CARDHOLDER");
    println!("{}", rule('='));
    for c in cardholder_summary(records) {
        println!("{}:", c.cardholder);
        println!("  Transactions: {}", c.count);
        println!("  Total:        {}", format_usd(c.total));
    }
    println!();
}

fn print_primary_check(analysis: &StatementAnalysis) {
    println!("STATEMENT TOTALS");
    println!("{}", "=".repeat(50));
    match analysis.primary_check() {
        Some(check) => println!("{}", check_line(check)),
        None => println!("(statement prints no comparable total)"),
    }
}

pub fn print_analysis(analysis: &StatementAnalysis, filter: &ReportFilter, summary_only: bool) {
    let report = filter.apply(&analysis.records);

    if summary_only {
        print_primary_check(analysis);
    } else {
        println!("\n{}", rule('='));
        match &analysis.source {
            Some(p) => println!("STATEMENT ANALYSIS: {}", p.display()),
            None => println!("STATEMENT ANALYSIS"),
        }
        println!("{}", rule('='));
        println!("Layout: {}", analysis.format);
        if let Some(suffix) = &analysis.account_suffix {
            println!("Account: ...{suffix}");
        }
        if let Some(period) = analysis.summary.period {
            println!("Statement period: {} - {}", period.opening, period.closing);
        }
        if let Some(prev) = analysis.summary.previous_balance {
            println!("Previous balance: {}", format_usd(prev));
        }
        if let Some(new) = analysis.summary.new_balance {
            println!("New balance: {}", format_usd(new));
        }
        println!();
        print_cardholders(&report);
        print_checks(analysis);
    }

    println!("\n{}", rule('='));
    println!("CATEGORY BREAKDOWN");
    println!("{}", rule('='));
    print!("{}", render_category_table(&category_breakdown(&report)));

    if !summary_only {
        if let Some(master) = &analysis.master {
            print_master_report(master);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardstat_core::Category;
    use cardstat_finance::CheckKind;

    #[test]
    fn test_check_lines() {
        let matched = ReconcileCheck {
            kind: CheckKind::Purchases,
            calculated: 2031.62,
            printed: Some(2031.62),
            status: CheckStatus::Match,
        };
        let line = check_line(&matched);
        assert!(line.starts_with("Purchases"));
        assert!(line.contains("$2,031.62"));
        assert!(line.ends_with("MATCH"));

        let missing = ReconcileCheck {
            kind: CheckKind::Fees,
            calculated: 39.0,
            printed: None,
            status: CheckStatus::Unavailable,
        };
        assert!(check_line(&missing).contains("n/a"));

        let off = ReconcileCheck {
            kind: CheckKind::Cardholder("CASEY LEE".to_string()),
            calculated: 789.00,
            printed: Some(789.19),
            status: CheckStatus::Mismatch { difference: -0.19 },
        };
        assert!(check_line(&off).contains("MISMATCH (-$0.19)"));
    }

    #[test]
    fn test_category_table_has_total_row() {
        let rows = vec![
            CategoryTotal {
                category: Category::new("GROCERY"),
                count: 2,
                total: 843.76,
                percent: 75.0,
            },
            CategoryTotal {
                category: Category::new("UTILITIES"),
                count: 1,
                total: 281.25,
                percent: 25.0,
            },
        ];
        let table = render_category_table(&rows);
        let last = table.lines().last().unwrap();
        assert!(last.starts_with("TOTAL"));
        assert!(last.contains("$1,125.01"));
        assert!(last.contains("100.0%"));
    }

    #[test]
    fn test_comparison_signs() {
        let changes = vec![
            CategoryChange {
                category: Category::new("RESTAURANT"),
                original_total: 398.67,
                final_total: 0.0,
            },
            CategoryChange {
                category: Category::new("RESTAURANT SUPPLY"),
                original_total: 0.0,
                final_total: 398.67,
            },
        ];
        let text = render_comparison(&changes);
        assert!(text.lines().next().unwrap().ends_with("(-$398.67)"));
        assert!(text.lines().nth(1).unwrap().ends_with("(+$398.67)"));
    }
}
