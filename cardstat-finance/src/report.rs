//! Transaction CSVs, category/cardholder breakdowns and the `.categories`
//! summary file

use anyhow::{anyhow, Context, Result};
use cardstat_core::{format_usd, Category, LedgerRecord, TxnKind};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const CSV_DATE_FORMAT: &str = "%Y/%m/%d";
const BASE_COLUMNS: [&str; 6] = ["date", "cardholder", "merchant", "amount", "type", "category"];

/// Which records make it into reports
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub include_credits: bool,
    pub cardholder: Option<String>,
}

impl ReportFilter {
    pub fn keeps(&self, record: &LedgerRecord) -> bool {
        if record.is_credit() && !self.include_credits {
            return false;
        }
        match &self.cardholder {
            Some(name) => record.cardholder.eq_ignore_ascii_case(name),
            None => true,
        }
    }

    pub fn apply(&self, records: &[LedgerRecord]) -> Vec<LedgerRecord> {
        records.iter().filter(|r| self.keeps(r)).cloned().collect()
    }
}

pub fn write_transactions_csv(path: &Path, records: &[LedgerRecord]) -> Result<()> {
    let with_original = records.iter().any(|r| r.original_category.is_some());

    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("writing {}", path.display()))?;

    let mut header: Vec<&str> = BASE_COLUMNS.to_vec();
    if with_original {
        header.push("original_category");
    }
    wtr.write_record(&header)?;

    for r in records {
        let mut row = vec![
            r.date.format(CSV_DATE_FORMAT).to_string(),
            r.cardholder.clone(),
            r.merchant.clone(),
            format!("{:.2}", r.amount),
            r.kind.label().to_string(),
            r.category.to_string(),
        ];
        if with_original {
            row.push(r.base_category().to_string());
        }
        wtr.write_record(&row)?;
    }
    wtr.flush()?;

    info!(path = %path.display(), rows = records.len(), "transactions CSV written");
    Ok(())
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    cardholder: String,
    merchant: String,
    amount: f64,
    #[serde(rename = "type")]
    kind: String,
    category: String,
    #[serde(default)]
    original_category: Option<String>,
}

fn parse_csv_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, CSV_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .ok()
}

pub fn read_transactions_csv(path: &Path) -> Result<Vec<LedgerRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut records = Vec::new();
    for (i, row) in rdr.deserialize::<CsvRow>().enumerate() {
        let line = i + 2;
        let row = row.with_context(|| format!("{} line {}", path.display(), line))?;

        let date = parse_csv_date(&row.date)
            .ok_or_else(|| anyhow!("{} line {}: bad date '{}'", path.display(), line, row.date))?;
        let kind = TxnKind::from_label(&row.kind)
            .ok_or_else(|| anyhow!("{} line {}: unknown type '{}'", path.display(), line, row.kind))?;

        let mut record = LedgerRecord::new(
            date,
            row.cardholder,
            row.merchant,
            row.amount,
            kind,
            Category::new(row.category),
        );
        record.original_category = row
            .original_category
            .filter(|c| !c.is_empty())
            .map(Category::new);
        records.push(record);
    }
    Ok(records)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub count: usize,
    pub total: f64,
    /// Share of the grand total; 0 when the grand total is not positive
    pub percent: f64,
}

fn totals_by<'a>(
    records: &'a [LedgerRecord],
    key: impl Fn(&'a LedgerRecord) -> &'a Category,
) -> HashMap<&'a Category, (usize, f64)> {
    let mut map: HashMap<&Category, (usize, f64)> = HashMap::new();
    for r in records {
        let entry = map.entry(key(r)).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += r.amount;
    }
    map
}

/// Per-category count and total, largest total first
pub fn category_breakdown(records: &[LedgerRecord]) -> Vec<CategoryTotal> {
    let grand: f64 = records.iter().map(|r| r.amount).sum();

    let mut rows: Vec<CategoryTotal> = totals_by(records, |r| &r.category)
        .into_iter()
        .map(|(category, (count, total))| CategoryTotal {
            category: category.clone(),
            count,
            total,
            percent: if grand > 0.0 { total * 100.0 / grand } else { 0.0 },
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.category.cmp(&b.category))
    });
    rows
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardholderTotal {
    pub cardholder: String,
    pub count: usize,
    pub total: f64,
}

/// Per-cardholder totals in order of first appearance
pub fn cardholder_summary(records: &[LedgerRecord]) -> Vec<CardholderTotal> {
    let mut out: Vec<CardholderTotal> = Vec::new();
    for r in records {
        match out.iter_mut().find(|c| c.cardholder == r.cardholder) {
            Some(c) => {
                c.count += 1;
                c.total += r.amount;
            }
            None => out.push(CardholderTotal {
                cardholder: r.cardholder.clone(),
                count: 1,
                total: r.amount,
            }),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryChange {
    pub category: Category,
    pub original_total: f64,
    pub final_total: f64,
}

impl CategoryChange {
    pub fn change(&self) -> f64 {
        self.final_total - self.original_total
    }
}

/// Categories whose totals moved by more than a cent once master rules ran
pub fn category_comparison(records: &[LedgerRecord]) -> Vec<CategoryChange> {
    let finals = totals_by(records, |r| &r.category);
    let originals = totals_by(records, |r| r.base_category());

    let mut names: Vec<&Category> = finals.keys().chain(originals.keys()).copied().collect();
    names.sort();
    names.dedup();

    names
        .into_iter()
        .filter_map(|category| {
            let original_total = originals.get(category).map_or(0.0, |t| t.1);
            let final_total = finals.get(category).map_or(0.0, |t| t.1);
            ((original_total - final_total).abs() > 0.01).then(|| CategoryChange {
                category: category.clone(),
                original_total,
                final_total,
            })
        })
        .collect()
}

/// `<csv stem>.categories` next to the CSV
pub fn category_summary_path(csv_path: &Path) -> PathBuf {
    csv_path.with_extension("categories")
}

pub fn render_category_summary(
    source: &str,
    records: &[LedgerRecord],
    generated_at: NaiveDateTime,
) -> String {
    let total: f64 = records.iter().map(|r| r.amount).sum();
    let mut by_name = category_breakdown(records);
    by_name.sort_by(|a, b| a.category.cmp(&b.category));

    let mut out = String::new();
    out.push_str("CREDIT CARD STATEMENT - CATEGORY ANALYSIS\n");
    out.push_str(&format!("{}\n", "=".repeat(80)));
    out.push_str(&format!("Generated from: {source}\n"));
    out.push_str(&format!("Analysis Date: {}\n", generated_at.format("%Y-%m-%d %H:%M:%S")));
    out.push_str(&format!("Total Transactions: {}\n", records.len()));
    out.push_str(&format!("Total Amount: {}\n", format_usd(total)));
    out.push('\n');
    out.push_str("CATEGORY BREAKDOWN\n");
    out.push_str(&format!("{}\n", "=".repeat(80)));
    for row in by_name {
        out.push_str(&format!(
            "{:<20} {:>3} transactions  {:>11}\n",
            row.category,
            row.count,
            format_usd(row.total),
        ));
    }
    out
}

/// Write the `.categories` summary for a transactions CSV; returns its path
pub fn write_category_summary(
    csv_path: &Path,
    records: &[LedgerRecord],
    generated_at: NaiveDateTime,
) -> Result<PathBuf> {
    let path = category_summary_path(csv_path);
    let source = csv_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| csv_path.display().to_string());
    fs::write(&path, render_category_summary(&source, records, generated_at))
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "category summary written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(cardholder: &str, merchant: &str, amount: f64, kind: TxnKind, category: &str) -> LedgerRecord {
        LedgerRecord::new(
            NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            cardholder,
            merchant,
            amount,
            kind,
            Category::new(category),
        )
    }

    fn sample() -> Vec<LedgerRecord> {
        vec![
            rec("JORDAN LEE", "COSTCO WHSE #0692", 300.0, TxnKind::Purchase, "GROCERY"),
            rec("CASEY LEE", "SHELL OIL 57444", 50.0, TxnKind::Purchase, "GAS/FUEL"),
            rec("JORDAN LEE", "SAFEWAY #1234", 150.0, TxnKind::Purchase, "GROCERY"),
            rec("CASEY LEE", "Payment Thank You", -400.0, TxnKind::Credit, "PAYMENT"),
        ]
    }

    #[test]
    fn test_filter_drops_credits_by_default() {
        let kept = ReportFilter::default().apply(&sample());
        assert_eq!(kept.len(), 3);

        let casey = ReportFilter {
            include_credits: true,
            cardholder: Some("casey lee".to_string()),
        }
        .apply(&sample());
        assert_eq!(casey.len(), 2);
    }

    #[test]
    fn test_breakdown_sorted_by_total_with_percent() {
        let records = ReportFilter::default().apply(&sample());
        let rows = category_breakdown(&records);
        assert_eq!(rows[0].category.as_str(), "GROCERY");
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].total, 450.0);
        assert_eq!(rows[0].percent, 90.0);
        assert_eq!(rows[1].category.as_str(), "GAS/FUEL");
    }

    #[test]
    fn test_percent_is_zero_for_non_positive_total() {
        let rows = category_breakdown(&sample());
        assert!(rows.iter().all(|r| r.percent == 0.0));
    }

    #[test]
    fn test_cardholders_in_first_appearance_order() {
        let rows = cardholder_summary(&ReportFilter::default().apply(&sample()));
        assert_eq!(rows[0].cardholder, "JORDAN LEE");
        assert_eq!(rows[0].total, 450.0);
        assert_eq!(rows[1].cardholder, "CASEY LEE");
        assert_eq!(rows[1].count, 1);
    }

    #[test]
    fn test_comparison_lists_changed_categories() {
        let mut records = ReportFilter::default().apply(&sample());
        records[1].original_category = Some(Category::new("GAS/FUEL"));
        records[1].category = Category::new("AUTO");

        let changes = category_comparison(&records);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].category.as_str(), "AUTO");
        assert_eq!(changes[0].change(), 50.0);
        assert_eq!(changes[1].category.as_str(), "GAS/FUEL");
        assert_eq!(changes[1].final_total, 0.0);
    }

    #[test]
    fn test_csv_written_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statement.csv");

        let mut records = sample();
        records[0].original_category = Some(Category::new("OTHER"));
        write_transactions_csv(&path, &records).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "date,cardholder,merchant,amount,type,category,original_category"
        );
        assert_eq!(
            lines.next().unwrap(),
            "2025/06/10,JORDAN LEE,COSTCO WHSE #0692,300.00,Purchase,GROCERY,OTHER"
        );
        assert!(text.contains("Credit/Payment,PAYMENT,PAYMENT"));

        let back = read_transactions_csv(&path).unwrap();
        assert_eq!(back.len(), 4);
        assert_eq!(back[0].original_category.as_ref().unwrap().as_str(), "OTHER");
        assert_eq!(back[3].kind, TxnKind::Credit);
        assert_eq!(back[3].amount, -400.0);
    }

    #[test]
    fn test_csv_without_original_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.csv");
        fs::write(
            &path,
            "date,cardholder,merchant,amount,type,category\n2025/07/05,PRIMARY,LATE FEE,39.00,Fee,CC FEES\n",
        )
        .unwrap();
        let back = read_transactions_csv(&path).unwrap();
        assert_eq!(back[0].kind, TxnKind::Fee);
        assert!(back[0].original_category.is_none());
    }

    #[test]
    fn test_category_summary_file() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("june.csv");
        let at = NaiveDate::from_ymd_opt(2025, 7, 8)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();

        let records = ReportFilter::default().apply(&sample());
        let path = write_category_summary(&csv_path, &records, at).unwrap();
        assert_eq!(path, dir.path().join("june.categories"));

        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("Generated from: june.csv"));
        assert!(text.contains("Analysis Date: 2025-07-08 09:30:00"));
        assert!(text.contains("Total Transactions: 3"));
        assert!(text.contains("Total Amount: $500.00"));
        let gas = text.find("GAS/FUEL").unwrap();
        let grocery = text.find("GROCERY").unwrap();
        assert!(gas < grocery);
    }
}
