//! Statement analysis pipeline: parse -> categorize -> master rules ->
//! reconcile (and balance). Also the CSV-only `totals` flow.

use anyhow::{bail, Context, Result};
use cardstat_core::{categorize, Category, LedgerRecord};
use cardstat_ingest::{
    parse_statement_text, read_statement_text, CardholderSection, ParseContext, StatementFormat,
    StatementSummary, StatementTransaction,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::category_rules::{RecategorizeSummary, Recategorizer, VendorPrompt};
use crate::master_file::MasterRules;
use crate::reconcile::{
    balance_against, primary_check, reconcile_and_balance, ReconcileCheck, Reconciliation,
    DEFAULT_TOLERANCE,
};
use crate::report::{read_transactions_csv, write_transactions_csv};

#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub parse: ParseContext,
    /// Apply (and maintain) this master categorization file
    pub master_file: Option<PathBuf>,
    pub tolerance: f64,
    pub auto_balance: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            parse: ParseContext::default(),
            master_file: None,
            tolerance: DEFAULT_TOLERANCE,
            auto_balance: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MasterReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub summary: RecategorizeSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatementAnalysis {
    pub source: Option<PathBuf>,
    pub format: StatementFormat,
    pub account_suffix: Option<String>,
    pub summary: StatementSummary,
    pub sections: Vec<CardholderSection>,
    pub records: Vec<LedgerRecord>,
    pub reconciliation: Reconciliation,
    pub master: Option<MasterReport>,
}

impl StatementAnalysis {
    pub fn primary_check(&self) -> Option<&ReconcileCheck> {
        primary_check(&self.reconciliation.checks)
    }

    /// True when the primary check matches (after any adjustment)
    pub fn is_reconciled(&self) -> bool {
        self.primary_check().is_some_and(|c| c.is_match())
    }
}

/// Built-in categories for freshly parsed lines
pub fn to_records(txns: &[StatementTransaction]) -> Vec<LedgerRecord> {
    txns.iter()
        .map(|t| {
            LedgerRecord::new(
                t.date,
                &t.cardholder,
                &t.description,
                t.amount,
                t.kind,
                categorize(&t.description, t.kind),
            )
        })
        .collect()
}

/// Load the master file, recategorize `records` and save any new vendors
pub fn apply_master_file(
    records: &mut [LedgerRecord],
    path: &Path,
    prompt: Option<&mut dyn VendorPrompt>,
) -> Result<MasterReport> {
    let mut rules = MasterRules::load(path);

    let recategorizer = Recategorizer::new(&rules)?;
    let summary = match prompt {
        Some(p) => recategorizer.interactive(p).apply(records)?,
        None => recategorizer.apply(records)?,
    };

    if !summary.new_vendors.is_empty() {
        for (key, category) in &summary.new_vendors {
            rules.insert(key.clone(), category.clone());
        }
        match rules.save(path) {
            Ok(()) => info!(
                path = %path.display(),
                new_vendors = summary.new_vendors.len(),
                "master file updated"
            ),
            Err(e) => warn!(path = %path.display(), error = %e, "could not save master file"),
        }
    }

    Ok(MasterReport {
        path: path.to_path_buf(),
        summary,
    })
}

pub fn analyze_text(
    text: &str,
    opts: &AnalysisOptions,
    prompt: Option<&mut dyn VendorPrompt>,
) -> Result<StatementAnalysis> {
    let parsed = parse_statement_text(text, &opts.parse)?;
    if parsed.transactions.is_empty() {
        bail!("no transactions found ({} layout)", parsed.format);
    }

    let mut records = to_records(&parsed.transactions);

    let master = match &opts.master_file {
        Some(path) => Some(apply_master_file(&mut records, path, prompt)?),
        None => None,
    };

    let reconciliation = reconcile_and_balance(
        &mut records,
        &parsed.summary,
        &parsed.sections,
        opts.tolerance,
        opts.auto_balance,
    );

    Ok(StatementAnalysis {
        source: None,
        format: parsed.format,
        account_suffix: parsed.account_suffix,
        summary: parsed.summary,
        sections: parsed.sections,
        records,
        reconciliation,
        master,
    })
}

pub fn analyze_statement(
    path: &Path,
    opts: &AnalysisOptions,
    prompt: Option<&mut dyn VendorPrompt>,
) -> Result<StatementAnalysis> {
    let text = read_statement_text(path)?;
    let mut analysis =
        analyze_text(&text, opts, prompt).with_context(|| format!("analyzing {}", path.display()))?;
    analysis.source = Some(path.to_path_buf());
    Ok(analysis)
}

/// Category totals recomputed from a transactions CSV
#[derive(Debug, Clone, Serialize)]
pub struct TotalsRun {
    pub source: PathBuf,
    pub records: Vec<LedgerRecord>,
    pub master: MasterReport,
    pub adjustment: Option<LedgerRecord>,
}

impl TotalsRun {
    pub fn total(&self) -> f64 {
        self.records.iter().map(|r| r.amount).sum()
    }
}

/// Re-apply master rules to a transactions CSV. With `auto_balance`, a small
/// non-zero total is evened out to zero by appending an adjustment line to
/// the CSV itself.
pub fn category_totals_from_csv(
    csv_path: &Path,
    master_path: &Path,
    auto_balance: bool,
    tolerance: f64,
) -> Result<TotalsRun> {
    let mut raw = read_transactions_csv(csv_path)?;
    info!(path = %csv_path.display(), rows = raw.len(), "transactions loaded");

    let mut records = raw.clone();
    let master = apply_master_file(&mut records, master_path, None)?;

    let mut adjustment = None;
    if auto_balance {
        if let Some(adj) = balance_against(&mut raw, 0.0, tolerance) {
            write_transactions_csv(csv_path, &raw)?;
            let mut recategorized = adj.clone();
            recategorized.original_category = Some(Category::new(Category::MISCELLANEOUS));
            records.push(recategorized);
            adjustment = Some(adj);
        }
    }

    Ok(TotalsRun {
        source: csv_path.to_path_buf(),
        records,
        master,
        adjustment,
    })
}
