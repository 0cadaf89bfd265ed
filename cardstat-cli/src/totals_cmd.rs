use anyhow::{bail, Context, Result};
use cardstat_core::{format_usd, LedgerRecord};
use cardstat_finance::report::{category_breakdown, category_comparison};
use cardstat_finance::{category_totals_from_csv, TotalsRun};
use clap::{ArgGroup, Args};
use serde::Serialize;
use std::path::PathBuf;

use crate::config::Config;
use crate::display::{render_category_table, render_comparison};
use crate::state::{files_with_extension, parent_dir};

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("input").required(true).args(["csv", "directory"])))]
pub struct TotalsArgs {
    /// Transactions CSV written by `cardstat analyze --csv`
    csv: Option<PathBuf>,

    /// Combine every CSV in this directory
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// Show categories whose totals changed under the master rules
    #[arg(long)]
    show_comparison: bool,

    /// Never add a balance adjustment to the CSV
    #[arg(long)]
    no_balance: bool,

    /// Print the totals as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct Combined {
    files: Vec<TotalsRun>,
    records: usize,
    total: f64,
    recategorized: usize,
    new_vendors: usize,
}

impl Combined {
    fn new(files: Vec<TotalsRun>) -> Self {
        let records = files.iter().map(|f| f.records.len()).sum();
        let total = files.iter().map(|f| f.total()).sum();
        let recategorized = files.iter().map(|f| f.master.summary.recategorized).sum();
        let new_vendors = files.iter().map(|f| f.master.summary.new_vendors.len()).sum();
        Self {
            files,
            records,
            total,
            recategorized,
            new_vendors,
        }
    }

    fn all_records(&self) -> Vec<LedgerRecord> {
        self.files.iter().flat_map(|f| f.records.iter().cloned()).collect()
    }
}

pub fn run(args: TotalsArgs, cfg: &Config) -> Result<()> {
    let runs = match (&args.csv, &args.directory) {
        (Some(csv), None) => {
            if !csv.exists() {
                bail!("CSV not found: {}", csv.display());
            }
            let master = parent_dir(csv).join(&cfg.master.file_name);
            let auto_balance = cfg.reconcile.auto_balance && !args.no_balance;
            vec![category_totals_from_csv(csv, &master, auto_balance, cfg.reconcile.tolerance)?]
        }
        (None, Some(dir)) => {
            let csvs = files_with_extension(dir, "csv")?;
            if csvs.is_empty() {
                bail!("no CSV files found in {}", dir.display());
            }
            let master = dir.join(&cfg.master.file_name);
            // combined totals are not balanced file by file
            csvs.iter()
                .map(|csv| category_totals_from_csv(csv, &master, false, cfg.reconcile.tolerance))
                .collect::<Result<Vec<_>>>()?
        }
        _ => bail!("specify either a CSV file or --directory, not both"),
    };

    let combined = Combined::new(runs);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&combined).context("serialize totals")?);
        return Ok(());
    }

    print_totals(&combined, args.directory.as_ref(), args.show_comparison);
    Ok(())
}

fn print_totals(combined: &Combined, directory: Option<&PathBuf>, show_comparison: bool) {
    let records = combined.all_records();

    for run in &combined.files {
        if let Some(adj) = &run.adjustment {
            println!(
                "Added MISC balance adjustment of {} to {}",
                format_usd(adj.amount),
                run.source.display()
            );
        }
    }

    if let Some(dir) = directory {
        println!("\n{}", "=".repeat(70));
        println!("COMBINED RESULTS FROM {} FILES", combined.files.len());
        println!("Directory: {}", dir.display());
    }

    println!("\n{}", "=".repeat(70));
    println!("CATEGORY TOTALS");
    println!("{}", "=".repeat(70));
    print!("{}", render_category_table(&category_breakdown(&records)));

    if combined.recategorized > 0 || combined.new_vendors > 0 {
        println!("\nMASTER FILE MAINTENANCE:");
        if combined.recategorized > 0 {
            println!("  {} transactions recategorized using existing rules", combined.recategorized);
        }
        if combined.new_vendors > 0 {
            println!("  {} new vendors added to the master file", combined.new_vendors);
        }
    }

    if show_comparison && combined.recategorized > 0 {
        println!("\n{}", "=".repeat(70));
        println!("COMPARISON: ORIGINAL vs FINAL CATEGORIES");
        println!("{}", "=".repeat(70));
        print!("{}", render_comparison(&category_comparison(&records)));
    }

    println!("\nTotal: {} across {} transactions", format_usd(combined.total), combined.records);
}
