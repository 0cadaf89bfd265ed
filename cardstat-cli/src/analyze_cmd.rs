use anyhow::{bail, Context, Result};
use cardstat_finance::report::{write_category_summary, write_transactions_csv};
use cardstat_finance::{analyze_statement, AnalysisOptions, ReportFilter, StatementAnalysis, VendorPrompt};
use cardstat_ingest::StatementFormat;
use chrono::Local;
use clap::{ArgGroup, Args};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::config::Config;
use crate::display;
use crate::prompt::StdinPrompt;
use crate::state::{files_with_extension, resolve_master_file};

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("input").required(true).args(["pdf", "directory"])))]
pub struct AnalyzeArgs {
    /// Statement PDF (or a .txt dump of one)
    pdf: Option<PathBuf>,

    /// Analyze every PDF in this directory
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// Write <statement>.csv and <statement>.categories
    #[arg(long)]
    csv: bool,

    /// Apply the master categorization file, optionally naming it (`-m=FILE`)
    #[arg(short = 'm', long = "master", num_args = 0..=1, require_equals = true, value_name = "FILE")]
    master: Option<Option<PathBuf>>,

    /// Master categorization file (implies --master)
    #[arg(long, value_name = "FILE")]
    master_file: Option<PathBuf>,

    /// Ask for a category for each new vendor
    #[arg(short, long)]
    interactive: bool,

    /// Only print the statement totals and category table
    #[arg(short = 'S', long)]
    summary_only: bool,

    /// Print the analysis as JSON
    #[arg(long)]
    json: bool,

    /// Year for MM/DD rows when the statement period is unreadable
    #[arg(long)]
    year: Option<i32>,

    /// Skip layout detection
    #[arg(long, value_name = "LAYOUT")]
    format: Option<StatementFormat>,

    /// Report on one cardholder only
    #[arg(long)]
    cardholder: Option<String>,

    /// Keep payments and refunds in reports
    #[arg(long)]
    include_credits: bool,

    /// Never add a balance adjustment
    #[arg(long)]
    no_balance: bool,

    /// Largest discrepancy evened out by an adjustment (default from config)
    #[arg(long)]
    tolerance: Option<f64>,
}

impl AnalyzeArgs {
    fn uses_master(&self) -> bool {
        self.master.is_some() || self.master_file.is_some()
    }

    fn explicit_master(&self) -> Option<&Path> {
        self.master_file
            .as_deref()
            .or_else(|| self.master.as_ref().and_then(|m| m.as_deref()))
    }

    fn filter(&self) -> ReportFilter {
        ReportFilter {
            include_credits: self.include_credits,
            cardholder: self.cardholder.clone(),
        }
    }
}

pub fn run(args: AnalyzeArgs, cfg: &Config) -> Result<()> {
    if args.interactive && !args.uses_master() {
        bail!("--interactive needs --master or --master-file");
    }

    let statements = match (&args.pdf, &args.directory) {
        (Some(pdf), None) => {
            if !pdf.exists() {
                bail!("statement not found: {}", pdf.display());
            }
            vec![pdf.clone()]
        }
        (None, Some(dir)) => {
            let pdfs = files_with_extension(dir, "pdf")?;
            if pdfs.is_empty() {
                bail!("no PDF files found in {}", dir.display());
            }
            if !args.json {
                println!("Found {} PDF files in {}", pdfs.len(), dir.display());
            }
            pdfs
        }
        _ => bail!("specify either a statement PDF or --directory, not both"),
    };

    let mut parse = cfg.parse_context(args.year);
    parse.format = args.format;

    let mut prompt = StdinPrompt::new();
    let mut analyses = Vec::new();
    let mut failed = 0;

    for pdf in &statements {
        let master_file = args
            .uses_master()
            .then(|| {
                resolve_master_file(
                    args.explicit_master(),
                    pdf,
                    &cfg.master.file_name,
                    args.directory.as_deref(),
                )
            });
        let opts = AnalysisOptions {
            parse: parse.clone(),
            master_file,
            tolerance: args.tolerance.unwrap_or(cfg.reconcile.tolerance),
            auto_balance: cfg.reconcile.auto_balance && !args.no_balance,
        };

        let vendor_prompt: Option<&mut dyn VendorPrompt> = if args.interactive {
            Some(&mut prompt)
        } else {
            None
        };

        match analyze_one(pdf, &opts, vendor_prompt, &args) {
            Ok(analysis) => analyses.push(analysis),
            // one bad statement should not stop the rest of the directory
            Err(e) if statements.len() > 1 => {
                error!(path = %pdf.display(), error = %format!("{e:#}"), "statement skipped");
                failed += 1;
            }
            Err(e) => return Err(e),
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analyses).context("serialize analysis")?);
    }

    if failed > 0 {
        bail!("{} of {} statements could not be analyzed", failed, statements.len());
    }
    Ok(())
}

fn analyze_one(
    pdf: &Path,
    opts: &AnalysisOptions,
    prompt: Option<&mut dyn VendorPrompt>,
    args: &AnalyzeArgs,
) -> Result<StatementAnalysis> {
    info!(path = %pdf.display(), "analyzing statement");
    let analysis = analyze_statement(pdf, opts, prompt)?;
    let filter = args.filter();

    if !args.json {
        display::print_analysis(&analysis, &filter, args.summary_only);
    }

    if args.csv {
        let report = filter.apply(&analysis.records);
        let csv_path = pdf.with_extension("csv");
        write_transactions_csv(&csv_path, &report)?;
        let summary_path = write_category_summary(&csv_path, &report, Local::now().naive_local())?;
        if !args.json {
            println!("\nCSV file created: {} ({} transactions)", csv_path.display(), report.len());
            println!("Category summary created: {}", summary_path.display());
        }
    }

    Ok(analysis)
}
