//! cardstat-finance: master categorization file, recategorization,
//! reconciliation, reports and the statement analysis pipeline

pub mod category_rules;
pub mod master_file;
pub mod pipeline;
pub mod reconcile;
pub mod report;
pub mod vendor;

pub use category_rules::{RecategorizeSummary, Recategorizer, VendorPrompt};
pub use master_file::{MasterRule, MasterRules, DEFAULT_MASTER_FILE};
pub use pipeline::{
    analyze_statement, analyze_text, category_totals_from_csv, AnalysisOptions, MasterReport,
    StatementAnalysis, TotalsRun,
};
pub use reconcile::{
    balance_against, reconcile, reconcile_and_balance, CheckKind, CheckStatus, ReconcileCheck,
    Reconciliation, DEFAULT_TOLERANCE,
};
pub use report::ReportFilter;
