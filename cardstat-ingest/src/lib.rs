//! cardstat-ingest: statement text extraction, layout detection, summary and
//! line parsers.

pub mod dates;
pub mod detect;
pub mod parsers;
pub mod pdf;
pub mod summary;
pub mod types;

pub use detect::{detect_format, DetectedBy, Detection};
pub use parsers::parse_statement_text;
pub use pdf::{extract_pdf_text, read_statement_text, StatementTextError};
pub use summary::{parse_statement_summary, StatementPeriod, StatementSummary};
pub use types::{
    default_account_formats, CardholderSection, ParseContext, ParsedStatement, StatementFormat,
    StatementTransaction,
};
