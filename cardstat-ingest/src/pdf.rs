//! Statement text loading. PDF decoding is delegated to `pdf-extract`;
//! `.txt` files are taken as an already-extracted dump.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Below this many non-whitespace characters the PDF is treated as image-only
const MIN_TEXT_CHARS: usize = 30;

#[derive(Debug, thiserror::Error)]
pub enum StatementTextError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to extract text from {}: {message}", .path.display())]
    Extract { path: PathBuf, message: String },
    #[error("no text found in {} (scanned or image-only PDF?)", .path.display())]
    Empty { path: PathBuf },
}

/// Extract the text layer of a PDF statement
pub fn extract_pdf_text(path: impl AsRef<Path>) -> Result<String, StatementTextError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| StatementTextError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let text = pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
        StatementTextError::Extract {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    ensure_meaningful(path, text)
}

/// Load statement text from a PDF, or from a `.txt` dump of one
pub fn read_statement_text(path: impl AsRef<Path>) -> Result<String, StatementTextError> {
    let path = path.as_ref();
    let is_text_dump = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("txt"))
        .unwrap_or(false);

    if is_text_dump {
        debug!(path = %path.display(), "reading pre-extracted statement text");
        let text = fs::read_to_string(path).map_err(|source| StatementTextError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        return ensure_meaningful(path, text);
    }

    extract_pdf_text(path)
}

fn ensure_meaningful(path: &Path, text: String) -> Result<String, StatementTextError> {
    let meaningful = text.chars().filter(|c| !c.is_whitespace()).count();
    if meaningful < MIN_TEXT_CHARS {
        return Err(StatementTextError::Empty {
            path: path.to_path_buf(),
        });
    }
    info!(path = %path.display(), chars = text.len(), "statement text loaded");
    Ok(text)
}
