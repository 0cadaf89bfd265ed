use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub fn cardstat_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".cardstat"))
}

pub fn ensure_cardstat_home() -> Result<PathBuf> {
    let dir = cardstat_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Files in `dir` with extension `ext` (case-insensitive), sorted by name
pub fn files_with_extension(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("directory not found: {}", dir.display());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let path = entry?.path();
        let matches = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case(ext))
            .unwrap_or(false);
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Directory holding `path`, `.` for bare file names
pub fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Where the master file lives for one statement.
///
/// An explicit path that exists wins. A bare file name is looked up next to
/// the statement first. Without an explicit path, a directory scan keeps the
/// default name inside `scanned`; a single statement uses it next to the
/// statement when present, else in the current directory.
pub fn resolve_master_file(
    explicit: Option<&Path>,
    statement: &Path,
    default_name: &str,
    scanned: Option<&Path>,
) -> PathBuf {
    let dir = parent_dir(statement);
    match explicit {
        Some(p) if p.exists() => p.to_path_buf(),
        Some(p) if p.components().count() == 1 => {
            let local = dir.join(p);
            if local.exists() { local } else { p.to_path_buf() }
        }
        Some(p) => p.to_path_buf(),
        None => match scanned {
            Some(scan_dir) => scan_dir.join(default_name),
            None => {
                let local = dir.join(default_name);
                if local.exists() { local } else { PathBuf::from(default_name) }
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdfs_are_listed_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.PDF", "notes.txt"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        let files = files_with_extension(dir.path(), "pdf").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(files_with_extension(&dir.path().join("gone"), "pdf").is_err());
    }

    #[test]
    fn test_master_next_to_statement_is_preferred() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("june.pdf");

        assert_eq!(
            resolve_master_file(None, &pdf, "categories.master", None),
            PathBuf::from("categories.master")
        );

        fs::write(dir.path().join("categories.master"), "vendor_pattern,category\n").unwrap();
        assert_eq!(
            resolve_master_file(None, &pdf, "categories.master", None),
            dir.path().join("categories.master")
        );

        fs::write(dir.path().join("work.master"), "vendor_pattern,category\n").unwrap();
        assert_eq!(
            resolve_master_file(Some(Path::new("work.master")), &pdf, "categories.master", None),
            dir.path().join("work.master")
        );
        assert_eq!(
            resolve_master_file(Some(Path::new("other.master")), &pdf, "categories.master", None),
            PathBuf::from("other.master")
        );
    }

    #[test]
    fn test_directory_scan_keeps_master_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("june.pdf");

        // not created yet, still not the current directory
        assert_eq!(
            resolve_master_file(None, &pdf, "categories.master", Some(dir.path())),
            dir.path().join("categories.master")
        );

        let shared = dir.path().join("shared.master");
        fs::write(&shared, "vendor_pattern,category\n").unwrap();
        assert_eq!(
            resolve_master_file(Some(&shared), &pdf, "categories.master", Some(dir.path())),
            shared
        );
    }
}
