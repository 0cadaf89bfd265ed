use anyhow::{Context, Result};
use cardstat_finance::{DEFAULT_MASTER_FILE, DEFAULT_TOLERANCE};
use cardstat_ingest::{default_account_formats, ParseContext, StatementFormat};
use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::ensure_cardstat_home;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub statement: StatementSection,
    pub reconcile: ReconcileSection,
    pub master: MasterSection,
    /// Account-number suffix -> statement layout
    pub accounts: BTreeMap<String, StatementFormat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatementSection {
    /// Owner of rows in layouts that do not group by cardholder
    pub primary_cardholder: String,
    /// Year for `MM/DD` rows when the statement period is unreadable.
    /// Unset means the current year.
    pub fallback_year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileSection {
    pub tolerance: f64,
    pub auto_balance: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterSection {
    pub file_name: String,
}

impl Default for StatementSection {
    fn default() -> Self {
        Self {
            primary_cardholder: "PRIMARY".to_string(),
            fallback_year: None,
        }
    }
}

impl Default for ReconcileSection {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            auto_balance: true,
        }
    }
}

impl Default for MasterSection {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_MASTER_FILE.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            statement: StatementSection::default(),
            reconcile: ReconcileSection::default(),
            master: MasterSection::default(),
            accounts: default_account_formats().into_iter().collect(),
        }
    }
}

impl Config {
    /// Parser settings; `year` (from `--year`) beats the configured fallback
    pub fn parse_context(&self, year: Option<i32>) -> ParseContext {
        ParseContext {
            primary_cardholder: self.statement.primary_cardholder.clone(),
            fallback_year: year
                .or(self.statement.fallback_year)
                .unwrap_or_else(|| Local::now().year()),
            accounts: self
                .accounts
                .iter()
                .map(|(suffix, format)| (suffix.clone(), *format))
                .collect(),
            format: None,
        }
    }
}

pub fn config_path(override_path: Option<&Path>) -> Result<PathBuf> {
    match override_path {
        Some(p) => Ok(p.to_path_buf()),
        None => Ok(ensure_cardstat_home()?.join("config.toml")),
    }
}

pub fn load_config(override_path: Option<&Path>) -> Result<Config> {
    let p = config_path(override_path)?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(path: &Path, cfg: &Config) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn init_config(override_path: Option<&Path>) -> Result<()> {
    let p = config_path(override_path)?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&p, &Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config(override_path: Option<&Path>) -> Result<()> {
    let cfg = load_config(override_path)?;
    print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
    Ok(())
}
