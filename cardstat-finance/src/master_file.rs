//! Master categorization file: user-editable `vendor_pattern,category` CSV
//! whose patterns override the built-in keyword categories.
//!
//! Rules are matched in file order by case-insensitive substring. Saving
//! rewrites the file sorted by pattern.

use anyhow::{Context, Result};
use cardstat_core::Category;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_MASTER_FILE: &str = "categories.master";
const HEADER: [&str; 2] = ["vendor_pattern", "category"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterRule {
    #[serde(rename = "vendor_pattern")]
    pub pattern: String,
    pub category: Category,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MasterRules {
    rules: Vec<MasterRule>,
}

impl MasterRules {
    /// Load rules from `path`. A missing file is created with just the header.
    /// Any failure is logged and yields an empty table so analysis can go on.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!(path = %path.display(), "creating master categorization file");
            if let Err(e) = Self::default().save(path) {
                warn!(path = %path.display(), error = %e, "could not create master file");
            }
            return Self::default();
        }

        match Self::read(path) {
            Ok(rules) => {
                info!(path = %path.display(), rules = rules.len(), "master rules loaded");
                rules
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not load master rules; continuing without them");
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("opening {}", path.display()))?;

        let mut rules = Self::default();
        for (i, row) in rdr.deserialize::<MasterRule>().enumerate() {
            let rule = row.with_context(|| format!("{} row {}", path.display(), i + 2))?;
            if rule.pattern.is_empty() {
                warn!(row = i + 2, "skipping master rule with empty pattern");
                continue;
            }
            rules.insert(rule.pattern, rule.category);
        }
        Ok(rules)
    }

    /// Write all rules, sorted by pattern
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut sorted: Vec<&MasterRule> = self.rules.iter().collect();
        sorted.sort_by(|a, b| a.pattern.cmp(&b.pattern));

        let mut wtr = csv::Writer::from_path(path)
            .with_context(|| format!("writing {}", path.display()))?;
        wtr.write_record(HEADER)?;
        for rule in sorted {
            wtr.write_record([rule.pattern.as_str(), rule.category.as_str()])?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Add a rule, or replace the category of an existing identical pattern
    /// without moving it
    pub fn insert(&mut self, pattern: impl Into<String>, category: Category) {
        let pattern = pattern.into();
        match self.rules.iter_mut().find(|r| r.pattern == pattern) {
            Some(existing) => existing.category = category,
            None => self.rules.push(MasterRule { pattern, category }),
        }
    }

    /// Exact pattern lookup
    pub fn get(&self, pattern: &str) -> Option<&Category> {
        self.rules
            .iter()
            .find(|r| r.pattern == pattern)
            .map(|r| &r.category)
    }

    /// First rule whose pattern occurs in the merchant (case-insensitive)
    pub fn lookup(&self, merchant: &str) -> Option<&MasterRule> {
        let upper = merchant.to_uppercase();
        self.rules
            .iter()
            .find(|r| upper.contains(&r.pattern.to_uppercase()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &MasterRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_file_is_created_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_MASTER_FILE);

        let rules = MasterRules::load(&path);
        assert!(rules.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "vendor_pattern,category\n");
    }

    #[test]
    fn test_file_order_decides_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_MASTER_FILE);
        fs::write(
            &path,
            "vendor_pattern,category\nCOSTCO GAS,AUTO\nCOSTCO,GROCERIES\n restaurant depot , RESTAURANT SUPPLY\n",
        )
        .unwrap();

        let rules = MasterRules::load(&path);
        assert_eq!(rules.len(), 3);
        assert_eq!(
            rules.lookup("COSTCO GAS #0692 HILLSBORO OR").unwrap().category.as_str(),
            "AUTO"
        );
        assert_eq!(
            rules.lookup("costco whse #0692").unwrap().category.as_str(),
            "GROCERIES"
        );
        assert_eq!(
            rules.lookup("RESTAURANT DEPOT PORTLAND OR").unwrap().category.as_str(),
            "RESTAURANT SUPPLY"
        );
        assert!(rules.lookup("SAFEWAY #1234").is_none());
    }

    #[test]
    fn test_save_sorts_by_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_MASTER_FILE);

        let mut rules = MasterRules::default();
        rules.insert("SHELL OIL", Category::new("GAS/FUEL"));
        rules.insert("AMAZON", Category::new(Category::MAINTENANCE));
        rules.insert("COSTCO WHSE", Category::new("GROCERY"));
        rules.insert("SHELL OIL", Category::new("AUTO"));
        rules.save(&path).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "vendor_pattern,category\nAMAZON,MAINTENANCE\nCOSTCO WHSE,GROCERY\nSHELL OIL,AUTO\n"
        );
        assert_eq!(MasterRules::load(&path).len(), 3);
    }

    #[test]
    fn test_malformed_file_yields_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_MASTER_FILE);
        fs::write(&path, "pattern_only\nCOSTCO\n").unwrap();

        let rules = MasterRules::load(&path);
        assert!(rules.is_empty());
    }
}
