//! Master-rule recategorization of categorized statement lines.
//!
//! Rule order for each record:
//!   1. fees, adjustments and credits keep the category they already have
//!   2. Amazon aliases take the `AMAZON` rule, or become MAINTENANCE
//!   3. first master pattern contained in the merchant
//!   4. otherwise the vendor is new and gets registered

use anyhow::Result;
use cardstat_core::{Category, LedgerRecord, TxnKind};
use serde::Serialize;
use tracing::{debug, info};

use crate::master_file::MasterRules;
use crate::vendor::{is_amazon, VendorKeyer, AMAZON_KEY};

/// Asks the user to name a category for a vendor no rule knows about
pub trait VendorPrompt {
    /// `Ok(None)` (or a blank answer) keeps `suggested`
    fn ask(&mut self, vendor_key: &str, suggested: &Category) -> Result<Option<String>>;
}

/// Where a record's final category came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    Preserved,
    Alias,
    Master(String),
    NewVendor(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecategorizeSummary {
    pub rules_loaded: usize,
    pub recategorized: usize,
    /// Vendor keys registered during this run, in discovery order
    pub new_vendors: Vec<(String, Category)>,
}

pub struct Recategorizer<'a> {
    rules: &'a MasterRules,
    keyer: VendorKeyer,
    prompt: Option<&'a mut dyn VendorPrompt>,
    new_vendors: Vec<(String, Category)>,
}

impl<'a> Recategorizer<'a> {
    pub fn new(rules: &'a MasterRules) -> Result<Self> {
        Ok(Self {
            rules,
            keyer: VendorKeyer::new()?,
            prompt: None,
            new_vendors: Vec::new(),
        })
    }

    /// Prompt for a category whenever a new vendor would otherwise land in OTHER
    pub fn interactive(mut self, prompt: &'a mut dyn VendorPrompt) -> Self {
        self.prompt = Some(prompt);
        self
    }

    fn registered(&self, key: &str) -> Option<&Category> {
        self.new_vendors
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, c)| c)
    }

    fn register(&mut self, key: String, category: Category) {
        if self.registered(&key).is_none() {
            info!(vendor = %key, category = %category, "new vendor");
            self.new_vendors.push((key, category));
        }
    }

    /// Final category for one record, given its current category
    pub fn resolve(&mut self, record: &LedgerRecord) -> Result<(Category, RuleSource)> {
        let current = record.category.clone();

        match record.kind {
            TxnKind::Fee if current.as_str() == Category::CC_FEES => {
                return Ok((current, RuleSource::Preserved));
            }
            TxnKind::Adjustment | TxnKind::Credit | TxnKind::CashAdvance => return Ok((current, RuleSource::Preserved)),
            _ => {}
        }

        if is_amazon(&record.merchant) {
            if let Some(category) = self.rules.get(AMAZON_KEY) {
                return Ok((category.clone(), RuleSource::Alias));
            }
            let maintenance = Category::new(Category::MAINTENANCE);
            self.register(AMAZON_KEY.to_string(), maintenance.clone());
            return Ok((maintenance, RuleSource::NewVendor(AMAZON_KEY.to_string())));
        }

        if let Some(rule) = self.rules.lookup(&record.merchant) {
            debug!(pattern = %rule.pattern, merchant = %record.merchant, category = %rule.category, "master rule");
            return Ok((rule.category.clone(), RuleSource::Master(rule.pattern.clone())));
        }

        let key = self.keyer.key(&record.merchant);
        // an empty pattern would match every merchant
        if key.is_empty() {
            return Ok((current, RuleSource::Preserved));
        }
        if let Some(category) = self.registered(&key) {
            return Ok((category.clone(), RuleSource::NewVendor(key)));
        }

        let mut category = current;
        if category.is_other() {
            if let Some(prompt) = self.prompt.as_mut() {
                if let Some(answer) = prompt.ask(&key, &category)? {
                    let answer = answer.trim().to_uppercase();
                    if !answer.is_empty() {
                        category = Category::new(answer);
                    }
                }
            }
        }

        self.register(key.clone(), category.clone());
        Ok((category, RuleSource::NewVendor(key)))
    }

    /// Recategorize every record in place. Each record's previous category is
    /// kept in `original_category`.
    pub fn apply(mut self, records: &mut [LedgerRecord]) -> Result<RecategorizeSummary> {
        let mut recategorized = 0;
        for record in records.iter_mut() {
            let (category, _) = self.resolve(record)?;
            if category != record.category {
                recategorized += 1;
            }
            let original = std::mem::replace(&mut record.category, category);
            record.original_category = Some(original);
        }

        if recategorized > 0 {
            info!(recategorized, "records recategorized by master rules");
        }

        Ok(RecategorizeSummary {
            rules_loaded: self.rules.len(),
            recategorized,
            new_vendors: self.new_vendors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(merchant: &str, kind: TxnKind, category: &str) -> LedgerRecord {
        LedgerRecord::new(
            NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            "JORDAN LEE",
            merchant,
            10.0,
            kind,
            Category::new(category),
        )
    }

    struct Scripted {
        answers: Vec<&'static str>,
        asked: Vec<String>,
    }

    impl VendorPrompt for Scripted {
        fn ask(&mut self, vendor_key: &str, _suggested: &Category) -> Result<Option<String>> {
            self.asked.push(vendor_key.to_string());
            Ok(Some(self.answers.remove(0).to_string()))
        }
    }

    #[test]
    fn test_master_rule_overrides_builtin() {
        let mut rules = MasterRules::default();
        rules.insert("RESTAURANT DEPOT", Category::new("RESTAURANT SUPPLY"));

        let mut records = vec![rec("RESTAURANT DEPOT PORTLAND OR", TxnKind::Purchase, "RESTAURANT")];
        let summary = Recategorizer::new(&rules).unwrap().apply(&mut records).unwrap();

        assert_eq!(records[0].category.as_str(), "RESTAURANT SUPPLY");
        assert_eq!(records[0].original_category.as_ref().unwrap().as_str(), "RESTAURANT");
        assert_eq!(summary.recategorized, 1);
        assert!(summary.new_vendors.is_empty());
    }

    #[test]
    fn test_fees_credits_and_adjustments_are_preserved() {
        let mut rules = MasterRules::default();
        rules.insert("FEE", Category::new("BANK"));
        rules.insert("PAYMENT", Category::new("TRANSFER"));
        rules.insert("CASH ADVANCE", Category::new("ATM"));

        let mut records = vec![
            rec("LATE FEE", TxnKind::Fee, Category::CC_FEES),
            rec("Payment Thank You-Mobile", TxnKind::Credit, Category::PAYMENT),
            rec("MISC BALANCE ADJUSTMENT", TxnKind::Adjustment, Category::MISCELLANEOUS),
            rec("CASH ADVANCE CHASE BRANCH", TxnKind::CashAdvance, Category::CASH_ADVANCE),
        ];
        let summary = Recategorizer::new(&rules).unwrap().apply(&mut records).unwrap();

        assert_eq!(summary.recategorized, 0);
        assert_eq!(records[3].category.as_str(), Category::CASH_ADVANCE);
        assert_eq!(records[0].category.as_str(), Category::CC_FEES);
        assert_eq!(records[1].category.as_str(), Category::PAYMENT);
        assert_eq!(records[2].category.as_str(), Category::MISCELLANEOUS);
    }

    #[test]
    fn test_blank_merchant_is_not_registered() {
        let rules = MasterRules::default();
        let mut records = vec![rec("   ", TxnKind::Purchase, "OTHER")];
        let summary = Recategorizer::new(&rules).unwrap().apply(&mut records).unwrap();

        assert!(summary.new_vendors.is_empty());
        assert!(records[0].category.is_other());
    }

    #[test]
    fn test_amazon_without_rule_becomes_maintenance() {
        let rules = MasterRules::default();
        let mut records = vec![
            rec("AMZN Mktp US*2K3 Amzn.com/bill WA", TxnKind::Purchase, "SHOPPING"),
            rec("Amazon.com*NO73404K1", TxnKind::Purchase, "SHOPPING"),
        ];
        let summary = Recategorizer::new(&rules).unwrap().apply(&mut records).unwrap();

        assert!(records.iter().all(|r| r.category.as_str() == Category::MAINTENANCE));
        assert_eq!(summary.recategorized, 2);
        assert_eq!(
            summary.new_vendors,
            vec![(AMAZON_KEY.to_string(), Category::new(Category::MAINTENANCE))]
        );
    }

    #[test]
    fn test_amazon_rule_is_used_when_present() {
        let mut rules = MasterRules::default();
        rules.insert(AMAZON_KEY, Category::new("OFFICE"));
        let mut records = vec![rec("AMZNMktplace amazon.co.uk", TxnKind::Purchase, "SHOPPING")];
        let summary = Recategorizer::new(&rules).unwrap().apply(&mut records).unwrap();
        assert_eq!(records[0].category.as_str(), "OFFICE");
        assert!(summary.new_vendors.is_empty());
    }

    #[test]
    fn test_unknown_vendor_is_registered_with_builtin_category() {
        let rules = MasterRules::default();
        let mut records = vec![
            rec("COSTCO WHSE #0692 HILLSBORO OR", TxnKind::Purchase, "GROCERY"),
            rec("COSTCO WHSE #0017 TIGARD OR", TxnKind::Purchase, "GROCERY"),
        ];
        let summary = Recategorizer::new(&rules).unwrap().apply(&mut records).unwrap();

        assert_eq!(summary.recategorized, 0);
        assert_eq!(
            summary.new_vendors,
            vec![("COSTCO WHSE".to_string(), Category::new("GROCERY"))]
        );
    }

    #[test]
    fn test_interactive_prompt_only_for_other_and_only_once() {
        let rules = MasterRules::default();
        let mut prompt = Scripted {
            answers: vec!["  landscaping "],
            asked: Vec::new(),
        };
        let mut records = vec![
            rec("GREENLEAF YARD CARE 503-555-0100 OR", TxnKind::Purchase, Category::OTHER),
            rec("SAFEWAY #1234 BEAVERTON OR", TxnKind::Purchase, "GROCERY"),
            rec("GREENLEAF YARD CARE 503-555-0199 OR", TxnKind::Purchase, Category::OTHER),
        ];
        let summary = Recategorizer::new(&rules)
            .unwrap()
            .interactive(&mut prompt)
            .apply(&mut records)
            .unwrap();

        assert_eq!(records[0].category.as_str(), "LANDSCAPING");
        assert_eq!(records[2].category.as_str(), "LANDSCAPING");
        assert_eq!(records[1].category.as_str(), "GROCERY");
        assert_eq!(summary.recategorized, 2);
        assert_eq!(prompt.asked, vec!["GREENLEAF YARD CARE".to_string()]);
    }

    #[test]
    fn test_blank_answer_keeps_other() {
        let rules = MasterRules::default();
        let mut prompt = Scripted {
            answers: vec![""],
            asked: Vec::new(),
        };
        let mut records = vec![rec("ZZ UNKNOWN VENDOR", TxnKind::Purchase, Category::OTHER)];
        let summary = Recategorizer::new(&rules)
            .unwrap()
            .interactive(&mut prompt)
            .apply(&mut records)
            .unwrap();
        assert!(records[0].category.is_other());
        assert_eq!(summary.new_vendors[0].1.as_str(), Category::OTHER);
    }
}
