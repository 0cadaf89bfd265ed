//! cardstat-core: record types, money helpers and the built-in merchant categorizer

pub mod money;
pub mod record;

pub use money::{cents_eq, format_usd, parse_amount, round_cents};
pub use record::{Category, LedgerRecord, TxnKind};

/// Built-in keyword heuristics for assigning a first category to a statement line
pub mod categorizer {
    use super::{Category, TxnKind};

    /// Ordered keyword table. The first category with a keyword contained in
    /// the (uppercased) merchant wins, so more specific merchants must come
    /// before broader ones (`COSTCO GAS` before `COSTCO`).
    pub const BUILTIN_RULES: &[(&str, &[&str])] = &[
        (
            "UTILITIES",
            &[
                "PORTLAND GENERAL ELECTRIC",
                "ELECTRIC",
                "TUALATIN VALLEY WATER",
                "WATER DIST",
                "GAS BILL",
                "COMCAST",
                "XFINITY",
                "VERIZON",
            ],
        ),
        ("TELECOM", &["T-MOBILE", "EFAX", "AT&T"]),
        (
            "GAS/FUEL",
            &[
                "COSTCO GAS",
                "NORTHWEST BIOFUEL",
                "SHELL",
                "CHEVRON",
                "EXXON",
                "MOBIL",
                "ARCO",
                "BP ",
            ],
        ),
        (
            "GROCERY",
            &[
                "COSTCO",
                "SAFEWAY",
                "QFC",
                "SUPERMARKET",
                "APNA BAZAAR",
                "DENNIS MARKET",
                "MARKET OF CHOICE",
                "TARGET",
                "WALMART",
            ],
        ),
        ("SHOPPING", &["AMAZON", "AMZN", "EBAY", "NORDSTROM", "GAMESTOP", "OAKLEY"]),
        (
            "RESTAURANT",
            &[
                "RESTAURANT",
                "CHEFSTORE",
                "TORCHYS",
                "CHIPOTLE",
                "VELVET TACO",
                "CAVA",
                "JAMBA JUICE",
                "STARBUCKS",
                "MCDONALD",
                "SUBWAY",
                "PIZZA",
            ],
        ),
        (
            "TRAVEL/DINING",
            &[
                "UNITED",
                "DELTA",
                "AMERICAN AIR",
                "SOUTHWEST",
                "HOTEL",
                "SALT AND STRAW",
                "KRISPY KREME",
            ],
        ),
        (
            "SUBSCRIPTIONS",
            &["NETFLIX", "HULU", "SPOTIFY", "YOUTUBE", "GOOGLE", "APPLE.COM", "VONAGE"],
        ),
        (
            "SERVICES",
            &[
                "ACCOUNTING",
                "STRETCHLAB",
                "GOLF",
                "LIFE TIME",
                "ADT SECURITY",
                "PEST CONTROL",
                "US LINEN",
                "WEBSTAURANT",
            ],
        ),
        ("GOVERNMENT", &["CITY OF", "SEC STATE", "PARKING"]),
        ("MEDICAL/HEALTH", &["PHARMACY", "WALGREENS", "CLINIC", "NATIONWIDE"]),
    ];

    /// Categorize a purchase by merchant name alone
    pub fn categorize_merchant(merchant: &str) -> Category {
        let upper = merchant.to_uppercase();
        for (category, keywords) in BUILTIN_RULES {
            if keywords.iter().any(|k| upper.contains(k)) {
                return Category::new(category);
            }
        }
        Category::other()
    }

    /// Categorize any statement line. Fees, credits and adjustments get fixed
    /// categories; purchases go through the keyword table.
    pub fn categorize(merchant: &str, kind: TxnKind) -> Category {
        match kind {
            TxnKind::Fee => Category::new(Category::CC_FEES),
            TxnKind::Adjustment => Category::new(Category::MISCELLANEOUS),
            TxnKind::CashAdvance => Category::new(Category::CASH_ADVANCE),
            TxnKind::Credit => {
                if merchant.to_uppercase().contains("PAYMENT") {
                    Category::new(Category::PAYMENT)
                } else {
                    Category::new(Category::REFUND)
                }
            }
            TxnKind::Purchase => categorize_merchant(merchant),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_costco_gas_beats_costco_grocery() {
            assert_eq!(categorize_merchant("COSTCO GAS #0692 HILLSBORO OR").as_str(), "GAS/FUEL");
            assert_eq!(categorize_merchant("COSTCO WHSE #0692 HILLSBORO OR").as_str(), "GROCERY");
        }

        #[test]
        fn test_restaurant_supply() {
            assert_eq!(categorize_merchant("RESTAURANT DEPOT PORTLAND OR").as_str(), "RESTAURANT");
            assert_eq!(categorize_merchant("CHEFSTORE 7537 PORTLAND OR").as_str(), "RESTAURANT");
        }

        #[test]
        fn test_case_insensitive() {
            assert_eq!(categorize_merchant("Amazon.com*NO73404K1 Amzn.com/bill WA").as_str(), "SHOPPING");
            assert_eq!(categorize_merchant("GOOGLE *YouTube TV g.co/helppay# CA").as_str(), "SUBSCRIPTIONS");
        }

        #[test]
        fn test_utilities_and_government() {
            assert_eq!(
                categorize_merchant("PORTLAND GENERAL ELECTRIC 800-542-8818 OR").as_str(),
                "UTILITIES"
            );
            assert_eq!(categorize_merchant("CITY OF HILLSBORO 503-615-6628 OR").as_str(), "GOVERNMENT");
        }

        #[test]
        fn test_unknown_is_other() {
            assert!(categorize_merchant("ZZ UNKNOWN VENDOR 123").is_other());
        }

        #[test]
        fn test_fixed_categories_by_kind() {
            assert_eq!(categorize("LATE FEE", TxnKind::Fee).as_str(), Category::CC_FEES);
            assert_eq!(
                categorize("CASH ADVANCE CHASE BRANCH", TxnKind::CashAdvance).as_str(),
                Category::CASH_ADVANCE
            );
            assert_eq!(
                categorize("MISC BALANCE ADJUSTMENT", TxnKind::Adjustment).as_str(),
                Category::MISCELLANEOUS
            );
            assert_eq!(
                categorize("Payment Thank You-Mobile", TxnKind::Credit).as_str(),
                Category::PAYMENT
            );
            assert_eq!(
                categorize("AMZNMktplace amazon.co.uk", TxnKind::Credit).as_str(),
                Category::REFUND
            );
        }
    }
}

pub use categorizer::{categorize, categorize_merchant};
