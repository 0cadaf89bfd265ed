//! Dollar amount helpers. Statement math is done in f64 and compared at cent
//! precision.

/// Smallest difference treated as a real discrepancy
pub const CENT: f64 = 0.01;

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// True when two amounts agree to within a cent
pub fn cents_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < CENT
}

/// Parse a printed amount such as `1,234.56`, `$12.00`, `-$3.10` or `+$5`
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '+' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

/// Format as `$1,234.56` / `-$12.00`
pub fn format_usd(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{frac:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_usd_groups_thousands() {
        assert_eq!(format_usd(0.0), "$0.00");
        assert_eq!(format_usd(5.8), "$5.80");
        assert_eq!(format_usd(999.999), "$1,000.00");
        assert_eq!(format_usd(20482.54), "$20,482.54");
        assert_eq!(format_usd(1234567.0), "$1,234,567.00");
        assert_eq!(format_usd(-19000.0), "-$19,000.00");
        assert_eq!(format_usd(-0.001), "$0.00");
    }

    #[test]
    fn test_parse_amount_variants() {
        assert_eq!(parse_amount("3,493.67"), Some(3493.67));
        assert_eq!(parse_amount("-$22,898.07"), Some(-22898.07));
        assert_eq!(parse_amount("+$20,482.54"), Some(20482.54));
        assert_eq!(parse_amount("- $14.05"), Some(-14.05));
        assert_eq!(parse_amount("$"), None);
        assert_eq!(parse_amount("abc"), None);
    }

    #[test]
    fn test_cents_eq() {
        assert!(cents_eq(0.1 + 0.2, 0.3));
        assert!(!cents_eq(10.00, 10.02));
        assert_eq!(round_cents(2.675_1), 2.68);
    }
}
