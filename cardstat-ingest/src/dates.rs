//! Year-less statement dates (`06/17`, `Jul 20`) resolved against the
//! statement period.

use chrono::{Datelike, NaiveDate};

/// Resolves rows to full dates. Rows later in the year than the closing month
/// belong to the previous year (December rows on a January statement).
#[derive(Debug, Clone, Copy)]
pub struct YearResolver {
    closing: Option<NaiveDate>,
    fallback_year: i32,
}

impl YearResolver {
    pub fn new(closing: Option<NaiveDate>, fallback_year: i32) -> Self {
        Self {
            closing,
            fallback_year,
        }
    }

    pub fn resolve(&self, month: u32, day: u32) -> Option<NaiveDate> {
        let year = match self.closing {
            Some(c) if month > c.month() => c.year() - 1,
            Some(c) => c.year(),
            None => self.fallback_year,
        };
        NaiveDate::from_ymd_opt(year, month, day)
    }

    /// `MM/DD`
    pub fn parse_mm_dd(&self, s: &str) -> Option<NaiveDate> {
        let (m, d) = s.trim().split_once('/')?;
        self.resolve(m.parse().ok()?, d.parse().ok()?)
    }

    /// `Mon DD`
    pub fn parse_mmm_dd(&self, s: &str) -> Option<NaiveDate> {
        let mut parts = s.split_whitespace();
        let month = month_from_abbrev(parts.next()?)?;
        let day: u32 = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        self.resolve(month, day)
    }
}

pub fn month_from_abbrev(s: &str) -> Option<u32> {
    let month = match s.get(..3)?.to_ascii_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_rows_take_closing_year() {
        let r = YearResolver::new(Some(d(2025, 7, 6)), 1999);
        assert_eq!(r.parse_mm_dd("06/17"), Some(d(2025, 6, 17)));
        assert_eq!(r.parse_mmm_dd("Jul 2"), Some(d(2025, 7, 2)));
    }

    #[test]
    fn test_december_rows_on_january_statement() {
        let r = YearResolver::new(Some(d(2025, 1, 5)), 1999);
        assert_eq!(r.parse_mm_dd("12/28"), Some(d(2024, 12, 28)));
        assert_eq!(r.parse_mm_dd("01/02"), Some(d(2025, 1, 2)));
    }

    #[test]
    fn test_fallback_year_without_period() {
        let r = YearResolver::new(None, 2024);
        assert_eq!(r.parse_mm_dd("02/29"), Some(d(2024, 2, 29)));
        let r = YearResolver::new(None, 2025);
        assert_eq!(r.parse_mm_dd("02/29"), None);
    }

    #[test]
    fn test_rejects_garbage() {
        let r = YearResolver::new(None, 2025);
        assert_eq!(r.parse_mm_dd("13/01"), None);
        assert_eq!(r.parse_mmm_dd("Foo 12"), None);
        assert_eq!(r.parse_mmm_dd("Jul 20 extra"), None);
    }
}
