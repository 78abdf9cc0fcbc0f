use anyhow::{anyhow, Result};
use chrono::{Duration, Local, NaiveDate};

// Parse a calendar date like "today", "YYYY-MM-DD", or a day offset "+3d"/"-1d" relative to `today`.
// Returns None if unparseable.
pub fn parse_date_str(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("today") {
        return Some(today);
    }
    if let Some(stripped) = s.strip_suffix('d') {
        if stripped.starts_with('+') || stripped.starts_with('-') {
            if let Ok(days) = stripped.parse::<i64>() {
                return Duration::try_days(days).and_then(|d| today.checked_add_signed(d));
            }
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

// CLI helper: resolves against the local calendar day and reports a friendly error.
pub fn parse_date_arg(s: &str) -> Result<NaiveDate> {
    parse_date_str(s, today()).ok_or_else(|| anyhow!("Invalid date: {} (use today, YYYY-MM-DD, +Nd or -Nd)", s))
}

// Helper for Option<String> inputs used by CLI flags like --to
pub fn parse_date_opt(s: &Option<String>) -> Result<Option<NaiveDate>> {
    let Some(s) = s.as_ref() else { return Ok(None) };
    parse_date_arg(s).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn today_keyword_is_case_insensitive() {
        let t = d(2025, 3, 10);
        assert_eq!(parse_date_str("today", t), Some(t));
        assert_eq!(parse_date_str(" Today ", t), Some(t));
    }

    #[test]
    fn day_offsets_cross_month_boundaries() {
        let t = d(2025, 1, 30);
        assert_eq!(parse_date_str("+3d", t), Some(d(2025, 2, 2)));
        assert_eq!(parse_date_str("-30d", t), Some(d(2024, 12, 31)));
    }

    #[test]
    fn offsets_past_the_calendar_are_rejected() {
        let t = d(2025, 1, 1);
        assert_eq!(parse_date_str("+999999999999999d", t), None);
        assert_eq!(parse_date_str("-999999999999999d", t), None);
        assert_eq!(parse_date_str("+99999999d", t), None);
        assert!(parse_date_arg("+999999999999999d").is_err());
    }

    #[test]
    fn iso_dates_parse() {
        assert_eq!(parse_date_str("2025-12-24", d(2025, 1, 1)), Some(d(2025, 12, 24)));
    }

    #[test]
    fn garbage_is_rejected() {
        let t = d(2025, 1, 1);
        assert_eq!(parse_date_str("3d", t), None);
        assert_eq!(parse_date_str("2025-13-01", t), None);
        assert_eq!(parse_date_str("soon", t), None);
        assert!(parse_date_arg("soon").is_err());
    }

    #[test]
    fn missing_optional_date_is_none() {
        assert_eq!(parse_date_opt(&None).unwrap(), None);
        assert!(parse_date_opt(&Some("2025-02-30".into())).is_err());
    }
}
