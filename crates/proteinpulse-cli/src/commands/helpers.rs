use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

use proteinpulse_core::models::{UnitPreference, ValidationError};
use proteinpulse_core::Propagation;

const GRAMS_PER_OUNCE: f64 = 28.349_523_125;
const PROGRESS_BAR_WIDTH: usize = 20;

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            "tomorrow" => Ok(Local::now().date_naive() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

/// Timestamp for an entry logged on `date`: now when `date` is today,
/// otherwise noon local time on that day.
pub(crate) fn eaten_at(date: NaiveDate) -> DateTime<Utc> {
    let now = Local::now();
    if date == now.date_naive() {
        return now.with_timezone(&Utc);
    }
    let noon = date.and_hms_opt(12, 0, 0).unwrap_or_default();
    Local
        .from_local_datetime(&noon)
        .earliest()
        .map_or_else(|| Utc.from_utc_datetime(&noon), |t| t.with_timezone(&Utc))
}

/// Render a gram amount in the user's preferred unit
pub(crate) fn format_amount(grams: f64, units: UnitPreference) -> String {
    match units {
        UnitPreference::Grams => format!("{grams:.1} g"),
        UnitPreference::Ounces => format!("{:.2} oz", grams / GRAMS_PER_OUNCE),
    }
}

pub(crate) fn progress_bar(fraction: f64) -> String {
    let clamped = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let filled = (clamped * PROGRESS_BAR_WIDTH as f64).round() as usize;
    format!(
        "[{}{}] {:>3.0}%",
        "#".repeat(filled),
        "-".repeat(PROGRESS_BAR_WIDTH - filled),
        fraction.max(0.0) * 100.0
    )
}

/// One line describing where a write ended up
pub(crate) fn report_write(what: &str, outcome: Propagation) {
    println!("{what} ({outcome})");
}

pub(crate) fn invalid(e: ValidationError) -> anyhow::Error {
    anyhow::anyhow!("Invalid input: {e}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_keywords() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(None).unwrap(), today);
        assert_eq!(parse_date(Some("today".to_string())).unwrap(), today);
        assert_eq!(
            parse_date(Some("yesterday".to_string())).unwrap(),
            today - chrono::Duration::days(1)
        );
    }

    #[test]
    fn test_parse_date_iso() {
        let date = parse_date(Some("2024-01-15".to_string())).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date(Some("someday".to_string())).is_err());
    }

    #[test]
    fn test_eaten_at_lands_on_requested_day() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(eaten_at(date).with_timezone(&Local).date_naive(), date);

        let today = Local::now().date_naive();
        assert_eq!(eaten_at(today).with_timezone(&Local).date_naive(), today);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(30.0, UnitPreference::Grams), "30.0 g");
        assert_eq!(format_amount(GRAMS_PER_OUNCE * 2.0, UnitPreference::Ounces), "2.00 oz");
    }

    #[test]
    fn test_progress_bar_clamps() {
        assert!(progress_bar(0.5).starts_with("[##########----------]"));
        assert!(progress_bar(1.5).starts_with(&format!("[{}]", "#".repeat(20))));
        assert!(progress_bar(1.5).ends_with("150%"));
        assert!(progress_bar(f64::NAN).starts_with(&format!("[{}]", "-".repeat(20))));
    }
}
