//! Date helper functions

use chrono::{DateTime, TimeZone};

/// Long month and year, as shown in an article header ("March 2024")
pub fn month_year<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%B %Y").to_string()
}

/// Short date, as shown on index cards ("Mar 5, 2024")
pub fn short_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%b %-d, %Y").to_string()
}

/// ISO 8601 with millisecond precision ("2024-03-05T00:00:00.000Z")
pub fn date_iso<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.with_timezone(&chrono::Utc)
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_month_year() {
        let date = Utc.with_ymd_and_hms(2024, 3, 5, 10, 30, 0).unwrap();
        assert_eq!(month_year(&date), "March 2024");
    }

    #[test]
    fn test_short_date() {
        let date = Utc.with_ymd_and_hms(2024, 3, 5, 10, 30, 0).unwrap();
        assert_eq!(short_date(&date), "Mar 5, 2024");
    }

    #[test]
    fn test_date_iso() {
        let date = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        assert_eq!(date_iso(&date), "2024-03-05T00:00:00.000Z");
    }
}
