use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use time::{macros::format_description, Date, Duration, OffsetDateTime, Weekday};

/// A `YYYY-MM-DD` calendar day. Events are grouped by this value, never by
/// their timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, sqlx::Type)]
#[sqlx(transparent)]
pub struct CalendarDate(Date);

#[derive(Debug, thiserror::Error)]
#[error("invalid calendar date {0:?}, expected YYYY-MM-DD")]
pub struct ParseDateError(String);

impl CalendarDate {
    pub fn new(date: Date) -> Self {
        Self(date)
    }

    /// Current UTC day.
    pub fn today() -> Self {
        Self::new(OffsetDateTime::now_utc().date())
    }

    /// UTC calendar day of an instant.
    pub fn of(ts: OffsetDateTime) -> Self {
        Self::new(ts.to_offset(time::UtcOffset::UTC).date())
    }

    pub fn into_inner(self) -> Date {
        self.0
    }

    pub fn days_before(self, days: i64) -> Self {
        Self(self.0 - Duration::days(days))
    }

    /// The seven days ending at and including `self`, oldest first.
    pub fn trailing_week(self) -> [CalendarDate; 7] {
        std::array::from_fn(|i| self.days_before(6 - i as i64))
    }

    pub fn short_weekday(self) -> &'static str {
        match self.0.weekday() {
            Weekday::Monday => "Mon",
            Weekday::Tuesday => "Tue",
            Weekday::Wednesday => "Wed",
            Weekday::Thursday => "Thu",
            Weekday::Friday => "Fri",
            Weekday::Saturday => "Sat",
            Weekday::Sunday => "Sun",
        }
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day()
        )
    }
}

impl FromStr for CalendarDate {
    type Err = ParseDateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Date::parse(s.trim(), format_description!("[year]-[month]-[day]"))
            .map(Self)
            .map_err(|_| ParseDateError(s.to_string()))
    }
}

impl Serialize for CalendarDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod calendar_tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn parses_and_displays_iso_dates() {
        let d: CalendarDate = "2024-03-09".parse().unwrap();
        assert_eq!(d.into_inner(), date!(2024 - 03 - 09));
        assert_eq!(d.to_string(), "2024-03-09");
    }

    #[test]
    fn rejects_garbage() {
        assert!("2024-13-01".parse::<CalendarDate>().is_err());
        assert!("yesterday".parse::<CalendarDate>().is_err());
    }

    #[test]
    fn trailing_week_crosses_month_boundary() {
        let week = CalendarDate::new(date!(2024 - 03 - 02)).trailing_week();
        let rendered: Vec<String> = week.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "2024-02-25",
                "2024-02-26",
                "2024-02-27",
                "2024-02-28",
                "2024-02-29",
                "2024-03-01",
                "2024-03-02"
            ]
        );
    }

    #[test]
    fn weekday_names() {
        // 2024-03-04 was a Monday
        assert_eq!(CalendarDate::new(date!(2024 - 03 - 04)).short_weekday(), "Mon");
        assert_eq!(CalendarDate::new(date!(2024 - 03 - 10)).short_weekday(), "Sun");
    }

    #[test]
    fn day_of_instant_is_utc() {
        let ts = datetime!(2024-03-04 23:30 -2);
        assert_eq!(CalendarDate::of(ts).to_string(), "2024-03-05");
    }

    #[test]
    fn serde_uses_plain_string() {
        let d: CalendarDate = serde_json::from_str("\"2023-12-31\"").unwrap();
        assert_eq!(serde_json::to_string(&d).unwrap(), "\"2023-12-31\"");
    }
}
