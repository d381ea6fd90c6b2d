//! Calendar helpers shared by the filter engine and the row builder.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Datelike, Month, NaiveDate, Utc};

/// A calendar month, ordered chronologically.
///
/// Parsed from a `YYYY-MM` prefix (`"2026-02"`, `"2026-02-05"`,
/// `"2026-02-05T10:00:00Z"`) or from a month name mapped to a reference
/// year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    /// Calendar year.
    year: i32,
    /// Month number, `1..=12`.
    month: u32,
}

impl YearMonth {
    /// Creates a year-month, returning `None` for a month outside `1..=12`.
    #[inline]
    #[must_use]
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Returns the calendar year.
    #[inline]
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// Returns the month number (`1..=12`).
    #[inline]
    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// Returns the month containing `date`.
    #[inline]
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parses the leading `YYYY-MM` of a date-like string.
    #[inline]
    #[must_use]
    pub fn from_date_prefix(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let year_part = trimmed.get(0..4)?;
        let separator = trimmed.get(4..5)?;
        let month_part = trimmed.get(5..7)?;
        let all_digits = |part: &str| part.bytes().all(|byte| byte.is_ascii_digit());
        if separator != "-" || !all_digits(year_part) || !all_digits(month_part) {
            return None;
        }
        Self::new(year_part.parse().ok()?, month_part.parse().ok()?)
    }

    /// Maps a human month name (`"February"`, `"feb"`, `"February 2025"`)
    /// to a year-month. Without an explicit year the `reference_year` is
    /// used.
    #[inline]
    #[must_use]
    pub fn from_month_name(text: &str, reference_year: i32) -> Option<Self> {
        let mut parts = text.split_whitespace();
        let month = Month::from_str(parts.next()?).ok()?;
        let year = match parts.next() {
            Some(raw) => raw.parse::<i32>().ok()?,
            None => reference_year,
        };
        Self::new(year, month.number_from_month())
    }

    /// Resolves the month of a record: the explicit date wins, then the
    /// record's month label (either `YYYY-MM` or a month name).
    #[inline]
    #[must_use]
    pub fn resolve(date: Option<&str>, month_label: Option<&str>, reference_year: i32) -> Option<Self> {
        date.and_then(Self::from_date_prefix).or_else(|| {
            month_label.and_then(|label| {
                Self::from_date_prefix(label)
                    .or_else(|| Self::from_month_name(label, reference_year))
            })
        })
    }
}

impl fmt::Display for YearMonth {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_date_prefix(s)
            .filter(|_| s.trim().len() == 7)
            .ok_or_else(|| format!("expected YYYY-MM, got {s:?}"))
    }
}

/// Parses the calendar date at the start of a stored date string.
///
/// Accepts `YYYY-MM-DD` optionally followed by a time component.
#[inline]
#[must_use]
pub fn parse_record_date(text: &str) -> Option<NaiveDate> {
    let head = text.trim().get(0..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Sort key used for records whose date is missing or unparseable.
#[inline]
#[must_use]
pub fn epoch_date() -> NaiveDate {
    DateTime::<Utc>::UNIX_EPOCH.date_naive()
}
