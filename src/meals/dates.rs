//! Parsing of the `YYYY-M-D` date strings the input form produces.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DATE_RE: Regex = Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").unwrap();
    static ref MONTH_RE: Regex = Regex::new(r"^(\d{4})-(\d{1,2})$").unwrap();
}

/// A calendar month, e.g. `2024-5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearMonth {
    pub year: i32,
    pub month: u8,
}

impl YearMonth {
    pub fn parse(s: &str) -> Option<Self> {
        let caps = MONTH_RE.captures(s.trim())?;
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Postgres `~` pattern matching dates in this month, with or without zero padding.
    pub fn date_pattern(&self) -> String {
        let month = if self.month < 10 {
            format!("0?{}", self.month)
        } else {
            self.month.to_string()
        };
        format!("^{:04}-{}-[0-9]{{1,2}}$", self.year, month)
    }

    pub fn contains(&self, date: &str) -> bool {
        parse_date(date).is_some_and(|(y, m, _)| y == self.year && m == self.month)
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.year, self.month)
    }
}

/// Splits a date into (year, month, day). Zero padding is optional.
pub fn parse_date(s: &str) -> Option<(i32, u8, u8)> {
    let caps = DATE_RE.captures(s)?;
    let year = caps[1].parse().ok()?;
    let month: u8 = caps[2].parse().ok()?;
    let day: u8 = caps[3].parse().ok()?;
    ((1..=12).contains(&month) && (1..=31).contains(&day)).then_some((year, month, day))
}
