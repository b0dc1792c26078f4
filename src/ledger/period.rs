use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::{PortfelError, Result};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a `YYYY-MM-DD` string, requiring zero padding.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.len() != 10 {
        return Err(PortfelError::InvalidDate(format!(
            "`{trimmed}` must use the YYYY-MM-DD format"
        )));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|err| PortfelError::InvalidDate(format!("`{trimmed}`: {err}")))
}

/// How expense dates are matched against a budgeting period.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PeriodFilter {
    /// `YYYY-MM-01 <= date <= YYYY-MM-31` under plain string ordering.
    #[default]
    Lexical,
    /// Parsed dates compared against the real first and last day of the month.
    Calendar,
}

impl PeriodFilter {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lexical" => Ok(PeriodFilter::Lexical),
            "calendar" => Ok(PeriodFilter::Calendar),
            other => Err(PortfelError::Validation(format!(
                "unknown period filter `{other}` (expected lexical or calendar)"
            ))),
        }
    }
}

impl fmt::Display for PeriodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodFilter::Lexical => f.write_str("lexical"),
            PeriodFilter::Calendar => f.write_str("calendar"),
        }
    }
}

/// A calendar month used to scope expense aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) || !(0..=9999).contains(&year) {
            return Err(PortfelError::InvalidDate(format!(
                "{year}-{month} is not a valid month"
            )));
        }
        Ok(Self { year, month })
    }

    /// Parses `YYYY-MM`.
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let invalid = || PortfelError::InvalidDate(format!("`{trimmed}` must use YYYY-MM"));
        let (year, month) = trimmed.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month)
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// String bounds used by the lexical filter. The upper bound is always day 31.
    pub fn lexical_bounds(&self) -> (String, String) {
        (
            format!("{self}-01"),
            format!("{self}-31"),
        )
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|first| first.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn contains(&self, date: &str, filter: PeriodFilter) -> bool {
        match filter {
            PeriodFilter::Lexical => {
                let (lower, upper) = self.lexical_bounds();
                lower.as_str() <= date && date <= upper.as_str()
            }
            PeriodFilter::Calendar => match parse_date(date) {
                Ok(parsed) => self.first_day() <= parsed && parsed <= self.last_day(),
                Err(_) => false,
            },
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
