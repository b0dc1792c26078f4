//! Historical mid-rate series for charting a single currency.

use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::currency::CurrencyCode;
use crate::errors::{PortfelError, Result};

/// Look-back windows offered by the history view.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum HistoryPeriod {
    #[default]
    Last7Days,
    Last14Days,
    Last30Days,
}

impl HistoryPeriod {
    pub const ALL: [HistoryPeriod; 3] = [
        HistoryPeriod::Last7Days,
        HistoryPeriod::Last14Days,
        HistoryPeriod::Last30Days,
    ];

    pub fn days(self) -> i64 {
        match self {
            HistoryPeriod::Last7Days => 7,
            HistoryPeriod::Last14Days => 14,
            HistoryPeriod::Last30Days => 30,
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|period| period.days().to_string() == trimmed)
            .ok_or_else(|| {
                PortfelError::Validation(format!(
                    "history period must be 7, 14 or 30 days, got `{trimmed}`"
                ))
            })
    }

    /// Inclusive `(start, end)` date range ending on `today`.
    pub fn window(self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        (today - Duration::days(self.days()), today)
    }
}

impl fmt::Display for HistoryPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "last {} days", self.days())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatePoint {
    pub effective_date: NaiveDate,
    pub mid: f64,
}

/// Published mid rates for one currency, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateSeries {
    pub code: CurrencyCode,
    pub currency: String,
    pub points: Vec<RatePoint>,
}

impl RateSeries {
    pub fn new(
        code: impl Into<CurrencyCode>,
        currency: impl Into<String>,
        mut points: Vec<RatePoint>,
    ) -> Self {
        points.sort_by_key(|point| point.effective_date);
        Self {
            code: code.into(),
            currency: currency.into(),
            points,
        }
    }

    /// Fails with `NoHistoricalData` when the series carries no points.
    pub fn ensure_not_empty(self) -> Result<Self> {
        if self.points.is_empty() {
            return Err(PortfelError::NoHistoricalData(self.code.to_string()));
        }
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn min(&self) -> Option<f64> {
        self.points.iter().map(|point| point.mid).reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.points.iter().map(|point| point.mid).reduce(f64::max)
    }

    pub fn average(&self) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }
        let sum: f64 = self.points.iter().map(|point| point.mid).sum();
        Some(sum / self.points.len() as f64)
    }

    /// Difference between the newest and the oldest rate.
    pub fn change(&self) -> Option<f64> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        Some(last.mid - first.mid)
    }

    pub fn change_percent(&self) -> Option<f64> {
        let first = self.points.first()?;
        if first.mid == 0.0 {
            return None;
        }
        self.change().map(|delta| delta / first.mid * 100.0)
    }
}
