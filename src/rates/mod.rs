//! Exchange-rate sources and the per-session rate cache.

pub mod exchangerate_api;
pub mod http;
pub mod nbp;

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::currency::history::RateSeries;
use crate::currency::{CurrencyCode, RateTable};
use crate::errors::{PortfelError, Result};

pub use http::HttpRateSource;

/// Public rate providers the application knows how to read.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RateProvider {
    /// National Bank of Poland table A, mid rates in PLN.
    #[default]
    Nbp,
    /// exchangerate-api.com, quotes per one unit of a configurable base.
    ExchangeRateApi,
}

impl RateProvider {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "nbp" => Ok(RateProvider::Nbp),
            "exchangerate-api" | "exchangerate_api" => Ok(RateProvider::ExchangeRateApi),
            other => Err(PortfelError::Validation(format!(
                "unknown rate provider `{other}` (expected nbp or exchangerate-api)"
            ))),
        }
    }
}

impl fmt::Display for RateProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateProvider::Nbp => f.write_str("nbp"),
            RateProvider::ExchangeRateApi => f.write_str("exchangerate-api"),
        }
    }
}

/// Anything able to produce a current rate table and historical series.
pub trait RateSource: Send + Sync {
    fn base(&self) -> CurrencyCode;

    fn latest(&self) -> Result<RateTable>;

    fn history(&self, code: &str, start: NaiveDate, end: NaiveDate) -> Result<RateSeries>;
}

/// Fixed rates, for offline use and tests.
#[derive(Debug, Clone)]
pub struct StaticRateSource {
    table: RateTable,
    series: HashMap<CurrencyCode, RateSeries>,
}

impl StaticRateSource {
    pub fn new(table: RateTable) -> Self {
        Self {
            table,
            series: HashMap::new(),
        }
    }

    pub fn with_series(mut self, series: RateSeries) -> Self {
        self.series.insert(series.code.clone(), series);
        self
    }

    /// Reads an offline rate file: `{ "table": {..}, "series": [..] }`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|err| {
            PortfelError::RemoteUnavailable(format!("cannot read {}: {err}", path.display()))
        })?;
        let file: OfflineRates = serde_json::from_str(&data).map_err(|err| {
            PortfelError::RemoteUnavailable(format!("{} is not a rate file: {err}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), count = file.table.len(), "offline rates loaded");
        Ok(file
            .series
            .into_iter()
            .map(|series| RateSeries::new(series.code.as_str(), series.currency, series.points))
            .fold(Self::new(file.table), Self::with_series))
    }
}

#[derive(Debug, Deserialize)]
struct OfflineRates {
    table: RateTable,
    #[serde(default)]
    series: Vec<RateSeries>,
}

impl RateSource for StaticRateSource {
    fn base(&self) -> CurrencyCode {
        self.table.base.clone()
    }

    fn latest(&self) -> Result<RateTable> {
        Ok(self.table.clone())
    }

    fn history(&self, code: &str, start: NaiveDate, end: NaiveDate) -> Result<RateSeries> {
        let code = CurrencyCode::new(code);
        let series = self
            .series
            .get(&code)
            .ok_or_else(|| PortfelError::NoHistoricalData(code.to_string()))?;
        let points = series
            .points
            .iter()
            .filter(|point| start <= point.effective_date && point.effective_date <= end)
            .cloned()
            .collect();
        RateSeries::new(code, series.currency.clone(), points).ensure_not_empty()
    }
}

/// Stands in for a source that could not be set up; every fetch reports why.
#[derive(Debug, Clone)]
pub struct UnavailableRateSource {
    base: CurrencyCode,
    reason: String,
}

impl UnavailableRateSource {
    pub fn new(base: CurrencyCode, reason: impl Into<String>) -> Self {
        Self {
            base,
            reason: reason.into(),
        }
    }
}

impl RateSource for UnavailableRateSource {
    fn base(&self) -> CurrencyCode {
        self.base.clone()
    }

    fn latest(&self) -> Result<RateTable> {
        Err(PortfelError::RemoteUnavailable(self.reason.clone()))
    }

    fn history(&self, _code: &str, _start: NaiveDate, _end: NaiveDate) -> Result<RateSeries> {
        Err(PortfelError::RemoteUnavailable(self.reason.clone()))
    }
}

/// Fetches the rate table once and reuses it until explicitly refreshed.
pub struct SessionRates {
    source: Box<dyn RateSource>,
    table: Option<RateTable>,
}

impl SessionRates {
    pub fn new(source: Box<dyn RateSource>) -> Self {
        Self {
            source,
            table: None,
        }
    }

    pub fn source(&self) -> &dyn RateSource {
        self.source.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.table.is_some()
    }

    /// The table fetched so far, if any; never triggers a fetch.
    pub fn cached(&self) -> Option<&RateTable> {
        self.table.as_ref()
    }

    pub fn table(&mut self) -> Result<&RateTable> {
        if self.table.is_none() {
            self.table = Some(self.source.latest()?);
        }
        self.table
            .as_ref()
            .ok_or_else(|| PortfelError::RemoteUnavailable("rate table unavailable".into()))
    }

    /// Drops the cached table and fetches a new one.
    pub fn refresh(&mut self) -> Result<&RateTable> {
        self.table = None;
        self.table()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::currency::history::RatePoint;
    use crate::currency::ExchangeRate;

    struct CountingSource {
        calls: Arc<AtomicUsize>,
    }

    impl RateSource for CountingSource {
        fn base(&self) -> CurrencyCode {
            CurrencyCode::new("PLN")
        }

        fn latest(&self) -> Result<RateTable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RateTable::with_rates("PLN", [ExchangeRate::new("USD", "dolar", 4.0)]))
        }

        fn history(&self, code: &str, _: NaiveDate, _: NaiveDate) -> Result<RateSeries> {
            Err(PortfelError::NoHistoricalData(code.into()))
        }
    }

    #[test]
    fn session_fetches_once_until_refreshed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut rates = SessionRates::new(Box::new(CountingSource {
            calls: Arc::clone(&calls),
        }));
        assert!(!rates.is_loaded());
        assert!(rates.cached().is_none());
        rates.table().unwrap();
        rates.table().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(rates.cached().map(RateTable::len), Some(1));
        rates.refresh().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn static_history_is_windowed() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 6, d).unwrap();
        let source = StaticRateSource::new(RateTable::new("PLN")).with_series(RateSeries::new(
            "EUR",
            "euro",
            vec![
                RatePoint { effective_date: day(1), mid: 4.3 },
                RatePoint { effective_date: day(10), mid: 4.4 },
            ],
        ));
        let series = source.history("eur", day(5), day(12)).unwrap();
        assert_eq!(series.points.len(), 1);
        assert!(matches!(
            source.history("EUR", day(20), day(25)),
            Err(PortfelError::NoHistoricalData(_))
        ));
        assert!(matches!(
            source.history("GBP", day(1), day(25)),
            Err(PortfelError::NoHistoricalData(_))
        ));
    }

    #[test]
    fn reads_offline_rate_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rates.json");
        fs::write(
            &path,
            r#"{"table":{"base":"PLN","rates":{"USD":{"code":"USD","currency":"dolar","mid":4.0}}},
                "series":[{"code":"USD","currency":"dolar","points":[
                    {"effective_date":"2024-06-03","mid":3.98}]}]}"#,
        )
        .unwrap();
        let source = StaticRateSource::from_file(&path).unwrap();
        assert_eq!(source.latest().unwrap().resolve("USD").unwrap(), 4.0);
        let day = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        assert_eq!(source.history("USD", day, day).unwrap().points.len(), 1);
        assert!(matches!(
            StaticRateSource::from_file(&dir.path().join("missing.json")),
            Err(PortfelError::RemoteUnavailable(_))
        ));
    }

    #[test]
    fn unavailable_source_fails_every_fetch() {
        let mut rates = SessionRates::new(Box::new(UnavailableRateSource::new(
            CurrencyCode::new("PLN"),
            "cannot read rates.json",
        )));
        assert!(matches!(
            rates.table(),
            Err(PortfelError::RemoteUnavailable(message)) if message == "cannot read rates.json"
        ));
        assert!(!rates.is_loaded());
        let day = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        assert!(matches!(
            rates.source().history("USD", day, day),
            Err(PortfelError::RemoteUnavailable(_))
        ));
        assert_eq!(rates.source().base().as_str(), "PLN");
    }

    #[test]
    fn parses_provider_names() {
        assert_eq!(RateProvider::parse("NBP").unwrap(), RateProvider::Nbp);
        assert_eq!(
            RateProvider::parse("exchangerate-api").unwrap(),
            RateProvider::ExchangeRateApi
        );
        assert!(RateProvider::parse("ecb").is_err());
    }
}
