//! Payloads of the National Bank of Poland table-A API (base currency PLN).

use chrono::NaiveDate;
use serde::Deserialize;

use crate::currency::history::{RatePoint, RateSeries};
use crate::currency::{ExchangeRate, RateTable};
use crate::errors::{PortfelError, Result};

pub const BASE_CURRENCY: &str = "PLN";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TablePayload {
    effective_date: Option<NaiveDate>,
    rates: Vec<TableRate>,
}

#[derive(Debug, Deserialize)]
struct TableRate {
    currency: String,
    code: String,
    mid: f64,
}

#[derive(Debug, Deserialize)]
struct SeriesPayload {
    currency: String,
    code: String,
    rates: Vec<SeriesRate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeriesRate {
    effective_date: NaiveDate,
    mid: f64,
}

pub fn table_path() -> &'static str {
    "exchangerates/tables/A?format=json"
}

pub fn series_path(code: &str, start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "exchangerates/rates/A/{}/{}/{}/?format=json",
        code.to_uppercase(),
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
    )
}

/// Parses `[{ table, no, effectiveDate, rates: [{ currency, code, mid }] }]`.
pub fn parse_table(body: &str) -> Result<RateTable> {
    let tables: Vec<TablePayload> = serde_json::from_str(body)
        .map_err(|err| PortfelError::RemoteUnavailable(format!("unexpected NBP table: {err}")))?;
    let table = tables
        .into_iter()
        .next()
        .ok_or_else(|| PortfelError::RemoteUnavailable("NBP returned no rate table".into()))?;
    let mut rates = RateTable::with_rates(
        BASE_CURRENCY,
        table
            .rates
            .into_iter()
            .map(|rate| ExchangeRate::new(rate.code, rate.currency, rate.mid)),
    );
    rates.effective_date = table.effective_date;
    Ok(rates)
}

/// Parses `{ table, currency, code, rates: [{ no, effectiveDate, mid }] }`.
pub fn parse_series(body: &str) -> Result<RateSeries> {
    let payload: SeriesPayload = serde_json::from_str(body)
        .map_err(|err| PortfelError::RemoteUnavailable(format!("unexpected NBP series: {err}")))?;
    let points = payload
        .rates
        .into_iter()
        .map(|rate| RatePoint {
            effective_date: rate.effective_date,
            mid: rate.mid,
        })
        .collect();
    RateSeries::new(payload.code, payload.currency, points).ensure_not_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"[{"table":"A","no":"101/A/NBP/2024","effectiveDate":"2024-05-27",
        "rates":[{"currency":"dolar amerykański","code":"USD","mid":3.9187},
                 {"currency":"euro","code":"EUR","mid":4.2588}]}]"#;

    const SERIES: &str = r#"{"table":"A","currency":"dolar amerykański","code":"USD",
        "rates":[{"no":"097/A/NBP/2024","effectiveDate":"2024-05-21","mid":3.9361},
                 {"no":"096/A/NBP/2024","effectiveDate":"2024-05-20","mid":3.9334}]}"#;

    #[test]
    fn parses_table_a() {
        let table = parse_table(TABLE).unwrap();
        assert_eq!(table.base.as_str(), "PLN");
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("EUR").unwrap().currency, "euro");
        assert_eq!(table.effective_date, NaiveDate::from_ymd_opt(2024, 5, 27));
    }

    #[test]
    fn parses_series_in_date_order() {
        let series = parse_series(SERIES).unwrap();
        assert_eq!(series.code.as_str(), "USD");
        assert_eq!(series.points.len(), 2);
        assert_eq!(
            series.points[0].effective_date,
            NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
        );
    }

    #[test]
    fn empty_series_and_garbage_are_errors() {
        assert!(matches!(
            parse_series(r#"{"currency":"jen","code":"JPY","rates":[]}"#),
            Err(PortfelError::NoHistoricalData(_))
        ));
        assert!(matches!(parse_table("[]"), Err(PortfelError::RemoteUnavailable(_))));
        assert!(matches!(
            parse_table("404 NotFound"),
            Err(PortfelError::RemoteUnavailable(_))
        ));
    }

    #[test]
    fn builds_series_path() {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 5, 8).unwrap();
        assert_eq!(
            series_path("usd", start, end),
            "exchangerates/rates/A/USD/2024-05-01/2024-05-08/?format=json"
        );
    }
}
