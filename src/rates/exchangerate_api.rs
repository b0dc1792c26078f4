//! Payloads of the exchangerate-api `latest` endpoint.
//!
//! Quotes there are units of each currency per one base unit, so they are
//! inverted into mid rates.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::currency::RateTable;
use crate::errors::{PortfelError, Result};

#[derive(Debug, Deserialize)]
struct LatestPayload {
    base: String,
    #[serde(default)]
    date: Option<NaiveDate>,
    rates: BTreeMap<String, f64>,
}

pub fn latest_path(base: &str) -> String {
    base.to_uppercase()
}

pub fn parse_latest(body: &str) -> Result<RateTable> {
    let payload: LatestPayload = serde_json::from_str(body).map_err(|err| {
        PortfelError::RemoteUnavailable(format!("unexpected exchangerate-api payload: {err}"))
    })?;
    let mut table = RateTable::from_per_base_quotes(payload.base, payload.rates);
    table.effective_date = payload.date;
    Ok(table)
}
