use std::time::Duration;

use chrono::NaiveDate;
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};

use crate::currency::history::RateSeries;
use crate::currency::{CurrencyCode, RateTable};
use crate::errors::{PortfelError, Result};

use super::{exchangerate_api, nbp, RateProvider, RateSource};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Blocking HTTP client for the configured public rate provider.
#[derive(Debug, Clone)]
pub struct HttpRateSource {
    http: Client,
    provider: RateProvider,
    base_url: Url,
    base: CurrencyCode,
}

impl HttpRateSource {
    pub fn new(provider: RateProvider, base_url: &str, base: CurrencyCode) -> Result<Self> {
        // Url::join drops the last segment unless the base ends with a slash
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&normalized)
            .map_err(|err| PortfelError::Config(format!("invalid rate source URL `{base_url}`: {err}")))?;
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| PortfelError::RemoteUnavailable(format!("HTTP client: {err}")))?;
        let base = match provider {
            RateProvider::Nbp => CurrencyCode::new(nbp::BASE_CURRENCY),
            RateProvider::ExchangeRateApi => base,
        };
        Ok(Self {
            http,
            provider,
            base_url,
            base,
        })
    }

    fn get(&self, path: &str) -> Result<(StatusCode, String)> {
        let endpoint = self
            .base_url
            .join(path)
            .map_err(|err| PortfelError::Config(format!("cannot build URL for `{path}`: {err}")))?;
        tracing::debug!(%endpoint, "fetching rates");
        let response = self.http.get(endpoint.clone()).send().map_err(|err| {
            tracing::warn!(%endpoint, error = %err, "rate request failed");
            PortfelError::RemoteUnavailable(format!("GET {endpoint}: {err}"))
        })?;
        let status = response.status();
        let body = response.text()?;
        Ok((status, body))
    }

    fn get_ok(&self, path: &str) -> Result<String> {
        let (status, body) = self.get(path)?;
        if !status.is_success() {
            return Err(PortfelError::RemoteUnavailable(format!(
                "rate source answered {status}"
            )));
        }
        Ok(body)
    }
}

impl RateSource for HttpRateSource {
    fn base(&self) -> CurrencyCode {
        self.base.clone()
    }

    fn latest(&self) -> Result<RateTable> {
        let table = match self.provider {
            RateProvider::Nbp => nbp::parse_table(&self.get_ok(nbp::table_path())?)?,
            RateProvider::ExchangeRateApi => exchangerate_api::parse_latest(
                &self.get_ok(&exchangerate_api::latest_path(self.base.as_str()))?,
            )?,
        };
        tracing::info!(
            provider = %self.provider,
            base = %table.base,
            count = table.len(),
            "rate table fetched"
        );
        Ok(table)
    }

    fn history(&self, code: &str, start: NaiveDate, end: NaiveDate) -> Result<RateSeries> {
        match self.provider {
            RateProvider::Nbp => {
                let (status, body) = self.get(&nbp::series_path(code, start, end))?;
                // NBP answers 404 when the range holds no published table
                if status == StatusCode::NOT_FOUND {
                    return Err(PortfelError::NoHistoricalData(code.to_uppercase()));
                }
                if !status.is_success() {
                    return Err(PortfelError::RemoteUnavailable(format!(
                        "rate source answered {status}"
                    )));
                }
                nbp::parse_series(&body)
            }
            RateProvider::ExchangeRateApi => Err(PortfelError::Unsupported(
                "exchangerate-api does not publish historical series".into(),
            )),
        }
    }
}
