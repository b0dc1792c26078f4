use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::currency::history::HistoryPeriod;
use crate::currency::{CurrencyCode, LocaleConfig};
use crate::errors::{PortfelError, Result};
use crate::ledger::{AllocationRatios, PeriodFilter};
use crate::rates::{nbp, RateProvider};
use crate::storage::json_backend::{tmp_path, write_atomic};

/// Overrides the application directory.
pub const HOME_ENV: &str = "PORTFEL_HOME";
/// Points at an offline rate file used instead of the remote provider.
pub const RATES_FILE_ENV: &str = "PORTFEL_RATES_FILE";

const APP_DIR: &str = "portfel";
const CONFIG_FILE: &str = "config.json";
const DATA_DIR: &str = "data";

/// Keys understood by [`Config::set_value`], aliases excluded.
pub const KEYS: &[&str] = &[
    "base_currency",
    "rate_provider",
    "nbp_base_url",
    "exchangerate_api_url",
    "locale",
    "period_filter",
    "history_period",
    "living_costs",
    "discretionary",
    "savings",
    "data_root",
    "rates_file",
];

pub const DEFAULT_NBP_URL: &str = "https://api.nbp.pl/api";
pub const DEFAULT_EXCHANGERATE_API_URL: &str = "https://api.exchangerate-api.com/v4/latest";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub base_currency: CurrencyCode,
    pub rate_provider: RateProvider,
    pub nbp_base_url: String,
    pub exchangerate_api_url: String,
    pub locale: LocaleConfig,
    pub period_filter: PeriodFilter,
    pub allocation: AllocationRatios,
    pub default_history_period: HistoryPeriod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rates_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_currency: CurrencyCode::new(nbp::BASE_CURRENCY),
            rate_provider: RateProvider::Nbp,
            nbp_base_url: DEFAULT_NBP_URL.into(),
            exchangerate_api_url: DEFAULT_EXCHANGERATE_API_URL.into(),
            locale: LocaleConfig::default(),
            period_filter: PeriodFilter::default(),
            allocation: AllocationRatios::default(),
            default_history_period: HistoryPeriod::default(),
            data_root: None,
            rates_file: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.base_currency.as_str().is_empty() {
            return Err(PortfelError::Config("base currency must not be empty".into()));
        }
        if self.rate_provider == RateProvider::Nbp
            && self.base_currency.as_str() != nbp::BASE_CURRENCY
        {
            return Err(PortfelError::Config(format!(
                "the nbp provider only publishes {} based rates",
                nbp::BASE_CURRENCY
            )));
        }
        let url = match self.rate_provider {
            RateProvider::Nbp => &self.nbp_base_url,
            RateProvider::ExchangeRateApi => &self.exchangerate_api_url,
        };
        if url.trim().is_empty() {
            return Err(PortfelError::Config(format!(
                "no URL configured for the {} provider",
                self.rate_provider
            )));
        }
        self.allocation
            .validate()
            .map_err(|err| PortfelError::Config(err.to_string()))
    }

    /// Applies a `config set <key> <value>` style update and re-validates.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let mut updated = self.clone();
        match key {
            "base_currency" | "currency" => updated.base_currency = CurrencyCode::new(value),
            "rate_provider" | "provider" => updated.rate_provider = RateProvider::parse(value)?,
            "nbp_base_url" => updated.nbp_base_url = value.into(),
            "exchangerate_api_url" => updated.exchangerate_api_url = value.into(),
            "locale" => updated.locale = LocaleConfig::for_tag(value),
            "period_filter" => updated.period_filter = PeriodFilter::parse(value)?,
            "history_period" | "default_history_period" => {
                updated.default_history_period = HistoryPeriod::parse(value)?
            }
            "living_costs" => updated.allocation.living_costs = parse_ratio(key, value)?,
            "discretionary" => updated.allocation.discretionary = parse_ratio(key, value)?,
            "savings" => updated.allocation.savings = parse_ratio(key, value)?,
            "data_root" => updated.data_root = optional_path(value),
            "rates_file" => updated.rates_file = optional_path(value),
            other => {
                return Err(PortfelError::Validation(format!(
                    "unknown configuration key `{other}`"
                )))
            }
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

fn parse_ratio(key: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| PortfelError::Validation(format!("`{key}` must be a number, got `{value}`")))
}

fn optional_path(value: &str) -> Option<PathBuf> {
    match value.trim() {
        "" | "none" | "-" => None,
        path => Some(PathBuf::from(path)),
    }
}

/// Loads and persists [`Config`] inside the application directory.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    /// Resolves the directory from `PORTFEL_HOME`, falling back to the platform data dir.
    pub fn new() -> Result<Self> {
        Self::with_base_dir(Self::default_base_dir()?)
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base)?;
        Ok(Self {
            path: base.join(CONFIG_FILE),
            base,
        })
    }

    pub fn default_base_dir() -> Result<PathBuf> {
        if let Some(home) = env::var_os(HOME_ENV).filter(|value| !value.is_empty()) {
            return Ok(PathBuf::from(home));
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| {
                PortfelError::Config(format!(
                    "cannot determine a data directory; set {HOME_ENV}"
                ))
            })
    }

    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let config: Config = serde_json::from_str(&data).map_err(|err| {
            PortfelError::Config(format!("{} is not valid: {err}", self.path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        config.validate()?;
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        tracing::info!(path = %self.path.display(), "configuration saved");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the document store collections.
    pub fn data_dir(&self, config: &Config) -> PathBuf {
        config
            .data_root
            .clone()
            .unwrap_or_else(|| self.base.join(DATA_DIR))
    }

    /// Offline rate file, the environment taking precedence over the config.
    pub fn rates_file(&self, config: &Config) -> Option<PathBuf> {
        env::var_os(RATES_FILE_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .or_else(|| config.rates_file.clone())
    }
}
