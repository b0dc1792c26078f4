//! Currency codes, exchange-rate tables, conversion and amount formatting.

pub mod history;

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{PortfelError, Result};

/// Decimal places used when amounts are shown to the user.
pub const DISPLAY_PRECISION: u32 = 2;

/// ISO 4217-like currency code, always upper case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::new("PLN")
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CurrencyCode {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// One row of a rate table: the value of one unit of `code` in the base currency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExchangeRate {
    pub code: CurrencyCode,
    /// Human readable currency name as published by the rate source.
    pub currency: String,
    pub mid: f64,
}

impl ExchangeRate {
    pub fn new(code: impl Into<CurrencyCode>, currency: impl Into<String>, mid: f64) -> Self {
        Self {
            code: code.into(),
            currency: currency.into(),
            mid,
        }
    }

    fn is_usable(&self) -> bool {
        self.mid.is_finite() && self.mid > 0.0
    }
}

/// Mid rates relative to a single base currency, as fetched once per session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateTable {
    pub base: CurrencyCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<NaiveDate>,
    #[serde(default)]
    rates: BTreeMap<CurrencyCode, ExchangeRate>,
}

impl RateTable {
    pub fn new(base: impl Into<CurrencyCode>) -> Self {
        Self {
            base: base.into(),
            effective_date: None,
            rates: BTreeMap::new(),
        }
    }

    pub fn with_rates(
        base: impl Into<CurrencyCode>,
        rates: impl IntoIterator<Item = ExchangeRate>,
    ) -> Self {
        let mut table = Self::new(base);
        for rate in rates {
            table.insert(rate);
        }
        table
    }

    /// Builds a table from quotes expressed as "units of X per one base unit".
    ///
    /// Quotes that cannot be inverted are dropped.
    pub fn from_per_base_quotes(
        base: impl Into<CurrencyCode>,
        quotes: impl IntoIterator<Item = (String, f64)>,
    ) -> Self {
        let mut table = Self::new(base);
        for (code, quote) in quotes {
            if !quote.is_finite() || quote <= 0.0 {
                tracing::warn!(code = %code, quote, "skipping unusable quote");
                continue;
            }
            let code = CurrencyCode::new(code);
            let name = code.as_str().to_string();
            table.insert(ExchangeRate::new(code, name, 1.0 / quote));
        }
        table
    }

    pub fn insert(&mut self, rate: ExchangeRate) {
        self.rates.insert(rate.code.clone(), rate);
    }

    pub fn get(&self, code: &str) -> Option<&ExchangeRate> {
        self.rates.get(&CurrencyCode::new(code))
    }

    pub fn rates(&self) -> impl Iterator<Item = &ExchangeRate> {
        self.rates.values()
    }

    /// Every code that can be resolved, base currency first.
    pub fn codes(&self) -> Vec<CurrencyCode> {
        let mut codes = vec![self.base.clone()];
        codes.extend(
            self.rates
                .keys()
                .filter(|code| **code != self.base)
                .cloned(),
        );
        codes
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Returns the mid rate for `code`; the base currency is always at parity.
    pub fn resolve(&self, code: &str) -> Result<f64> {
        let code = CurrencyCode::new(code);
        if code == self.base {
            return Ok(1.0);
        }
        match self.rates.get(&code) {
            Some(rate) if rate.is_usable() => Ok(rate.mid),
            _ => Err(PortfelError::RateNotFound(code.to_string())),
        }
    }

    /// Converts `amount` of `from` into `to`, rejecting unknown codes.
    pub fn convert_between(&self, amount: f64, from: &str, to: &str) -> Result<f64> {
        let from_rate = self.resolve(from)?;
        let to_rate = self.resolve(to)?;
        Ok(convert(amount, from_rate, to_rate))
    }
}

/// Converts an amount between two currencies quoted against the same base.
///
/// Full precision; round only for display.
pub fn convert(amount: f64, from_rate: f64, to_rate: f64) -> f64 {
    amount * from_rate / to_rate
}

/// Rounds half away from zero to `places` decimals.
pub fn round_half_up(value: f64, places: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(places as i32);
    let scaled = value * factor;
    // absorb binary representation error such as 1.005 * 100 = 100.49999999999999
    let nudged = scaled + scaled * f64::EPSILON * 2.0;
    nudged.round() / factor
}

/// Parses a user-entered amount, accepting `,` as the decimal separator.
pub fn parse_amount(input: &str) -> Result<f64> {
    let cleaned: String = input.trim().chars().filter(|ch| !ch.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(PortfelError::Validation("amount is required".into()));
    }
    let normalized = if cleaned.contains('.') {
        cleaned.replace(',', "")
    } else {
        cleaned.replace(',', ".")
    };
    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(PortfelError::Validation(format!(
            "`{}` is not a valid amount",
            input.trim()
        ))),
    }
}

/// Number formatting preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocaleConfig {
    pub language_tag: String,
    pub decimal_separator: char,
    pub grouping_separator: char,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self::for_tag("pl-PL")
    }
}

impl LocaleConfig {
    pub fn for_tag(tag: &str) -> Self {
        match tag {
            "pl-PL" | "fr-FR" | "de-DE" => LocaleConfig {
                language_tag: tag.into(),
                decimal_separator: ',',
                grouping_separator: ' ',
            },
            _ => LocaleConfig {
                language_tag: "en-US".into(),
                decimal_separator: '.',
                grouping_separator: ',',
            },
        }
    }
}

pub fn format_number(locale: &LocaleConfig, value: f64, precision: u32) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rounded = round_half_up(value, precision);
    let body = format!("{:.*}", precision as usize, rounded.abs());
    let (int_part, frac_part) = match body.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (body.as_str(), None),
    };
    let mut out = String::new();
    if rounded < 0.0 {
        out.push('-');
    }
    out.push_str(&group_digits(int_part, locale.grouping_separator));
    if let Some(frac) = frac_part {
        out.push(locale.decimal_separator);
        out.push_str(frac);
    }
    out
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::new();
    for (count, ch) in digits.chars().rev().enumerate() {
        if count != 0 && count % 3 == 0 {
            grouped.insert(0, separator);
        }
        grouped.insert(0, ch);
    }
    grouped
}

/// Renders an amount with two decimals followed by its currency code.
pub fn format_amount(amount: f64, code: &CurrencyCode, locale: &LocaleConfig) -> String {
    format!(
        "{} {}",
        format_number(locale, amount, DISPLAY_PRECISION),
        code
    )
}
