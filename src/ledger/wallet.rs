use serde::{Deserialize, Serialize};

use crate::currency::{convert, parse_amount, CurrencyCode, RateTable};
use crate::errors::{PortfelError, Result};
use crate::storage::Document;

/// One currency balance held in the wallet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WalletEntry {
    /// External store key. Not part of the stored document body.
    #[serde(default, skip_serializing)]
    pub id: String,
    pub currency: CurrencyCode,
    pub amount: f64,
    /// Mid rate captured when the line was created. Exchanges leave it as is.
    pub rate: f64,
}

impl WalletEntry {
    pub fn new(currency: impl Into<CurrencyCode>, amount: f64, rate: f64) -> Self {
        Self {
            id: String::new(),
            currency: currency.into(),
            amount,
            rate,
        }
    }

    /// Value of the line in the base currency at its snapshot rate.
    pub fn value_in_base(&self) -> f64 {
        self.amount * self.rate
    }
}

impl Document for WalletEntry {
    const COLLECTION: &'static str = "wallets";

    fn id(&self) -> &str {
        &self.id
    }

    fn with_id(mut self, id: String) -> Self {
        self.id = id;
        self
    }
}

/// Converts one wallet line into `target_currency` at `target_rate`.
///
/// Only `amount` and `currency` change; the store key and the rate snapshot
/// are carried over from `entry`. The target rate is rejected before anything
/// is produced when it is not a usable mid rate.
pub fn exchange(
    entry: &WalletEntry,
    target_currency: &CurrencyCode,
    target_rate: f64,
) -> Result<WalletEntry> {
    if !target_rate.is_finite() || target_rate <= 0.0 {
        tracing::warn!(
            entry = %entry.id,
            target = %target_currency,
            target_rate,
            "exchange rejected: unusable target rate"
        );
        return Err(PortfelError::RateNotFound(target_currency.to_string()));
    }
    if !entry.rate.is_finite() || entry.rate <= 0.0 {
        return Err(PortfelError::RateNotFound(entry.currency.to_string()));
    }
    let amount = convert(entry.amount, entry.rate, target_rate);
    tracing::debug!(
        entry = %entry.id,
        from = %entry.currency,
        to = %target_currency,
        amount,
        "exchanged wallet entry"
    );
    Ok(WalletEntry {
        id: entry.id.clone(),
        currency: target_currency.clone(),
        amount,
        rate: entry.rate,
    })
}

/// Resolves `target` through `rates` and exchanges the entry.
pub fn exchange_with_table(
    entry: &WalletEntry,
    target: &str,
    rates: &RateTable,
) -> Result<WalletEntry> {
    let target_rate = rates.resolve(target)?;
    exchange(entry, &CurrencyCode::new(target), target_rate)
}

/// Latest known snapshot of the wallet collection.
#[derive(Debug, Clone, Default)]
pub struct WalletLedger {
    entries: Vec<WalletEntry>,
}

impl WalletLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<WalletEntry>) -> Self {
        Self { entries }
    }

    /// Swaps in a fresh snapshot delivered by the store.
    pub fn replace_snapshot(&mut self, entries: Vec<WalletEntry>) {
        self.entries = entries;
    }

    pub fn entries(&self) -> &[WalletEntry] {
        &self.entries
    }

    pub fn entry(&self, id: &str) -> Option<&WalletEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validates an "add currency" request and snapshots the current mid rate.
    ///
    /// The returned entry has no store key yet.
    pub fn new_entry(currency: &str, amount_input: &str, rates: &RateTable) -> Result<WalletEntry> {
        let amount = parse_amount(amount_input)?;
        if amount < 0.0 {
            return Err(PortfelError::Validation(
                "wallet amount cannot be negative".into(),
            ));
        }
        let rate = rates.resolve(currency)?;
        Ok(WalletEntry::new(currency, amount, rate))
    }

    /// Exchanges a single line in place. On any error the ledger is unchanged.
    pub fn apply_exchange(
        &mut self,
        id: &str,
        target: &str,
        rates: &RateTable,
    ) -> Result<WalletEntry> {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or_else(|| PortfelError::EntryNotFound(id.to_string()))?;
        let updated = exchange_with_table(&self.entries[position], target, rates)?;
        self.entries[position] = updated.clone();
        Ok(updated)
    }

    /// Values every line at its snapshot rate and expresses the sum in `target`.
    pub fn total_in(&self, target: &str, rates: &RateTable) -> Result<f64> {
        let target_rate = rates.resolve(target)?;
        let base_total: f64 = self.entries.iter().map(WalletEntry::value_in_base).sum();
        Ok(base_total / target_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::{round_half_up, ExchangeRate};

    fn rates() -> RateTable {
        RateTable::with_rates(
            "PLN",
            [
                ExchangeRate::new("USD", "dolar amerykański", 4.0),
                ExchangeRate::new("EUR", "euro", 5.0),
            ],
        )
    }

    fn ledger() -> WalletLedger {
        WalletLedger::from_entries(vec![
            WalletEntry::new("PLN", 100.0, 1.0).with_id("a".into()),
            WalletEntry::new("USD", 10.0, 4.0).with_id("b".into()),
        ])
    }

    #[test]
    fn exchange_converts_and_keeps_identity() {
        let entry = WalletEntry::new("PLN", 100.0, 1.0).with_id("wallet-1".into());
        let exchanged = exchange(&entry, &CurrencyCode::new("USD"), 4.0).unwrap();
        assert_eq!(exchanged.id, "wallet-1");
        assert_eq!(exchanged.currency.as_str(), "USD");
        assert_eq!(round_half_up(exchanged.amount, 2), 25.0);
        assert_eq!(entry.currency.as_str(), "PLN");
        assert_eq!(entry.amount, 100.0);
    }

    #[test]
    fn exchange_keeps_the_rate_snapshot() {
        let entry = WalletEntry::new("PLN", 100.0, 1.0);
        let exchanged = exchange(&entry, &CurrencyCode::new("USD"), 4.0).unwrap();
        assert_eq!(exchanged.rate, 1.0);
        assert_eq!(exchanged.currency.as_str(), "USD");
        assert_eq!(round_half_up(exchanged.amount, 2), 25.0);
    }

    #[test]
    fn second_exchange_converts_from_the_creation_rate() {
        let entry = WalletEntry::new("USD", 12.5, 4.0);
        let eur = exchange(&entry, &CurrencyCode::new("EUR"), 5.0).unwrap();
        assert!((eur.amount - 10.0).abs() < 1e-9);
        assert_eq!(eur.rate, 4.0);
        // the snapshot still describes USD, so the next hop starts from it
        let pln = exchange(&eur, &CurrencyCode::new("PLN"), 1.0).unwrap();
        assert!((pln.amount - 40.0).abs() < 1e-9);
    }

    #[test]
    fn exchange_rejects_unusable_rates() {
        let entry = WalletEntry::new("PLN", 100.0, 1.0);
        for rate in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                exchange(&entry, &CurrencyCode::new("USD"), rate),
                Err(PortfelError::RateNotFound(code)) if code == "USD"
            ));
        }
    }

    #[test]
    fn apply_exchange_mutates_only_the_target_line() {
        let mut ledger = ledger();
        let updated = ledger.apply_exchange("a", "EUR", &rates()).unwrap();
        assert_eq!(updated.amount, 20.0);
        assert_eq!(ledger.entry("a").unwrap().currency.as_str(), "EUR");
        assert_eq!(ledger.entry("a").unwrap().rate, 1.0);
        assert_eq!(ledger.entry("b").unwrap().amount, 10.0);
    }

    #[test]
    fn failed_exchange_leaves_ledger_untouched() {
        let mut ledger = ledger();
        let before = ledger.entries().to_vec();
        assert!(matches!(
            ledger.apply_exchange("a", "GBP", &rates()),
            Err(PortfelError::RateNotFound(_))
        ));
        assert!(matches!(
            ledger.apply_exchange("missing", "USD", &rates()),
            Err(PortfelError::EntryNotFound(_))
        ));
        assert_eq!(ledger.entries(), before.as_slice());
    }

    #[test]
    fn new_entry_snapshots_rate_and_validates_amount() {
        let entry = WalletLedger::new_entry("usd", "12,50", &rates()).unwrap();
        assert_eq!(entry.rate, 4.0);
        assert_eq!(entry.amount, 12.5);
        assert!(entry.id.is_empty());

        assert!(matches!(
            WalletLedger::new_entry("USD", "-1", &rates()),
            Err(PortfelError::Validation(_))
        ));
        assert!(matches!(
            WalletLedger::new_entry("USD", "", &rates()),
            Err(PortfelError::Validation(_))
        ));
        assert!(matches!(
            WalletLedger::new_entry("CHF", "10", &rates()),
            Err(PortfelError::RateNotFound(_))
        ));
    }

    #[test]
    fn total_is_expressed_in_requested_currency() {
        let ledger = ledger();
        assert!((ledger.total_in("PLN", &rates()).unwrap() - 140.0).abs() < 1e-9);
        assert!((ledger.total_in("USD", &rates()).unwrap() - 35.0).abs() < 1e-9);
    }
}
