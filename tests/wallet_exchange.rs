use portfel_core::currency::{convert, round_half_up, CurrencyCode, ExchangeRate, RateTable};
use portfel_core::errors::PortfelError;
use portfel_core::ledger::{exchange, WalletEntry, WalletLedger};
use portfel_core::storage::Document;

fn table() -> RateTable {
    RateTable::with_rates(
        "PLN",
        [
            ExchangeRate::new("USD", "dolar amerykański", 4.0),
            ExchangeRate::new("EUR", "euro", 4.3),
            ExchangeRate::new("JPY", "jen (Japonia)", 0.0251),
        ],
    )
}

#[test]
fn identity_conversion() {
    for rate in [0.0251, 1.0, 4.3, 1000.0] {
        for amount in [0.0, 1.0, 99.99, 123456.78] {
            assert_eq!(round_half_up(convert(amount, rate, rate), 2), amount);
        }
    }
}

#[test]
fn round_trip_within_display_tolerance() {
    let rates = [0.0251, 1.0, 4.0, 4.3, 5.1234];
    for &a in &rates {
        for &b in &rates {
            let amount = 1234.56;
            let back = convert(convert(amount, a, b), b, a);
            assert_eq!(round_half_up(back, 2), amount);
        }
    }
}

#[test]
fn reference_exchange() {
    let entry = WalletEntry::new("PLN", 100.0, 1.0).with_id("line-1".into());
    let exchanged = exchange(&entry, &CurrencyCode::new("USD"), 4.0).unwrap();
    assert_eq!(round_half_up(exchanged.amount, 2), 25.00);
    assert_eq!(exchanged.currency.as_str(), "USD");
    assert_eq!(exchanged.id, "line-1");
    assert_eq!(exchanged.rate, 1.0);
}

#[test]
fn unresolvable_rate_leaves_everything_unchanged() {
    let mut ledger = WalletLedger::from_entries(vec![
        WalletEntry::new("PLN", 100.0, 1.0).with_id("a".into()),
        WalletEntry::new("EUR", 10.0, 4.3).with_id("b".into()),
    ]);
    let before = ledger.entries().to_vec();

    let err = ledger.apply_exchange("a", "XYZ", &table()).unwrap_err();
    assert!(matches!(err, PortfelError::RateNotFound(code) if code == "XYZ"));
    assert_eq!(ledger.entries(), before.as_slice());

    for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        assert!(matches!(
            exchange(&before[0], &CurrencyCode::new("USD"), bad),
            Err(PortfelError::RateNotFound(_))
        ));
    }
}

#[test]
fn exchanging_one_line_does_not_touch_the_others() {
    let mut ledger = WalletLedger::from_entries(vec![
        WalletEntry::new("PLN", 100.0, 1.0).with_id("a".into()),
        WalletEntry::new("EUR", 10.0, 4.3).with_id("b".into()),
    ]);
    let untouched = ledger.entry("a").cloned().unwrap();

    ledger.apply_exchange("b", "JPY", &table()).unwrap();

    assert_eq!(ledger.entry("a"), Some(&untouched));
    let yen = ledger.entry("b").unwrap();
    assert_eq!(yen.currency.as_str(), "JPY");
    assert_eq!(round_half_up(yen.amount, 2), round_half_up(10.0 * 4.3 / 0.0251, 2));
    assert_eq!(yen.rate, 4.3);
}

#[test]
fn missing_line_is_reported() {
    let mut ledger = WalletLedger::new();
    assert!(matches!(
        ledger.apply_exchange("nope", "USD", &table()),
        Err(PortfelError::EntryNotFound(_))
    ));
}

#[test]
fn new_lines_snapshot_the_current_rate() {
    let entry = WalletLedger::new_entry("eur", "12,50", &table()).unwrap();
    assert_eq!(entry.currency.as_str(), "EUR");
    assert_eq!(entry.amount, 12.5);
    assert_eq!(entry.rate, 4.3);
    assert!(entry.id().is_empty());

    assert!(matches!(
        WalletLedger::new_entry("USD", "ten", &table()),
        Err(PortfelError::Validation(_))
    ));
    assert!(matches!(
        WalletLedger::new_entry("USD", "-1", &table()),
        Err(PortfelError::Validation(_))
    ));
}

#[test]
fn usd_based_tables_work_the_same_way() {
    let usd = RateTable::from_per_base_quotes(
        "USD",
        [("PLN".to_string(), 4.0), ("EUR".to_string(), 0.8)],
    );
    let entry = WalletLedger::new_entry("PLN", "100", &usd).unwrap();
    let ledger = WalletLedger::from_entries(vec![entry.with_id("x".into())]);
    assert!((ledger.total_in("USD", &usd).unwrap() - 25.0).abs() < 1e-9);
    assert!((ledger.total_in("EUR", &usd).unwrap() - 20.0).abs() < 1e-9);
}
