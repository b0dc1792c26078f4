use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::currency::parse_amount;
use crate::errors::{PortfelError, Result};
use crate::ledger::period::{parse_date, Period, PeriodFilter};
use crate::storage::Document;

/// An unplanned expense recorded on a calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpenseRecord {
    #[serde(default, skip_serializing)]
    pub id: String,
    /// `YYYY-MM-DD`; ordering and period checks work on this string.
    pub date: String,
    #[serde(rename = "expenseName")]
    pub expense_name: String,
    pub amount: f64,
}

impl ExpenseRecord {
    /// Validates form input for a new or edited expense. The result has no store key.
    pub fn draft(date: &str, expense_name: &str, amount_input: &str) -> Result<Self> {
        let date = date.trim();
        if date.is_empty() {
            return Err(PortfelError::Validation("select a date first".into()));
        }
        parse_date(date)?;
        let expense_name = expense_name.trim();
        if expense_name.is_empty() {
            return Err(PortfelError::Validation("expense name is required".into()));
        }
        let amount = parse_amount(amount_input)?;
        Ok(Self {
            id: String::new(),
            date: date.to_string(),
            expense_name: expense_name.to_string(),
            amount,
        })
    }
}

impl Document for ExpenseRecord {
    const COLLECTION: &'static str = "expenses";

    fn id(&self) -> &str {
        &self.id
    }

    fn with_id(mut self, id: String) -> Self {
        self.id = id;
        self
    }
}

/// Anything contributing an amount to the unplanned-expense total.
pub trait HasAmount {
    fn amount(&self) -> f64;
}

impl HasAmount for ExpenseRecord {
    fn amount(&self) -> f64 {
        self.amount
    }
}

impl HasAmount for f64 {
    fn amount(&self) -> f64 {
        *self
    }
}

/// Latest known snapshot of the expense collection.
#[derive(Debug, Clone, Default)]
pub struct ExpenseCalendar {
    records: Vec<ExpenseRecord>,
}

impl ExpenseCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<ExpenseRecord>) -> Self {
        Self { records }
    }

    pub fn replace_snapshot(&mut self, records: Vec<ExpenseRecord>) {
        self.records = records;
    }

    pub fn records(&self) -> &[ExpenseRecord] {
        &self.records
    }

    pub fn record(&self, id: &str) -> Option<&ExpenseRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn for_date<'a>(&'a self, date: &'a str) -> impl Iterator<Item = &'a ExpenseRecord> + 'a {
        self.records.iter().filter(move |record| record.date == date)
    }

    pub fn in_period(&self, period: Period, filter: PeriodFilter) -> Vec<&ExpenseRecord> {
        self.records
            .iter()
            .filter(|record| period.contains(&record.date, filter))
            .collect()
    }

    pub fn total_for(&self, period: Period, filter: PeriodFilter) -> f64 {
        self.in_period(period, filter)
            .into_iter()
            .map(|record| record.amount)
            .sum()
    }

    /// Distinct days carrying at least one expense, for calendar marking.
    pub fn marked_dates(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|record| record.date.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, date: &str, amount: f64) -> ExpenseRecord {
        ExpenseRecord {
            id: id.into(),
            date: date.into(),
            expense_name: format!("expense {id}"),
            amount,
        }
    }

    fn calendar() -> ExpenseCalendar {
        ExpenseCalendar::from_records(vec![
            record("1", "2024-02-10", 50.0),
            record("2", "2024-02-10", 25.0),
            record("3", "2024-02-30", 10.0),
            record("4", "2024-03-01", 99.0),
        ])
    }

    #[test]
    fn draft_requires_date_name_and_amount() {
        assert!(matches!(
            ExpenseRecord::draft("", "Dentist", "100"),
            Err(PortfelError::Validation(_))
        ));
        assert!(matches!(
            ExpenseRecord::draft("2024-02-10", "  ", "100"),
            Err(PortfelError::Validation(_))
        ));
        assert!(matches!(
            ExpenseRecord::draft("2024-02-10", "Dentist", "lots"),
            Err(PortfelError::Validation(_))
        ));
        assert!(matches!(
            ExpenseRecord::draft("10.02.2024", "Dentist", "100"),
            Err(PortfelError::InvalidDate(_))
        ));
        let draft = ExpenseRecord::draft("2024-02-10", " Dentist ", "120,5").unwrap();
        assert_eq!(draft.expense_name, "Dentist");
        assert_eq!(draft.amount, 120.5);
    }

    #[test]
    fn serializes_with_store_field_names() {
        let json = serde_json::to_value(record("x", "2024-02-10", 5.0)).unwrap();
        assert_eq!(json["expenseName"], "expense x");
        assert!(json.get("id").is_none());
    }

    #[test]
    fn groups_by_day_and_period() {
        let calendar = calendar();
        assert_eq!(calendar.for_date("2024-02-10").count(), 2);
        assert_eq!(calendar.marked_dates(), vec!["2024-02-10", "2024-02-30", "2024-03-01"]);

        let feb = Period::parse("2024-02").unwrap();
        assert_eq!(calendar.total_for(feb, PeriodFilter::Lexical), 85.0);
        assert_eq!(calendar.total_for(feb, PeriodFilter::Calendar), 75.0);
    }
}
