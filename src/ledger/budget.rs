use serde::{Deserialize, Serialize};

use crate::currency::parse_amount;
use crate::errors::{PortfelError, Result};
use crate::ledger::expense::{ExpenseRecord, HasAmount};
use crate::ledger::period::{Period, PeriodFilter};

/// Shares used to split a monthly income.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AllocationRatios {
    /// Share of income reserved for fixed living costs.
    pub living_costs: f64,
    /// Share of what remains after unplanned expenses that may be spent freely.
    pub discretionary: f64,
    /// Share of what remains after unplanned expenses that is saved.
    pub savings: f64,
}

impl Default for AllocationRatios {
    fn default() -> Self {
        Self {
            living_costs: 0.5,
            discretionary: 0.3,
            savings: 0.2,
        }
    }
}

impl AllocationRatios {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("living_costs", self.living_costs),
            ("discretionary", self.discretionary),
            ("savings", self.savings),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PortfelError::Validation(format!(
                    "allocation ratio `{name}` must be a non-negative number"
                )));
            }
        }
        Ok(())
    }
}

/// Derived four-way split for one period. Never persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct BudgetSnapshot {
    #[serde(rename = "kosztyZycia")]
    pub living_costs: f64,
    #[serde(rename = "zachcianki")]
    pub discretionary: f64,
    #[serde(rename = "oszczednosci")]
    pub savings: f64,
    #[serde(rename = "niespodziewaneWydatki")]
    pub unplanned_expenses: f64,
}

impl BudgetSnapshot {
    /// Living costs left after unplanned expenses. May be negative.
    pub fn remaining(&self) -> f64 {
        self.living_costs - self.unplanned_expenses
    }

    pub fn is_overspent(&self) -> bool {
        self.remaining() < 0.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BudgetAllocator {
    ratios: AllocationRatios,
}

impl BudgetAllocator {
    pub fn new(ratios: AllocationRatios) -> Self {
        Self { ratios }
    }

    pub fn ratios(&self) -> AllocationRatios {
        self.ratios
    }

    /// Splits `monthly_income` after subtracting the recorded expenses.
    ///
    /// Total function: negative remainders are not clamped and a NaN income
    /// yields NaN in every field.
    pub fn allocate<'a, I, T>(&self, monthly_income: f64, expenses: I) -> BudgetSnapshot
    where
        I: IntoIterator<Item = &'a T>,
        T: HasAmount + 'a,
    {
        let living_costs = monthly_income * self.ratios.living_costs;
        let unplanned_expenses: f64 = expenses.into_iter().map(HasAmount::amount).sum();
        let remaining = living_costs - unplanned_expenses;
        let snapshot = BudgetSnapshot {
            living_costs,
            discretionary: remaining * self.ratios.discretionary,
            savings: remaining * self.ratios.savings,
            unplanned_expenses,
        };
        tracing::debug!(monthly_income, ?snapshot, "allocated budget");
        snapshot
    }
}

/// Allocates with the default 50/30/20 ratios.
pub fn allocate<'a, I, T>(monthly_income: f64, expenses: I) -> BudgetSnapshot
where
    I: IntoIterator<Item = &'a T>,
    T: HasAmount + 'a,
{
    BudgetAllocator::default().allocate(monthly_income, expenses)
}

/// Holds the latest budgeting inputs and recomputes the snapshot on demand.
///
/// Stays inert (no snapshot) until a valid income has been supplied.
#[derive(Debug, Clone)]
pub struct BudgetPlanner {
    allocator: BudgetAllocator,
    filter: PeriodFilter,
    period: Period,
    income: Option<f64>,
    expenses: Vec<ExpenseRecord>,
}

impl BudgetPlanner {
    pub fn new(period: Period, filter: PeriodFilter, ratios: AllocationRatios) -> Self {
        Self {
            allocator: BudgetAllocator::new(ratios),
            filter,
            period,
            income: None,
            expenses: Vec::new(),
        }
    }

    /// Parses and stores the monthly income. Invalid input keeps the previous value.
    pub fn set_income(&mut self, input: &str) -> Result<f64> {
        let income = parse_amount(input)?;
        if income < 0.0 {
            return Err(PortfelError::Validation(
                "monthly income cannot be negative".into(),
            ));
        }
        self.income = Some(income);
        Ok(income)
    }

    pub fn clear_income(&mut self) {
        self.income = None;
    }

    pub fn income(&self) -> Option<f64> {
        self.income
    }

    pub fn set_period(&mut self, period: Period) {
        self.period = period;
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn filter(&self) -> PeriodFilter {
        self.filter
    }

    /// Applies changed preferences while keeping income, period and expenses.
    pub fn reconfigure(&mut self, filter: PeriodFilter, ratios: AllocationRatios) {
        self.filter = filter;
        self.allocator = BudgetAllocator::new(ratios);
    }

    pub fn replace_expenses(&mut self, expenses: Vec<ExpenseRecord>) {
        self.expenses = expenses;
    }

    pub fn expenses_in_period(&self) -> impl Iterator<Item = &ExpenseRecord> {
        self.expenses
            .iter()
            .filter(|record| self.period.contains(&record.date, self.filter))
    }

    pub fn snapshot(&self) -> Option<BudgetSnapshot> {
        let income = self.income?;
        Some(self.allocator.allocate(income, self.expenses_in_period()))
    }
}
