//! Wallet lines, expense records and the budget split derived from them.

pub mod budget;
pub mod expense;
pub mod period;
pub mod wallet;

pub use budget::{allocate, AllocationRatios, BudgetAllocator, BudgetPlanner, BudgetSnapshot};
pub use expense::{ExpenseCalendar, ExpenseRecord, HasAmount};
pub use period::{parse_date, Period, PeriodFilter};
pub use wallet::{exchange, exchange_with_table, WalletEntry, WalletLedger};
