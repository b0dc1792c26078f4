//! Core CLI state, dispatch, and error plumbing shared by every command.

use std::io;

use chrono::{Local, NaiveDate};
use rustyline::error::ReadlineError;
use strsim::levenshtein;

use crate::cli::commands;
use crate::cli::io as cli_io;
use crate::cli::registry::{CommandEntry, CommandRegistry};
use crate::config::{Config, ConfigManager};
use crate::currency::{format_amount, format_number, CurrencyCode, RateTable};
use crate::errors::PortfelError;
use crate::ledger::{
    BudgetPlanner, ExpenseCalendar, ExpenseRecord, Period, WalletEntry, WalletLedger,
};
use crate::rates::{
    HttpRateSource, RateProvider, RateSource, SessionRates, StaticRateSource,
    UnavailableRateSource,
};
use crate::storage::{DocumentStore, JsonStorage, Subscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

/// Failures that stop the shell itself.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] PortfelError),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Command failed: {0}")]
    Command(String),
}

/// Failures of a single command; reported and then the shell carries on.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Core(#[from] PortfelError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Core(inner) => CliError::Core(inner),
            CommandError::InvalidArguments(message) => CliError::Input(message),
            other => CliError::Command(other.to_string()),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::Command(err.to_string())
    }
}

impl From<ReadlineError> for CliError {
    fn from(err: ReadlineError) -> Self {
        CliError::Command(err.to_string())
    }
}

/// Everything a command handler can reach: preferences, the store, the
/// session rate cache and the latest wallet and expense snapshots.
pub struct ShellContext {
    pub(crate) mode: CliMode,
    pub(crate) registry: CommandRegistry,
    config_manager: ConfigManager,
    config: Config,
    store: DocumentStore,
    rates: SessionRates,
    wallet: WalletLedger,
    calendar: ExpenseCalendar,
    planner: BudgetPlanner,
    wallet_feed: Subscription<WalletEntry>,
    expense_feed: Subscription<ExpenseRecord>,
    pub(crate) running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        Self::with_config_manager(mode, ConfigManager::new()?)
    }

    pub fn with_config_manager(
        mode: CliMode,
        config_manager: ConfigManager,
    ) -> Result<Self, CliError> {
        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);

        let config = config_manager.load()?;
        let storage = JsonStorage::new(config_manager.data_dir(&config))?;
        tracing::debug!(root = %storage.root().display(), "opening document store");
        let store = DocumentStore::new(Box::new(storage));
        let rates = SessionRates::new(rate_source_or_unavailable(&config_manager, &config));
        let wallet_feed = store.subscribe::<WalletEntry>()?;
        let expense_feed = store.subscribe::<ExpenseRecord>()?;
        let planner = BudgetPlanner::new(
            Period::containing(today()),
            config.period_filter,
            config.allocation,
        );

        let mut context = ShellContext {
            mode,
            registry,
            config_manager,
            config,
            store,
            rates,
            wallet: WalletLedger::new(),
            calendar: ExpenseCalendar::new(),
            planner,
            wallet_feed,
            expense_feed,
            running: true,
        };
        context.sync()?;
        Ok(context)
    }

    pub(crate) fn mode(&self) -> CliMode {
        self.mode
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub(crate) fn prompt(&self) -> String {
        format!("portfel [{}]> ", self.config.base_currency)
    }

    /// Pulls the newest wallet and expense snapshots delivered by the store.
    pub(crate) fn sync(&mut self) -> CommandResult {
        if let Some(entries) = self.wallet_feed.latest() {
            self.wallet.replace_snapshot(entries?);
        }
        if let Some(records) = self.expense_feed.latest() {
            let records = records?;
            self.planner.replace_expenses(records.clone());
            self.calendar.replace_snapshot(records);
        }
        Ok(())
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        let Some(handler) = self.registry.handler(command) else {
            self.suggest_command(raw);
            return Ok(LoopControl::Continue);
        };
        self.sync()?;
        let outcome = handler(self, args);
        self.sync()?;
        match outcome {
            Ok(()) => Ok(LoopControl::Continue),
            Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
            Err(err) => Err(err),
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let needle = input.to_lowercase();
        let best = self
            .registry
            .names()
            .map(|name| (levenshtein(name, &needle), name))
            .min_by_key(|(distance, _)| *distance);

        if let Some((distance, name)) = best {
            if distance <= 3 {
                cli_io::print_hint(format!("Did you mean `{}`?", name));
            }
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        cli_io::confirm_action("Exit shell?").map_err(CliError::from)
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                cli_io::print_error(&message);
                cli_io::print_hint("Use `help <command>` for usage details.");
            }
            CommandError::Core(PortfelError::RemoteUnavailable(message)) => {
                cli_io::print_error(format!("Rates unavailable: {message}"));
                cli_io::print_hint("Check the connection or point `rates_file` at offline rates.");
            }
            CommandError::Core(core) if core.is_user_error() => {
                cli_io::print_error(core.to_string());
                cli_io::print_hint("Nothing was changed; correct the input and try again.");
            }
            other => cli_io::print_error(other.to_string()),
        }
        Ok(())
    }

    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn config_manager(&self) -> &ConfigManager {
        &self.config_manager
    }

    /// Updates one preference, persists it and refreshes what depends on it.
    pub(crate) fn set_config_value(&mut self, key: &str, value: &str) -> CommandResult {
        let mut updated = self.config.clone();
        updated.set_value(key, value)?;

        let rates_changed = updated.rate_provider != self.config.rate_provider
            || updated.base_currency != self.config.base_currency
            || updated.nbp_base_url != self.config.nbp_base_url
            || updated.exchangerate_api_url != self.config.exchangerate_api_url
            || updated.rates_file != self.config.rates_file;
        // a source that cannot be built must not reach the saved config
        let source = if rates_changed {
            Some(build_rate_source(&self.config_manager, &updated)?)
        } else {
            None
        };
        self.config_manager.save(&updated)?;

        if let Some(source) = source {
            self.rates = SessionRates::new(source);
        }
        self.planner
            .reconfigure(updated.period_filter, updated.allocation);
        let store_moved = updated.data_root != self.config.data_root;
        self.config = updated;
        if store_moved {
            cli_io::print_hint("The new data directory is used from the next start.");
        }
        Ok(())
    }

    pub(crate) fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub(crate) fn wallet(&self) -> &WalletLedger {
        &self.wallet
    }

    pub(crate) fn calendar(&self) -> &ExpenseCalendar {
        &self.calendar
    }

    pub(crate) fn planner(&self) -> &BudgetPlanner {
        &self.planner
    }

    pub(crate) fn planner_mut(&mut self) -> &mut BudgetPlanner {
        &mut self.planner
    }

    pub(crate) fn rate_source(&self) -> &dyn RateSource {
        self.rates.source()
    }

    /// Session rate table, fetched on first use.
    pub(crate) fn rate_table(&mut self) -> Result<RateTable, CommandError> {
        Ok(self.rates.table()?.clone())
    }

    /// Table already fetched this session; `None` until a command needs rates.
    pub(crate) fn cached_rate_table(&self) -> Option<&RateTable> {
        self.rates.cached()
    }

    pub(crate) fn refresh_rates(&mut self) -> Result<RateTable, CommandError> {
        Ok(self.rates.refresh()?.clone())
    }

    pub(crate) fn format_amount(&self, amount: f64, code: &CurrencyCode) -> String {
        format_amount(amount, code, &self.config.locale)
    }

    pub(crate) fn format_number(&self, value: f64, precision: u32) -> String {
        format_number(&self.config.locale, value, precision)
    }

    #[cfg(test)]
    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        crate::cli::shell::handle_line(self, line)
    }
}

fn build_rate_source(
    manager: &ConfigManager,
    config: &Config,
) -> Result<Box<dyn RateSource>, PortfelError> {
    if let Some(path) = manager.rates_file(config) {
        tracing::info!(path = %path.display(), "using offline rates");
        return Ok(Box::new(StaticRateSource::from_file(&path)?));
    }
    let url = match config.rate_provider {
        RateProvider::Nbp => &config.nbp_base_url,
        RateProvider::ExchangeRateApi => &config.exchangerate_api_url,
    };
    Ok(Box::new(HttpRateSource::new(
        config.rate_provider,
        url,
        config.base_currency.clone(),
    )?))
}

/// Startup variant: a broken source only surfaces once a command needs rates.
fn rate_source_or_unavailable(manager: &ConfigManager, config: &Config) -> Box<dyn RateSource> {
    build_rate_source(manager, config).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "rate source unavailable");
        let reason = match err {
            PortfelError::RemoteUnavailable(reason) => reason,
            other => other.to_string(),
        };
        Box::new(UnavailableRateSource::new(config.base_currency.clone(), reason))
    })
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Finds the single id equal to, or starting with, `needle`.
pub(crate) fn resolve_id<'a>(
    ids: impl IntoIterator<Item = &'a str>,
    needle: &str,
) -> Result<String, CommandError> {
    let needle = needle.trim();
    let mut matches = Vec::new();
    for id in ids {
        if id == needle {
            return Ok(id.to_string());
        }
        if !needle.is_empty() && id.starts_with(needle) {
            matches.push(id);
        }
    }
    match matches.as_slice() {
        [only] => Ok(only.to_string()),
        [] => Err(CommandError::Message(format!("No record matches `{needle}`."))),
        _ => Err(CommandError::InvalidArguments(format!(
            "`{needle}` matches {} records; type more of the id",
            matches.len()
        ))),
    }
}

pub(crate) fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

#[cfg(test)]
pub(crate) fn process_script(
    manager: ConfigManager,
    lines: &[&str],
) -> Result<ShellContext, CliError> {
    let mut context = ShellContext::with_config_manager(CliMode::Script, manager)?;
    for line in lines {
        match context.process_line(line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => context.report_error(err)?,
        }
    }
    Ok(context)
}
