use crate::cli::core::{resolve_id, short_id, CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::currency::CurrencyCode;
use crate::ledger::WalletLedger;

use super::required;

const USAGE: &str = "wallet [list|add <code> <amount>|exchange <id> <code>|total [code]]";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "wallet",
        "List, add, exchange and value wallet currencies",
        USAGE,
        cmd_wallet,
    )]
}

fn cmd_wallet(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let action = args.first().map(|arg| arg.to_lowercase());
    let tail = args.get(1..).unwrap_or_default();
    match action.as_deref() {
        None | Some("list") => list(context),
        Some("add") => add(context, tail),
        Some("exchange") => exchange(context, tail),
        Some("total") => total(context, tail),
        Some(other) => Err(CommandError::InvalidArguments(format!(
            "unknown wallet action `{other}`; usage: {USAGE}"
        ))),
    }
}

fn list(context: &mut ShellContext) -> CommandResult {
    let wallet = context.wallet();
    if wallet.is_empty() {
        io::print_info("The wallet is empty. Add a currency with `wallet add <code> <amount>`.");
        return Ok(());
    }
    let base = context.config().base_currency.clone();
    output_section("Wallet");
    let rows: Vec<Vec<String>> = wallet
        .entries()
        .iter()
        .map(|entry| {
            vec![
                short_id(&entry.id),
                context.format_amount(entry.amount, &entry.currency),
                context.format_number(entry.rate, 4),
                context.format_amount(entry.value_in_base(), &base),
            ]
        })
        .collect();
    io::print_table(&["ID", "Amount", "Rate", "Value"], &rows);
    Ok(())
}

fn add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "wallet add <code> <amount>";
    let code = required(args, 0, usage)?;
    let amount = required(args, 1, usage)?;

    let table = context.rate_table()?;
    let entry = WalletLedger::new_entry(code, amount, &table)?;
    let stored = context.store().add(entry)?;
    io::print_success(format!(
        "Added {} at rate {} (id {}).",
        context.format_amount(stored.amount, &stored.currency),
        context.format_number(stored.rate, 4),
        short_id(&stored.id)
    ));
    Ok(())
}

fn exchange(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "wallet exchange <id> <code>";
    let needle = required(args, 0, usage)?;
    let target = required(args, 1, usage)?;

    let id = resolve_id(
        context.wallet().entries().iter().map(|entry| entry.id.as_str()),
        needle,
    )?;
    let table = context.rate_table()?;
    let mut ledger = context.wallet().clone();
    let previous = ledger.entry(&id).cloned();
    let updated = ledger.apply_exchange(&id, target, &table)?;
    context.store().update(&updated)?;

    if let Some(previous) = previous {
        io::print_success(format!(
            "Exchanged {} into {}.",
            context.format_amount(previous.amount, &previous.currency),
            context.format_amount(updated.amount, &updated.currency)
        ));
    }
    Ok(())
}

fn total(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let target = args
        .first()
        .map(|code| CurrencyCode::new(*code))
        .unwrap_or_else(|| context.config().base_currency.clone());
    let table = context.rate_table()?;
    let sum = context.wallet().total_in(target.as_str(), &table)?;
    io::print_info(format!(
        "Wallet total: {}",
        context.format_amount(sum, &target)
    ));
    Ok(())
}
