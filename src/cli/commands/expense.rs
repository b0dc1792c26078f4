use crate::cli::core::{resolve_id, short_id, CliMode, CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::ledger::{parse_date, ExpenseRecord, Period};
use crate::storage::Document;

use super::{required, rest};

const USAGE: &str = "expense [list [date|YYYY-MM]|days|add <date> <amount> <name..>|edit <id> <date> <amount> <name..>|delete <id>]";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "expense",
        "Record unplanned expenses on calendar days",
        USAGE,
        cmd_expense,
    )]
}

fn cmd_expense(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let action = args.first().map(|arg| arg.to_lowercase());
    let tail = args.get(1..).unwrap_or_default();
    match action.as_deref() {
        None | Some("list") => list(context, tail),
        Some("days") => days(context),
        Some("add") => add(context, tail),
        Some("edit") => edit(context, tail),
        Some("delete") | Some("remove") => delete(context, tail),
        Some(other) => Err(CommandError::InvalidArguments(format!(
            "unknown expense action `{other}`; usage: {USAGE}"
        ))),
    }
}

fn list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let calendar = context.calendar();
    let (title, mut records): (String, Vec<&ExpenseRecord>) = match args.first() {
        Some(value) if value.len() == 7 => {
            let period = Period::parse(value)?;
            let filter = context.config().period_filter;
            (format!("Expenses in {period}"), calendar.in_period(period, filter))
        }
        Some(value) => {
            parse_date(value)?;
            (format!("Expenses on {value}"), calendar.for_date(value).collect())
        }
        None => ("Expenses".to_string(), calendar.records().iter().collect()),
    };

    if records.is_empty() {
        io::print_info("No expenses recorded.");
        return Ok(());
    }
    records.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.expense_name.cmp(&b.expense_name)));

    let base = context.config().base_currency.clone();
    output_section(title);
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| {
            vec![
                short_id(record.id()),
                record.date.clone(),
                record.expense_name.clone(),
                context.format_amount(record.amount, &base),
            ]
        })
        .collect();
    io::print_table(&["ID", "Date", "Name", "Amount"], &rows);
    let total: f64 = records.iter().map(|record| record.amount).sum();
    io::print_info(format!("Total: {}", context.format_amount(total, &base)));
    Ok(())
}

fn days(context: &mut ShellContext) -> CommandResult {
    let dates = context.calendar().marked_dates();
    if dates.is_empty() {
        io::print_info("No days carry expenses.");
    } else {
        io::print_info(format!("Days with expenses: {}", dates.join(", ")));
    }
    Ok(())
}

fn add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "expense add <date> <amount> <name..>";
    let date = required(args, 0, usage)?;
    let amount = required(args, 1, usage)?;
    let draft = ExpenseRecord::draft(date, &rest(args, 2), amount)?;
    let stored = context.store().add(draft)?;
    io::print_success(format!(
        "Recorded `{}` on {} (id {}).",
        stored.expense_name,
        stored.date,
        short_id(&stored.id)
    ));
    Ok(())
}

fn edit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "expense edit <id> <date> <amount> <name..>";
    let id = find_record(context, required(args, 0, usage)?)?;
    let date = required(args, 1, usage)?;
    let amount = required(args, 2, usage)?;
    let record = ExpenseRecord::draft(date, &rest(args, 3), amount)?.with_id(id);
    context.store().update(&record)?;
    io::print_success(format!("Updated expense {}.", short_id(&record.id)));
    Ok(())
}

fn delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let id = find_record(context, required(args, 0, "expense delete <id>")?)?;
    if context.mode() == CliMode::Interactive
        && !io::confirm_action(&format!("Delete expense {}?", short_id(&id)))?
    {
        io::print_info("Operation cancelled.");
        return Ok(());
    }
    context.store().delete::<ExpenseRecord>(&id)?;
    io::print_success(format!("Deleted expense {}.", short_id(&id)));
    Ok(())
}

fn find_record(context: &ShellContext, needle: &str) -> Result<String, CommandError> {
    resolve_id(
        context
            .calendar()
            .records()
            .iter()
            .map(|record| record.id.as_str()),
        needle,
    )
}
