use crate::cli::core::{today, CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::currency::history::HistoryPeriod;
use crate::currency::{parse_amount, CurrencyCode, DISPLAY_PRECISION};

use super::required;

const RATE_PRECISION: u32 = 4;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "rates",
            "List the session exchange-rate table",
            "rates [refresh]",
            cmd_rates,
        ),
        CommandEntry::new(
            "convert",
            "Convert an amount between two currencies",
            "convert <amount> <from> <to>",
            cmd_convert,
        ),
        CommandEntry::new(
            "history",
            "Show recent mid rates of one currency",
            "history <code> [7|14|30]",
            cmd_history,
        ),
    ]
}

fn cmd_rates(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let table = match args.first().map(|arg| arg.to_lowercase()) {
        None => context.rate_table()?,
        Some(arg) if arg == "refresh" => {
            let table = context.refresh_rates()?;
            io::print_success("Rates refreshed.");
            table
        }
        Some(other) => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown rates action `{other}`; usage: rates [refresh]"
            )))
        }
    };

    let effective = table
        .effective_date
        .map(|date| format!(", effective {date}"))
        .unwrap_or_default();
    output_section(format!("Rates (base {}{effective})", table.base));
    let rows: Vec<Vec<String>> = table
        .rates()
        .map(|rate| {
            vec![
                rate.code.to_string(),
                rate.currency.clone(),
                context.format_number(rate.mid, RATE_PRECISION),
            ]
        })
        .collect();
    io::print_table(&["Code", "Currency", "Mid"], &rows);
    Ok(())
}

fn cmd_convert(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let usage = "convert <amount> <from> <to>";
    let amount = parse_amount(required(args, 0, usage)?)?;
    let from = CurrencyCode::new(required(args, 1, usage)?);
    let to = CurrencyCode::new(required(args, 2, usage)?);

    let table = context.rate_table()?;
    let converted = table.convert_between(amount, from.as_str(), to.as_str())?;
    let unit = table.convert_between(1.0, from.as_str(), to.as_str())?;
    tracing::debug!(amount, %from, %to, converted, "converted amount");

    io::print_info(format!(
        "{} = {}",
        context.format_amount(amount, &from),
        context.format_amount(converted, &to)
    ));
    io::print_hint(format!(
        "1 {from} = {} {to}",
        context.format_number(unit, RATE_PRECISION)
    ));
    Ok(())
}

fn cmd_history(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let code = CurrencyCode::new(required(args, 0, "history <code> [7|14|30]")?);
    let period = match args.get(1) {
        Some(days) => HistoryPeriod::parse(days)?,
        None => context.config().default_history_period,
    };
    let (start, end) = period.window(today());
    let series = context
        .rate_source()
        .history(code.as_str(), start, end)?;

    output_section(format!("{} ({}) {}", series.code, series.currency, period));
    let rows: Vec<Vec<String>> = series
        .points
        .iter()
        .map(|point| {
            vec![
                point.effective_date.to_string(),
                context.format_number(point.mid, RATE_PRECISION),
            ]
        })
        .collect();
    io::print_table(&["Date", "Mid"], &rows);

    if let (Some(min), Some(max), Some(average)) = (series.min(), series.max(), series.average())
    {
        io::print_info(format!(
            "min {}  max {}  avg {}",
            context.format_number(min, RATE_PRECISION),
            context.format_number(max, RATE_PRECISION),
            context.format_number(average, RATE_PRECISION)
        ));
    }
    if let Some(change) = series.change_percent() {
        io::print_info(format!(
            "change {}%",
            context.format_number(change, DISPLAY_PRECISION)
        ));
    }
    Ok(())
}
