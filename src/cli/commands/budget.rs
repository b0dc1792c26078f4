use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::{section as output_section, separator};
use crate::cli::registry::CommandEntry;
use crate::ledger::Period;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "budget",
        "Split a monthly income into living costs, discretionary spending and savings",
        "budget [<income>|clear] [YYYY-MM]",
        cmd_budget,
    )]
}

fn cmd_budget(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let mut args = args.iter().copied();
    if let Some(first) = args.next() {
        if first.eq_ignore_ascii_case("clear") {
            context.planner_mut().clear_income();
            io::print_info("Monthly income cleared.");
            return Ok(());
        }
        // a lone YYYY-MM switches the period and keeps the income
        if let Ok(period) = Period::parse(first) {
            context.planner_mut().set_period(period);
        } else {
            context.planner_mut().set_income(first)?;
            if let Some(period) = args.next() {
                let period = Period::parse(period)?;
                context.planner_mut().set_period(period);
            }
        }
    }
    show(context)
}

fn show(context: &ShellContext) -> CommandResult {
    let planner = context.planner();
    let Some(snapshot) = planner.snapshot() else {
        return Err(CommandError::InvalidArguments(
            "enter a monthly income first, e.g. `budget 4000`".into(),
        ));
    };
    let base = &context.config().base_currency;
    let income = planner.income().unwrap_or_default();

    output_section(format!("Budget {} ({} filter)", planner.period(), planner.filter()));
    io::print_info(format!("  Income               {}", context.format_amount(income, base)));
    io::print_info(format!(
        "  Living costs         {}",
        context.format_amount(snapshot.living_costs, base)
    ));
    io::print_info(format!(
        "  Unplanned expenses   {}",
        context.format_amount(snapshot.unplanned_expenses, base)
    ));
    io::print_info(format!(
        "  Discretionary        {}",
        context.format_amount(snapshot.discretionary, base)
    ));
    io::print_info(format!(
        "  Savings              {}",
        context.format_amount(snapshot.savings, base)
    ));
    separator();
    if snapshot.is_overspent() {
        io::print_warning(format!(
            "Unplanned expenses exceed living costs by {}.",
            context.format_amount(-snapshot.remaining(), base)
        ));
    } else {
        io::print_info(format!(
            "  Left after expenses  {}",
            context.format_amount(snapshot.remaining(), base)
        ));
    }
    Ok(())
}
