use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::config;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "config",
        "View and update preferences",
        "config [show|set <key> <value>]",
        cmd_config,
    )]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() || args[0].eq_ignore_ascii_case("show") {
        show(context);
        return Ok(());
    }

    match args[0].to_lowercase().as_str() {
        "set" => {
            if args.len() < 3 {
                return Err(CommandError::InvalidArguments(format!(
                    "usage: config set <{}> <value>",
                    config::KEYS.join("|")
                )));
            }
            let key = args[1].to_lowercase();
            let value = args[2..].join(" ");
            context.set_config_value(&key, value.trim())?;
            io::print_success(format!("Updated `{key}`."));
            Ok(())
        }
        other => Err(CommandError::InvalidArguments(format!(
            "unknown config action `{other}`; usage: config [show|set <key> <value>]"
        ))),
    }
}

fn show(context: &ShellContext) {
    let config = context.config();
    let manager = context.config_manager();
    let ratios = config.allocation;
    output_section("Configuration");
    io::print_info(format!("  File           : {}", manager.path().display()));
    io::print_info(format!("  Base currency  : {}", config.base_currency));
    io::print_info(format!("  Rate provider  : {}", config.rate_provider));
    io::print_info(format!("  NBP URL        : {}", config.nbp_base_url));
    io::print_info(format!("  Exch.-API URL  : {}", config.exchangerate_api_url));
    io::print_info(format!("  Locale         : {}", config.locale.language_tag));
    io::print_info(format!("  Period filter  : {}", config.period_filter));
    io::print_info(format!(
        "  Allocation     : living {} / discretionary {} / savings {}",
        context.format_number(ratios.living_costs, 2),
        context.format_number(ratios.discretionary, 2),
        context.format_number(ratios.savings, 2)
    ));
    io::print_info(format!("  History period : {}", config.default_history_period));
    io::print_info(format!(
        "  Data directory : {}",
        manager.data_dir(config).display()
    ));
    if let Some(path) = manager.rates_file(config) {
        io::print_info(format!("  Offline rates  : {}", path.display()));
    }
}
