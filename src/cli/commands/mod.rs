pub mod budget;
pub mod config;
pub mod expense;
pub mod rates;
pub mod system;
pub mod wallet;

use crate::cli::core::CommandError;
use crate::cli::registry::CommandRegistry;

pub(crate) fn register_all(registry: &mut CommandRegistry) {
    let definitions = [
        rates::definitions(),
        wallet::definitions(),
        expense::definitions(),
        budget::definitions(),
        config::definitions(),
        system::definitions(),
    ];
    for entry in definitions.into_iter().flatten() {
        registry.register(entry);
    }
}

/// Positional argument `index`, or a usage error.
pub(crate) fn required<'a>(
    args: &[&'a str],
    index: usize,
    usage: &str,
) -> Result<&'a str, CommandError> {
    args.get(index)
        .copied()
        .ok_or_else(|| CommandError::InvalidArguments(format!("usage: {usage}")))
}

/// Joins the arguments from `index` on, for free-text fields such as names.
pub(crate) fn rest(args: &[&str], index: usize) -> String {
    args.get(index..).map(|tail| tail.join(" ")).unwrap_or_default()
}
