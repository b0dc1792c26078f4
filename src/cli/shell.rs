use std::{
    fmt,
    io::{self, BufRead},
};

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::Validator,
    Cmd, Context as ReadlineContext, Editor, Helper, KeyEvent,
};
use shell_words::split;

use crate::cli::core::{CliError, CliMode, CommandError, LoopControl, ShellContext};
use crate::cli::output;
use crate::config;
use crate::currency::history::HistoryPeriod;

/// Set to any value to read commands from stdin without prompts or colors.
pub const SCRIPT_ENV: &str = "PORTFEL_CLI_SCRIPT";

const WALLET_ACTIONS: &[&str] = &["add", "exchange", "list", "total"];
const EXPENSE_ACTIONS: &[&str] = &["add", "days", "delete", "edit", "list", "remove"];

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };
    output::set_plain(mode == CliMode::Script);

    let mut context = ShellContext::new(mode)?;
    tracing::debug!(?mode, "shell started");

    match mode {
        CliMode::Interactive => run_interactive(&mut context),
        CliMode::Script => run_script(&mut context),
    }
}

fn run_interactive(context: &mut ShellContext) -> Result<(), CliError> {
    let mut editor = Editor::<Vocabulary, DefaultHistory>::new()?;
    editor.set_helper(Some(Vocabulary::from_context(context)));
    editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);
    output::info("Type `help` to list commands.");

    while context.running {
        let line = match editor.readline(&context.prompt()) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                if context.confirm_exit()? {
                    break;
                }
                continue;
            }
            Err(ReadlineError::Eof) => {
                output::info("Exiting shell.");
                break;
            }
            Err(err) => return Err(err.into()),
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        editor.add_history_entry(line).ok();

        let control = run_line(context, line)?;
        // ids and fetched currencies change as commands run
        if let Some(vocabulary) = editor.helper_mut() {
            *vocabulary = Vocabulary::from_context(context);
        }
        if control == LoopControl::Exit {
            break;
        }
    }
    Ok(())
}

fn run_script(context: &mut ShellContext) -> Result<(), CliError> {
    for line in io::stdin().lock().lines() {
        if !context.running || run_line(context, &line?)? == LoopControl::Exit {
            break;
        }
    }
    Ok(())
}

/// Runs one line and reports a failed command without leaving the shell.
fn run_line(context: &mut ShellContext, line: &str) -> Result<LoopControl, CliError> {
    match handle_line(context, line) {
        Ok(control) => Ok(control),
        Err(err) => {
            context.report_error(err)?;
            Ok(LoopControl::Continue)
        }
    }
}

pub(crate) fn handle_line(
    context: &mut ShellContext,
    line: &str,
) -> Result<LoopControl, CommandError> {
    let tokens = match parse_command_line(line) {
        Ok(tokens) => tokens,
        Err(err) => {
            output::warning(&err);
            return Ok(LoopControl::Continue);
        }
    };

    let Some(raw) = tokens.first() else {
        return Ok(LoopControl::Continue);
    };
    if raw.starts_with('#') {
        return Ok(LoopControl::Continue);
    }

    let command = raw.to_lowercase();
    let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();

    let control = context.dispatch(&command, raw, &args)?;
    if control == LoopControl::Exit {
        context.running = false;
    }
    Ok(control)
}

/// Completion words for the line editor, taken from the session state.
///
/// Currency codes only show up once the rate table has been fetched, so
/// pressing tab never triggers a network request.
#[derive(Debug, Default)]
struct Vocabulary {
    commands: Vec<String>,
    currencies: Vec<String>,
    wallet_ids: Vec<String>,
    expense_ids: Vec<String>,
}

impl Vocabulary {
    fn from_context(context: &ShellContext) -> Self {
        let mut commands: Vec<String> = context
            .command_names()
            .into_iter()
            .map(str::to_ascii_lowercase)
            .collect();
        commands.sort();
        commands.dedup();

        let currencies = match context.cached_rate_table() {
            Some(table) => table.codes().iter().map(|code| code.to_string()).collect(),
            None => vec![context.config().base_currency.to_string()],
        };

        Self {
            commands,
            currencies,
            wallet_ids: context
                .wallet()
                .entries()
                .iter()
                .map(|entry| entry.id.clone())
                .collect(),
            expense_ids: context
                .calendar()
                .records()
                .iter()
                .map(|record| record.id.clone())
                .collect(),
        }
    }

    /// Words that fit argument slot `slot` (0 is the command itself).
    fn slot_words(&self, words: &[&str], slot: usize) -> Vec<String> {
        let command = words.first().map(|word| word.to_ascii_lowercase());
        let action = words.get(1).map(|word| word.to_ascii_lowercase());
        let fixed = |options: &[&str]| -> Vec<String> {
            options.iter().map(|word| word.to_string()).collect()
        };

        match (command.as_deref(), slot, action.as_deref()) {
            (_, 0, _) => self.commands.clone(),
            (Some("help"), 1, _) => self.commands.clone(),
            (Some("wallet"), 1, _) => fixed(WALLET_ACTIONS),
            (Some("wallet"), 2, Some("add" | "total")) => self.currencies.clone(),
            (Some("wallet"), 2, Some("exchange")) => self.wallet_ids.clone(),
            (Some("wallet"), 3, Some("exchange")) => self.currencies.clone(),
            (Some("expense"), 1, _) => fixed(EXPENSE_ACTIONS),
            (Some("expense"), 2, Some("edit" | "delete" | "remove")) => self.expense_ids.clone(),
            (Some("convert"), 2 | 3, _) => self.currencies.clone(),
            (Some("history"), 1, _) => self.currencies.clone(),
            (Some("history"), 2, _) => HistoryPeriod::ALL
                .iter()
                .map(|period| period.days().to_string())
                .collect(),
            (Some("rates"), 1, _) => fixed(&["refresh"]),
            (Some("budget"), 1, _) => fixed(&["clear"]),
            (Some("config"), 1, _) => fixed(&["set", "show"]),
            (Some("config"), 2, Some("set")) => fixed(config::KEYS),
            _ => Vec::new(),
        }
    }

    /// Start of the word under the cursor and the words that complete it.
    fn complete_prefix(&self, prefix: &str) -> (usize, Vec<String>) {
        let start = prefix
            .rfind(char::is_whitespace)
            .map(|idx| idx + 1)
            .unwrap_or(0);
        let words: Vec<&str> = prefix[..start].split_whitespace().collect();
        let needle = &prefix[start..];

        let matches = self
            .slot_words(&words, words.len())
            .into_iter()
            .filter(|word| {
                word.get(..needle.len())
                    .is_some_and(|head| head.eq_ignore_ascii_case(needle))
            })
            .collect();
        (start, matches)
    }
}

impl Helper for Vocabulary {}

impl Completer for Vocabulary {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, words) = self.complete_prefix(&line[..pos]);
        let candidates = words
            .into_iter()
            .map(|word| Pair {
                display: word.clone(),
                replacement: word,
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for Vocabulary {
    type Hint = String;
}

impl Highlighter for Vocabulary {}

impl Validator for Vocabulary {}

pub(crate) fn parse_command_line(input: &str) -> Result<Vec<String>, ParseError> {
    split(input).map_err(|err| ParseError {
        message: err.to_string(),
    })
}

#[derive(Debug)]
pub(crate) struct ParseError {
    message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
