//! Shared helpers for command handlers.

use std::io::{self, IsTerminal};

use dbmon_core::{EntityId, Outcome};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Refuses to guess when stdin is not a terminal.
pub fn confirm(message: &str, action: &str, global: &GlobalOpts) -> Result<bool, CliError> {
    if global.yes {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()?;
    Ok(confirmed)
}

/// Status line for a completed action, preferring the backend's message.
pub fn outcome_message(outcome: &Outcome, fallback: &str) -> String {
    outcome
        .message
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(fallback)
        .to_owned()
}

/// Comma-separated id list for messages.
pub fn join_ids(ids: &[EntityId]) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Print a status line to stderr unless `--quiet`.
pub fn status(global: &GlobalOpts, message: &str) {
    if !global.quiet {
        eprintln!("{message}");
    }
}
