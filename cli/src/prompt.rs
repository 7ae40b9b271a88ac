//! Interactive confirmation and tri-state toggle resolution.
use anyhow::Result;
use std::io::IsTerminal as _;

use crate::config::settings::Toggle;

/// Asks the user yes/no questions.
#[cfg_attr(test, mockall::automock)]
pub trait Prompter: Send + Sync + std::fmt::Debug {
    /// Ask `prompt`, returning `default` when the user just presses enter.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read.
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;
}

/// Terminal prompter backed by `dialoguer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DialoguerPrompter;

impl Prompter for DialoguerPrompter {
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        Ok(dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?)
    }
}

/// How `ask` toggles are answered for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AskMode {
    /// Prompt on the terminal.
    Interactive,
    /// `--yes`: answer every question with yes.
    AssumeYes,
    /// No terminal or running in CI: answer no.
    Decline,
}

impl AskMode {
    /// Choose the mode from the `--yes` flag, the `CI` variable and whether
    /// stdin is a terminal.
    #[must_use]
    pub fn detect(assume_yes: bool, ci: bool) -> Self {
        Self::from_flags(assume_yes, ci, std::io::stdin().is_terminal())
    }

    /// Mode for the given flags.
    #[must_use]
    pub const fn from_flags(assume_yes: bool, ci: bool, tty: bool) -> Self {
        if assume_yes {
            Self::AssumeYes
        } else if ci || !tty {
            Self::Decline
        } else {
            Self::Interactive
        }
    }
}

/// Resolve a toggle to a decision, prompting only for `ask` in interactive mode.
///
/// # Errors
///
/// Returns an error if prompting fails.
pub fn resolve_toggle(
    toggle: Toggle,
    question: &str,
    mode: AskMode,
    prompter: &dyn Prompter,
) -> Result<bool> {
    match (toggle, mode) {
        (Toggle::Yes, _) | (Toggle::Ask, AskMode::AssumeYes) => Ok(true),
        (Toggle::No, _) | (Toggle::Ask, AskMode::Decline) => Ok(false),
        (Toggle::Ask, AskMode::Interactive) => prompter.confirm(question, false),
    }
}

/// Whether the `CI` variable marks a CI environment.
#[must_use]
pub fn is_ci(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false"))
}
