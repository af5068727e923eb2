//! Interactive prompt abstraction.
//!
//! Handlers take a `Prompter` rather than talking to inquire directly, so
//! tests can drive them with scripted answers instead of a terminal.

use anyhow::{Context, Result, bail};
use std::io::IsTerminal;

/// Fail with a clear message when the prompter has no terminal to talk to.
/// Interactive commands never fall back to reading piped input.
pub fn ensure_interactive(prompter: &dyn Prompter, what: &str) -> Result<()> {
    if !prompter.is_interactive() {
        bail!(
            "'{}' requires an interactive terminal.\nHint: Edit ~/.ccenv/profiles.json directly, or run this command from a terminal.",
            what
        );
    }
    Ok(())
}

pub trait Prompter {
    /// Whether prompts can actually be answered.
    fn is_interactive(&self) -> bool;

    /// Ask for a line of text. An empty answer yields the default when one
    /// is given, otherwise an empty string.
    fn text(&mut self, message: &str, default: Option<&str>) -> Result<String>;

    /// Ask a yes/no question, defaulting to "no".
    fn confirm(&mut self, message: &str, help: Option<&str>) -> Result<bool>;
}

/// Production prompter backed by inquire.
#[derive(Default)]
pub struct InquirePrompter;

impl Prompter for InquirePrompter {
    fn is_interactive(&self) -> bool {
        std::io::stdin().is_terminal()
    }

    fn text(&mut self, message: &str, default: Option<&str>) -> Result<String> {
        let mut prompt = inquire::Text::new(message);
        if let Some(default) = default {
            prompt = prompt.with_default(default);
        }
        prompt.prompt().context("Prompt cancelled")
    }

    fn confirm(&mut self, message: &str, help: Option<&str>) -> Result<bool> {
        let mut prompt = inquire::Confirm::new(message).with_default(false);
        if let Some(help) = help {
            prompt = prompt.with_help_message(help);
        }
        prompt.prompt().context("Confirmation cancelled")
    }
}

/// Scripted prompter for tests: pops pre-baked answers in order. An empty
/// string stands for "just pressed Enter".
#[cfg(test)]
pub struct ScriptedPrompter {
    answers: std::collections::VecDeque<String>,
    confirms: std::collections::VecDeque<bool>,
}

#[cfg(test)]
impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|s| s.to_string()).collect(),
            confirms: std::collections::VecDeque::new(),
        }
    }

    pub fn with_confirms(mut self, confirms: &[bool]) -> Self {
        self.confirms = confirms.iter().copied().collect();
        self
    }
}

#[cfg(test)]
impl Prompter for ScriptedPrompter {
    fn is_interactive(&self) -> bool {
        true
    }

    fn text(&mut self, message: &str, default: Option<&str>) -> Result<String> {
        let answer = self
            .answers
            .pop_front()
            .with_context(|| format!("ScriptedPrompter ran out of answers at: {}", message))?;
        if answer.is_empty() {
            Ok(default.unwrap_or("").to_string())
        } else {
            Ok(answer)
        }
    }

    fn confirm(&mut self, message: &str, _help: Option<&str>) -> Result<bool> {
        self.confirms
            .pop_front()
            .with_context(|| format!("ScriptedPrompter ran out of confirms at: {}", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_default_fallback() {
        let mut p = ScriptedPrompter::new(&["typed", ""]);
        assert_eq!(p.text("a", None).unwrap(), "typed");
        assert_eq!(p.text("b", Some("kept")).unwrap(), "kept");
        assert!(p.text("c", None).is_err());
    }

    #[test]
    fn test_scripted_confirm() {
        let mut p = ScriptedPrompter::new(&[]).with_confirms(&[true, false]);
        assert!(p.confirm("x", None).unwrap());
        assert!(!p.confirm("y", Some("help")).unwrap());
    }
}
