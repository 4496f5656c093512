//! Interactive terminal helpers: warning styling and yes/no confirmation.

use crate::core::error::StashError;
use colored::Colorize;
use std::io::{self, BufRead, Write};

/// Render `text` in the warning style used for destructive prompts.
pub fn warning(text: &str) -> String {
    text.bright_red().bold().to_string()
}

/// Source of answers to confirmation prompts.
pub trait Confirm {
    /// Show `prompt` and return the raw answer line (empty on end of input).
    fn ask(&mut self, prompt: &str) -> Result<String, StashError>;
}

/// Prompts on stdout and reads one line from stdin.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn ask(&mut self, prompt: &str) -> Result<String, StashError> {
        let mut stdout = io::stdout();
        writeln!(stdout, "{}", prompt)?;
        stdout.flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line)
    }
}

/// Answers every prompt with the same text and remembers what was asked.
#[derive(Debug, Default)]
pub struct FixedAnswer {
    answer: String,
    pub prompts: Vec<String>,
}

impl FixedAnswer {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            prompts: Vec::new(),
        }
    }
}

impl Confirm for FixedAnswer {
    fn ask(&mut self, prompt: &str) -> Result<String, StashError> {
        self.prompts.push(prompt.to_string());
        Ok(self.answer.clone())
    }
}

/// Only an exact `y` (ignoring surrounding whitespace) confirms.
pub fn is_yes(answer: &str) -> bool {
    answer.trim() == "y"
}
