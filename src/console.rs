//! Command console over the fit results.
//!
//! ```text
//! >>> hc = (hc_plus - hc_minus) / 2
//! hc = 12.5
//! >>> error_hc * 2
//! 0.6
//! ```

use thiserror::Error;

use crate::fit::expr::{Expr, ExprError};
use crate::fit::results::FitResults;

const HELP: &str = "\
name = expr   assign a variable
expr          evaluate an expression
vars          list all variables
del name      remove a variable
clear         clear the console
help          show this message
Fitted parameters are available by name, their errors as error_<name>.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Expression(#[from] ExprError),
    #[error("Cannot assign to '{0}'")]
    InvalidTarget(String),
    #[error("Name '{0}' is not defined")]
    UnknownVariable(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Input,
    Output,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    pub kind: LineKind,
    pub text: String,
}

/// Console state: the pending input line and the scroll-back.
#[derive(Debug, Clone, Default)]
pub struct Console {
    pub input: String,
    pub history: Vec<ConsoleLine>,
    /// Previously submitted commands, oldest first.
    pub recall: Vec<String>,
    /// Position in `recall` while browsing with the arrow keys.
    recall_pos: Option<usize>,
}

impl Console {
    /// Execute the pending input line.
    pub fn submit(&mut self, results: &mut FitResults) {
        let command = std::mem::take(&mut self.input);
        self.execute(&command, results);
    }

    /// Execute `command`, appending its echo and output to the history.
    pub fn execute(&mut self, command: &str, results: &mut FitResults) {
        let command = command.trim();
        self.recall_pos = None;
        if command.is_empty() {
            return;
        }
        self.recall.push(command.to_string());

        if command == "clear" {
            self.history.clear();
            return;
        }

        self.push(LineKind::Input, format!(">>> {command}"));
        match run(command, results) {
            Ok(Some(output)) => self.push(LineKind::Output, output),
            Ok(None) => {}
            Err(e) => {
                log::warn!("console: {command}: {e}");
                self.push(LineKind::Error, e.to_string());
            }
        }
    }

    /// Replace the input with the previous command (Up arrow).
    pub fn recall_previous(&mut self) {
        if self.recall.is_empty() {
            return;
        }
        let pos = match self.recall_pos {
            Some(pos) => pos.saturating_sub(1),
            None => self.recall.len() - 1,
        };
        self.recall_pos = Some(pos);
        self.input = self.recall[pos].clone();
    }

    /// Move forward through the recalled commands (Down arrow); past the
    /// newest one the input is cleared.
    pub fn recall_next(&mut self) {
        let Some(pos) = self.recall_pos else {
            return;
        };
        if pos + 1 < self.recall.len() {
            self.recall_pos = Some(pos + 1);
            self.input = self.recall[pos + 1].clone();
        } else {
            self.recall_pos = None;
            self.input.clear();
        }
    }

    fn push(&mut self, kind: LineKind, text: String) {
        self.history.push(ConsoleLine { kind, text });
    }
}

fn run(command: &str, results: &mut FitResults) -> Result<Option<String>, ConsoleError> {
    match command {
        "help" => return Ok(Some(HELP.to_string())),
        "vars" => {
            if results.is_empty() {
                return Ok(Some("no variables".to_string()));
            }
            let listing = results
                .iter()
                .map(|(name, value)| format!("{name} = {value}"))
                .collect::<Vec<_>>()
                .join("\n");
            return Ok(Some(listing));
        }
        _ => {}
    }

    if let Some(rest) = command.strip_prefix("del ") {
        let name = rest.trim();
        if name.is_empty() {
            return Err(ConsoleError::Usage("del name"));
        }
        return results
            .remove(name)
            .map(|_| None)
            .ok_or_else(|| ConsoleError::UnknownVariable(name.to_string()));
    }

    if let Some((target, expression)) = command.split_once('=') {
        let target = target.trim();
        if !is_identifier(target) {
            return Err(ConsoleError::InvalidTarget(target.to_string()));
        }
        let value = evaluate(expression, results)?;
        results.set(target, value);
        log::info!("console: {target} = {value}");
        return Ok(Some(format!("{target} = {value}")));
    }

    evaluate(command, results).map(|v| Some(v.to_string()))
}

fn evaluate(expression: &str, results: &FitResults) -> Result<f64, ConsoleError> {
    let names = results.names();
    let expr = Expr::parse(expression, &names)?;
    Ok(expr.eval(&results.values()))
}

fn is_identifier(s: &str) -> bool {
    s.chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}
