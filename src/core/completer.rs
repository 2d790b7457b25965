use std::{borrow::Cow, cmp::Ordering, fs};

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::{Highlighter, MatchingBracketHighlighter},
    hint::Hinter,
    validate::{ValidationContext, ValidationResult, Validator},
    Context, Helper,
};

use crate::completion::CompletionEngine;

/// Line-editor helper: command names for the first word, file names after.
pub struct CommandCompleter {
    engine: CompletionEngine,
    history: Vec<String>,
}

impl CommandCompleter {
    pub fn new(engine: CompletionEngine, history: Vec<String>) -> Self {
        Self { engine, history }
    }

    /// Make `line` available to later first-word completions.
    pub fn remember(&mut self, line: &str) {
        if !self.history.iter().any(|entry| entry == line) {
            self.history.push(line.to_string());
        }
    }

    fn file_candidates(word: &str) -> Vec<Pair> {
        let Ok(entries) = fs::read_dir(".") else {
            return Vec::new();
        };

        entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .to_lowercase()
                    .contains(word)
            })
            .map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
                let display = if is_dir {
                    format!("{}{}", name, std::path::MAIN_SEPARATOR)
                } else {
                    name.clone()
                };
                Pair {
                    display,
                    replacement: name,
                }
            })
            .collect()
    }
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> Result<(usize, Vec<Pair>), ReadlineError> {
        let start = line[..pos].rfind(' ').map(|i| i + 1).unwrap_or(0);
        let word = line[start..pos].to_lowercase();

        let mut matches: Vec<Pair> = if start == 0 {
            self.engine
                .complete(&word, &self.history)
                .into_iter()
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd,
                })
                .collect()
        } else {
            Self::file_candidates(&word)
        };

        // Prefix matches first, then substring matches
        matches.sort_by(|a, b| {
            let a_starts = a.display.to_lowercase().starts_with(&word);
            let b_starts = b.display.to_lowercase().starts_with(&word);
            match (a_starts, b_starts) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => a.display.cmp(&b.display),
            }
        });

        Ok((start, matches))
    }
}

impl Validator for CommandCompleter {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        Ok(line_status(ctx.input()))
    }
}

/// Every line is complete; quoting and brackets are the wrapped shell's
/// business, and cmd's `(` blocks or a stray `:(` must still run.
fn line_status(_line: &str) -> ValidationResult {
    ValidationResult::Valid(None)
}

impl Hinter for CommandCompleter {
    type Hint = String;
}

impl Highlighter for CommandCompleter {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        MatchingBracketHighlighter::new().highlight(line, pos)
    }
}

impl Helper for CommandCompleter {}
