use std::io::{self, BufRead, Write};

use rustyline::{error::ReadlineError, history::FileHistory, Editor};
use tracing::warn;

use crate::{core::completer::CommandCompleter, error::Result};

/// One read attempt from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    /// Ctrl-C: drop the current line and prompt again.
    Interrupted,
    Eof,
}

pub trait LineReader {
    fn read_line(&mut self, prompt: &str) -> Result<Input>;

    /// Offer `line` to the reader's own recall (arrow keys, completion).
    fn add_history(&mut self, _line: &str) {}
}

impl LineReader for Editor<CommandCompleter, FileHistory> {
    fn read_line(&mut self, prompt: &str) -> Result<Input> {
        match self.readline(prompt) {
            Ok(line) => Ok(Input::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
            Err(ReadlineError::Eof) => Ok(Input::Eof),
            Err(e) => Err(e.into()),
        }
    }

    fn add_history(&mut self, line: &str) {
        if let Err(e) = self.add_history_entry(line) {
            warn!(error = %e, "could not add line to editor history");
        }
        if let Some(helper) = self.helper_mut() {
            helper.remember(line);
        }
    }
}

/// Plain reader for piped or redirected input.
pub struct BufReadInput<R> {
    reader: R,
}

impl<R: BufRead> BufReadInput<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineReader for BufReadInput<R> {
    fn read_line(&mut self, prompt: &str) -> Result<Input> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(Input::Eof);
        }
        Ok(Input::Line(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Replays a fixed list of inputs, then reports end of input.
#[cfg(test)]
pub struct ScriptedInput {
    inputs: std::collections::VecDeque<Input>,
    pub prompts: Vec<String>,
}

#[cfg(test)]
impl ScriptedInput {
    pub fn lines(lines: &[&str]) -> Self {
        Self::new(lines.iter().map(|l| Input::Line(l.to_string())).collect())
    }

    pub fn new(inputs: Vec<Input>) -> Self {
        Self {
            inputs: inputs.into(),
            prompts: Vec::new(),
        }
    }
}

#[cfg(test)]
impl LineReader for ScriptedInput {
    fn read_line(&mut self, prompt: &str) -> Result<Input> {
        self.prompts.push(prompt.to_string());
        Ok(self.inputs.pop_front().unwrap_or(Input::Eof))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buf_read_input_strips_line_endings() {
        let mut input = BufReadInput::new("ls -la\r\nexit\n".as_bytes());
        assert_eq!(input.read_line("").unwrap(), Input::Line("ls -la".into()));
        assert_eq!(input.read_line("").unwrap(), Input::Line("exit".into()));
        assert_eq!(input.read_line("").unwrap(), Input::Eof);
    }

    #[test]
    fn test_scripted_input_ends_with_eof() {
        let mut input = ScriptedInput::new(vec![Input::Interrupted]);
        assert_eq!(input.read_line("> ").unwrap(), Input::Interrupted);
        assert_eq!(input.read_line("> ").unwrap(), Input::Eof);
        assert_eq!(input.prompts, vec!["> ", "> "]);
    }
}
