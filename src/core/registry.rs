use std::{collections::HashMap, io::Write};

use crate::{commands::DirectoryListing, error::Result};

use super::command::{Command, Outcome};

pub struct CommandRegistry {
    commands: HashMap<&'static str, Box<dyn Command>>,
}

impl CommandRegistry {
    pub fn setup() -> Self {
        let commands: Vec<Box<dyn Command>> = vec![Box::new(DirectoryListing)];

        let mut command_map = HashMap::new();
        for cmd in commands {
            command_map.insert(cmd.name(), cmd);
        }

        CommandRegistry {
            commands: command_map,
        }
    }

    /// Run `line` if its first word names a built-in. Verbs match without
    /// regard to case.
    pub fn execute(&self, line: &str, out: &mut dyn Write) -> Result<Outcome> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(Outcome::NotHandled);
        };
        let args: Vec<&str> = words.collect();

        match self.find(verb) {
            Some(cmd) => cmd.execute(&args, out),
            None => Ok(Outcome::NotHandled),
        }
    }

    pub fn find(&self, verb: &str) -> Option<&dyn Command> {
        self.commands
            .get(verb.to_ascii_lowercase().as_str())
            .map(|cmd| cmd.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_verb_is_not_handled() {
        let registry = CommandRegistry::setup();
        let mut out = Vec::new();
        assert_eq!(
            registry.execute("git status", &mut out).unwrap(),
            Outcome::NotHandled
        );
        assert_eq!(registry.execute("   ", &mut out).unwrap(), Outcome::NotHandled);
        assert!(out.is_empty());
    }

    #[test]
    fn test_verb_is_case_insensitive() {
        let registry = CommandRegistry::setup();
        assert!(registry.find("DIR").is_some());
        assert!(registry.find("Dir").is_some());
        assert!(registry.find("ls").is_none());
    }

    #[test]
    fn test_usage_error_is_handled() {
        let registry = CommandRegistry::setup();
        let mut out = Vec::new();
        assert_eq!(
            registry.execute("dir one two", &mut out).unwrap(),
            Outcome::Handled(1)
        );
    }

    #[test]
    fn test_native_switch_falls_through() {
        let registry = CommandRegistry::setup();
        let mut out = Vec::new();
        let line = if cfg!(windows) { "dir /w" } else { "dir -l" };
        assert_eq!(
            registry.execute(line, &mut out).unwrap(),
            Outcome::NotHandled
        );
    }
}
