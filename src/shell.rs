use std::{env, io::Write, path::PathBuf};

use colored::Colorize;
use tracing::{debug, warn};

use crate::{
    alias::AliasTable,
    clipboard::ClipboardWriter,
    completion::CompletionEngine,
    config::{
        theme::{self, PresetResolver},
        Config,
    },
    core::{command::Outcome, external::ExternalCommand, registry::CommandRegistry},
    envsync::{self, ActivationRule, ActivationRules, EnvironmentSnapshot, MatchKind},
    error::Result,
    history::HistoryStore,
    input::{Input, LineReader},
    meta::{MetaCommand, COPY_ERROR_HINT},
    prompt::{self, PromptContext},
    utils,
};

/// The interactive session: reads lines, dispatches them and keeps the state
/// the next prompt is rendered from.
pub struct Shell {
    config: Config,
    config_source: Option<PathBuf>,
    resolver: PresetResolver,
    last_exit_code: i32,
    last_error: String,
    history: HistoryStore,
    completion: CompletionEngine,
    aliases: AliasTable,
    registry: CommandRegistry,
    rules: ActivationRules,
    clipboard: Box<dyn ClipboardWriter>,
}

impl Shell {
    /// Apply the configured preset and open the history file.
    pub fn new(
        config: Config,
        config_source: Option<PathBuf>,
        resolver: PresetResolver,
        clipboard: Box<dyn ClipboardWriter>,
    ) -> Result<Self> {
        let config = theme::apply_preset(config, &resolver)?;
        let history = HistoryStore::open(&config.history.path, config.history.max_size)?;

        Ok(Self {
            aliases: AliasTable::new(config.alias.clone()),
            rules: activation_rules(&config),
            config,
            config_source,
            resolver,
            last_exit_code: 0,
            last_error: String::new(),
            history,
            completion: CompletionEngine::default(),
            registry: CommandRegistry::setup(),
            clipboard,
        })
    }

    pub fn history_entries(&self) -> Vec<String> {
        self.history.entries()
    }

    /// Run until `exit` or end of input. History is saved on both paths; a
    /// failed save is logged and the session still ends successfully.
    pub fn run(&mut self, reader: &mut dyn LineReader, out: &mut dyn Write) -> Result<()> {
        loop {
            let prompt = self.render_prompt();
            let line = match reader.read_line(&prompt) {
                Ok(Input::Line(line)) => line,
                Ok(Input::Interrupted) => continue,
                Ok(Input::Eof) => break,
                Err(e) => {
                    warn!(error = %e, "input failed, ending session");
                    break;
                }
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line == "exit" {
                break;
            }

            reader.add_history(line);
            self.last_exit_code = self.dispatch(line, out);
            if let Err(e) = out.flush() {
                warn!(error = %e, "could not flush output");
            }
        }

        if let Err(e) = self.history.save() {
            warn!(error = %e, "could not save history");
        }
        Ok(())
    }

    fn render_prompt(&self) -> String {
        let working_directory = env::current_dir()
            .map(|dir| dir.display().to_string())
            .unwrap_or_default();
        prompt::render(
            &self.config.prompt.segments,
            &self.config.prompt.symbol,
            &self.config.palette,
            &PromptContext {
                last_exit_code: self.last_exit_code,
                working_directory,
            },
        )
    }

    /// Route one trimmed, non-empty line and return its exit code.
    fn dispatch(&mut self, line: &str, out: &mut dyn Write) -> i32 {
        if MetaCommand::is_meta(line) {
            return self.run_meta(line, out);
        }

        let mut words = line.splitn(2, char::is_whitespace);
        if words.next() == Some("cd") {
            return self.change_directory(words.next().unwrap_or_default().trim());
        }

        let expanded = self.aliases.resolve(line);
        self.history.add(&expanded);
        self.run_command(&expanded, out)
    }

    fn change_directory(&mut self, target: &str) -> i32 {
        let target = target.trim_matches('"');
        let path = if target.is_empty() {
            match dirs::home_dir() {
                Some(home) => home,
                None => {
                    self.report_error("cd: home directory not found");
                    return 1;
                }
            }
        } else {
            PathBuf::from(utils::expand_tilde(target))
        };

        match env::set_current_dir(&path) {
            Ok(()) => {
                self.last_error.clear();
                0
            }
            Err(e) => {
                self.report_error(&format!("cd: {}", e));
                1
            }
        }
    }

    fn run_command(&mut self, line: &str, out: &mut dyn Write) -> i32 {
        match self.registry.execute(line, out) {
            Ok(Outcome::Handled(code)) => return self.finish(line, code),
            Ok(Outcome::NotHandled) => {}
            Err(e) => {
                let verb = line.split_whitespace().next().unwrap_or(line);
                self.report_error(&format!("{}: {}", verb, e));
                return 1;
            }
        }

        let shell = &self.config.shell;
        let external = ExternalCommand::new(&shell.executable, &shell.args);

        if envsync::is_cmd_shell(&self.config.shell.executable) && self.rules.is_activation(line) {
            return self.run_with_env_sync(&external, line, out);
        }

        match external.execute(line) {
            Ok(code) => self.finish(line, code),
            Err(e) => {
                self.report_error(&format!("veil: run command: {}", e));
                1
            }
        }
    }

    /// Run an activation command in a disposable `cmd` and copy the
    /// environment it leaves behind into this process.
    fn run_with_env_sync(
        &mut self,
        external: &ExternalCommand,
        line: &str,
        out: &mut dyn Write,
    ) -> i32 {
        debug!(line, "running with environment sync");
        let captured = match external.execute_captured_cmd(&envsync::wrap_command(line)) {
            Ok(captured) => captured,
            Err(e) => {
                self.report_error(&format!("veil: run command: {}", e));
                return 1;
            }
        };

        let (before, block) = envsync::split_output(&captured.output, envsync::MARKER);
        if !before.is_empty() {
            if let Err(e) = write!(out, "{}", before) {
                warn!(error = %e, "could not echo command output");
            }
        }

        if captured.code != 0 {
            return self.finish(line, captured.code);
        }

        let Some(block) = block else {
            debug!("sync marker missing from output, environment left unchanged");
            return self.finish(line, 0);
        };

        let mut snapshot = EnvironmentSnapshot::parse(block);
        let code = snapshot.take_exit_code();
        if snapshot.is_empty() {
            warn!("environment dump was empty, environment left unchanged");
            return self.finish(line, code);
        }

        let diff = envsync::diff_process_environment(&snapshot);
        debug!(vars = snapshot.len(), "captured environment");
        if !diff.is_empty() {
            diff.apply();
        }
        self.finish(line, code)
    }

    /// Record the outcome of an executed command: failures become the last
    /// error, success clears it.
    fn finish(&mut self, line: &str, code: i32) -> i32 {
        if code == 0 {
            self.last_error.clear();
        } else {
            self.record_error(&exit_message(line, code));
            print_hint();
        }
        code
    }

    fn run_meta(&mut self, line: &str, out: &mut dyn Write) -> i32 {
        let command = match MetaCommand::parse(line) {
            Ok(command) => command,
            Err(usage) => {
                self.report_error(&usage);
                return 1;
            }
        };

        let result = match command {
            MetaCommand::History => self.print_history(out),
            MetaCommand::Complete(prefix) => self.print_completions(&prefix, out),
            MetaCommand::Reload => self.reload(out),
            MetaCommand::CopyError(name) => self.copy_last_error(name, out),
        };

        result.unwrap_or_else(|e| {
            self.report_error(&format!("veil: {}", e));
            1
        })
    }

    fn print_history(&self, out: &mut dyn Write) -> Result<i32> {
        for entry in self.history.entries() {
            writeln!(out, "{}", entry)?;
        }
        Ok(0)
    }

    fn print_completions(&self, prefix: &str, out: &mut dyn Write) -> Result<i32> {
        for candidate in self.completion.complete(prefix, &self.history.entries()) {
            writeln!(out, "{}", candidate)?;
        }
        Ok(0)
    }

    /// Replace the session config only if loading and theming both succeed.
    fn reload(&mut self, out: &mut dyn Write) -> Result<i32> {
        let loaded = Config::load(self.config_source.as_deref()).and_then(|(config, source)| {
            Ok((theme::apply_preset(config, &self.resolver)?, source))
        });

        match loaded {
            Ok((config, source)) => {
                debug!(source = ?source, "configuration reloaded");
                if config.history.path != self.config.history.path {
                    warn!("history path changes take effect on the next start");
                }
                self.aliases = AliasTable::new(config.alias.clone());
                self.rules = activation_rules(&config);
                self.config = config;
                self.config_source = source;
                writeln!(out, "configuration reloaded")?;
                Ok(0)
            }
            Err(e) => {
                self.report_error(&format!("reload failed: {}", e));
                Ok(1)
            }
        }
    }

    fn copy_last_error(&mut self, name: &str, out: &mut dyn Write) -> Result<i32> {
        if self.last_error.trim().is_empty() {
            self.report_error("no error message captured yet");
            return Ok(1);
        }

        let text = self.last_error.clone();
        match self.clipboard.write_text(&text) {
            Ok(()) => {
                writeln!(out, "copied last error to clipboard")?;
                Ok(0)
            }
            Err(e) => {
                self.report_error(&format!("{} failed: {}", name, e));
                Ok(1)
            }
        }
    }

    fn record_error(&mut self, message: &str) {
        self.last_error = message.trim().to_string();
    }

    /// Record `message` as the last error and show it.
    fn report_error(&mut self, message: &str) {
        self.record_error(message);
        if self.last_error.is_empty() {
            return;
        }
        eprintln!("{}", self.last_error.red());
        print_hint();
    }
}

/// Built-in activation heuristics plus any configured patterns.
fn activation_rules(config: &Config) -> ActivationRules {
    let mut rules = ActivationRules::default();
    for pattern in &config.env_sync.contains {
        rules.push(ActivationRule::new(MatchKind::Contains, pattern));
    }
    for pattern in &config.env_sync.prefixes {
        rules.push(ActivationRule::new(MatchKind::Prefix, pattern));
    }
    rules
}

/// How a failed command is described, with the line quoted and escaped.
pub fn exit_message(line: &str, code: i32) -> String {
    format!("command {:?} exited with code {}", line, code)
}

fn print_hint() {
    eprintln!("{}", COPY_ERROR_HINT.dimmed());
}
