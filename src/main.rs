use std::{
    io::{self, IsTerminal},
    path::Path,
    process::ExitCode,
};

use clap::Parser;
use colored::Colorize;
use rustyline::{history::FileHistory, Editor};

mod alias;
mod cli;
mod clipboard;
mod commands;
mod completion;
mod config;
mod core;
mod envsync;
mod error;
mod git;
mod history;
mod input;
mod integration;
mod logging;
mod meta;
mod prompt;
mod shell;
mod utils;

use cli::{Cli, Commands};
use clipboard::SystemClipboard;
use completion::CompletionEngine;
use config::{theme::PresetResolver, Config};
use error::Result;
use input::{BufReadInput, LineReader};
use shell::Shell;

use crate::core::completer::CommandCompleter;

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Prompt {
            last_exit_code,
            workdir,
            shell,
        }) => cli::run_prompt(
            cli.config.as_deref(),
            last_exit_code,
            workdir.as_deref(),
            shell,
            &mut io::stdout(),
        ),
        Some(Commands::Init { shell }) => cli::run_init(&shell, &mut io::stdout()),
        Some(Commands::Cp { target }) => copy_captured_error(&target),
        Some(Commands::CopyError) => copy_captured_error("error"),
        None => run_interactive(cli.config.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "veil:".red(), e);
            ExitCode::FAILURE
        }
    }
}

fn copy_captured_error(target: &str) -> Result<()> {
    let mut clipboard = SystemClipboard::new();
    cli::run_copy(
        target,
        cli::captured_error_from_env(),
        &mut clipboard,
        &mut io::stdout(),
    )
}

fn run_interactive(config_path: Option<&Path>) -> Result<()> {
    let (config, source) = Config::load(config_path)?;
    let mut shell = Shell::new(
        config,
        source,
        PresetResolver::from_environment(),
        Box::new(SystemClipboard::new()),
    )?;

    let mut stdout = io::stdout();
    if !io::stdin().is_terminal() {
        let mut reader = BufReadInput::new(io::stdin().lock());
        return shell.run(&mut reader, &mut stdout);
    }

    let history = shell.history_entries();
    let mut editor = Editor::<CommandCompleter, FileHistory>::new()?;
    editor.set_helper(Some(CommandCompleter::new(
        CompletionEngine::default(),
        history.clone(),
    )));
    for entry in &history {
        editor.add_history(entry);
    }

    shell.run(&mut editor, &mut stdout)
}
