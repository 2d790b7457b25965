use std::{
    env,
    io::Write,
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};

use crate::{
    clipboard::ClipboardWriter,
    config::{
        theme::{self, PresetResolver},
        Config,
    },
    error::{Error, Result},
    integration::{self, PromptDialect},
    meta::is_error_target,
    prompt::{self, PromptContext},
};

/// Error text exported by shell hooks for `veil cp err`.
pub const LAST_ERROR_ENV: &str = "VEIL_LAST_ERROR";
/// Exit code exported by shell hooks before each prompt.
pub const LAST_EXIT_CODE_ENV: &str = "VEIL_LAST_EXIT_CODE";

/// A prompt, alias and history front-end for your native shell.
#[derive(Parser, Debug)]
#[command(name = "veil", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file to use instead of the default search path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Render one prompt and exit (used by shell integration hooks)
    Prompt {
        /// Exit code of the previous command
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        last_exit_code: i32,

        /// Directory to show; defaults to the current one
        #[arg(long)]
        workdir: Option<PathBuf>,

        /// Mark escape sequences for this shell's prompt variable
        #[arg(long, value_enum)]
        shell: Option<PromptDialect>,
    },

    /// Print the integration snippet for a shell
    Init {
        /// powershell, pwsh, bash, zsh or cmd
        shell: String,
    },

    /// Copy the error captured by the shell hooks (`veil cp err`)
    Cp {
        /// err or error
        target: String,
    },

    /// Same as `veil cp err`
    CopyError,
}

pub fn run_prompt(
    config_path: Option<&Path>,
    last_exit_code: i32,
    workdir: Option<&Path>,
    dialect: Option<PromptDialect>,
    out: &mut dyn Write,
) -> Result<()> {
    let (config, _) = Config::load(config_path)?;
    let config = theme::apply_preset(config, &PresetResolver::from_environment())?;

    let working_directory = match workdir {
        Some(dir) => dir.to_path_buf(),
        None => env::current_dir()?,
    };
    let rendered = prompt::render(
        &config.prompt.segments,
        &config.prompt.symbol,
        &config.palette,
        &PromptContext {
            last_exit_code,
            working_directory: working_directory.display().to_string(),
        },
    );

    match dialect {
        Some(dialect) => write!(out, "{}", dialect.escape(&rendered))?,
        None => write!(out, "{}", rendered)?,
    }
    Ok(())
}

pub fn run_init(shell: &str, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "{}", integration::init_script(shell)?)?;
    Ok(())
}

/// The text `veil cp err` copies: the exported error, or a description of
/// a non-zero exported exit code.
pub fn captured_error(last_error: Option<&str>, last_exit_code: Option<&str>) -> Option<String> {
    if let Some(message) = last_error.map(str::trim).filter(|m| !m.is_empty()) {
        return Some(message.to_string());
    }

    last_exit_code
        .map(str::trim)
        .filter(|code| !code.is_empty() && *code != "0")
        .map(|code| format!("last command exited with code {}", code))
}

/// Copy the error captured in the environment to `clipboard`.
pub fn run_copy(
    target: &str,
    captured: Option<String>,
    clipboard: &mut dyn ClipboardWriter,
    out: &mut dyn Write,
) -> Result<()> {
    if !is_error_target(target.trim()) {
        return Err(Error::Usage("usage: veil cp <err|error>"));
    }
    let message = captured.ok_or(Error::NothingCaptured)?;

    clipboard.write_text(&message)?;
    writeln!(out, "copied last error to clipboard")?;
    Ok(())
}

/// [`captured_error`] read from this process's environment.
pub fn captured_error_from_env() -> Option<String> {
    captured_error(
        env::var(LAST_ERROR_ENV).ok().as_deref(),
        env::var(LAST_EXIT_CODE_ENV).ok().as_deref(),
    )
}
