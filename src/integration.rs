//! Snippets that hook `veil prompt` into a shell's own prompt.

use clap::ValueEnum;

use crate::error::{Error, Result};

pub const SUPPORTED_SHELLS: &str = "powershell, bash, zsh, cmd";

/// Setup snippet for `shell` (case-insensitive).
pub fn init_script(shell: &str) -> Result<&'static str> {
    match shell.trim().to_lowercase().as_str() {
        "powershell" | "pwsh" => Ok(POWERSHELL),
        "bash" => Ok(BASH),
        "zsh" => Ok(ZSH),
        "cmd" | "cmd.exe" => Ok(CMD),
        _ => Err(Error::UnsupportedShell(shell.to_string())),
    }
}

/// A shell whose prompt variable needs escape sequences marked as
/// zero-width so its line editor measures the prompt correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PromptDialect {
    Bash,
    Zsh,
}

impl PromptDialect {
    /// Wrap each CSI sequence in the shell's zero-width markers and escape
    /// the shell's own prompt metacharacter.
    pub fn escape(self, prompt: &str) -> String {
        let (open, close, meta) = match self {
            PromptDialect::Bash => (r"\[", r"\]", '\\'),
            PromptDialect::Zsh => ("%{", "%}", '%'),
        };

        let mut escaped = String::with_capacity(prompt.len() * 2);
        let mut chars = prompt.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                escaped.push_str(open);
                escaped.push(c);
                if chars.next_if_eq(&'[').is_some() {
                    escaped.push('[');
                    for c in chars.by_ref() {
                        escaped.push(c);
                        if ('@'..='~').contains(&c) {
                            break;
                        }
                    }
                }
                escaped.push_str(close);
            } else if c == meta {
                escaped.push(c);
                escaped.push(c);
            } else {
                escaped.push(c);
            }
        }
        escaped
    }
}

const POWERSHELL: &str = r#"function prompt {
    $code = $global:LASTEXITCODE
    if ($null -eq $code) { $code = 0 }
    $env:VEIL_LAST_EXIT_CODE = "$code"
    veil prompt --last-exit-code $code --workdir "$PWD"
}"#;

const BASH: &str = r#"__veil_prompt() {
  local code="$?"
  export VEIL_LAST_EXIT_CODE="$code"
  PS1="$(veil prompt --shell bash --last-exit-code "$code" --workdir "$PWD")"
}
PROMPT_COMMAND=__veil_prompt"#;

const ZSH: &str = r#"function precmd() {
  local code="$?"
  export VEIL_LAST_EXIT_CODE="$code"
  PROMPT="$(veil prompt --shell zsh --last-exit-code "$code" --workdir "$PWD")"
}"#;

const CMD: &str = r#":: cmd has no pre-prompt hook that can run an external program.
:: This keeps the path and time visible instead.
PROMPT $P $T $G "#;
