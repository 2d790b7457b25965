//! Commands addressed to veil itself rather than to the native shell.

/// First word that routes a line to the meta-commands.
pub const META_PREFIX: &str = "veil";

pub const COPY_ERROR_HINT: &str =
    "hint: run `veil cp err` (or `veil copy-error`) to copy the last error";

const COMMAND_LIST: &str = "veil commands: complete, history, reload, copy-error, cp err";
const COMPLETE_USAGE: &str = "usage: veil complete <prefix>";
const CP_USAGE: &str = "usage: veil cp <err|error>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaCommand {
    History,
    Complete(String),
    Reload,
    /// Copy the last error; carries the spelling used, for error messages.
    CopyError(&'static str),
}

impl MetaCommand {
    /// Whether `line` is addressed to veil.
    pub fn is_meta(line: &str) -> bool {
        line.split_whitespace().next() == Some(META_PREFIX)
    }

    /// Parse a `veil ...` line. The error is the usage text to show.
    pub fn parse(line: &str) -> Result<Self, String> {
        let words: Vec<&str> = line.split_whitespace().skip(1).collect();

        match words.as_slice() {
            [] => Err(COMMAND_LIST.to_string()),
            ["history", ..] => Ok(Self::History),
            ["complete"] => Err(COMPLETE_USAGE.to_string()),
            ["complete", prefix, ..] => Ok(Self::Complete(prefix.to_string())),
            ["reload", ..] => Ok(Self::Reload),
            ["copy-error", ..] => Ok(Self::CopyError("copy-error")),
            ["cp", target, ..] if is_error_target(target) => Ok(Self::CopyError("cp err")),
            ["cp", ..] => Err(CP_USAGE.to_string()),
            [other, ..] => Err(format!("unknown veil command: {}\n{}", other, COMMAND_LIST)),
        }
    }
}

/// `err` or `error`, in any case.
pub fn is_error_target(target: &str) -> bool {
    target.eq_ignore_ascii_case("err") || target.eq_ignore_ascii_case("error")
}
