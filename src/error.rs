use std::{num::ParseIntError, path::PathBuf};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{}:{line}: {message}", path.display())]
    ConfigParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("invalid {field}: {source}")]
    InvalidNumber {
        field: &'static str,
        #[source]
        source: ParseIntError,
    },

    #[error("{0}")]
    InvalidConfig(String),

    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    #[error("preset file {file:?} not found (looked in: {candidates})")]
    PresetNotFound { file: String, candidates: String },

    #[error("unsupported shell {0:?} (supported: {shells})", shells = crate::integration::SUPPORTED_SHELLS)]
    UnsupportedShell(String),

    #[error("line editor: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),

    #[error("{0}")]
    Clipboard(String),

    #[error("{0}")]
    Usage(&'static str),

    #[error("no captured error found in this shell session")]
    NothingCaptured,
}
