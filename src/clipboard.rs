use std::{
    io::{self, Write},
    process::{Command, Stdio},
};

use tracing::debug;

use crate::error::{Error, Result};

/// Somewhere the last error text can be copied to.
pub trait ClipboardWriter {
    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// The desktop clipboard.
///
/// Platform utilities are tried first since they keep serving the selection
/// after this process exits; the in-process `arboard` handle is the fallback
/// and is kept for the rest of the session once created.
#[derive(Default)]
pub struct SystemClipboard {
    native: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn write_native(&mut self, text: &str) -> Result<()> {
        if self.native.is_none() {
            let clipboard =
                arboard::Clipboard::new().map_err(|e| Error::Clipboard(e.to_string()))?;
            self.native = Some(clipboard);
        }

        match self.native.as_mut() {
            Some(clipboard) => clipboard
                .set_text(text)
                .map_err(|e| Error::Clipboard(e.to_string())),
            None => Err(Error::Clipboard("clipboard unavailable".to_string())),
        }
    }
}

impl ClipboardWriter for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(Error::Clipboard("empty text".to_string()));
        }

        let mut tried = Vec::new();
        for (program, args) in utilities() {
            match run_utility(program, args, text) {
                Ok(()) => {
                    debug!(program, "copied to clipboard");
                    return Ok(());
                }
                Err(e) => {
                    debug!(program, error = %e, "clipboard utility failed");
                    tried.push(*program);
                }
            }
        }

        self.write_native(text).map_err(|e| {
            Error::Clipboard(format!(
                "no clipboard utility available (tried {}); {}",
                tried.join(", "),
                e
            ))
        })
    }
}

type Utility = (&'static str, &'static [&'static str]);

const WINDOWS_UTILITIES: &[Utility] = &[("cmd", &["/c", "clip"])];
const MACOS_UTILITIES: &[Utility] = &[("pbcopy", &[])];
const UNIX_UTILITIES: &[Utility] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

fn utilities() -> &'static [Utility] {
    if cfg!(windows) {
        WINDOWS_UTILITIES
    } else if cfg!(target_os = "macos") {
        MACOS_UTILITIES
    } else {
        UNIX_UTILITIES
    }
}

fn run_utility(program: &str, args: &[&str], text: &str) -> io::Result<()> {
    // Some utilities leave a daemon behind that keeps inherited pipes open,
    // so only stdin is piped.
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    let written = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(text.as_bytes()),
        None => Ok(()),
    };

    let status = child.wait()?;
    if !status.success() {
        return Err(io::Error::other(format!("{} {}", program, status)));
    }
    written
}

/// Records copied text instead of touching the desktop.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingClipboard {
    pub copied: std::rc::Rc<std::cell::RefCell<Vec<String>>>,
    pub fail_with: Option<String>,
}

#[cfg(test)]
impl ClipboardWriter for RecordingClipboard {
    fn write_text(&mut self, text: &str) -> Result<()> {
        if let Some(message) = &self.fail_with {
            return Err(Error::Clipboard(message.clone()));
        }
        self.copied.borrow_mut().push(text.to_string());
        Ok(())
    }
}
