//! Prompt rendering: segment names, palette and session context in, styled
//! terminal string out.

mod ansi;
pub mod env;
mod glyphs;
mod identity;
mod path;

use std::{collections::HashMap, env as std_env, path::PathBuf};

use chrono::Local;

use crate::git::{BranchProbe, GitProbe};

pub use env::RenderEnv;
use glyphs::Glyphs;

/// Shown at the start of the line that holds the prompt symbol.
const SYMBOL_LINE_PREFIX: &str = "| ";
const DEFAULT_SYMBOL: &str = ">";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptContext {
    pub last_exit_code: i32,
    pub working_directory: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub foreground: Option<String>,
    pub background: Option<String>,
}

impl Segment {
    /// Segment styled from the `<name>_fg` and `<name>_bg` palette entries.
    fn named(name: &str, text: String, palette: &HashMap<String, String>) -> Self {
        Self {
            text,
            foreground: palette.get(&format!("{}_fg", name)).cloned(),
            background: palette.get(&format!("{}_bg", name)).cloned(),
        }
    }
}

/// Render with the live process environment and git.
pub fn render(
    segments: &[String],
    symbol: &str,
    palette: &HashMap<String, String>,
    ctx: &PromptContext,
) -> String {
    Renderer::new(RenderEnv::from_process(), &GitProbe).render(segments, symbol, palette, ctx)
}

pub struct Renderer<'a> {
    env: RenderEnv,
    probe: &'a dyn BranchProbe,
}

impl<'a> Renderer<'a> {
    pub fn new(env: RenderEnv, probe: &'a dyn BranchProbe) -> Self {
        Self { env, probe }
    }

    pub fn render(
        &self,
        names: &[String],
        symbol: &str,
        palette: &HashMap<String, String>,
        ctx: &PromptContext,
    ) -> String {
        let glyphs = Glyphs::detect(&self.env, palette);
        let workdir = if ctx.working_directory.trim().is_empty() {
            std_env::current_dir()
                .map(|dir| dir.display().to_string())
                .unwrap_or_default()
        } else {
            ctx.working_directory.clone()
        };

        let mut segments = Vec::with_capacity(names.len());
        for name in names {
            match name.as_str() {
                "user" => {
                    let label = identity::user_label(&self.env, self.probe, &PathBuf::from(&workdir));
                    if !label.is_empty() {
                        let mut segment =
                            Segment::named("user", glyphs::with_icon(&glyphs.user, &label), palette);
                        segment.foreground = Some("#ffffff".to_string());
                        segments.push(segment);
                    }
                }
                "path" => segments.extend(path::path_segments(&workdir, palette, &glyphs)),
                "time" => {
                    let now = Local::now().format("%-I:%M %p").to_string();
                    segments.push(Segment::named("time", glyphs::with_icon(&glyphs.time, &now), palette));
                }
                "exit_code" => {
                    if let Some(text) = exit_code_text(ctx.last_exit_code) {
                        segments.push(Segment::named(
                            "exit_code",
                            glyphs::with_icon(&glyphs.error, &text),
                            palette,
                        ));
                    }
                }
                other => tracing::debug!(segment = other, "unknown prompt segment"),
            }
        }

        let symbol = match symbol {
            "" => DEFAULT_SYMBOL,
            s if !glyphs.unicode && !s.is_ascii() => DEFAULT_SYMBOL,
            s => s,
        };
        let symbol = [Segment::named("symbol", symbol.to_string(), palette)];

        if segments.is_empty() {
            return ansi::render_with_arrows(&symbol, glyphs.separator);
        }

        let badges = ansi::render_with_arrows(&segments, glyphs.separator);
        let symbol_line = ansi::render_with_arrows(&symbol, glyphs.separator);
        format!(
            "{}\n{}{}",
            badges.trim_end_matches(' '),
            SYMBOL_LINE_PREFIX,
            symbol_line.trim_start_matches(' ')
        )
    }
}

/// `1 error`, `N errors`, or nothing for success.
pub fn exit_code_text(code: i32) -> Option<String> {
    match code {
        0 => None,
        1 => Some("1 error".to_string()),
        n => Some(format!("{} errors", n)),
    }
}
