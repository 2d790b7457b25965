use std::{
    cmp::Ordering,
    env, fs,
    io::Write,
    path::{Path, MAIN_SEPARATOR},
    time::SystemTime,
};

use chrono::{DateTime, Local};

use crate::{
    core::command::{Command, Outcome},
    error::Result,
    utils,
};

#[derive(Clone)]
pub struct DirectoryListing;

struct Row {
    name: String,
    is_dir: bool,
    modified: String,
    size: u64,
}

impl Command for DirectoryListing {
    fn name(&self) -> &'static str {
        "dir"
    }

    fn usage(&self) -> &'static str {
        "usage: dir [path]"
    }

    fn execute(&self, args: &[&str], out: &mut dyn Write) -> Result<Outcome> {
        if args.len() > 1 {
            eprintln!("{}", self.usage());
            return Ok(Outcome::Handled(1));
        }
        if args.first().is_some_and(|arg| is_native_switch(arg)) {
            return Ok(Outcome::NotHandled);
        }

        let target = args.first().copied().unwrap_or(".");
        render_directory(out, Path::new(target))?;
        Ok(Outcome::Handled(0))
    }
}

/// Switches understood by the native listing command on this platform.
fn is_native_switch(arg: &str) -> bool {
    if cfg!(windows) {
        arg.starts_with('/')
    } else {
        arg.starts_with('-')
    }
}

pub fn render_directory(out: &mut dyn Write, target: &Path) -> Result<()> {
    let abs_path = if target.is_absolute() {
        target.to_path_buf()
    } else {
        env::current_dir()?.join(target)
    };

    let mut rows = Vec::new();
    for entry in fs::read_dir(&abs_path)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        rows.push(Row {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir: metadata.is_dir(),
            modified: format_time(metadata.modified().ok()),
            size: metadata.len(),
        });
    }

    rows.sort_by(|a, b| match (a.is_dir, b.is_dir) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    });

    writeln!(out, "📂 {}\n", abs_path.display())?;

    let (mut dirs, mut files, mut total) = (0usize, 0usize, 0u64);
    for row in &rows {
        let (name, size) = if row.is_dir {
            dirs += 1;
            (
                format!("{}{}", utils::colorize_dir_name(&row.name), MAIN_SEPARATOR),
                "<DIR>".to_string(),
            )
        } else {
            files += 1;
            total += row.size;
            (row.name.clone(), utils::human_bytes(row.size))
        };

        writeln!(
            out,
            "{}  {}  {:>8}  {}",
            file_icon(&row.name, row.is_dir),
            row.modified,
            size,
            name
        )?;
    }

    writeln!(
        out,
        "\n{} folder(s), {} file(s), {} total",
        dirs,
        files,
        utils::human_bytes(total)
    )?;
    Ok(())
}

fn format_time(time: Option<SystemTime>) -> String {
    match time {
        Some(time) => DateTime::<Local>::from(time)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        None => " ".repeat(16),
    }
}

fn file_icon(name: &str, is_dir: bool) -> &'static str {
    if is_dir {
        return "📁";
    }
    let ext = Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "py" => "🐍",
        "go" => "🐹",
        "rs" => "🦀",
        "js" | "ts" => "🟨",
        "md" => "📝",
        "toml" | "ini" | "yaml" | "yml" => "⚙️",
        "json" => "🧩",
        "exe" | "bat" | "cmd" | "sh" => "⚡",
        _ => "📄",
    }
}
