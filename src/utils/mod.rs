use colored::{ColoredString, Colorize};

pub fn colorize_dir_name(name: &str) -> ColoredString {
    if name.starts_with('.') {
        name.blue().dimmed()
    } else {
        name.blue()
    }
}

/// Size in bytes using base-1024 units with one decimal.
pub fn human_bytes(size: u64) -> String {
    const UNIT: u64 = 1024;
    if size < UNIT {
        return format!("{} B", size);
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = size / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }

    format!("{:.1} {}iB", size as f64 / div as f64, "KMGTPE".as_bytes()[exp] as char)
}

/// Replace a leading `~` with the home directory.
pub fn expand_tilde(path: &str) -> String {
    if path == "~" || path.starts_with("~/") || path.starts_with("~\\") {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }

    path.to_string()
}
