//! Breadcrumb badges for the working directory.

use std::{
    collections::HashMap,
    iter,
    path::{Component, Path, MAIN_SEPARATOR_STR},
};

use rand::seq::SliceRandom;

use super::{
    ansi::parse_hex,
    glyphs::{with_icon, Glyphs},
    Segment,
};

pub const MAX_BREADCRUMBS: usize = 20;
pub const GRADIENT_STEPS: usize = 20;

const DEFAULT_GRADIENT: [&str; GRADIENT_STEPS] = [
    "#3b82f6", "#22c55e", "#a855f7", "#f59e0b", "#06b6d4", "#ef4444", "#84cc16", "#ec4899",
    "#6366f1", "#14b8a6", "#f97316", "#8b5cf6", "#10b981", "#eab308", "#0ea5e9", "#d946ef",
    "#65a30d", "#fb7185", "#2563eb", "#16a34a",
];

/// Split `wd` into a volume or root crumb followed by one crumb per
/// component, capped at [`MAX_BREADCRUMBS`].
pub fn breadcrumbs(wd: &str, glyphs: &Glyphs) -> Vec<String> {
    let root = || {
        if glyphs.folder.is_empty() {
            MAIN_SEPARATOR_STR.to_string()
        } else {
            glyphs.folder.clone()
        }
    };

    let wd = wd.trim();
    if wd.is_empty() {
        return vec![root()];
    }

    let volume = volume_name(wd);
    let remainder = &wd[volume.len()..];

    let mut crumbs = Vec::new();
    if !volume.is_empty() {
        crumbs.push(with_icon(&glyphs.drive, volume));
    } else if remainder.starts_with(['/', '\\']) {
        crumbs.push(root());
    }

    let parts = remainder
        .split(['/', '\\'])
        .filter(|part| !part.is_empty() && *part != ".");
    for part in parts {
        if crumbs.len() >= MAX_BREADCRUMBS {
            break;
        }
        crumbs.push(with_icon(&glyphs.folder, part));
    }

    if crumbs.is_empty() {
        crumbs.push(root());
    }
    crumbs
}

/// Drive letter or UNC share at the start of `path`, empty when there is
/// none on this platform.
fn volume_name(path: &str) -> &str {
    match Path::new(path).components().next() {
        Some(Component::Prefix(prefix)) => path.get(..prefix.as_os_str().len()).unwrap_or(""),
        _ => "",
    }
}

/// Background colors for successive crumbs. Indexed `path_bg_N` palette
/// entries are used in order when present; otherwise the built-in colors,
/// led by any valid `path_bg`, in a fresh random order.
pub fn gradient(palette: &HashMap<String, String>) -> Vec<String> {
    let configured: Vec<String> = (1..=GRADIENT_STEPS)
        .filter_map(|i| palette.get(&format!("path_bg_{}", i)))
        .map(|color| color.trim())
        .filter(|color| !color.is_empty())
        .map(String::from)
        .collect();
    if !configured.is_empty() {
        return configured;
    }

    let base = palette
        .get("path_bg")
        .map(|color| color.trim().to_ascii_lowercase())
        .filter(|color| parse_hex(color).is_some());

    let mut colors: Vec<String> = match base {
        Some(base) => iter::once(base.clone())
            .chain(
                DEFAULT_GRADIENT
                    .iter()
                    .filter(|color| !color.eq_ignore_ascii_case(&base))
                    .map(|color| color.to_string()),
            )
            .take(GRADIENT_STEPS)
            .collect(),
        None => DEFAULT_GRADIENT.iter().map(|c| c.to_string()).collect(),
    };

    colors.shuffle(&mut rand::thread_rng());
    colors
}

pub fn path_segments(wd: &str, palette: &HashMap<String, String>, glyphs: &Glyphs) -> Vec<Segment> {
    let colors = gradient(palette);
    let foreground = palette.get("path_fg").cloned();

    breadcrumbs(wd, glyphs)
        .into_iter()
        .enumerate()
        .map(|(i, text)| Segment {
            text,
            foreground: foreground.clone(),
            background: Some(colors[i % colors.len()].clone()),
        })
        .collect()
}
