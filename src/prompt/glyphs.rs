//! Icon and separator selection based on terminal capabilities.

use std::collections::HashMap;

use super::env::{parse_flag, RenderEnv};

pub const SEPARATOR: &str = "\u{e0b0}";
pub const SEPARATOR_ASCII: &str = ">";

const USER_ICON: &str = "👤";
const DRIVE_ICON: &str = "💾";
const FOLDER_ICON: &str = "📂";
const TIME_ICON: &str = "⌛";
const ERROR_ICON: &str = "⚠";

/// Code points that show up when UTF-8 glyph bytes are decoded as
/// Windows-1252.
const MOJIBAKE_MARKERS: &[char] = &[
    '\u{00C3}', '\u{00C2}', '\u{00E2}', '\u{00F0}', '\u{0178}', '\u{00EF}', '\u{00B8}',
    '\u{2018}', '\u{00A4}', '\u{20AC}', '\u{2122}', '\u{0153}', '\u{0161}', '\u{017E}',
];

/// The glyphs one render uses. Empty strings mean "no icon".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyphs {
    pub unicode: bool,
    pub user: String,
    pub drive: String,
    pub folder: String,
    pub time: String,
    pub error: String,
    pub separator: &'static str,
}

impl Glyphs {
    /// Pick glyphs for `env`. Palette keys such as `folder_icon` replace the
    /// built-in icons.
    pub fn detect(env: &RenderEnv, palette: &HashMap<String, String>) -> Self {
        let unicode = supports_unicode(env);
        let icon = |key: &str, default: &str| {
            let configured = palette.get(key).map(String::as_str).unwrap_or(default);
            prompt_icon(configured, unicode, env)
        };

        Self {
            unicode,
            user: icon("user_icon", USER_ICON),
            drive: icon("drive_icon", DRIVE_ICON),
            folder: icon("folder_icon", FOLDER_ICON),
            time: icon("time_icon", TIME_ICON),
            error: icon("error_icon", ERROR_ICON),
            separator: if unicode { SEPARATOR } else { SEPARATOR_ASCII },
        }
    }
}

pub fn supports_unicode(env: &RenderEnv) -> bool {
    parse_flag(env.unicode_override.as_deref()).unwrap_or(true)
}

fn prompt_icon(icon: &str, unicode: bool, env: &RenderEnv) -> String {
    if !unicode {
        return String::new();
    }
    if env.is_vscode()
        && (parse_flag(env.vscode_empty_icons.as_deref()) == Some(true) || is_mojibake(icon))
    {
        return String::new();
    }
    icon.to_string()
}

/// Heuristic for an icon whose bytes were mis-decoded somewhere between the
/// config file and the terminal.
pub fn is_mojibake(icon: &str) -> bool {
    icon.trim()
        .chars()
        .any(|c| c < '\u{20}' || ('\u{7f}'..='\u{9f}').contains(&c) || MOJIBAKE_MARKERS.contains(&c))
}

/// `icon  label`, or whichever of the two is present.
pub fn with_icon(icon: &str, label: &str) -> String {
    match (icon.is_empty(), label.is_empty()) {
        (true, _) => label.to_string(),
        (false, true) => icon.to_string(),
        (false, false) => format!("{}  {}", icon, label),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(unicode: Option<&str>, term: Option<&str>, empty: Option<&str>) -> RenderEnv {
        RenderEnv {
            unicode_override: unicode.map(String::from),
            term_program: term.map(String::from),
            vscode_empty_icons: empty.map(String::from),
            ..RenderEnv::default()
        }
    }

    #[test]
    fn test_unicode_enabled_by_default() {
        let glyphs = Glyphs::detect(&env(None, None, None), &HashMap::new());
        assert!(glyphs.unicode);
        assert_eq!(glyphs.separator, SEPARATOR);
        assert_eq!(glyphs.folder, FOLDER_ICON);
    }

    #[test]
    fn test_unicode_override_off() {
        let glyphs = Glyphs::detect(&env(Some("off"), None, None), &HashMap::new());
        assert!(!glyphs.unicode);
        assert_eq!(glyphs.separator, SEPARATOR_ASCII);
        assert!(glyphs.user.is_empty());
        assert!(glyphs.folder.is_empty());
    }

    #[test]
    fn test_vscode_empty_icons() {
        let glyphs = Glyphs::detect(&env(None, Some("vscode"), Some("1")), &HashMap::new());
        assert!(glyphs.unicode);
        assert!(glyphs.time.is_empty());
        assert_eq!(glyphs.separator, SEPARATOR);
    }

    #[test]
    fn test_vscode_drops_mojibake_icons_only() {
        let mut palette = HashMap::new();
        palette.insert("folder_icon".to_string(), "ðŸ“‚".to_string());

        let glyphs = Glyphs::detect(&env(None, Some("vscode"), None), &palette);
        assert!(glyphs.folder.is_empty());
        assert_eq!(glyphs.user, USER_ICON);

        // outside VS Code the configured icon is used as-is
        let glyphs = Glyphs::detect(&env(None, None, None), &palette);
        assert_eq!(glyphs.folder, "ðŸ“‚");
    }

    #[test]
    fn test_is_mojibake() {
        assert!(is_mojibake("â€™"));
        assert!(is_mojibake("\u{1b}x"));
        assert!(!is_mojibake(FOLDER_ICON));
        assert!(!is_mojibake(""));
    }

    #[test]
    fn test_with_icon() {
        assert_eq!(with_icon("", "src"), "src");
        assert_eq!(with_icon("X", ""), "X");
        assert_eq!(with_icon("X", "src"), "X  src");
    }
}
