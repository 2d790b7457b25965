//! 24-bit ANSI styling and powerline-style composition of segments.

use super::Segment;

pub const RESET: &str = "\x1b[0m";

/// Parse `#rrggbb` into its components.
pub fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range| u8::from_str_radix(&hex[range], 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

pub fn foreground(color: &str) -> Option<String> {
    parse_hex(color).map(|(r, g, b)| format!("\x1b[38;2;{};{};{}m", r, g, b))
}

pub fn background(color: &str) -> Option<String> {
    parse_hex(color).map(|(r, g, b)| format!("\x1b[48;2;{};{};{}m", r, g, b))
}

/// Escape sequence selecting `fg` on `bg`. Invalid or missing colors are
/// skipped; the result is empty when neither applies.
pub fn style(fg: Option<&str>, bg: Option<&str>) -> String {
    let mut seq = String::new();
    if let Some(code) = fg.and_then(foreground) {
        seq.push_str(&code);
    }
    if let Some(code) = bg.and_then(background) {
        seq.push_str(&code);
    }
    seq
}

/// Join segments into one line. A segment with a background is padded and
/// followed by `separator` drawn in its background color over the next
/// segment's background.
pub fn render_with_arrows(segments: &[Segment], separator: &str) -> String {
    let mut out = String::new();

    for (i, segment) in segments.iter().enumerate() {
        let next_bg = segments.get(i + 1).and_then(|s| s.background.as_deref());
        let bg = segment.background.as_deref();

        let text = match bg {
            Some(_) => format!(" {} ", segment.text),
            None => segment.text.clone(),
        };

        let start = style(segment.foreground.as_deref(), bg);
        if start.is_empty() {
            out.push_str(&text);
        } else {
            out.push_str(&start);
            out.push_str(&text);
            out.push_str(RESET);
        }

        if bg.is_some() {
            let arrow = style(bg, next_bg);
            if arrow.is_empty() {
                out.push_str(separator);
            } else {
                out.push_str(&arrow);
                out.push_str(separator);
                out.push_str(RESET);
            }
        } else if i + 1 < segments.len() {
            out.push(' ');
        }
    }

    out.push(' ');
    out
}
