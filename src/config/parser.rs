//! Reader for the simplified TOML dialect used by config and preset files.
//!
//! Only `[section]` headers, `key = value` pairs, `#` comments and bracketed
//! string arrays are understood. Anything else is rejected with its line
//! number.

use std::path::Path;

use crate::error::{Error, Result};

/// One `key = value` pair together with the section it appeared in.
/// Top-level keys carry an empty section name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub section: String,
    pub key: String,
    pub value: String,
}

pub fn parse(path: &Path, source: &str) -> Result<Vec<Entry>> {
    let mut section = String::new();
    let mut entries = Vec::new();

    for (idx, raw) in source.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = line.trim_matches(|c| c == '[' || c == ']').trim().to_string();
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(Error::ConfigParse {
                path: path.to_path_buf(),
                line: idx + 1,
                message: format!("expected `key = value`, found {:?}", line),
            });
        };

        let key = key.trim();
        if key.is_empty() {
            return Err(Error::ConfigParse {
                path: path.to_path_buf(),
                line: idx + 1,
                message: "missing key before `=`".to_string(),
            });
        }

        entries.push(Entry {
            section: section.clone(),
            key: unquote(key).to_string(),
            value: unquote(value.trim()).to_string(),
        });
    }

    Ok(entries)
}

/// Split `["a", b]` into its items. An empty array yields no items.
pub fn parse_array(value: &str) -> Vec<String> {
    let inner = value
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim();
    if inner.is_empty() {
        return Vec::new();
    }

    inner
        .split(',')
        .map(|item| unquote(item.trim()).to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn unquote(value: &str) -> &str {
    value.trim_matches('"')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_and_comments() {
        let source = "preset = \"minimal\"\n# comment\n\n[shell]\nexecutable = \"sh\"\n";
        let entries = parse(Path::new("config.toml"), source).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].section, "");
        assert_eq!(entries[0].key, "preset");
        assert_eq!(entries[0].value, "minimal");
        assert_eq!(entries[1].section, "shell");
        assert_eq!(entries[1].value, "sh");
    }

    #[test]
    fn test_value_keeps_inner_equals() {
        let entries = parse(Path::new("c"), "[alias]\nll = \"ls --color=auto\"\n").unwrap();
        assert_eq!(entries[0].value, "ls --color=auto");
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let err = parse(Path::new("c.toml"), "[shell]\nexecutable\n").unwrap_err();
        match err {
            Error::ConfigParse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_array() {
        assert_eq!(parse_array("[\"user\", path , \"time\"]"), vec!["user", "path", "time"]);
        assert!(parse_array("[]").is_empty());
        assert!(parse_array("[  ]").is_empty());
    }
}
