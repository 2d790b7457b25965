use std::collections::HashMap;

/// Maps a leading command word to its replacement text.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    aliases: HashMap<String, String>,
}

impl AliasTable {
    pub fn new(aliases: HashMap<String, String>) -> Self {
        Self { aliases }
    }

    /// Expand the first word of `line` if it names an alias. The replacement
    /// is not expanded again.
    pub fn resolve(&self, line: &str) -> String {
        let Some(first) = line.split_whitespace().next() else {
            return line.to_string();
        };

        match self.aliases.get(first) {
            Some(replacement) => line.replacen(first, replacement, 1).trim().to_string(),
            None => line.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, &str)]) -> AliasTable {
        AliasTable::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_replaces_first_token() {
        let aliases = table(&[("ls", "ls -G")]);
        assert_eq!(aliases.resolve("ls -la"), "ls -G -la");
    }

    #[test]
    fn test_not_recursive() {
        let aliases = table(&[("ll", "ls -l"), ("ls", "ls -G")]);
        assert_eq!(aliases.resolve("ll /tmp"), "ls -l /tmp");
    }

    #[test]
    fn test_only_first_token_matches() {
        let aliases = table(&[("gs", "git status")]);
        assert_eq!(aliases.resolve("echo gs"), "echo gs");
    }

    #[test]
    fn test_unknown_and_empty() {
        let aliases = table(&[("gs", "git status")]);
        assert_eq!(aliases.resolve("cargo build"), "cargo build");
        assert_eq!(aliases.resolve(""), "");
    }

    #[test]
    fn test_trims_result() {
        let aliases = table(&[("clear", "")]);
        assert_eq!(aliases.resolve("clear"), "");
    }
}
