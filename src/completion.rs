use std::{
    collections::BTreeSet,
    env,
    ffi::OsString,
    fs,
    path::Path,
};

/// Maximum number of suggestions returned by one completion request.
pub const MAX_COMPLETIONS: usize = 20;

const DEFAULT_BUILTINS: &[&str] = &[
    "cd", "dir", "copy", "del", "exit", "git", "go", "npm", "docker", "python",
];

/// Suggests command names from builtins, history and the executables on
/// `PATH`.
#[derive(Debug, Clone)]
pub struct CompletionEngine {
    builtins: Vec<String>,
    search_path: Option<OsString>,
}

impl Default for CompletionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_BUILTINS.iter().map(|s| s.to_string()).collect())
    }
}

impl CompletionEngine {
    pub fn new(builtins: Vec<String>) -> Self {
        Self {
            builtins,
            search_path: None,
        }
    }

    /// Scan `path` instead of the process `PATH`.
    #[cfg(test)]
    pub fn with_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    /// Sorted, unique candidates starting with `prefix` (case-insensitive),
    /// at most [`MAX_COMPLETIONS`] of them.
    pub fn complete(&self, prefix: &str, history: &[String]) -> Vec<String> {
        let prefix = prefix.to_lowercase();

        let mut all: BTreeSet<String> = self.builtins.iter().cloned().collect();
        all.extend(
            history
                .iter()
                .filter_map(|entry| entry.split_whitespace().next())
                .map(str::to_string),
        );
        all.extend(self.path_executables());

        all.into_iter()
            .filter(|candidate| candidate.to_lowercase().starts_with(&prefix))
            .take(MAX_COMPLETIONS)
            .collect()
    }

    fn path_executables(&self) -> BTreeSet<String> {
        let path = match &self.search_path {
            Some(path) => Some(path.clone()),
            None => env::var_os("PATH"),
        };
        let Some(path) = path else {
            return BTreeSet::new();
        };

        let mut found = BTreeSet::new();
        for dir in env::split_paths(&path) {
            let Ok(entries) = fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.filter_map(|entry| entry.ok()) {
                let full = entry.path();
                if !is_executable(&full) {
                    continue;
                }
                if let Some(stem) = command_name(&full) {
                    found.insert(stem);
                }
            }
        }
        found
    }
}

/// The name a user types to run `path`: the file name without extension.
fn command_name(path: &Path) -> Option<String> {
    Some(path.file_stem()?.to_string_lossy().into_owned())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    let is_file = fs::metadata(path).map(|meta| meta.is_file()).unwrap_or(false);
    if !is_file {
        return false;
    }

    let pathext = env::var("PATHEXT").unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".to_string());
    let ext = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    !ext.is_empty()
        && pathext
            .split(';')
            .any(|candidate| candidate.eq_ignore_ascii_case(&ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_without_path() -> CompletionEngine {
        CompletionEngine::default().with_search_path("")
    }

    #[test]
    fn test_builtins_and_history_are_candidates() {
        let engine = engine_without_path();
        let history = vec!["git status".to_string(), "gcc -o main main.c".to_string()];

        assert_eq!(engine.complete("g", &history), vec!["gcc", "git", "go"]);
    }

    #[test]
    fn test_prefix_is_case_insensitive() {
        let engine = engine_without_path();
        assert_eq!(engine.complete("DO", &[]), vec!["docker"]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let engine = engine_without_path();
        let history = vec!["cd src".to_string(), "cd ..".to_string()];
        assert_eq!(engine.complete("cd", &history), vec!["cd"]);
    }

    #[test]
    fn test_results_are_capped() {
        let engine = CompletionEngine::new(Vec::new()).with_search_path("");
        let history: Vec<String> = (0..30).map(|i| format!("tool{:02} --flag", i)).collect();

        let got = engine.complete("tool", &history);
        assert_eq!(got.len(), MAX_COMPLETIONS);
        assert_eq!(got.first().map(String::as_str), Some("tool00"));
        assert_eq!(got.last().map(String::as_str), Some("tool19"));
    }

    #[cfg(unix)]
    #[test]
    fn test_path_executables_are_found() {
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        let tmp = TempDir::new().unwrap();
        let tool = tmp.path().join("veiltool");
        fs::write(&tool, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
        let plain = tmp.path().join("veilnotes");
        fs::write(&plain, "not executable").unwrap();
        fs::set_permissions(&plain, fs::Permissions::from_mode(0o644)).unwrap();

        let engine = CompletionEngine::new(Vec::new()).with_search_path(tmp.path());
        assert_eq!(engine.complete("veil", &[]), vec!["veiltool"]);
    }

    #[test]
    fn test_command_name_strips_extension() {
        assert_eq!(
            command_name(Path::new("/usr/bin/python3.exe")).as_deref(),
            Some("python3")
        );
        assert_eq!(command_name(Path::new("/usr/bin/ls")).as_deref(), Some("ls"));
    }
}
