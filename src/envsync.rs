//! Replays environment changes made by activation scripts run in a
//! disposable `cmd.exe` back into this process.
//!
//! The user's command is chained with an exit-code capture, a marker line
//! and a full `set` dump. Everything before the marker is the command's own
//! output; everything after it is the child's final environment.

use std::{
    collections::{BTreeMap, HashMap},
    env,
};

use tracing::debug;

pub const MARKER: &str = "__VEIL_ENV_SYNC_BEGIN__";
pub const EXIT_VAR: &str = "__VEIL_EXIT_CODE";
const ERRORLEVEL_TOKEN: &str = "!ERRORLEVEL!";

/// How a rule compares against the lowercased, trimmed command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Contains,
    Prefix,
    Exact,
    /// Contains, applied to the target of a `call` statement.
    CallContains,
    /// Prefix, applied to the target of a `call` statement.
    CallPrefix,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationRule {
    pub kind: MatchKind,
    pub pattern: String,
}

impl ActivationRule {
    pub fn new(kind: MatchKind, pattern: &str) -> Self {
        Self {
            kind,
            pattern: pattern.to_ascii_lowercase(),
        }
    }

    fn matches(&self, line: &str) -> bool {
        let call_target = || line.strip_prefix("call ").map(str::trim);
        match self.kind {
            MatchKind::Contains => line.contains(&self.pattern),
            MatchKind::Prefix => line.starts_with(&self.pattern),
            MatchKind::Exact => line == self.pattern,
            MatchKind::CallContains => call_target().is_some_and(|t| t.contains(&self.pattern)),
            MatchKind::CallPrefix => call_target().is_some_and(|t| t.starts_with(&self.pattern)),
        }
    }
}

/// Table of heuristics recognizing commands that activate or deactivate an
/// environment.
#[derive(Debug, Clone)]
pub struct ActivationRules {
    rules: Vec<ActivationRule>,
}

impl Default for ActivationRules {
    fn default() -> Self {
        use MatchKind::*;
        Self::new(vec![
            ActivationRule::new(Contains, "activate.bat"),
            ActivationRule::new(Contains, r"\scripts\activate"),
            ActivationRule::new(Contains, "/scripts/activate"),
            ActivationRule::new(Prefix, "conda activate "),
            ActivationRule::new(Prefix, "conda deactivate"),
            ActivationRule::new(Exact, "deactivate"),
            ActivationRule::new(Prefix, "deactivate "),
            ActivationRule::new(CallContains, "activate"),
            ActivationRule::new(CallPrefix, "deactivate"),
        ])
    }
}

impl ActivationRules {
    pub fn new(rules: Vec<ActivationRule>) -> Self {
        Self { rules }
    }

    pub fn push(&mut self, rule: ActivationRule) {
        self.rules.push(rule);
    }

    pub fn is_activation(&self, line: &str) -> bool {
        let line = line.trim().to_ascii_lowercase();
        !line.is_empty() && self.rules.iter().any(|rule| rule.matches(&line))
    }
}

/// Whether `executable` names the Windows console interpreter.
pub fn is_cmd_shell(executable: &str) -> bool {
    let base = executable
        .trim()
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    base == "cmd" || base == "cmd.exe"
}

/// The command line actually handed to `cmd /V:ON /C`.
pub fn wrap_command(line: &str) -> String {
    format!(
        "{} & set \"{}={}\" & echo {} & set",
        line, EXIT_VAR, ERRORLEVEL_TOKEN, MARKER
    )
}

/// Split captured output at the first marker. Returns the output preceding
/// it and, when found, the environment block that follows.
pub fn split_output<'a>(output: &'a str, marker: &str) -> (&'a str, Option<&'a str>) {
    match output.find(marker) {
        Some(idx) => {
            let block = output[idx + marker.len()..].trim_start_matches(['\r', '\n']);
            (&output[..idx], Some(block))
        }
        None => (output, None),
    }
}

/// Serializes tests that mutate the process environment.
#[cfg(test)]
pub static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Variables captured from a subshell's `set` dump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvironmentSnapshot {
    /// Parse a `KEY=VALUE` dump. Lines without a key before `=`, and the
    /// hidden per-drive `=C:` entries, are dropped.
    pub fn parse(block: &str) -> Self {
        let vars = block
            .split('\n')
            .map(|line| line.trim_end_matches('\r'))
            .filter_map(split_assignment)
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self { vars }
    }

    /// [`take_exit_code_named`](Self::take_exit_code_named) for [`EXIT_VAR`].
    pub fn take_exit_code(&mut self) -> i32 {
        self.take_exit_code_named(EXIT_VAR)
    }

    /// Remove every spelling of `name` and return its value, 0 when absent
    /// or unparsable.
    pub fn take_exit_code_named(&mut self, name: &str) -> i32 {
        let keys: Vec<String> = self
            .vars
            .keys()
            .filter(|key| key.eq_ignore_ascii_case(name))
            .cloned()
            .collect();

        let mut code = None;
        for key in keys {
            if let Some(value) = self.vars.remove(&key) {
                code = code.or_else(|| value.trim().parse().ok());
            }
        }
        code.unwrap_or(0)
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvironmentSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn split_assignment(line: &str) -> Option<(&str, &str)> {
    let idx = line.find('=')?;
    if idx == 0 {
        return None;
    }
    let key = line[..idx].trim();
    if key.is_empty() || key.starts_with('=') {
        return None;
    }
    Some((key, &line[idx + 1..]))
}

/// Whether variable names compare with or without regard to case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCase {
    Sensitive,
    Insensitive,
}

impl KeyCase {
    /// Windows environment names are case-insensitive; everywhere else they
    /// are not.
    pub fn for_platform() -> Self {
        if cfg!(windows) {
            KeyCase::Insensitive
        } else {
            KeyCase::Sensitive
        }
    }

    fn normalize(self, key: &str) -> String {
        match self {
            KeyCase::Sensitive => key.to_string(),
            KeyCase::Insensitive => key.to_uppercase(),
        }
    }
}

/// Changes needed to turn one environment into another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvDiff {
    pub assign: BTreeMap<String, String>,
    pub unset: Vec<String>,
}

impl EnvDiff {
    pub fn compute<'a>(
        current: impl IntoIterator<Item = (&'a str, &'a str)>,
        snapshot: &'a EnvironmentSnapshot,
        case: KeyCase,
    ) -> Self {
        let normalize = |entries: Vec<(&'a str, &'a str)>| -> HashMap<String, (&'a str, &'a str)> {
            entries
                .into_iter()
                .map(|(k, v)| (k.trim(), v))
                .filter(|(k, _)| !k.is_empty() && !k.starts_with('='))
                .map(|(k, v)| (case.normalize(k), (k, v)))
                .collect()
        };

        let current = normalize(current.into_iter().collect());
        let next = normalize(snapshot.iter().collect());

        let mut diff = EnvDiff::default();
        for (norm, (key, value)) in &next {
            match current.get(norm) {
                Some((cur_key, cur_value)) if cur_key == key && cur_value == value => {}
                _ => {
                    diff.assign.insert(key.to_string(), value.to_string());
                }
            }
        }
        for (norm, (key, _)) in &current {
            if !next.contains_key(norm) {
                diff.unset.push(key.to_string());
            }
        }
        diff.unset.sort();
        diff
    }

    pub fn is_empty(&self) -> bool {
        self.assign.is_empty() && self.unset.is_empty()
    }

    /// Apply to this process: assignments first, then removals, in sorted
    /// order. Must only run on the controller thread.
    pub fn apply(&self) {
        for (key, value) in &self.assign {
            env::set_var(key, value);
        }
        for key in &self.unset {
            env::remove_var(key);
        }
        debug!(
            assigned = self.assign.len(),
            unset = self.unset.len(),
            "environment synchronized"
        );
    }
}

/// Diff `snapshot` against the live process environment.
pub fn diff_process_environment(snapshot: &EnvironmentSnapshot) -> EnvDiff {
    let current: Vec<(String, String)> = env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect();
    EnvDiff::compute(
        current.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        snapshot,
        KeyCase::for_platform(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_cmd_shell() {
        assert!(is_cmd_shell("cmd"));
        assert!(is_cmd_shell("CMD.EXE"));
        assert!(is_cmd_shell(r"C:\Windows\System32\cmd.exe"));
        assert!(!is_cmd_shell("powershell.exe"));
        assert!(!is_cmd_shell("/bin/bash"));
        assert!(!is_cmd_shell(""));
    }

    #[test]
    fn test_activation_heuristics() {
        let rules = ActivationRules::default();
        for line in [
            r".venv\Scripts\activate",
            r".venv\Scripts\activate.bat",
            "env/Scripts/activate",
            "conda activate ml",
            "conda deactivate",
            "deactivate",
            "DEACTIVATE ",
            r"call C:\envs\api\Scripts\activate",
            "call deactivate",
        ] {
            assert!(rules.is_activation(line), "{line} should match");
        }
        for line in ["", "dir", "conda list", "echo activate", "deactivated-thing"] {
            assert!(!rules.is_activation(line), "{line} should not match");
        }
    }

    #[test]
    fn test_rules_are_extensible() {
        let mut rules = ActivationRules::default();
        assert!(!rules.is_activation("workon api"));
        rules.push(ActivationRule::new(MatchKind::Prefix, "workon "));
        assert!(rules.is_activation("workon api"));
    }

    #[test]
    fn test_wrap_command() {
        assert_eq!(
            wrap_command("conda activate ml"),
            "conda activate ml & set \"__VEIL_EXIT_CODE=!ERRORLEVEL!\" & echo __VEIL_ENV_SYNC_BEGIN__ & set"
        );
    }

    #[test]
    fn test_split_output() {
        let output = format!("activated\r\n{} \r\nPATH=C:\\x\r\n", MARKER);
        let (pre, block) = split_output(&output, MARKER);
        assert_eq!(pre, "activated\r\n");
        assert_eq!(block, Some(" \r\nPATH=C:\\x\r\n"));

        let (pre, block) = split_output("no marker here", MARKER);
        assert_eq!(pre, "no marker here");
        assert_eq!(block, None);
    }

    #[test]
    fn test_parse_block_and_exit_code() {
        let mut snapshot = EnvironmentSnapshot::parse("PATH=C:\\Windows\r\n__EXIT__=9\r\n");
        assert_eq!(snapshot.get("PATH"), Some("C:\\Windows"));
        assert_eq!(snapshot.take_exit_code_named("__EXIT__"), 9);
        assert_eq!(snapshot.get("__EXIT__"), None);
        assert_eq!(snapshot.len(), 1);

        let mut snapshot_with_var =
            EnvironmentSnapshot::parse("PATH=C:\\Windows\r\n__veil_exit_code=9\r\n");
        assert_eq!(snapshot_with_var.take_exit_code(), 9);
        assert_eq!(snapshot_with_var.get("__veil_exit_code"), None);
        assert_eq!(snapshot_with_var.get("PATH"), Some("C:\\Windows"));
        assert_eq!(snapshot_with_var.len(), 1);
    }

    #[test]
    fn test_other_exit_variables_are_kept() {
        let mut snapshot = EnvironmentSnapshot::parse("PATH=C:\\Windows\r\n__EXIT__=9\r\n");
        assert_eq!(snapshot.take_exit_code(), 0);
        assert_eq!(snapshot.get("__EXIT__"), Some("9"));
    }

    #[test]
    fn test_parse_discards_malformed_lines() {
        let snapshot =
            EnvironmentSnapshot::parse("=C:=C:\\repo\nnot a var\nA=1=2\n  \nB=\nECHO is on.\n");
        let vars: Vec<_> = snapshot.iter().collect();
        assert_eq!(vars, vec![("A", "1=2"), ("B", "")]);
    }

    #[test]
    fn test_unparsable_exit_code_defaults_to_zero() {
        let mut snapshot = EnvironmentSnapshot::parse(&format!("{}=!ERRORLEVEL!\n", EXIT_VAR));
        assert_eq!(snapshot.take_exit_code(), 0);
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_diff_case_insensitive() {
        let current = [
            ("PATH", r"C:\Windows"),
            ("VIRTUAL_ENV", r"C:\repo\.venv"),
            ("KEEP", "1"),
        ];
        let snapshot: EnvironmentSnapshot = [
            ("Path", r"C:\repo\.venv\Scripts;C:\Windows"),
            ("CONDA_DEFAULT_ENV", "base"),
            ("keep", "1"),
        ]
        .into_iter()
        .collect();

        let diff = EnvDiff::compute(current, &snapshot, KeyCase::Insensitive);

        assert_eq!(diff.assign.len(), 3);
        assert_eq!(
            diff.assign.get("Path").map(String::as_str),
            Some(r"C:\repo\.venv\Scripts;C:\Windows")
        );
        assert_eq!(diff.assign.get("CONDA_DEFAULT_ENV").map(String::as_str), Some("base"));
        // same value, different spelling of the name
        assert_eq!(diff.assign.get("keep").map(String::as_str), Some("1"));
        assert_eq!(diff.unset, vec!["VIRTUAL_ENV"]);
    }

    #[test]
    fn test_diff_venv_to_conda() {
        let current = [
            ("PATH", r"C:\Windows"),
            ("VIRTUAL_ENV", r"C:\repo\.venv"),
            ("KEEP", "1"),
        ];
        let snapshot: EnvironmentSnapshot = [
            ("PATH", r"C:\repo\.venv\Scripts;C:\Windows"),
            ("CONDA_DEFAULT_ENV", "base"),
            ("KEEP", "1"),
        ]
        .into_iter()
        .collect();

        for case in [KeyCase::Insensitive, KeyCase::Sensitive] {
            let diff = EnvDiff::compute(current, &snapshot, case);
            let assigned: Vec<_> = diff.assign.keys().map(String::as_str).collect();
            assert_eq!(assigned, vec!["CONDA_DEFAULT_ENV", "PATH"]);
            assert_eq!(diff.unset, vec!["VIRTUAL_ENV"]);
        }
    }

    #[test]
    fn test_diff_case_sensitive_treats_spellings_as_distinct() {
        let current = [("Path", "/usr/bin"), ("HOME", "/home/u")];
        let snapshot: EnvironmentSnapshot =
            [("PATH", "/usr/bin"), ("HOME", "/home/u")].into_iter().collect();

        let diff = EnvDiff::compute(current, &snapshot, KeyCase::Sensitive);
        assert_eq!(diff.assign.keys().collect::<Vec<_>>(), vec!["PATH"]);
        assert_eq!(diff.unset, vec!["Path"]);

        let diff = EnvDiff::compute(current, &snapshot, KeyCase::Insensitive);
        assert_eq!(diff.assign.keys().collect::<Vec<_>>(), vec!["PATH"]);
        assert!(diff.unset.is_empty());
    }

    #[test]
    fn test_unset_is_sorted() {
        let current = [("ZED", "1"), ("ALPHA", "1"), ("MID", "1")];
        let diff = EnvDiff::compute(current, &EnvironmentSnapshot::default(), KeyCase::Sensitive);
        assert_eq!(diff.unset, vec!["ALPHA", "MID", "ZED"]);
        assert!(!diff.is_empty());
    }

    #[test]
    fn test_apply_mutates_process_environment() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let set_key = "__VEIL_TEST_APPLY_SET";
        let unset_key = "__VEIL_TEST_APPLY_UNSET";
        env::set_var(unset_key, "old");

        let diff = EnvDiff {
            assign: [(set_key.to_string(), "new".to_string())].into_iter().collect(),
            unset: vec![unset_key.to_string()],
        };
        diff.apply();

        assert_eq!(env::var(set_key).as_deref(), Ok("new"));
        assert!(env::var(unset_key).is_err());
        env::remove_var(set_key);
    }
}
