mod parser;
pub mod theme;

use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::error::{Error, Result};

pub use parser::{parse_array, Entry};

/// Environment variable that points at an explicit config file.
pub const CONFIG_ENV: &str = "VEIL_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub preset: Option<String>,
    pub palette: HashMap<String, String>,
    pub shell: ShellConfig,
    pub prompt: PromptConfig,
    pub history: HistoryConfig,
    pub alias: HashMap<String, String>,
    pub env_sync: EnvSyncConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub executable: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptConfig {
    pub symbol: String,
    pub segments: Vec<String>,
}

/// Extra activation-command patterns, matched against the lowercased line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSyncConfig {
    pub contains: Vec<String>,
    pub prefixes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    pub path: PathBuf,
    pub max_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        let (executable, args) = if cfg!(windows) {
            ("cmd.exe", vec!["/C".to_string()])
        } else {
            ("sh", vec!["-c".to_string()])
        };

        Self {
            preset: None,
            palette: HashMap::new(),
            shell: ShellConfig {
                executable: executable.to_string(),
                args,
            },
            prompt: PromptConfig {
                symbol: ">".to_string(),
                segments: vec!["user".into(), "path".into(), "time".into()],
            },
            history: HistoryConfig {
                path: PathBuf::from("~/.veil/history"),
                max_size: 5000,
            },
            alias: HashMap::new(),
            env_sync: EnvSyncConfig::default(),
        }
    }
}

impl Config {
    /// Load the configuration, returning it together with the file it came
    /// from. When no file exists the defaults are returned with no source.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        let mut config = Self::default();

        let Some(path) = resolve_config_path(explicit) else {
            debug!("no config file found, using defaults");
            config.history.path = expand_home(&config.history.path);
            return Ok((config, None));
        };

        debug!(path = %path.display(), "loading config");
        let source = fs::read_to_string(&path)?;
        config.apply_entries(parser::parse(&path, &source)?)?;
        config.history.path = expand_home(&config.history.path);
        config.validate()?;

        Ok((config, Some(path)))
    }

    fn apply_entries(&mut self, entries: Vec<Entry>) -> Result<()> {
        for Entry {
            section,
            key,
            value,
        } in entries
        {
            match (section.as_str(), key.as_str()) {
                ("", "preset") => {
                    self.preset = Some(value).filter(|v| !v.is_empty());
                }
                ("shell", "executable") => self.shell.executable = value,
                ("shell", "args") => self.shell.args = parse_array(&value),
                ("prompt", "symbol") => self.prompt.symbol = value,
                ("prompt", "segments") => self.prompt.segments = parse_array(&value),
                ("history", "path") => self.history.path = PathBuf::from(value),
                ("history", "max_size") => {
                    self.history.max_size =
                        value
                            .parse()
                            .map_err(|source| Error::InvalidNumber {
                                field: "history.max_size",
                                source,
                            })?;
                }
                ("env_sync", "contains") => self.env_sync.contains = parse_array(&value),
                ("env_sync", "prefixes") => self.env_sync.prefixes = parse_array(&value),
                ("palette", _) => {
                    self.palette.insert(key, value);
                }
                ("alias", _) => {
                    self.alias.insert(key, value);
                }
                _ => warn!(section = %section, key = %key, "ignoring unknown config key"),
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.shell.executable.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "shell.executable cannot be empty".to_string(),
            ));
        }
        if self.history.max_size == 0 {
            return Err(Error::InvalidConfig(
                "history.max_size must be greater than zero".to_string(),
            ));
        }
        if self.history.path.as_os_str().is_empty() {
            return Err(Error::InvalidConfig(
                "history.path cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(path) = explicit {
        candidates.push(path.to_path_buf());
    }
    if let Some(path) = env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        candidates.push(PathBuf::from(path));
    }
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".veil").join("config.toml"));
    }
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("veil").join("config.toml"));
    }

    candidates.into_iter().find(|candidate| candidate.is_file())
}

/// Replace a leading `~` with the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}
