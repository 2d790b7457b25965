//! Theme presets and the lookup chain used to find them.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use tracing::debug;

use super::{parse_array, parser, Config};
use crate::error::{Error, Result};

const PRESETS: &[(&str, &str, &str)] = &[
    (
        "minimal",
        "minimal.toml",
        include_str!("../../presets/minimal.toml"),
    ),
    (
        "cyberpunk",
        "cyberpunk.toml",
        include_str!("../../presets/cyberpunk.toml"),
    ),
    (
        "hacker",
        "hacker.toml",
        include_str!("../../presets/hacker.toml"),
    ),
];

/// Where a preset's contents were found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresetSource {
    File(PathBuf),
    Bundled(&'static str),
}

type Resolver = Box<dyn Fn(&str) -> Option<PresetSource>>;

/// Ordered list of places a preset file may live. The first resolver that
/// produces a match wins.
pub struct PresetResolver {
    resolvers: Vec<Resolver>,
    probed: Vec<PathBuf>,
}

impl PresetResolver {
    /// Working directory, then the executable's directory, then the copies
    /// compiled into the binary.
    pub fn from_environment() -> Self {
        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let exe_dir = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        Self::new(cwd, exe_dir)
    }

    pub fn new(cwd: PathBuf, exe_dir: Option<PathBuf>) -> Self {
        let mut dirs = vec![cwd.join("presets")];
        if let Some(exe_dir) = exe_dir {
            let candidate = exe_dir.join("presets");
            if candidate != dirs[0] {
                dirs.push(candidate);
            }
        }

        let mut resolvers: Vec<Resolver> = Vec::new();
        for dir in &dirs {
            let dir = dir.clone();
            resolvers.push(Box::new(move |file| {
                let candidate = dir.join(file);
                candidate.is_file().then(|| PresetSource::File(candidate))
            }));
        }
        resolvers.push(Box::new(|file| {
            PRESETS
                .iter()
                .find(|(_, name, _)| *name == file)
                .map(|(_, _, contents)| PresetSource::Bundled(contents))
        }));

        Self {
            resolvers,
            probed: dirs,
        }
    }

    pub fn resolve(&self, file: &str) -> Result<PresetSource> {
        self.resolvers
            .iter()
            .find_map(|resolve| resolve(file))
            .ok_or_else(|| Error::PresetNotFound {
                file: file.to_string(),
                candidates: self
                    .probed
                    .iter()
                    .map(|dir| dir.join(file).display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// Merge the configured preset into `config`. Only fields the preset sets are
/// overridden; palette keys are added or replaced, never removed.
pub fn apply_preset(config: Config, resolver: &PresetResolver) -> Result<Config> {
    let Some(name) = config.preset.clone() else {
        return Ok(config);
    };

    let file = PRESETS
        .iter()
        .find(|(preset, _, _)| *preset == name)
        .map(|(_, file, _)| *file)
        .ok_or_else(|| Error::UnknownPreset(name.clone()))?;

    let source = resolver.resolve(file)?;
    debug!(preset = %name, source = ?source, "applying preset");

    let (path, contents) = match source {
        PresetSource::File(path) => {
            let contents = fs::read_to_string(&path)?;
            (path, contents)
        }
        PresetSource::Bundled(contents) => (PathBuf::from(file), contents.to_string()),
    };

    let mut merged = config;
    for entry in parser::parse(&path, &contents)? {
        match (entry.section.as_str(), entry.key.as_str()) {
            ("prompt", "symbol") if !entry.value.is_empty() => {
                merged.prompt.symbol = entry.value;
            }
            ("prompt", "segments") => {
                let segments = parse_array(&entry.value);
                if !segments.is_empty() {
                    merged.prompt.segments = segments;
                }
            }
            ("palette", _) => {
                merged.palette.insert(entry.key, entry.value);
            }
            _ => {}
        }
    }

    Ok(merged)
}
