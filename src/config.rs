use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::diagnostics::CompileError;

pub const CONFIG_FILE: &str = "keel.toml";

/// Project settings read from `keel.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Treat warnings as errors when deciding the exit status.
    pub deny_warnings: bool,
    /// Load the standard library before user code.
    pub stdlib_enabled: bool,
    /// Alternative prelude source, resolved relative to the config file.
    pub stdlib_path: Option<PathBuf>,
}

// ---- TOML deserialization types ----

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    #[serde(default)]
    analysis: TomlAnalysis,
    #[serde(default)]
    stdlib: TomlStdlib,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlAnalysis {
    #[serde(default)]
    deny_warnings: bool,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlStdlib {
    #[serde(default = "default_enabled")]
    enabled: bool,
    path: Option<String>,
}

impl Default for TomlStdlib {
    fn default() -> Self {
        Self { enabled: default_enabled(), path: None }
    }
}

fn default_enabled() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Settings used when no `keel.toml` is found.
    pub fn defaults() -> Self {
        Self { deny_warnings: false, stdlib_enabled: true, stdlib_path: None }
    }

    pub fn load(path: &Path) -> Result<Config, CompileError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CompileError::config(format!("{CONFIG_FILE}: could not read file: {e}"), path.to_path_buf())
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Config, CompileError> {
        let raw: TomlConfig = toml::from_str(content).map_err(|e| {
            CompileError::config(format!("{CONFIG_FILE}: invalid syntax: {e}"), path.to_path_buf())
        })?;

        let stdlib_path = match raw.stdlib.path {
            Some(p) if p.trim().is_empty() => {
                return Err(CompileError::config(
                    format!("{CONFIG_FILE}: [stdlib] path must not be empty"),
                    path.to_path_buf(),
                ));
            }
            Some(p) => {
                let dir = path.parent().unwrap_or(Path::new("."));
                Some(dir.join(p))
            }
            None => None,
        };

        Ok(Config {
            deny_warnings: raw.analysis.deny_warnings,
            stdlib_enabled: raw.stdlib.enabled,
            stdlib_path,
        })
    }

    /// Walk from `start_dir` up to a `.git` boundary or the filesystem root
    /// looking for `keel.toml`. Falls back to [`Config::defaults`].
    pub fn discover(start_dir: &Path) -> Result<Config, CompileError> {
        match find_config_walk(start_dir) {
            Some(path) => Self::load(&path),
            None => Ok(Self::defaults()),
        }
    }

    /// Source of the prelude to inject, or `None` when the standard library
    /// is disabled.
    pub fn prelude_source(&self) -> Result<Option<String>, CompileError> {
        if !self.stdlib_enabled {
            return Ok(None);
        }
        match &self.stdlib_path {
            Some(path) => std::fs::read_to_string(path)
                .map(Some)
                .map_err(|e| CompileError::config(format!("could not read standard library: {e}"), path.clone())),
            None => Ok(Some(crate::stdlib::PRELUDE_SOURCE.to_string())),
        }
    }
}

fn find_config_walk(start_dir: &Path) -> Option<PathBuf> {
    let mut dir = start_dir.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if dir.join(".git").exists() {
            return None;
        }
        if !dir.pop() {
            return None;
        }
    }
}
