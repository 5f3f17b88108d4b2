//! `.env` file support
//!
//! Values from the file only fill gaps: a key already set in the process
//! environment keeps its process value.

use crate::error::{ConfigError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable that points at an explicit `.env` file
pub const ENV_FILE_VAR: &str = "PROXYSTACK_ENV_FILE";

/// Parsed contents of a `.env` file
#[derive(Debug, Clone, Default)]
pub struct EnvFile {
    path: Option<PathBuf>,
    vars: BTreeMap<String, String>,
}

impl EnvFile {
    /// An empty file, used when no `.env` exists
    pub fn empty() -> Self {
        Self::default()
    }

    /// Read and parse a `.env` file
    #[tracing::instrument]
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::EnvFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let vars = parse(&content);
        info!(
            env_file = %path.display(),
            variable_count = vars.len(),
            "Loaded variables from .env file"
        );

        Ok(Self {
            path: Some(path.to_path_buf()),
            vars,
        })
    }

    /// Load the file if it exists, otherwise return an empty set
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) if p.exists() => Self::load(p),
            Some(p) => {
                debug!(env_file = %p.display(), ".env file not found, skipping");
                Ok(Self::empty())
            }
            None => Ok(Self::empty()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Process environment first, then this file
    pub fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .or_else(|| self.get(key).map(str::to_string))
    }
}

/// Locate the `.env` file to use
///
/// 1. `PROXYSTACK_ENV_FILE` (explicit path)
/// 2. `.env` in the current directory
pub fn find_env_file() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(ENV_FILE_VAR) {
        return Some(PathBuf::from(path));
    }

    let candidate = std::env::current_dir().ok()?.join(".env");
    candidate.exists().then_some(candidate)
}

fn parse(content: &str) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();

    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = line.strip_prefix("export ").unwrap_or(line);

        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            vars.insert(key.to_string(), parse_value(value.trim()).to_string());
        }
    }

    vars
}

/// Quoted values keep everything between the quotes; unquoted values end
/// at the first `#` preceded by whitespace
fn parse_value(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(rest) = value.strip_prefix(quote) {
            if let Some(end) = rest.find(quote) {
                return &rest[..end];
            }
        }
    }

    let bytes = value.as_bytes();
    let comment =
        (1..bytes.len()).find(|&i| bytes[i] == b'#' && bytes[i - 1].is_ascii_whitespace());
    match comment {
        Some(i) => value[..i].trim_end(),
        None => value,
    }
}
