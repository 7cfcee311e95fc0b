//! Configuration loading for the mailbox simulator.
//!
//! Supports loading the whole-state JSON snapshot and a handful of runtime
//! tunables from (in order of priority):
//! 1. An explicit path argument
//! 2. A file in the simulator's config directory (`~/.config/mailsim/`)
//! 3. Built-in defaults

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const STATE_FILE: &str = "state.json";
const LIMITS_FILE: &str = "limits.json";

/// Get the simulator's config directory (`~/.config/mailsim/`).
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("mailsim"))
}

/// Get the path to a file within the config directory.
pub fn config_path(filename: &str) -> Option<PathBuf> {
    config_dir().map(|p| p.join(filename))
}

/// Ensure the config directory exists, creating it if necessary.
pub fn ensure_config_dir() -> Result<PathBuf> {
    let dir = config_dir().context("could not determine config directory")?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory: {}", dir.display()))?;
    Ok(dir)
}

/// Load and parse a JSON file from an arbitrary path.
pub fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))
}

/// Save a value as pretty JSON to an arbitrary path.
pub fn save_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content)
        .with_context(|| format!("failed to write config file: {}", path.display()))?;
    Ok(())
}

/// Load and parse a JSON file from the config directory.
pub fn load_json<T: serde::de::DeserializeOwned>(filename: &str) -> Result<T> {
    let path = config_path(filename).context("could not determine config directory")?;
    load_json_file(&path)
}

/// Save a value as JSON to a file in the config directory.
pub fn save_json<T: Serialize>(filename: &str, value: &T) -> Result<()> {
    let dir = ensure_config_dir()?;
    save_json_file(&dir.join(filename), value)
}

/// Check whether a config file exists.
pub fn config_exists(filename: &str) -> bool {
    config_path(filename).is_some_and(|p| p.exists())
}

/// Tunables for the query evaluator (spec §5 concurrency/resource limits).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatorLimits {
    /// Worst-case number of tokens a single query may expand to before
    /// evaluation is rejected with `InvalidQuery`.
    pub max_tokens: usize,
}

impl Default for EvaluatorLimits {
    fn default() -> Self {
        Self { max_tokens: 10_000 }
    }
}

impl EvaluatorLimits {
    /// Load limits using the priority chain: explicit path, config dir file,
    /// then defaults.
    pub fn load(explicit_path: Option<&Path>) -> Self {
        if let Some(path) = explicit_path
            && let Ok(limits) = load_json_file(path)
        {
            return limits;
        }
        if config_exists(LIMITS_FILE)
            && let Ok(limits) = load_json::<Self>(LIMITS_FILE)
        {
            return limits;
        }
        Self::default()
    }
}

/// Default filename for a whole-state snapshot (spec §6.1).
pub fn default_state_path() -> Option<PathBuf> {
    config_path(STATE_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_ends_with_mailsim() {
        let dir = config_dir();
        assert!(dir.is_some());
        assert!(dir.unwrap().ends_with("mailsim"));
    }

    #[test]
    fn test_default_limits() {
        let limits = EvaluatorLimits::default();
        assert_eq!(limits.max_tokens, 10_000);
    }

    #[test]
    fn test_load_json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("limits.json");
        let limits = EvaluatorLimits { max_tokens: 42 };
        save_json_file(&path, &limits).unwrap();
        let loaded: EvaluatorLimits = load_json_file(&path).unwrap();
        assert_eq!(loaded.max_tokens, 42);
    }
}
