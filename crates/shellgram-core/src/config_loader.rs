//! Configuration file discovery and loading.
//!
//! Discovery order:
//! 1. An explicit path (the `--config` flag).
//! 2. `SHELLGRAM_CONFIG` environment variable.
//! 3. `config.json` in the current directory.
//! 4. `~/.shellgram/config.json`.
//!
//! JSON keys are normalized from camelCase to snake_case before
//! deserialization, so `{"botToken": ..., "whiteList": [...]}` loads as-is.
//! Keys inside `commands` are alias triggers and are left untouched.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use shellgram_types::config::Config;
use shellgram_types::error::ConfigError;

/// Environment variable holding an explicit config path.
pub const CONFIG_ENV_VAR: &str = "SHELLGRAM_CONFIG";

/// File name looked up in the current directory.
pub const LOCAL_CONFIG_FILE: &str = "config.json";

/// Sections whose keys are user data, not schema field names.
const VERBATIM_SECTIONS: &[&str] = &["commands"];

/// Candidate paths in discovery order.
pub fn candidate_paths(
    explicit: Option<&Path>,
    env_value: Option<String>,
    home_dir: Option<PathBuf>,
) -> Vec<PathBuf> {
    if let Some(path) = explicit {
        return vec![path.to_path_buf()];
    }
    if let Some(path) = env_value.filter(|v| !v.is_empty()) {
        return vec![PathBuf::from(path)];
    }
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    if let Some(home) = home_dir {
        paths.push(home.join(".shellgram").join("config.json"));
    }
    paths
}

/// Pick the first existing candidate.
///
/// An explicit path or an env-var path is returned even if it does not exist,
/// so that reading it reports a precise error.
pub fn discover_config_path(
    explicit: Option<&Path>,
    env_value: Option<String>,
    home_dir: Option<PathBuf>,
) -> Result<PathBuf, ConfigError> {
    let pinned = explicit.is_some() || env_value.as_deref().is_some_and(|v| !v.is_empty());
    let candidates = candidate_paths(explicit, env_value, home_dir);
    if pinned {
        return Ok(candidates.into_iter().next().unwrap_or_default());
    }
    candidates
        .iter()
        .find(|p| p.is_file())
        .cloned()
        .ok_or(ConfigError::NotFound { tried: candidates })
}

/// Discover and load the configuration using the process environment.
pub async fn load_config(explicit: Option<&Path>) -> Result<(PathBuf, Config), ConfigError> {
    let path = discover_config_path(
        explicit,
        std::env::var(CONFIG_ENV_VAR).ok(),
        dirs::home_dir(),
    )?;
    let config = load_config_file(&path).await?;
    Ok((path, config))
}

/// Read, normalize and deserialize one config file.
pub async fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config file");
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    parse_config(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse config JSON text, normalizing key case first.
pub fn parse_config(contents: &str) -> Result<Config, serde_json::Error> {
    let raw: Value = serde_json::from_str(contents)?;
    serde_json::from_value(normalize_keys(raw))
}

/// Convert camelCase keys to snake_case recursively, except inside
/// [`VERBATIM_SECTIONS`].
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, val)| {
                    let key = camel_to_snake(&key);
                    let val = if VERBATIM_SECTIONS.contains(&key.as_str()) {
                        val
                    } else {
                        normalize_keys(val)
                    };
                    (key, val)
                })
                .collect(),
        ),
        Value::Array(arr) => Value::Array(arr.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

/// Convert a single camelCase identifier to snake_case.
///
/// A run of capitals is kept together as one word (`"HTMLParser"` ->
/// `"html_parser"`).
///
/// ```
/// # use shellgram_core::config_loader::camel_to_snake;
/// assert_eq!(camel_to_snake("botToken"), "bot_token");
/// assert_eq!(camel_to_snake("whiteList"), "white_list");
/// assert_eq!(camel_to_snake("already_snake"), "already_snake");
/// assert_eq!(camel_to_snake("pollTimeoutSecs"), "poll_timeout_secs");
/// ```
pub fn camel_to_snake(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut result = String::with_capacity(name.len() + 4);

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next = chars.get(i + 1).copied();
            if prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next.is_some_and(|c| c.is_lowercase()))
            {
                result.push('_');
            }
        }
        result.extend(ch.to_lowercase());
    }
    result
}
