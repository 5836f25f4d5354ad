//! Configuration schema.
//!
//! Mirrors the on-disk JSON file. Keys are normalized from camelCase to
//! snake_case by the loader before deserialization, so `botToken` and
//! `bot_token` are equivalent.
//!
//! ```json
//! {
//!   "botToken": "123456:ABC-DEF",
//!   "whiteList": ["alice"],
//!   "commands": { "/ping": "echo pong" }
//! }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::secret::BotToken;

/// Prefix every alias trigger must start with.
pub const TRIGGER_SIGIL: char = '/';

/// Default Telegram long-poll timeout in seconds.
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

fn default_poll_timeout_secs() -> u64 {
    DEFAULT_POLL_TIMEOUT_SECS
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Chat-backend credential, passed through to the transport only.
    #[serde(default)]
    pub bot_token: BotToken,

    /// Name of an environment variable holding the token. Used when
    /// `bot_token` is empty.
    #[serde(default)]
    pub bot_token_env: Option<String>,

    /// Sender identities allowed to issue commands. Exact, case-sensitive.
    #[serde(default, alias = "allow_list")]
    pub white_list: Vec<String>,

    /// Trigger -> command line aliases.
    #[serde(default)]
    pub commands: BTreeMap<String, String>,

    /// Initial working directory for spawned commands.
    /// Defaults to the process's current directory.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// Long-poll timeout for `getUpdates`.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

impl Config {
    /// Resolve the effective token: `bot_token`, or the variable named by
    /// `bot_token_env` when the former is empty.
    pub fn resolve_token(&self, lookup: impl Fn(&str) -> Option<String>) -> BotToken {
        if !self.bot_token.is_empty() {
            return self.bot_token.clone();
        }
        self.bot_token_env
            .as_deref()
            .and_then(|name| lookup(name))
            .map(BotToken::from)
            .unwrap_or_default()
    }

    /// The allow-list as a set, for per-message membership checks.
    pub fn allow_set(&self) -> HashSet<String> {
        self.white_list.iter().cloned().collect()
    }

    /// Check the parts of the config that do not depend on the environment.
    ///
    /// Returns non-fatal findings as warnings; hard errors (such as a
    /// zero poll timeout) as `Err`.
    pub fn validate(&self) -> Result<Vec<String>, ConfigError> {
        if self.poll_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "poll_timeout_secs must be greater than zero".into(),
            ));
        }

        let mut warnings = Vec::new();
        if self.white_list.is_empty() {
            warnings.push("white_list is empty; every message will be rejected".to_owned());
        }
        for trigger in self.commands.keys() {
            if !trigger.starts_with(TRIGGER_SIGIL) {
                warnings.push(format!(
                    "command alias '{trigger}' does not start with '{TRIGGER_SIGIL}' and can never match"
                ));
            }
        }
        Ok(warnings)
    }
}
