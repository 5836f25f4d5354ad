//! Subcommand implementations and the helpers they share.

pub mod config_cmd;
pub mod run;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use tracing::{info, warn};

use shellgram_core::config_loader::load_config;
use shellgram_types::config::Config;
use shellgram_types::secret::BotToken;

/// Discover, load and validate the configuration.
///
/// Validation warnings are logged; hard validation errors abort.
pub async fn load(config_override: Option<&Path>) -> anyhow::Result<(PathBuf, Config)> {
    let (path, config) = load_config(config_override)
        .await
        .context("failed to load config")?;
    info!(path = %path.display(), "config loaded");

    for warning in config.validate()? {
        warn!("{warning}");
    }
    Ok((path, config))
}

/// Resolve the bot token, failing if neither the file nor the environment
/// provides one.
pub fn require_token(
    config: &Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<BotToken> {
    let token = config.resolve_token(lookup);
    if token.is_empty() {
        anyhow::bail!("no bot token configured: set botToken, or botTokenEnv to a populated variable");
    }
    Ok(token)
}
