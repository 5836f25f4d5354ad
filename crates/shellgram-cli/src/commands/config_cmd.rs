//! `shellgram config` -- display resolved configuration.
//!
//! Prints the configuration as formatted JSON. The bot token is never
//! printed; a separate line on stderr says where it would come from.

use std::path::Path;

use shellgram_types::config::Config;

use super::load;

pub async fn run(config_override: Option<&Path>) -> anyhow::Result<()> {
    let (path, config) = load(config_override).await?;
    eprintln!("config file: {}", path.display());
    eprintln!("bot token: {}", token_source(&config));
    println!("{}", render(&config)?);
    Ok(())
}

/// Pretty JSON with the token field blanked.
pub fn render(config: &Config) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(config)?)
}

fn token_source(config: &Config) -> String {
    if !config.bot_token.is_empty() {
        return "set in config file".to_owned();
    }
    match config.bot_token_env.as_deref() {
        Some(name) if std::env::var(name).is_ok_and(|v| !v.trim().is_empty()) => {
            format!("from ${name}")
        }
        Some(name) => format!("missing (${name} is not set)"),
        None => "missing".to_owned(),
    }
}
