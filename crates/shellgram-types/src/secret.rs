//! Redacting wrapper for the bot credential.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The chat-backend token.
///
/// Opaque to everything except the transport client: `Debug` and `Display`
/// print `[REDACTED]`, serialization writes an empty string, and the raw
/// value is only reachable through [`expose`](BotToken::expose).
#[derive(Clone, Default, PartialEq, Eq)]
pub struct BotToken(String);

impl BotToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw token, for building API URLs.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for BotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("BotToken(\"\")")
        } else {
            f.write_str("BotToken([REDACTED])")
        }
    }
}

impl fmt::Display for BotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.0.is_empty() {
            f.write_str("[REDACTED]")?;
        }
        Ok(())
    }
}

impl Serialize for BotToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // The token never leaves the process through serde.
        serializer.serialize_str("")
    }
}

impl<'de> Deserialize<'de> for BotToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(BotToken)
    }
}

impl From<&str> for BotToken {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for BotToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}
