//! Turns message text into an executable command line.
//!
//! Text starting with the trigger sigil is looked up verbatim in the alias
//! table; anything else is taken literally. Splitting is on single spaces
//! with no quoting or escaping, so an argument cannot contain a space.

use std::collections::BTreeMap;

use shellgram_types::config::TRIGGER_SIGIL;

/// A resolved command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    raw: String,
}

impl CommandLine {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// The full line, as shown by `/tasks`.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Executable name: everything before the first space.
    pub fn program(&self) -> &str {
        self.raw.split(' ').next().unwrap_or_default()
    }

    /// Arguments: every single-space-delimited word after the program.
    ///
    /// Consecutive spaces yield empty arguments.
    pub fn args(&self) -> impl Iterator<Item = &str> {
        self.raw.split(' ').skip(1)
    }
}

/// Resolves message text against the alias table.
#[derive(Debug, Clone, Default)]
pub struct CommandResolver {
    aliases: BTreeMap<String, String>,
}

impl CommandResolver {
    pub fn new(aliases: BTreeMap<String, String>) -> Self {
        Self { aliases }
    }

    /// Resolve `text`, or `None` for an unknown trigger.
    pub fn resolve(&self, text: &str) -> Option<CommandLine> {
        if text.starts_with(TRIGGER_SIGIL) {
            self.aliases.get(text).map(|line| CommandLine::new(line.as_str()))
        } else {
            Some(CommandLine::new(text))
        }
    }

    /// Aliases in trigger order.
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
