//! Sender allow-list.

use std::collections::HashSet;

/// Exact, case-sensitive membership check against the configured senders.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    senders: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(senders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            senders: senders.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_authorized(&self, sender_id: &str) -> bool {
        self.senders.contains(sender_id)
    }
}
