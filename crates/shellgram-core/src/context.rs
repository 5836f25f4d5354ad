//! Dispatcher-owned state shared by every handler.
//!
//! One [`DispatchContext`] is built at startup and passed by reference to
//! each handler invocation. It owns the allow-list, the alias table, the
//! task registry, the current working directory and the reply channel.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::warn;

use shellgram_channels::Channel;
use shellgram_types::config::Config;
use shellgram_types::event::{InboundMessage, OutboundMessage};

use crate::auth::AllowList;
use crate::registry::TaskRegistry;
use crate::resolver::CommandResolver;
use crate::runner::TaskRunner;

pub struct DispatchContext {
    channel: Arc<dyn Channel>,
    registry: Arc<TaskRegistry>,
    allow_list: AllowList,
    resolver: CommandResolver,
    runner: TaskRunner,
    /// Written only by the `/cd` handler on the dispatch loop; read by
    /// every task start.
    working_dir: RwLock<PathBuf>,
}

impl DispatchContext {
    pub fn new(
        channel: Arc<dyn Channel>,
        allow_list: AllowList,
        resolver: CommandResolver,
        working_dir: PathBuf,
    ) -> Self {
        let registry = Arc::new(TaskRegistry::new());
        let runner = TaskRunner::new(Arc::clone(&registry), Arc::clone(&channel));
        Self {
            channel,
            registry,
            allow_list,
            resolver,
            runner,
            working_dir: RwLock::new(working_dir),
        }
    }

    /// Build the context from a loaded [`Config`].
    ///
    /// The initial working directory is `config.working_dir`, falling back to
    /// the process's current directory.
    pub fn from_config(config: &Config, channel: Arc<dyn Channel>) -> Self {
        let working_dir = config
            .working_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(
            channel,
            AllowList::new(config.allow_set()),
            CommandResolver::new(config.commands.clone()),
            working_dir,
        )
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    pub fn resolver(&self) -> &CommandResolver {
        &self.resolver
    }

    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    pub fn runner(&self) -> &TaskRunner {
        &self.runner
    }

    pub fn channel(&self) -> &Arc<dyn Channel> {
        &self.channel
    }

    /// Current working directory for new tasks and `/file` lookups.
    pub fn working_dir(&self) -> PathBuf {
        self.working_dir.read().clone()
    }

    pub(crate) fn set_working_dir(&self, dir: PathBuf) {
        *self.working_dir.write() = dir;
    }

    /// Resolve `path` against the current working directory.
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        self.working_dir.read().join(path)
    }

    /// Send a plain-text reply. Failures are logged and dropped.
    pub async fn reply(&self, to: &InboundMessage, text: impl Into<String>) {
        send_logged(&*self.channel, &to.reply(text)).await;
    }

    /// Send an HTML reply. Failures are logged and dropped.
    pub async fn reply_html(&self, to: &InboundMessage, html: impl Into<String>) {
        send_logged(&*self.channel, &to.reply_html(html)).await;
    }
}

/// Best-effort send: a transport failure is logged, never retried.
pub(crate) async fn send_logged(channel: &dyn Channel, msg: &OutboundMessage) {
    if let Err(e) = channel.send(msg).await {
        warn!(chat_id = %msg.chat_id, error = %e, "failed to send reply");
    }
}
