//! Built-in commands: `/help`, `/file`, `/cd`, `/tasks`, `/kill`.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{info, warn};

use shellgram_types::event::InboundEvent;

use super::{Handler, Outcome};
use crate::context::DispatchContext;
use crate::registry::TaskId;

pub(crate) const HELP_TRIGGER: &str = "/help";
pub(crate) const FILE_PREFIX: &str = "/file ";
pub(crate) const CD_PREFIX: &str = "/cd ";
pub(crate) const TASKS_TRIGGER: &str = "/tasks";
pub(crate) const KILL_PREFIX: &str = "/kill ";

pub(crate) const NO_RUNNING_TASKS: &str = "no running tasks";
pub(crate) const INVALID_DIR: &str = "Invalid dir path";

/// Escape the characters Telegram's HTML mode treats as markup.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Replies with the built-in commands and the configured aliases.
pub struct HelpHandler;

impl HelpHandler {
    /// Render the help text as Telegram HTML.
    pub fn render(ctx: &DispatchContext) -> String {
        let mut out = String::new();
        out.push_str("Predefined commands:\n");
        out.push_str("/help - prints help message\n");
        out.push_str("/file &lt;PATH&gt; - sends back a file with the given path\n");
        out.push_str("/cd &lt;PATH&gt; - changes the working directory\n");
        out.push_str("/tasks - lists running tasks\n");
        out.push_str("/kill &lt;ID&gt; - kills a running task\n");
        out.push('\n');
        out.push_str("User commands (script aliases):\n");
        for (trigger, script) in ctx.resolver().aliases() {
            let _ = writeln!(out, "{} - <i>{}</i>", escape_html(trigger), escape_html(script));
        }
        out
    }
}

#[async_trait]
impl Handler for HelpHandler {
    fn name(&self) -> &'static str {
        "help"
    }

    async fn handle(&self, event: &InboundEvent, ctx: &DispatchContext) -> Outcome {
        match event.message() {
            Some(msg) if msg.content == HELP_TRIGGER => {
                ctx.reply_html(msg, Self::render(ctx)).await;
                Outcome::Handled
            }
            _ => Outcome::Pass,
        }
    }
}

/// Uploads a file relative to the working directory.
pub struct FileHandler;

#[async_trait]
impl Handler for FileHandler {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn handle(&self, event: &InboundEvent, ctx: &DispatchContext) -> Outcome {
        let Some(msg) = event.message() else {
            return Outcome::Pass;
        };
        let Some(requested) = msg.content.strip_prefix(FILE_PREFIX) else {
            return Outcome::Pass;
        };

        let path = ctx.resolve_path(requested);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                ctx.reply(msg, format!("{} is not a regular file", path.display()))
                    .await;
                return Outcome::Handled;
            }
            Err(e) => {
                ctx.reply(msg, format!("cannot read {}: {e}", path.display())).await;
                return Outcome::Handled;
            }
        }

        info!(file = %path.display(), chat_id = %msg.chat_id, "sending file");
        if let Err(e) = ctx.channel().send_document(&msg.chat_id, &path).await {
            warn!(file = %path.display(), error = %e, "failed to send file");
            ctx.reply(msg, e.to_string()).await;
        }
        Outcome::Handled
    }
}

/// Changes the working directory used by new tasks and `/file`.
pub struct CdHandler;

#[async_trait]
impl Handler for CdHandler {
    fn name(&self) -> &'static str {
        "cd"
    }

    async fn handle(&self, event: &InboundEvent, ctx: &DispatchContext) -> Outcome {
        let Some(msg) = event.message() else {
            return Outcome::Pass;
        };
        let Some(target) = msg.content.strip_prefix(CD_PREFIX) else {
            return Outcome::Pass;
        };

        match canonical_dir(&ctx.resolve_path(target)).await {
            Some(dir) => {
                info!(dir = %dir.display(), "working directory changed");
                let reply = format!("Current dir is set to '{}'", dir.display());
                ctx.set_working_dir(dir);
                ctx.reply(msg, reply).await;
            }
            None => ctx.reply(msg, INVALID_DIR).await,
        }
        Outcome::Handled
    }
}

/// `path` with `.`, `..` and symlinks resolved, if it names a directory.
async fn canonical_dir(path: &Path) -> Option<PathBuf> {
    let meta = tokio::fs::metadata(path).await.ok()?;
    if !meta.is_dir() {
        return None;
    }
    tokio::fs::canonicalize(path).await.ok()
}

/// Lists the tasks currently in the registry.
pub struct TasksHandler;

impl TasksHandler {
    pub fn render(ctx: &DispatchContext) -> String {
        let tasks = ctx.registry().list();
        if tasks.is_empty() {
            return NO_RUNNING_TASKS.to_owned();
        }
        tasks.iter().fold(String::new(), |mut out, task| {
            let _ = writeln!(out, "{} - {}", task.id, task.command);
            out
        })
    }
}

#[async_trait]
impl Handler for TasksHandler {
    fn name(&self) -> &'static str {
        "tasks"
    }

    async fn handle(&self, event: &InboundEvent, ctx: &DispatchContext) -> Outcome {
        match event.message() {
            Some(msg) if msg.content == TASKS_TRIGGER => {
                ctx.reply(msg, Self::render(ctx)).await;
                Outcome::Handled
            }
            _ => Outcome::Pass,
        }
    }
}

/// Requests cancellation of a task by id.
///
/// Replies only on a malformed or unknown id; a successful kill is
/// reported by the task's own runner when the process exits.
pub struct KillHandler;

#[async_trait]
impl Handler for KillHandler {
    fn name(&self) -> &'static str {
        "kill"
    }

    async fn handle(&self, event: &InboundEvent, ctx: &DispatchContext) -> Outcome {
        let Some(msg) = event.message() else {
            return Outcome::Pass;
        };
        let Some(raw_id) = msg.content.strip_prefix(KILL_PREFIX) else {
            return Outcome::Pass;
        };

        let Ok(id) = raw_id.parse::<u64>().map(TaskId) else {
            ctx.reply(msg, format!("invalid task id: {raw_id}")).await;
            return Outcome::Handled;
        };

        match ctx.registry().cancel(id) {
            Ok(()) => info!(task_id = %id, "kill requested"),
            Err(e) => ctx.reply(msg, e.to_string()).await,
        }
        Outcome::Handled
    }
}
