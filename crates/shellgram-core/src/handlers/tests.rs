//! Tests for the individual handlers and the chain.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use shellgram_channels::{Channel, ChannelHost, ChannelStatus, MessageId};
use shellgram_types::error::ChannelError;
use shellgram_types::event::{InboundEvent, InboundMessage, MessageFormat, OutboundMessage};

use super::*;
use crate::auth::AllowList;
use crate::context::DispatchContext;
use crate::registry::TaskId;
use crate::resolver::CommandResolver;

// ── Recording channel ────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingChannel {
    sent: parking_lot::Mutex<Vec<OutboundMessage>>,
    documents: parking_lot::Mutex<Vec<(String, PathBuf)>>,
    fail_documents: bool,
}

impl RecordingChannel {
    fn texts(&self) -> Vec<String> {
        self.sent.lock().iter().map(|m| m.content.clone()).collect()
    }

    async fn wait_for_texts(&self, n: usize) -> Vec<String> {
        for _ in 0..500 {
            if self.sent.lock().len() >= n {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.texts()
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    fn name(&self) -> &str {
        "mock"
    }

    fn status(&self) -> ChannelStatus {
        ChannelStatus::Running
    }

    async fn start(
        &self,
        _host: Arc<dyn ChannelHost>,
        _cancel: CancellationToken,
    ) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<MessageId, ChannelError> {
        let mut sent = self.sent.lock();
        sent.push(msg.clone());
        Ok(MessageId(sent.len().to_string()))
    }

    async fn send_document(&self, chat_id: &str, path: &Path) -> Result<MessageId, ChannelError> {
        if self.fail_documents {
            return Err(ChannelError::SendFailed("upload rejected".into()));
        }
        self.documents
            .lock()
            .push((chat_id.to_owned(), path.to_path_buf()));
        Ok(MessageId("doc".into()))
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────

fn context_with(channel: Arc<RecordingChannel>, dir: &Path) -> DispatchContext {
    let mut aliases = BTreeMap::new();
    aliases.insert("/ping".to_owned(), "echo pong".to_owned());
    aliases.insert("/html".to_owned(), "echo <b>&</b>".to_owned());
    DispatchContext::new(
        channel,
        AllowList::new(["alice"]),
        CommandResolver::new(aliases),
        dir.to_path_buf(),
    )
}

fn fixture() -> (Arc<RecordingChannel>, DispatchContext, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let channel = Arc::new(RecordingChannel::default());
    let ctx = context_with(Arc::clone(&channel), dir.path());
    (channel, ctx, dir)
}

fn from(sender: &str, text: &str) -> InboundEvent {
    InboundEvent::Message(InboundMessage::new("mock", sender, "42", text))
}

fn alice(text: &str) -> InboundEvent {
    from("alice", text)
}

// ── Chain ────────────────────────────────────────────────────────────────

#[test]
fn standard_chain_order() {
    assert_eq!(
        HandlerChain::standard().names(),
        vec![
            "non_message",
            "auth",
            "help",
            "file",
            "cd",
            "tasks",
            "kill",
            "command",
            "unsupported",
        ]
    );
}

#[tokio::test]
async fn chain_stops_at_first_handler() {
    let (channel, ctx, _dir) = fixture();
    let chain = HandlerChain::new(vec![Box::new(UnsupportedHandler), Box::new(UnsupportedHandler)]);
    assert_eq!(chain.dispatch(&alice("x"), &ctx).await, Some("unsupported"));
    assert_eq!(channel.texts(), vec!["unsupported command"]);
}

#[tokio::test]
async fn chain_of_passing_handlers_returns_none() {
    let (channel, ctx, _dir) = fixture();
    let chain = HandlerChain::new(vec![Box::new(HelpHandler), Box::new(TasksHandler)]);
    assert_eq!(chain.dispatch(&alice("hello"), &ctx).await, None);
    assert!(channel.texts().is_empty());
}

// ── Gate ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn non_message_is_handled_silently() {
    let (channel, ctx, _dir) = fixture();
    let event = InboundEvent::Unsupported {
        channel: "mock".into(),
        kind: "edited_message".into(),
    };
    let handled = HandlerChain::standard().dispatch(&event, &ctx).await;
    assert_eq!(handled, Some("non_message"));
    assert!(channel.texts().is_empty());
}

#[tokio::test]
async fn unauthorized_sender_gets_one_rejection_and_no_task() {
    let (channel, ctx, _dir) = fixture();
    let chain = HandlerChain::standard();

    for text in ["/ping", "sleep 5", "/tasks", "/kill 1", "/cd /"] {
        assert_eq!(chain.dispatch(&from("bob", text), &ctx).await, Some("auth"));
    }
    assert!(ctx.registry().is_empty());

    tokio::time::sleep(Duration::from_millis(50)).await;
    let texts = channel.texts();
    assert_eq!(texts.len(), 5);
    assert!(texts.iter().all(|t| t == "Sorry, you are not authorized"));
}

#[tokio::test]
async fn authorized_sender_passes_gate() {
    let (_channel, ctx, _dir) = fixture();
    assert_eq!(AuthHandler.handle(&alice("x"), &ctx).await, Outcome::Pass);
    assert_eq!(AuthHandler.handle(&from("Alice", "x"), &ctx).await, Outcome::Handled);
}

// ── /help ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn help_lists_builtins_and_escaped_aliases() {
    let (channel, ctx, _dir) = fixture();
    assert_eq!(HelpHandler.handle(&alice("/help"), &ctx).await, Outcome::Handled);

    let sent = channel.sent.lock().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].format, MessageFormat::Html);
    let body = &sent[0].content;
    assert!(body.starts_with("Predefined commands:\n/help - prints help message\n"));
    assert!(body.contains("/file &lt;PATH&gt;"));
    assert!(body.contains("/kill &lt;ID&gt;"));
    assert!(body.contains("\n\nUser commands (script aliases):\n"));
    assert!(body.contains("/html - <i>echo &lt;b&gt;&amp;&lt;/b&gt;</i>\n"));
    assert!(body.ends_with("/ping - <i>echo pong</i>\n"));
}

#[tokio::test]
async fn help_requires_exact_trigger() {
    let (_channel, ctx, _dir) = fixture();
    assert_eq!(HelpHandler.handle(&alice("/help me"), &ctx).await, Outcome::Pass);
    assert_eq!(HelpHandler.handle(&alice("/helpx"), &ctx).await, Outcome::Pass);
}

// ── /file ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn file_is_resolved_against_working_dir() {
    let (channel, ctx, dir) = fixture();
    std::fs::write(dir.path().join("report.txt"), "data").unwrap();

    assert_eq!(FileHandler.handle(&alice("/file report.txt"), &ctx).await, Outcome::Handled);
    let docs = channel.documents.lock().clone();
    assert_eq!(docs, vec![("42".to_owned(), dir.path().join("report.txt"))]);
    assert!(channel.texts().is_empty());
}

#[tokio::test]
async fn missing_file_replies_with_error() {
    let (channel, ctx, _dir) = fixture();
    FileHandler.handle(&alice("/file nope.txt"), &ctx).await;
    assert!(channel.documents.lock().is_empty());
    let texts = channel.texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].starts_with("cannot read "), "got {texts:?}");
    assert!(texts[0].contains("nope.txt"));
}

#[tokio::test]
async fn directory_is_not_sent() {
    let (channel, ctx, dir) = fixture();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    FileHandler.handle(&alice("/file sub"), &ctx).await;
    assert!(channel.documents.lock().is_empty());
    assert!(channel.texts()[0].ends_with("is not a regular file"));
}

#[tokio::test]
async fn upload_failure_is_relayed_as_text() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), "x").unwrap();
    let channel = Arc::new(RecordingChannel {
        fail_documents: true,
        ..Default::default()
    });
    let ctx = context_with(Arc::clone(&channel), dir.path());

    FileHandler.handle(&alice("/file a.txt"), &ctx).await;
    assert_eq!(channel.texts(), vec!["send failed: upload rejected"]);
}

#[tokio::test]
async fn file_without_argument_is_not_file_request() {
    let (_channel, ctx, _dir) = fixture();
    assert_eq!(FileHandler.handle(&alice("/file"), &ctx).await, Outcome::Pass);
}

// ── /cd ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn cd_to_existing_directory() {
    let (channel, ctx, _dir) = fixture();
    let target = tempfile::tempdir().unwrap();
    let text = format!("/cd {}", target.path().display());

    assert_eq!(CdHandler.handle(&alice(&text), &ctx).await, Outcome::Handled);
    let canonical = target.path().canonicalize().unwrap();
    assert_eq!(ctx.working_dir(), canonical);
    assert_eq!(
        channel.texts(),
        vec![format!("Current dir is set to '{}'", canonical.display())]
    );
}

#[tokio::test]
async fn cd_relative_to_current_dir() {
    let (_channel, ctx, dir) = fixture();
    std::fs::create_dir(dir.path().join("nested")).unwrap();
    CdHandler.handle(&alice("/cd nested"), &ctx).await;
    assert_eq!(ctx.working_dir(), dir.path().join("nested").canonicalize().unwrap());
}

#[tokio::test]
async fn cd_parent_is_normalized() {
    let (channel, ctx, dir) = fixture();
    std::fs::create_dir(dir.path().join("nested")).unwrap();
    let root = dir.path().canonicalize().unwrap();

    CdHandler.handle(&alice("/cd nested"), &ctx).await;
    CdHandler.handle(&alice("/cd .."), &ctx).await;
    CdHandler.handle(&alice("/cd ./nested/../nested/.."), &ctx).await;

    assert_eq!(ctx.working_dir(), root);
    let texts = channel.texts();
    assert_eq!(texts[2], format!("Current dir is set to '{}'", root.display()));
    assert!(texts.iter().all(|t| !t.contains("..")), "got {texts:?}");
}

#[tokio::test]
async fn cd_to_invalid_path_leaves_dir_untouched() {
    let (channel, ctx, dir) = fixture();
    std::fs::write(dir.path().join("plain.txt"), "x").unwrap();

    CdHandler.handle(&alice("/cd /nonexistent"), &ctx).await;
    CdHandler.handle(&alice("/cd plain.txt"), &ctx).await;

    assert_eq!(ctx.working_dir(), dir.path());
    assert_eq!(channel.texts(), vec!["Invalid dir path", "Invalid dir path"]);
}

// ── /tasks ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn tasks_empty() {
    let (channel, ctx, _dir) = fixture();
    assert_eq!(TasksHandler.handle(&alice("/tasks"), &ctx).await, Outcome::Handled);
    assert_eq!(channel.texts(), vec!["no running tasks"]);
}

#[tokio::test]
async fn tasks_lists_one_line_per_entry() {
    let (channel, ctx, _dir) = fixture();
    ctx.registry().register("sleep 10", CancellationToken::new());
    ctx.registry().register("top -b", CancellationToken::new());

    TasksHandler.handle(&alice("/tasks"), &ctx).await;
    assert_eq!(channel.texts(), vec!["1 - sleep 10\n2 - top -b\n"]);
}

#[tokio::test]
async fn tasks_shows_surviving_ids() {
    let (channel, ctx, _dir) = fixture();
    let registry = ctx.registry();
    let first = registry.register("true", CancellationToken::new());
    let second = registry.register("true", CancellationToken::new());
    registry.deregister(first);
    registry.deregister(second);
    registry.register("sleep 10", CancellationToken::new());

    TasksHandler.handle(&alice("/tasks"), &ctx).await;
    assert_eq!(channel.texts(), vec!["3 - sleep 10\n"]);
}

#[tokio::test]
async fn tasks_requires_exact_trigger() {
    let (_channel, ctx, _dir) = fixture();
    assert_eq!(TasksHandler.handle(&alice("/tasks all"), &ctx).await, Outcome::Pass);
}

// ── /kill ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn kill_malformed_id() {
    let (channel, ctx, _dir) = fixture();
    assert_eq!(KillHandler.handle(&alice("/kill abc"), &ctx).await, Outcome::Handled);
    KillHandler.handle(&alice("/kill -1"), &ctx).await;
    assert_eq!(
        channel.texts(),
        vec!["invalid task id: abc", "invalid task id: -1"]
    );
}

#[tokio::test]
async fn kill_unknown_id() {
    let (channel, ctx, _dir) = fixture();
    KillHandler.handle(&alice("/kill 9"), &ctx).await;
    assert_eq!(channel.texts(), vec!["task with ID 9 not found"]);
}

#[tokio::test]
async fn kill_known_id_cancels_silently() {
    let (channel, ctx, _dir) = fixture();
    let token = CancellationToken::new();
    let id = ctx.registry().register("sleep 10", token.clone());
    assert_eq!(id, TaskId(1));

    KillHandler.handle(&alice("/kill 1"), &ctx).await;
    assert!(token.is_cancelled());
    assert!(channel.texts().is_empty());
    // Entry stays until the runner removes it.
    assert_eq!(ctx.registry().len(), 1);
}

// ── command / fallback ───────────────────────────────────────────────────

#[tokio::test]
async fn alias_runs_and_replies() {
    let (channel, ctx, _dir) = fixture();
    assert_eq!(CommandHandler.handle(&alice("/ping"), &ctx).await, Outcome::Handled);
    assert_eq!(channel.wait_for_texts(1).await, vec!["pong\n"]);
}

#[tokio::test]
async fn literal_command_runs_in_working_dir() {
    let (channel, ctx, dir) = fixture();
    std::fs::write(dir.path().join("marker.txt"), "").unwrap();
    CommandHandler.handle(&alice("ls"), &ctx).await;
    assert_eq!(channel.wait_for_texts(1).await, vec!["marker.txt\n"]);
}

#[tokio::test]
async fn unknown_alias_passes_to_fallback() {
    let (channel, ctx, _dir) = fixture();
    assert_eq!(CommandHandler.handle(&alice("/nope"), &ctx).await, Outcome::Pass);

    let handled = HandlerChain::standard().dispatch(&alice("/nope"), &ctx).await;
    assert_eq!(handled, Some("unsupported"));
    assert_eq!(channel.texts(), vec!["unsupported command"]);
}
