//! HTTP client wrapper for the Telegram Bot API.
//!
//! [`TelegramClient`] provides typed methods for `getMe`, `getUpdates`,
//! `sendMessage` and `sendDocument`.

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use shellgram_types::error::ChannelError;
use shellgram_types::secret::BotToken;

use super::types::{Message, SendMessageRequest, TelegramResponse, Update, User};

/// Slack added on top of the long-poll timeout before the HTTP request
/// itself is abandoned.
const HTTP_TIMEOUT_SLACK_SECS: u64 = 10;

/// Upper bound for `getMe` and `sendMessage`. Replies are sent inline on the
/// dispatch loop, so a stalled request must not hold it indefinitely.
const SEND_TIMEOUT_SECS: u64 = 30;

/// Upper bound for `sendDocument`.
const UPLOAD_TIMEOUT_SECS: u64 = 120;

/// HTTP client for the Telegram Bot API.
pub struct TelegramClient {
    http: Client,
    /// `https://api.telegram.org/bot{token}` by default. Contains the token;
    /// never log it.
    base_url: String,
    send_timeout: Duration,
    upload_timeout: Duration,
}

impl TelegramClient {
    /// Create a client for the given bot token.
    pub fn new(token: &BotToken) -> Self {
        Self::with_base_url(format!("https://api.telegram.org/bot{}", token.expose()))
    }

    /// Create a client pointing at a custom base URL (for tests / proxies).
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            http: Client::new(),
            base_url,
            send_timeout: Duration::from_secs(SEND_TIMEOUT_SECS),
            upload_timeout: Duration::from_secs(UPLOAD_TIMEOUT_SECS),
        }
    }

    /// Override the request timeouts for messages and document uploads.
    pub fn with_timeouts(mut self, send: Duration, upload: Duration) -> Self {
        self.send_timeout = send;
        self.upload_timeout = upload;
        self
    }

    /// Return the base URL used for API requests.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    /// Fetch new updates using long polling.
    ///
    /// `offset` is the ID of the first update to return; `timeout` is the
    /// long-poll timeout in seconds.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout: u64,
    ) -> Result<Vec<Update>, ChannelError> {
        let mut url = format!("{}?timeout={timeout}", self.method_url("getUpdates"));
        if let Some(off) = offset {
            url.push_str(&format!("&offset={off}"));
        }

        trace!(?offset, timeout, "polling for updates");

        let resp = self
            .http
            .get(&url)
            .timeout(Duration::from_secs(timeout + HTTP_TIMEOUT_SLACK_SECS))
            .send()
            .await
            .map_err(|e| ChannelError::ConnectionFailed(e.without_url().to_string()))?;

        let updates: Vec<Update> = unwrap_response(resp, ChannelError::ReceiveFailed)
            .await?
            .unwrap_or_default();
        debug!(count = updates.len(), "received updates");
        Ok(updates)
    }

    /// Send a text message to a chat.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<&str>,
        reply_to: Option<i64>,
    ) -> Result<Message, ChannelError> {
        let req = SendMessageRequest {
            chat_id,
            text: text.to_owned(),
            parse_mode: parse_mode.map(str::to_owned),
            reply_to_message_id: reply_to,
        };

        debug!(chat_id, len = text.len(), "sending message");

        let resp = self
            .http
            .post(self.method_url("sendMessage"))
            .timeout(self.send_timeout)
            .json(&req)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed(e.without_url().to_string()))?;

        unwrap_response(resp, ChannelError::SendFailed)
            .await?
            .ok_or_else(|| ChannelError::SendFailed("missing result in response".into()))
    }

    /// Upload a local file to a chat as a document.
    pub async fn send_document(&self, chat_id: i64, path: &Path) -> Result<Message, ChannelError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ChannelError::SendFailed(format!("open {}: {e}", path.display())))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_owned());

        debug!(chat_id, file = %path.display(), size = bytes.len(), "uploading document");

        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", Part::bytes(bytes).file_name(file_name));

        let resp = self
            .http
            .post(self.method_url("sendDocument"))
            .timeout(self.upload_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed(e.without_url().to_string()))?;

        unwrap_response(resp, ChannelError::SendFailed)
            .await?
            .ok_or_else(|| ChannelError::SendFailed("missing result in response".into()))
    }

    /// Verify the bot token by calling `getMe`.
    pub async fn get_me(&self) -> Result<User, ChannelError> {
        debug!("verifying bot token");

        let resp = self
            .http
            .get(self.method_url("getMe"))
            .timeout(self.send_timeout)
            .send()
            .await
            .map_err(|e| ChannelError::ConnectionFailed(e.without_url().to_string()))?;

        unwrap_response(resp, ChannelError::AuthFailed)
            .await?
            .ok_or_else(|| ChannelError::AuthFailed("missing result in response".into()))
    }
}

/// Decode the `{ ok, result, description }` envelope, mapping failures
/// through `err`.
async fn unwrap_response<T: DeserializeOwned>(
    resp: reqwest::Response,
    err: fn(String) -> ChannelError,
) -> Result<Option<T>, ChannelError> {
    let body: TelegramResponse<T> = resp
        .json()
        .await
        .map_err(|e| err(e.without_url().to_string()))?;

    if !body.ok {
        return Err(err(body.description.unwrap_or_else(|| "unknown error".into())));
    }
    Ok(body.result)
}
