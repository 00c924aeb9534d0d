use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::NotifyError;

use super::{
    dispatcher::{CommandDispatcher, IncomingCommand},
    notifier::Notifier,
};

const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    base_url: String,
    token: String,
    send_timeout: Duration,
}

impl TelegramClient {
    pub fn new(base_url: &str, token: String, send_timeout: Duration) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            send_timeout,
        }
    }

    // Embeds the bot token: errors must be built with `without_url`.
    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    /// Long-polls for updates after `offset`. The request timeout is padded
    /// past `poll_timeout_secs` so the server, not reqwest, ends an idle poll.
    pub async fn get_updates(&self, offset: i64, poll_timeout_secs: u64) -> Result<Vec<Update>, String> {
        let res = self
            .http
            .get(self.method_url("getUpdates"))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", poll_timeout_secs.to_string()),
                ("allowed_updates", r#"["message"]"#.to_string()),
            ])
            .timeout(Duration::from_secs(poll_timeout_secs + 10))
            .send()
            .await
            .map_err(|e| e.without_url().to_string())?;

        let body = res
            .json::<ApiResponse<Vec<Update>>>()
            .await
            .map_err(|e| e.without_url().to_string())?;

        body.into_result()
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), NotifyError> {
        let res = self
            .http
            .post(self.method_url("sendMessage"))
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .timeout(self.send_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotifyError::Timeout
                } else {
                    NotifyError::Delivery(e.without_url().to_string())
                }
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(NotifyError::Delivery(format!("sendMessage failed: {status} {body}")));
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn send(&self, recipient_external_id: &str, text: &str) -> Result<(), NotifyError> {
        let chat_id = recipient_external_id
            .trim()
            .parse::<i64>()
            .map_err(|_| NotifyError::InvalidRecipient(recipient_external_id.to_string()))?;

        self.send_message(chat_id, text).await
    }
}

/// Consumes updates strictly one at a time: a command is fully handled and
/// answered before the next is looked at.
pub async fn run_command_loop(
    client: Arc<TelegramClient>,
    dispatcher: Arc<CommandDispatcher>,
    poll_timeout_secs: u64,
) {
    let mut offset: i64 = 0;

    loop {
        let updates = match client.get_updates(offset, poll_timeout_secs).await {
            Ok(u) => u,
            Err(e) => {
                tracing::warn!("getUpdates failed: {}", e);
                tokio::time::sleep(POLL_RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            let Some((chat_id, incoming)) = update.into_command() else {
                continue;
            };

            let Some(reply) = dispatcher.handle(&incoming).await else {
                continue;
            };

            if let Err(e) = client.send_message(chat_id, &reply).await {
                tracing::warn!(chat_id, "reply failed: {}", e);
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn into_result(self) -> Result<T, String> {
        match (self.ok, self.result) {
            (true, Some(r)) => Ok(r),
            _ => Err(self
                .description
                .unwrap_or_else(|| "telegram api error".to_string())),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<Sender>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Sender {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
}

impl Update {
    /// Reply chat plus the command as the dispatcher sees it. Updates without
    /// text or sender carry no command.
    pub fn into_command(self) -> Option<(i64, IncomingCommand)> {
        let msg = self.message?;
        let from = msg.from?;
        let text = msg.text?;

        let display_name = from
            .username
            .filter(|s| !s.trim().is_empty())
            .or(from.first_name.filter(|s| !s.trim().is_empty()));

        Some((
            msg.chat.id,
            IncomingCommand {
                external_id: from.id.to_string(),
                display_name,
                text,
            },
        ))
    }
}
