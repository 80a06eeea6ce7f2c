//! Telegram Bot API over plain HTTPS: long polling in, JSON method calls out.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use taskbot_core::commands::{MENU_HELP, MENU_TASKS, MENU_WEATHER};
use taskbot_core::{parse_command, Keyboard};

use crate::error::ServiceError;
use crate::gateway::{ChatId, EditOutcome, InboundEvent, Markup, MessageHandle, MessagingGateway};

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
pub const LONG_POLL_TIMEOUT_SECS: u64 = 20;
const PARSE_MODE: &str = "HTML";
const NOT_MODIFIED: &str = "message is not modified";

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub first_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub message: Option<Message>,
}

pub struct TelegramClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
}

impl TelegramClient {
    /// `timeout` bounds every call and must exceed [`LONG_POLL_TIMEOUT_SECS`].
    pub fn new(
        token: impl Into<String>,
        api_base: &str,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T, ServiceError> {
        let url = format!("{}/bot{}/{}", self.api_base, self.token, method);
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(ServiceError::from_request)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(ServiceError::from_request)?;
        decode_response(method, status, &text)
    }

    /// Fetch the next batch of updates; returns them with the offset to poll from next.
    pub async fn poll_updates(&self, offset: i64) -> Result<(Vec<Update>, i64), ServiceError> {
        let body = updates_request(offset, LONG_POLL_TIMEOUT_SECS);
        let updates: Vec<Update> = self.call("getUpdates", &body).await?;
        let next_offset = updates
            .iter()
            .fold(offset, |next, update| next.max(update.update_id.saturating_add(1)));
        Ok((updates, next_offset))
    }

    /// Confirm every update below `offset` without waiting for new ones. Updates
    /// at or above `offset` stay queued on the server.
    pub async fn acknowledge(&self, offset: i64) -> Result<(), ServiceError> {
        let _: Vec<Update> = self.call("getUpdates", &updates_request(offset, 0)).await?;
        Ok(())
    }

    pub async fn set_my_commands(&self, commands: &[(&str, &str)]) -> Result<(), ServiceError> {
        let commands = commands
            .iter()
            .map(|(command, description)| json!({ "command": command, "description": description }))
            .collect::<Vec<_>>();
        let _: bool = self
            .call("setMyCommands", &json!({ "commands": commands }))
            .await?;
        Ok(())
    }

    pub async fn set_my_description(&self, description: &str) -> Result<(), ServiceError> {
        let _: bool = self
            .call("setMyDescription", &json!({ "description": description }))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl MessagingGateway for TelegramClient {
    async fn deliver(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<&Markup>,
    ) -> Result<MessageHandle, ServiceError> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": PARSE_MODE,
            "disable_web_page_preview": true,
        });
        if let Some(markup) = markup {
            body["reply_markup"] = markup_json(markup);
        }
        let sent: Message = self.call("sendMessage", &body).await?;
        Ok(MessageHandle(sent.message_id))
    }

    async fn edit(
        &self,
        chat_id: ChatId,
        message: MessageHandle,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<EditOutcome, ServiceError> {
        let mut body = json!({
            "chat_id": chat_id,
            "message_id": message.0,
            "text": text,
            "parse_mode": PARSE_MODE,
            "disable_web_page_preview": true,
        });
        if let Some(keyboard) = keyboard {
            body["reply_markup"] = inline_keyboard(keyboard);
        }
        match self.call::<Value>("editMessageText", &body).await {
            Ok(_) => Ok(EditOutcome::Edited),
            Err(ServiceError::Api { description, .. }) if description.contains(NOT_MODIFIED) => {
                tracing::debug!(chat_id, message_id = message.0, "message not modified");
                Ok(EditOutcome::NotModified)
            }
            Err(err) => Err(err),
        }
    }

    async fn notify(&self, token: &str, text: &str, urgent: bool) -> Result<(), ServiceError> {
        let body = json!({
            "callback_query_id": token,
            "text": text,
            "show_alert": urgent,
        });
        let _: bool = self.call("answerCallbackQuery", &body).await?;
        Ok(())
    }
}

fn updates_request(offset: i64, timeout_secs: u64) -> Value {
    json!({
        "offset": offset,
        "timeout": timeout_secs,
        "allowed_updates": ["message", "callback_query"],
    })
}

fn decode_response<T: DeserializeOwned>(
    method: &str,
    status: u16,
    body: &str,
) -> Result<T, ServiceError> {
    let parsed: ApiResponse<T> = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(_) if !(200..300).contains(&status) => {
            return Err(ServiceError::Status {
                status,
                detail: None,
            })
        }
        Err(err) => return Err(ServiceError::Decode(format!("{method}: {err}"))),
    };

    if !parsed.ok {
        if let Some(retry_after_secs) = parsed.parameters.and_then(|p| p.retry_after) {
            return Err(ServiceError::RateLimited { retry_after_secs });
        }
        return Err(ServiceError::Api {
            code: parsed.error_code,
            description: parsed
                .description
                .unwrap_or_else(|| format!("telegram {method} failed")),
        });
    }

    parsed
        .result
        .ok_or_else(|| ServiceError::Decode(format!("{method}: missing result")))
}

pub fn markup_json(markup: &Markup) -> Value {
    match markup {
        Markup::Inline(keyboard) => inline_keyboard(keyboard),
        Markup::MainMenu => main_menu_keyboard(),
        Markup::ForceReply => json!({ "force_reply": true, "selective": true }),
    }
}

fn inline_keyboard(keyboard: &Keyboard) -> Value {
    let rows = keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|button| {
                    json!({
                        "text": button.label,
                        "callback_data": button.action.encode(),
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    json!({ "inline_keyboard": rows })
}

fn main_menu_keyboard() -> Value {
    json!({
        "keyboard": [[MENU_TASKS, MENU_WEATHER], [MENU_HELP]],
        "resize_keyboard": true,
    })
}

/// Strip a raw update down to what the assistant handles. Updates without text
/// or without a source message yield `None`.
pub fn update_into_event(update: Update) -> Option<InboundEvent> {
    if let Some(query) = update.callback_query {
        let Some(message) = query.message else {
            tracing::debug!(update_id = update.update_id, "callback without message ignored");
            return None;
        };
        return Some(InboundEvent::Action {
            chat_id: message.chat.id,
            message: MessageHandle(message.message_id),
            token: query.id,
            descriptor: query.data.unwrap_or_default(),
        });
    }

    let message = update.message?;
    let text = message.text?;
    let chat_id = message.chat.id;
    if text.starts_with('/') {
        if let Some(command) = parse_command(&text) {
            return Some(InboundEvent::Command {
                chat_id,
                command,
                sender: message.from.map(|user| user.first_name),
            });
        }
    }
    Some(InboundEvent::FreeText { chat_id, text })
}
