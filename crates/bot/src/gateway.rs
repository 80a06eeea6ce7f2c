//! Narrow interfaces to the services the assistant depends on.

use async_trait::async_trait;
use taskbot_core::{Command, Keyboard};

use crate::error::{ResolveError, ServiceError};
use crate::weather::WeatherSnapshot;

pub type ChatId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageHandle(pub i64);

/// Controls attached to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Markup {
    /// Buttons under the message, produced by the list renderer.
    Inline(Keyboard),
    /// The persistent main-menu reply keyboard.
    MainMenu,
    /// Ask the client to open a reply to this message.
    ForceReply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Edited,
    NotModified,
}

#[async_trait]
pub trait MessagingGateway: Send + Sync {
    async fn deliver(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<&Markup>,
    ) -> Result<MessageHandle, ServiceError>;

    async fn edit(
        &self,
        chat_id: ChatId,
        message: MessageHandle,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<EditOutcome, ServiceError>;

    /// Answer an interaction with a transient notification.
    async fn notify(&self, token: &str, text: &str, urgent: bool) -> Result<(), ServiceError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub coordinates: Coordinates,
    pub display_name: String,
}

#[async_trait]
pub trait LocationResolver: Send + Sync {
    async fn resolve(&self, query: &str) -> Result<Place, ResolveError>;
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn fetch(&self, at: Coordinates) -> Result<WeatherSnapshot, ServiceError>;
}

/// Everything the assistant reacts to, already stripped of transport details.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Command {
        chat_id: ChatId,
        command: Command,
        sender: Option<String>,
    },
    FreeText {
        chat_id: ChatId,
        text: String,
    },
    Action {
        chat_id: ChatId,
        message: MessageHandle,
        token: String,
        descriptor: String,
    },
}

impl InboundEvent {
    pub fn chat_id(&self) -> ChatId {
        match self {
            InboundEvent::Command { chat_id, .. }
            | InboundEvent::FreeText { chat_id, .. }
            | InboundEvent::Action { chat_id, .. } => *chat_id,
        }
    }
}
