//! Outbound delivery: the chat platform seam, message shapes and fan-out.

use async_trait::async_trait;
use derive_builder::Builder;

pub mod discord_notifier;
pub mod fanout;
pub mod message_builder;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum NotifyError {
    #[error("Chat platform request failed: {0}")]
    Platform(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Invalid message: {0}")]
    InvalidMessage(#[from] EmbedBuilderError),
}

impl From<serenity::Error> for NotifyError {
    fn from(e: serenity::Error) -> Self {
        NotifyError::Platform(Box::new(e))
    }
}

#[derive(Builder, Debug, Clone, Default, PartialEq, Eq)]
#[builder(setter(into, strip_option), default)]
pub struct Embed {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub color: Option<u32>,
    pub image_url: Option<String>,
    pub author_name: Option<String>,
    pub author_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonKind {
    Primary,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub custom_id: String,
    pub label: String,
    pub kind: ButtonKind,
}

/// Platform independent description of one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub content: Option<String>,
    pub embed: Option<Embed>,
    pub attachment: Option<Attachment>,
    pub buttons: Vec<Button>,
}

/// Everything the delivery core needs from the chat platform.
///
/// Resolution methods return `Ok(None)`/`Ok(false)` for targets that no
/// longer exist and reserve `Err` for transport failures.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// The id of the bot's own account.
    async fn bot_user_id(&self) -> Result<u64, NotifyError>;

    /// Returns the channel id if the guild is reachable and the channel is a
    /// text channel or thread inside it.
    async fn resolve_channel(
        &self,
        guild_id: u64,
        channel_id: u64,
    ) -> Result<Option<u64>, NotifyError>;

    /// Finds the role by name, creating it when missing.
    async fn ensure_role(&self, guild_id: u64, name: &str) -> Result<u64, NotifyError>;

    async fn role_members(&self, guild_id: u64, role_id: u64) -> Result<Vec<u64>, NotifyError>;

    async fn add_role(&self, guild_id: u64, user_id: u64, role_id: u64)
    -> Result<(), NotifyError>;

    async fn remove_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
    ) -> Result<(), NotifyError>;

    async fn send_message(
        &self,
        channel_id: u64,
        message: &OutgoingMessage,
    ) -> Result<(), NotifyError>;

    async fn user_exists(&self, user_id: u64) -> Result<bool, NotifyError>;

    async fn send_dm(&self, user_id: u64, message: &OutgoingMessage) -> Result<(), NotifyError>;
}
