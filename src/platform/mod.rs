pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

/// Where a message was sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatType {
    /// One-to-one chat with the bot
    Private,
    /// Groups, supergroups and channels
    Group,
}

/// A message received from the chat platform
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub chat_id: i64,
    /// Id of the message, used to thread the reply
    pub message_id: i32,
    pub chat_type: ChatType,
    /// The message text, or the media caption when there is no text
    pub text: String,
    /// True when `text` came from a caption
    pub from_caption: bool,
    /// Display name of the sender, for logging
    pub user_name: Option<String>,
}

/// Outbound side of the chat platform
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Send `text` to `chat_id` as a reply to message `reply_to`.
    async fn send_reply(&self, chat_id: i64, reply_to: i32, text: &str) -> Result<()>;
}
