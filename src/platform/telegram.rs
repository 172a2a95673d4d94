use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::{BotCommand, ChatId, MessageId, ReplyParameters};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::dispatch::{self, BotContext};
use crate::links::LinkRewriter;
use crate::platform::{ChatType, IncomingMessage, ReplySink};

impl IncomingMessage {
    /// Text or caption of a Telegram message; `None` when it has neither.
    pub fn from_telegram(msg: &Message) -> Option<Self> {
        let (text, from_caption) = match (msg.text(), msg.caption()) {
            (Some(text), _) => (text, false),
            (None, Some(caption)) => (caption, true),
            (None, None) => return None,
        };

        let chat_type = if msg.chat.is_private() {
            ChatType::Private
        } else {
            ChatType::Group
        };

        Some(Self {
            chat_id: msg.chat.id.0,
            message_id: msg.id.0,
            chat_type,
            text: text.to_string(),
            from_caption,
            user_name: msg.from.as_ref().map(|user| user.full_name()),
        })
    }
}

#[async_trait]
impl ReplySink for Bot {
    async fn send_reply(&self, chat_id: i64, reply_to: i32, text: &str) -> Result<()> {
        self.send_message(ChatId(chat_id), text)
            .reply_parameters(ReplyParameters::new(MessageId(reply_to)))
            .await
            .context("sendMessage failed")?;
        Ok(())
    }
}

/// Run the Telegram bot until Ctrl-C
pub async fn run(config: &Config, rewriter: LinkRewriter) -> Result<()> {
    let bot = Bot::new(&config.telegram.bot_token);

    info!("Starting Telegram platform...");

    let me = bot
        .get_me()
        .await
        .context("Failed to reach Telegram (check the bot token and network)")?;
    let bot_username = me
        .user
        .username
        .clone()
        .context("Bot account has no username")?;
    info!("Logged in as @{}", bot_username);

    let commands = vec![
        BotCommand::new("start", "Say hello"),
        BotCommand::new("help", "How to use this bot"),
    ];
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!("Failed to register bot commands: {}", e);
    }

    let ctx = Arc::new(BotContext {
        rewriter,
        bot_username,
    });

    let handler = Update::filter_message()
        .filter_map(|msg: Message| IncomingMessage::from_telegram(&msg))
        .endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![ctx])
        .default_handler(|upd| async move {
            debug!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Telegram platform stopped");
    Ok(())
}

async fn handle_message(
    bot: Bot,
    msg: IncomingMessage,
    ctx: Arc<BotContext>,
) -> ResponseResult<()> {
    debug!(
        "Message {} from {} in {:?} chat {}: {}",
        msg.message_id,
        msg.user_name.as_deref().unwrap_or("unknown"),
        msg.chat_type,
        msg.chat_id,
        msg.text
    );

    if let Err(e) = dispatch::handle(&msg, &ctx, &bot).await {
        error!("Error handling message: {:#}", e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Message {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_private_text_message() {
        let msg = parse(json!({
            "message_id": 10,
            "date": 1700000000,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "from": { "id": 42, "is_bot": false, "first_name": "Alice", "last_name": "Smith" },
            "text": "https://x.com/user/status/1"
        }));

        let incoming = IncomingMessage::from_telegram(&msg).unwrap();
        assert_eq!(incoming.chat_id, 42);
        assert_eq!(incoming.message_id, 10);
        assert_eq!(incoming.chat_type, ChatType::Private);
        assert_eq!(incoming.text, "https://x.com/user/status/1");
        assert!(!incoming.from_caption);
        assert_eq!(incoming.user_name.as_deref(), Some("Alice Smith"));
    }

    #[test]
    fn test_supergroup_message_is_group() {
        let msg = parse(json!({
            "message_id": 11,
            "date": 1700000000,
            "chat": { "id": -1001234, "type": "supergroup", "title": "Friends" },
            "from": { "id": 7, "is_bot": false, "first_name": "Bob" },
            "text": "@LinkFixBot https://x.com/user/status/1"
        }));

        let incoming = IncomingMessage::from_telegram(&msg).unwrap();
        assert_eq!(incoming.chat_type, ChatType::Group);
        assert_eq!(incoming.chat_id, -1001234);
    }

    #[test]
    fn test_caption_used_when_no_text() {
        let msg = parse(json!({
            "message_id": 12,
            "date": 1700000000,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "photo": [{
                "file_id": "AgAD",
                "file_unique_id": "AQAD",
                "width": 90,
                "height": 90,
                "file_size": 1024
            }],
            "caption": "see https://x.com/user/status/2"
        }));

        let incoming = IncomingMessage::from_telegram(&msg).unwrap();
        assert!(incoming.from_caption);
        assert_eq!(incoming.text, "see https://x.com/user/status/2");
        assert!(incoming.user_name.is_none());
    }

    #[test]
    fn test_message_without_text_or_caption_is_skipped() {
        let msg = parse(json!({
            "message_id": 13,
            "date": 1700000000,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "photo": [{
                "file_id": "AgAD",
                "file_unique_id": "AQAD",
                "width": 90,
                "height": 90,
                "file_size": 1024
            }]
        }));

        assert!(IncomingMessage::from_telegram(&msg).is_none());
    }
}
