use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::links::LinkRewriter;
use crate::platform::{ChatType, IncomingMessage, ReplySink};

const GREETING: &str = "Hello! Send your link and you'll get a link that has a preview! Enjoy!";

/// Everything a message handler needs, shared across updates
#[derive(Debug)]
pub struct BotContext {
    pub rewriter: LinkRewriter,
    /// The bot's own username, without the leading `@`
    pub bot_username: String,
}

/// Commands the bot answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
}

impl Command {
    pub fn reply_text(self, bot_username: &str) -> String {
        match self {
            Command::Start => GREETING.to_string(),
            Command::Help => format!(
                "{GREETING}\n\n\
                 In a private chat, just send me a post link.\n\
                 In a group, mention @{bot_username} in the message with the link.\n\n\
                 Commands:\n\
                 /start - Say hello\n\
                 /help - Show this message"
            ),
        }
    }
}

/// What to do with an incoming message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Command(Command),
    Rewrite,
    Ignore,
}

fn is_username_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// True if `text` contains `@bot_username` as a whole mention (case-insensitive).
pub fn is_bot_mentioned(text: &str, bot_username: &str) -> bool {
    let username = bot_username.trim_start_matches('@');
    if username.is_empty() {
        return false;
    }

    // ASCII lowercasing keeps byte offsets intact.
    let needle = format!("@{}", username.to_ascii_lowercase());
    let haystack = text.to_ascii_lowercase();
    haystack.match_indices(&needle).any(|(start, _)| {
        haystack[start + needle.len()..]
            .chars()
            .next()
            .map_or(true, |c| !is_username_char(c))
    })
}

/// Private chats always get a rewrite; groups only when the bot is mentioned.
pub fn should_rewrite(chat_type: ChatType, text: &str, bot_username: &str) -> bool {
    match chat_type {
        ChatType::Private => true,
        ChatType::Group => is_bot_mentioned(text, bot_username),
    }
}

/// Parse `/start`, `/help` and their `/cmd@bot_username` forms.
pub fn parse_command(text: &str, bot_username: &str) -> Option<Command> {
    let token = text.split_whitespace().next()?.strip_prefix('/')?;

    let name = match token.split_once('@') {
        Some((name, target)) => {
            if !target.eq_ignore_ascii_case(bot_username.trim_start_matches('@')) {
                return None;
            }
            name
        }
        None => token,
    };

    match name.to_ascii_lowercase().as_str() {
        "start" => Some(Command::Start),
        "help" => Some(Command::Help),
        _ => None,
    }
}

pub fn route(msg: &IncomingMessage, bot_username: &str) -> Route {
    // Commands are never rewritten, known or not.
    if !msg.from_caption && msg.text.starts_with('/') {
        return parse_command(&msg.text, bot_username).map_or(Route::Ignore, Route::Command);
    }

    if should_rewrite(msg.chat_type, &msg.text, bot_username) {
        Route::Rewrite
    } else {
        Route::Ignore
    }
}

/// Route one message and send the reply, if any. Returns whether a reply was sent.
pub async fn handle(msg: &IncomingMessage, ctx: &BotContext, sink: &dyn ReplySink) -> Result<bool> {
    let reply = match route(msg, &ctx.bot_username) {
        Route::Command(command) => {
            info!("Command {:?} in chat {}", command, msg.chat_id);
            Some(command.reply_text(&ctx.bot_username))
        }
        Route::Rewrite => {
            let rewritten = ctx.rewriter.rewrite(&msg.text);
            if rewritten.is_none() {
                debug!("No post link in message {} of chat {}", msg.message_id, msg.chat_id);
            }
            rewritten
        }
        Route::Ignore => None,
    };

    let Some(reply) = reply else {
        return Ok(false);
    };

    sink.send_reply(msg.chat_id, msg.message_id, &reply)
        .await
        .with_context(|| format!("Failed to reply in chat {}", msg.chat_id))?;

    info!(
        "Replied to {} in chat {}: {}",
        msg.user_name.as_deref().unwrap_or("unknown"),
        msg.chat_id,
        reply
    );
    Ok(true)
}
