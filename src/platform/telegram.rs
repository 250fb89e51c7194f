use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{Chat, MessageOrigin, ParseMode, User};
use tracing::{info, warn};

use crate::handler::Handler;
use crate::platform::{
    command_token, ChatIdentity, ForwardInfo, ForwardOrigin, InboundMessage, MediaKind,
    Transport, UserIdentity,
};

/// Sends replies through the Bot API
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send(&self, chat_id: i64, text: &str, markup: bool) -> Result<()> {
        let mut request = self.bot.send_message(ChatId(chat_id), text);
        if markup {
            request = request.parse_mode(ParseMode::Html);
        }
        request.await?;
        Ok(())
    }
}

/// Normalize a Telegram message. Messages without a sender are skipped.
pub fn from_message(msg: &Message) -> Option<InboundMessage> {
    let sender = msg.from.as_ref()?;

    Some(InboundMessage {
        chat_id: msg.chat.id.0,
        text: msg.text().map(str::to_string),
        media: media_kind(msg),
        caption: msg.caption().map(str::to_string),
        sender: user_identity(sender),
        forward: msg.forward_origin().map(forward_info),
        date: msg.date.timestamp(),
    })
}

fn media_kind(msg: &Message) -> Option<MediaKind> {
    let kind = if msg.photo().is_some() {
        MediaKind::Photo
    } else if msg.video().is_some() {
        MediaKind::Video
    } else if msg.video_note().is_some() {
        MediaKind::VideoNote
    } else if msg.audio().is_some() {
        MediaKind::Audio
    } else if msg.voice().is_some() {
        MediaKind::Voice
    } else if msg.sticker().is_some() {
        MediaKind::Sticker
    } else if msg.animation().is_some() {
        MediaKind::Animation
    } else if msg.document().is_some() {
        MediaKind::Document
    } else if msg.game().is_some() {
        MediaKind::Game
    } else if msg.contact().is_some() {
        MediaKind::Contact
    } else if msg.location().is_some() {
        MediaKind::Location
    } else if msg.venue().is_some() {
        MediaKind::Venue
    } else {
        return None;
    };
    Some(kind)
}

fn forward_info(origin: &MessageOrigin) -> ForwardInfo {
    match origin {
        MessageOrigin::User { date, sender_user } => ForwardInfo {
            origin: ForwardOrigin::User(user_identity(sender_user)),
            message_id: None,
            date: date.timestamp(),
        },
        MessageOrigin::HiddenUser {
            date,
            sender_user_name,
        } => ForwardInfo {
            origin: ForwardOrigin::HiddenUser {
                name: sender_user_name.clone(),
            },
            message_id: None,
            date: date.timestamp(),
        },
        MessageOrigin::Chat {
            date, sender_chat, ..
        } => ForwardInfo {
            origin: ForwardOrigin::Chat(chat_identity(sender_chat)),
            message_id: None,
            date: date.timestamp(),
        },
        MessageOrigin::Channel {
            date,
            chat,
            message_id,
            ..
        } => ForwardInfo {
            origin: ForwardOrigin::Chat(chat_identity(chat)),
            message_id: Some(message_id.0),
            date: date.timestamp(),
        },
    }
}

fn user_identity(user: &User) -> UserIdentity {
    UserIdentity {
        id: user.id.0,
        is_bot: user.is_bot,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        username: user.username.clone(),
        language_code: user.language_code.clone(),
    }
}

fn chat_identity(chat: &Chat) -> ChatIdentity {
    let kind = if chat.is_channel() {
        "channel"
    } else if chat.is_supergroup() {
        "supergroup"
    } else if chat.is_group() {
        "group"
    } else {
        "private"
    };

    ChatIdentity {
        id: chat.id.0,
        kind: kind.to_string(),
        title: chat.title().map(str::to_string),
        username: chat.username().map(str::to_string),
    }
}

/// Run the Telegram bot until Ctrl-C
pub async fn run(bot: Bot, handler: Arc<Handler>) -> Result<()> {
    let me = bot.get_me().await.context("Telegram bot cannot be initialized")?;
    info!(
        "Authorized on account @{}",
        me.username.as_deref().unwrap_or_default()
    );

    let dispatch_handler = Update::filter_message()
        .filter_map(|msg: Message| from_message(&msg))
        .endpoint(handle_message);

    Dispatcher::builder(bot, dispatch_handler)
        .dependencies(dptree::deps![handler])
        // Every update gets its own task, with no per-chat ordering
        .distribution_function(|_| None::<()>)
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Bot stopped");
    Ok(())
}

async fn handle_message(msg: InboundMessage, handler: Arc<Handler>) -> ResponseResult<()> {
    let command = command_token(msg.text.as_deref().unwrap_or(""));
    handler.handle(command, &msg).await;
    Ok(())
}
