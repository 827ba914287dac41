//! Telegram update handlers.
//!
//! Thin adapters: turn a teloxide `Message` into a core `ChatMessage` and hand
//! it to the command router, which owns all behavior and error handling.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{Me, Message},
};

use stb_core::{
    commands::addressed_to_other_bot,
    domain::{ChatId, ChatMessage},
    router::CommandRouter,
};

/// Chat id of the conversation the message came from.
pub fn chat_id(msg: &Message) -> ChatId {
    ChatId(msg.chat.id.0)
}

/// Messages without text (stickers, photos, ...) become empty text.
pub fn chat_message(msg: &Message) -> ChatMessage {
    ChatMessage::new(chat_id(msg), msg.text().unwrap_or_default())
}

/// Whether this bot should answer the message. In group chats, commands
/// like `/help@OtherBot` belong to another bot and get no reply.
pub fn is_for_us(msg: &Message, own_username: &str) -> bool {
    !addressed_to_other_bot(msg.text().unwrap_or_default(), own_username)
}

pub async fn handle_message(
    msg: Message,
    me: Me,
    router: Arc<CommandRouter>,
) -> ResponseResult<()> {
    if !is_for_us(&msg, me.username()) {
        tracing::debug!(chat = msg.chat.id.0, "ignoring command for another bot");
        return Ok(());
    }
    router.handle(chat_message(&msg)).await;
    Ok(())
}
