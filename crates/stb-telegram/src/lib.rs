//! Telegram adapter (teloxide).
//!
//! This crate implements the `stb-core` ChatGateway port over the Telegram Bot API
//! and feeds inbound updates into the core command router.

use std::path::Path;

use async_trait::async_trait;

use teloxide::{prelude::*, types::InputFile};

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use stb_core::{domain::ChatId, errors::Error, ports::ChatGateway, Result};

#[derive(Clone)]
pub struct TelegramGateway {
    bot: Bot,
}

impl TelegramGateway {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn from_token(token: impl Into<String>) -> Self {
        Self::new(Bot::new(token))
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

}

fn map_err(e: teloxide::RequestError) -> Error {
    Error::Delivery(format!("telegram error: {e}"))
}

/// Run a Bot API request, retrying once when Telegram asks us to back off.
async fn with_retry<T, Fut>(mut op: impl FnMut() -> Fut) -> Result<T>
where
    Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
    Fut::IntoFuture: Send,
{
    const MAX_RETRIES: usize = 1;
    let mut attempts = 0usize;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) => match e {
                teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                    attempts += 1;
                    tracing::warn!(retry_after = ?d, "telegram flood control; retrying once");
                    sleep(d).await;
                    continue;
                }
                other => return Err(map_err(other)),
            },
        }
    }
}

#[async_trait]
impl ChatGateway for TelegramGateway {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
        with_retry(|| self.bot.send_message(Self::tg_chat(chat_id), text.to_string())).await?;
        Ok(())
    }

    async fn send_file(
        &self,
        chat_id: ChatId,
        local_path: &Path,
        display_name: &str,
    ) -> Result<()> {
        with_retry(|| {
            let file =
                InputFile::file(local_path.to_path_buf()).file_name(display_name.to_string());
            self.bot.send_document(Self::tg_chat(chat_id), file)
        })
        .await?;
        Ok(())
    }
}
