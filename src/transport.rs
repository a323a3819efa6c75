//! Chat transport boundary.
//!
//! Handlers talk to the chat through the [`Messenger`] trait so the whole
//! conversation engine can run against a recording fake in tests. The real
//! implementation wraps a teloxide [`Bot`].

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    ChatId, FileId, KeyboardButton, KeyboardMarkup as ReplyKeyboardMarkup, MessageId, ParseMode,
};
use tracing::debug;

use crate::errors::{BotError, BotResult};

/// Reply keyboards are plain label grids; rows map positionally to board
/// cells plus one trailing command row.
pub type KeyboardRows = Vec<Vec<String>>;

/// One offered resolution of an incoming photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoMeta {
    pub file_id: String,
    pub file_size: u32,
}

/// Picks the largest offered resolution.
pub fn largest_photo(photos: &[PhotoMeta]) -> Option<&PhotoMeta> {
    photos.iter().max_by_key(|photo| photo.file_size)
}

#[async_trait]
pub trait Messenger: Send + Sync {
    /// Sends plain text, returning the sent message id.
    async fn send_text(&self, chat_id: i64, text: &str) -> BotResult<i32>;

    async fn send_markdown(&self, chat_id: i64, text: &str) -> BotResult<i32>;

    async fn send_text_with_keyboard(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: &KeyboardRows,
    ) -> BotResult<i32>;

    async fn send_markdown_with_keyboard(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: &KeyboardRows,
    ) -> BotResult<i32>;

    /// Retracts a previously sent reply keyboard. Already-retracted keyboards
    /// are not an error.
    async fn remove_keyboard(&self, chat_id: i64, message_id: i32) -> BotResult<()>;

    /// Downloads a photo by file id.
    async fn download_photo(&self, file_id: &str) -> BotResult<Vec<u8>>;
}

pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn build_keyboard(rows: &KeyboardRows) -> ReplyKeyboardMarkup {
        let buttons = rows
            .iter()
            .map(|row| row.iter().map(KeyboardButton::new).collect::<Vec<_>>());
        let mut markup = ReplyKeyboardMarkup::new(buttons);
        markup.one_time_keyboard = true;
        markup
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, chat_id: i64, text: &str) -> BotResult<i32> {
        let message = self.bot.send_message(ChatId(chat_id), text).await?;
        Ok(message.id.0)
    }

    async fn send_markdown(&self, chat_id: i64, text: &str) -> BotResult<i32> {
        let message = self
            .bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Markdown)
            .await?;
        Ok(message.id.0)
    }

    async fn send_text_with_keyboard(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: &KeyboardRows,
    ) -> BotResult<i32> {
        let message = self
            .bot
            .send_message(ChatId(chat_id), text)
            .reply_markup(Self::build_keyboard(keyboard))
            .await?;
        Ok(message.id.0)
    }

    async fn send_markdown_with_keyboard(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: &KeyboardRows,
    ) -> BotResult<i32> {
        let message = self
            .bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Markdown)
            .reply_markup(Self::build_keyboard(keyboard))
            .await?;
        Ok(message.id.0)
    }

    async fn remove_keyboard(&self, chat_id: i64, message_id: i32) -> BotResult<()> {
        debug!(chat_id, message_id, "Removing keyboard");
        let result = self
            .bot
            .edit_message_reply_markup(ChatId(chat_id), MessageId(message_id))
            .await;
        match result {
            Ok(_) => Ok(()),
            // The keyboard may already be gone (superseded or expired).
            Err(teloxide::RequestError::Api(_)) => Ok(()),
            Err(error) => Err(error.into()),
        }
    }

    async fn download_photo(&self, file_id: &str) -> BotResult<Vec<u8>> {
        let file = self.bot.get_file(FileId(file_id.to_string())).await?;
        let url = format!(
            "https://api.telegram.org/file/bot{}/{}",
            self.bot.token(),
            file.path
        );
        let response = reqwest::get(&url).await?;
        if !response.status().is_success() {
            return Err(BotError::Unexpected(anyhow::anyhow!(
                "photo download failed with status {}",
                response.status()
            )));
        }
        let bytes = response.bytes().await?;
        debug!(file_id, size = bytes.len(), "Downloaded photo");
        Ok(bytes.to_vec())
    }
}
