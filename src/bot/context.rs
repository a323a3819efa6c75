//! Per-dispatch request context.
//!
//! Each inbound update gets one [`EventContext`]: the parsed event, a snapshot
//! of the persisted session and handles to the collaborators. Handlers never
//! hold ambient mutable state; every session change goes through
//! copy-with-override plus a store write, so the snapshot and the store stay
//! in sync for the rest of the dispatch.

use anyhow::anyhow;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::{debug, info};

use crate::api::{GameApi, ParserApi};
use crate::errors::{BotError, BotResult};
use crate::game::GameState;
use crate::models::{BotState, GameConfig, ParsingState, Session};
use crate::store::SessionStore;
use crate::transport::{largest_photo, KeyboardRows, Messenger, PhotoMeta};

use super::ui_builder;

#[derive(Debug, Clone)]
pub struct UserInfo {
    pub id: i64,
    pub username: Option<String>,
    pub full_name: String,
}

/// The inbound event, already reduced to what dispatch cares about.
#[derive(Debug, Clone)]
pub enum EventKind {
    /// A `/command`, without the leading slash or bot mention.
    Command(String),
    Text(String),
    Photo(Vec<PhotoMeta>),
}

pub struct EventContext<'a> {
    pub chat_id: i64,
    pub user: Option<UserInfo>,
    pub event: EventKind,
    /// Snapshot of the persisted session; kept in sync with the store.
    pub session: Option<Session>,
    pub messenger: &'a dyn Messenger,
    pub game_api: &'a dyn GameApi,
    pub parser_api: &'a dyn ParserApi,
    pub store: &'a dyn SessionStore,
}

impl<'a> EventContext<'a> {
    pub fn current_state(&self) -> Option<BotState> {
        self.session.as_ref().and_then(|session| session.state)
    }

    /// The config in effect for the next game.
    pub fn config(&self) -> GameConfig {
        self.session
            .as_ref()
            .map(|session| session.config.clone())
            .unwrap_or_default()
    }

    pub fn game_id(&self) -> Option<String> {
        self.session
            .as_ref()
            .and_then(|session| session.game_id.clone())
    }

    pub fn text(&self) -> Option<&str> {
        match &self.event {
            EventKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Lowercased, trimmed message text. Absence is a routing bug, not user
    /// error: dispatch only selects text handlers for text events.
    pub fn require_text(&self) -> BotResult<String> {
        self.text()
            .map(|text| text.trim().to_lowercase())
            .ok_or_else(|| BotError::Unexpected(anyhow!("text handler got a non-text event")))
    }

    pub fn parsing_state(&self) -> BotResult<ParsingState> {
        self.session
            .as_ref()
            .and_then(|session| session.parsing_state.clone())
            .ok_or_else(|| BotError::Unexpected(anyhow!("parsing state is not set")))
    }

    // --- session lifecycle ---

    /// Replaces the persisted session and the local snapshot together.
    pub async fn set_session(&mut self, session: Option<Session>) -> BotResult<()> {
        self.store.set(self.chat_id, session.clone()).await?;
        self.session = session;
        Ok(())
    }

    pub async fn update_session(&mut self, session: Session) -> BotResult<()> {
        self.set_session(Some(session)).await
    }

    pub async fn reset_session(&mut self) -> BotResult<()> {
        self.set_session(None).await
    }

    pub async fn update_game_config(&mut self, config: GameConfig) -> BotResult<()> {
        let session = self
            .session
            .clone()
            .ok_or_else(|| BotError::Unexpected(anyhow!("session is not set, cannot update config")))?;
        self.update_session(session.with_config(config)).await
    }

    pub async fn update_parsing_state(&mut self, parsing_state: ParsingState) -> BotResult<()> {
        let session = self.session.clone().unwrap_or_default();
        self.update_session(session.with_parsing_state(Some(parsing_state)))
            .await
    }

    // --- outbound rendering ---

    pub async fn send_text(&self, text: &str) -> BotResult<i32> {
        self.messenger.send_text(self.chat_id, text).await
    }

    pub async fn send_markdown(&self, text: &str) -> BotResult<i32> {
        self.messenger.send_markdown(self.chat_id, text).await
    }

    pub async fn send_text_with_keyboard(
        &self,
        text: &str,
        keyboard: &KeyboardRows,
    ) -> BotResult<i32> {
        self.messenger
            .send_text_with_keyboard(self.chat_id, text, keyboard)
            .await
    }

    pub async fn send_markdown_with_keyboard(
        &self,
        text: &str,
        keyboard: &KeyboardRows,
    ) -> BotResult<i32> {
        self.messenger
            .send_markdown_with_keyboard(self.chat_id, text, keyboard)
            .await
    }

    /// Retracts the most recently sent board keyboard, if any.
    pub async fn remove_last_keyboard(&mut self) -> BotResult<()> {
        let Some(session) = self.session.clone() else {
            return Ok(());
        };
        let Some(message_id) = session.last_keyboard_message_id else {
            return Ok(());
        };
        self.messenger
            .remove_keyboard(self.chat_id, message_id)
            .await?;
        self.update_session(session.with_last_keyboard_message_id(None))
            .await
    }

    /// Renders the current board with its guess keyboard, censored unless the
    /// game is over, and records the keyboard message id for later retraction.
    pub async fn send_board(&mut self, state: &GameState, message: Option<&str>) -> BotResult<()> {
        let board = if state.is_game_over {
            state.board.clone()
        } else {
            state.board.censored()
        };
        let keyboard = ui_builder::build_board_keyboard(&board, state.is_game_over);
        let mut text = message
            .map(str::to_string)
            .unwrap_or_else(|| {
                if state.is_game_over {
                    "Game over!".to_string()
                } else {
                    "Pick your guess!".to_string()
                }
            });
        if state.left_guesses == 1 {
            text.push_str(" (bonus round)");
        }
        let message_id = self
            .messenger
            .send_markdown_with_keyboard(self.chat_id, &text, &keyboard)
            .await?;
        if let Some(session) = self.session.clone() {
            self.update_session(session.with_last_keyboard_message_id(Some(message_id)))
                .await?;
        }
        Ok(())
    }

    pub async fn send_score(&self, state: &GameState) -> BotResult<()> {
        self.send_markdown(&ui_builder::score_line(&state.score))
            .await?;
        Ok(())
    }

    /// Spymasters' recorded intents (for hints actually used) followed by the
    /// winner announcement.
    pub async fn send_game_summary(&self, state: &GameState) -> BotResult<()> {
        let intent_lines: Vec<String> = state
            .clues
            .iter()
            .filter(|clue| !clue.for_words.is_empty())
            .map(ui_builder::clue_intent_line)
            .collect();
        if !intent_lines.is_empty() {
            let text = format!("Spymasters intents were:\n{}\n", intent_lines.join("\n"));
            self.send_markdown(&text).await?;
        }
        let winner = state
            .winner
            .as_ref()
            .ok_or_else(|| BotError::Unexpected(anyhow!("winner is not set on a finished game")))?;
        let text = ui_builder::winner_text(winner);
        info!("{text}");
        self.send_text(&text).await?;
        Ok(())
    }

    pub async fn get_game_state(&self) -> BotResult<GameState> {
        let game_id = self
            .game_id()
            .ok_or_else(|| BotError::Unexpected(anyhow!("no active game id in session")))?;
        self.game_api.get_game_state(&game_id).await
    }

    /// Downloads the largest offered photo resolution and encodes it for the
    /// vision service.
    pub async fn photo_base64(&self) -> BotResult<String> {
        let photos: &[PhotoMeta] = match &self.event {
            EventKind::Photo(photos) => photos,
            _ => &[],
        };
        let largest = largest_photo(photos)
            .ok_or_else(|| BotError::BadInput("No photo found in message".to_string()))?;
        debug!(count = photos.len(), "Downloading the largest photo");
        let bytes = self.messenger.download_photo(&largest.file_id).await?;
        Ok(BASE64.encode(bytes))
    }
}
