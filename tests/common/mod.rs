//! Scripted in-process fakes for the bot's collaborators.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Mutex;

use anyhow::anyhow;
use async_trait::async_trait;

use spymaster_bot::api::game_client::{GuessResponse, NextMoveResponse, StartGameResponse};
use spymaster_bot::api::{GameApi, ParserApi};
use spymaster_bot::errors::{BotError, BotResult};
use spymaster_bot::game::{
    Board, Card, CardColor, GameState, PlayerRole, Score, Team, TeamScore, Winner, WinningReason,
};
use spymaster_bot::models::{ModelIdentifier, Solver};
use spymaster_bot::transport::{KeyboardRows, Messenger};

// --- game state builders ---

pub fn make_board(words: &[&str]) -> Board {
    Board {
        language: "english".to_string(),
        cards: words
            .iter()
            .map(|word| Card {
                word: word.to_string(),
                color: Some(CardColor::Neutral),
                revealed: false,
            })
            .collect(),
    }
}

pub fn turn_state(team: Team, role: PlayerRole, board: Board) -> GameState {
    GameState {
        current_team: team,
        current_player_role: role,
        is_game_over: false,
        board,
        score: Score {
            blue: TeamScore { unrevealed: 4 },
            red: TeamScore { unrevealed: 3 },
        },
        left_guesses: 2,
        winner: None,
        clues: vec![],
    }
}

pub fn human_turn_state(board: Board) -> GameState {
    turn_state(Team::Blue, PlayerRole::Operative, board)
}

pub fn game_over_state(winning_team: Team, board: Board) -> GameState {
    GameState {
        is_game_over: true,
        winner: Some(Winner {
            team: winning_team,
            reason: WinningReason::TargetScoreReached,
        }),
        ..turn_state(winning_team, PlayerRole::Operative, board)
    }
}

// --- fakes ---

/// Pre-scripted game service; every call pops the next queued response and
/// records itself for assertions.
#[derive(Default)]
pub struct ScriptedGameApi {
    pub start_responses: Mutex<VecDeque<StartGameResponse>>,
    pub guess_responses: Mutex<VecDeque<GuessResponse>>,
    pub next_move_responses: Mutex<VecDeque<NextMoveResponse>>,
    pub state_responses: Mutex<VecDeque<GameState>>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedGameApi {
    pub fn push_start(&self, response: StartGameResponse) {
        self.start_responses.lock().unwrap().push_back(response);
    }

    pub fn push_guess(&self, response: GuessResponse) {
        self.guess_responses.lock().unwrap().push_back(response);
    }

    pub fn push_next_move(&self, response: NextMoveResponse) {
        self.next_move_responses.lock().unwrap().push_back(response);
    }

    pub fn push_state(&self, state: GameState) {
        self.state_responses.lock().unwrap().push_back(state);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn exhausted(what: &str) -> BotError {
        BotError::Unexpected(anyhow!("scripted {what} responses exhausted"))
    }
}

#[async_trait]
impl GameApi for ScriptedGameApi {
    async fn start_game(&self, language: &str, first_team: Team) -> BotResult<StartGameResponse> {
        self.record(format!("start_game:{language}:{first_team:?}"));
        self.start_responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Self::exhausted("start_game"))
    }

    async fn guess(&self, game_id: &str, card_index: i32) -> BotResult<GuessResponse> {
        self.record(format!("guess:{game_id}:{card_index}"));
        self.guess_responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Self::exhausted("guess"))
    }

    async fn next_move(&self, game_id: &str, solver: Solver) -> BotResult<NextMoveResponse> {
        self.record(format!("next_move:{game_id}:{solver:?}"));
        self.next_move_responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Self::exhausted("next_move"))
    }

    async fn get_game_state(&self, game_id: &str) -> BotResult<GameState> {
        self.record(format!("get_game_state:{game_id}"));
        self.state_responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Self::exhausted("get_game_state"))
    }

    async fn load_models(&self, model_identifiers: &[ModelIdentifier]) -> BotResult<u32> {
        self.record(format!("load_models:{}", model_identifiers.len()));
        Ok(model_identifiers.len() as u32)
    }
}

/// Pre-scripted vision service.
#[derive(Default)]
pub struct ScriptedParserApi {
    pub color_responses: Mutex<VecDeque<Vec<CardColor>>>,
    pub word_responses: Mutex<VecDeque<Vec<String>>>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedParserApi {
    pub fn push_colors(&self, colors: Vec<CardColor>) {
        self.color_responses.lock().unwrap().push_back(colors);
    }

    pub fn push_words(&self, words: Vec<String>) {
        self.word_responses.lock().unwrap().push_back(words);
    }
}

#[async_trait]
impl ParserApi for ScriptedParserApi {
    async fn parse_color_map(&self, _image_b64: &str) -> BotResult<Vec<CardColor>> {
        self.calls.lock().unwrap().push("parse_color_map".into());
        self.color_responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| BotError::Unexpected(anyhow!("scripted color responses exhausted")))
    }

    async fn parse_board_words(&self, _image_b64: &str, language: &str) -> BotResult<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("parse_board_words:{language}"));
        self.word_responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| BotError::Unexpected(anyhow!("scripted word responses exhausted")))
    }

    async fn load_languages(&self, languages: &[String]) -> BotResult<Vec<String>> {
        self.calls.lock().unwrap().push("load_languages".into());
        Ok(languages.to_vec())
    }
}

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub text: String,
    pub keyboard: Option<KeyboardRows>,
}

/// Records every outbound message instead of talking to Telegram.
#[derive(Default)]
pub struct RecordingMessenger {
    pub sent: Mutex<Vec<SentMessage>>,
    pub removed_keyboards: Mutex<Vec<i32>>,
    next_message_id: AtomicI32,
}

impl RecordingMessenger {
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|message| message.text).collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.texts().iter().any(|text| text.contains(needle))
    }

    fn record(&self, text: &str, keyboard: Option<&KeyboardRows>) -> i32 {
        self.sent.lock().unwrap().push(SentMessage {
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        self.next_message_id.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, _chat_id: i64, text: &str) -> BotResult<i32> {
        Ok(self.record(text, None))
    }

    async fn send_markdown(&self, _chat_id: i64, text: &str) -> BotResult<i32> {
        Ok(self.record(text, None))
    }

    async fn send_text_with_keyboard(
        &self,
        _chat_id: i64,
        text: &str,
        keyboard: &KeyboardRows,
    ) -> BotResult<i32> {
        Ok(self.record(text, Some(keyboard)))
    }

    async fn send_markdown_with_keyboard(
        &self,
        _chat_id: i64,
        text: &str,
        keyboard: &KeyboardRows,
    ) -> BotResult<i32> {
        Ok(self.record(text, Some(keyboard)))
    }

    async fn remove_keyboard(&self, _chat_id: i64, message_id: i32) -> BotResult<()> {
        self.removed_keyboards.lock().unwrap().push(message_id);
        Ok(())
    }

    async fn download_photo(&self, _file_id: &str) -> BotResult<Vec<u8>> {
        Ok(vec![1, 2, 3, 4])
    }
}
