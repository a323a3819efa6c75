//! Typed client for the remote game/solver service.
//!
//! All board and rule logic lives on the server; this client only moves typed
//! requests and responses. 4xx responses carry a structured `{message,
//! details}` body and map onto the familiar error classes: 409 means the move
//! was legal to ask for but illegal under game rules, any other 4xx is an
//! upstream client error. 5xx and transport failures are unexpected faults.

use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{BotError, BotResult};
use crate::game::{GameState, GivenGuess, Clue, Team};
use crate::models::{ModelIdentifier, Solver};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Serialize)]
pub struct StartGameRequest<'a> {
    pub language: &'a str,
    pub first_team: Team,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartGameResponse {
    pub game_id: String,
    pub game_state: GameState,
}

#[derive(Debug, Clone, Serialize)]
pub struct GuessRequest<'a> {
    pub game_id: &'a str,
    pub card_index: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuessResponse {
    pub game_state: GameState,
    /// `None` means the turn was passed.
    pub given_guess: Option<GivenGuess>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NextMoveRequest<'a> {
    pub game_id: &'a str,
    pub solver: Solver,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NextMoveResponse {
    pub game_state: GameState,
    pub given_clue: Option<Clue>,
    pub given_guess: Option<GivenGuess>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetGameStateRequest<'a> {
    pub game_id: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetGameStateResponse {
    pub game_state: GameState,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadModelsRequest<'a> {
    pub model_identifiers: &'a [ModelIdentifier],
    pub load_default_models: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoadModelsResponse {
    pub success_count: u32,
}

/// Structured body of every 4xx response.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(default)]
    pub details: Option<String>,
}

#[async_trait]
pub trait GameApi: Send + Sync {
    async fn start_game(&self, language: &str, first_team: Team) -> BotResult<StartGameResponse>;

    async fn guess(&self, game_id: &str, card_index: i32) -> BotResult<GuessResponse>;

    async fn next_move(&self, game_id: &str, solver: Solver) -> BotResult<NextMoveResponse>;

    async fn get_game_state(&self, game_id: &str) -> BotResult<GameState>;

    /// Pre-loads solver models, returning how many loaded successfully.
    async fn load_models(&self, model_identifiers: &[ModelIdentifier]) -> BotResult<u32>;
}

pub struct HttpGameClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpGameClient {
    pub fn new(base_url: &str) -> BotResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> BotResult<T> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, "Game server request");
        let response = self.http.post(&url).json(body).send().await?;
        let status = response.status();
        if status.is_client_error() {
            return Err(client_error(status, response).await);
        }
        if !status.is_success() {
            return Err(BotError::Unexpected(anyhow!(
                "game server returned {status} for {path}"
            )));
        }
        Ok(response.json().await?)
    }
}

async fn client_error(status: StatusCode, response: reqwest::Response) -> BotError {
    let body = match response.json::<ErrorResponse>().await {
        Ok(body) => body,
        Err(error) => {
            // A 4xx without the structured body is not a familiar condition.
            return BotError::Unexpected(anyhow!(
                "game server returned {status} with unreadable body: {error}"
            ));
        }
    };
    if status == StatusCode::CONFLICT {
        BotError::RuleViolation(body.message)
    } else {
        BotError::UpstreamClient {
            message: body.message,
            details: body.details,
        }
    }
}

#[async_trait]
impl GameApi for HttpGameClient {
    async fn start_game(&self, language: &str, first_team: Team) -> BotResult<StartGameResponse> {
        let request = StartGameRequest {
            language,
            first_team,
        };
        self.post("start-game", &request).await
    }

    async fn guess(&self, game_id: &str, card_index: i32) -> BotResult<GuessResponse> {
        let request = GuessRequest {
            game_id,
            card_index,
        };
        self.post("guess", &request).await
    }

    async fn next_move(&self, game_id: &str, solver: Solver) -> BotResult<NextMoveResponse> {
        let request = NextMoveRequest { game_id, solver };
        self.post("next-move", &request).await
    }

    async fn get_game_state(&self, game_id: &str) -> BotResult<GameState> {
        let request = GetGameStateRequest { game_id };
        let response: GetGameStateResponse = self.post("get-game-state", &request).await?;
        Ok(response.game_state)
    }

    async fn load_models(&self, model_identifiers: &[ModelIdentifier]) -> BotResult<u32> {
        let request = LoadModelsRequest {
            model_identifiers,
            load_default_models: false,
        };
        let response: LoadModelsResponse = self.post("load-models", &request).await?;
        Ok(response.success_count)
    }
}
