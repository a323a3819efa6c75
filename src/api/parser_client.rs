//! Client for the vision service that reads physical boards from photos.

use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{BotError, BotResult};
use crate::game::CardColor;

// Board recognition is much slower than color-map recognition.
const MAP_TIMEOUT: Duration = Duration::from_secs(15);
const BOARD_TIMEOUT: Duration = Duration::from_secs(80);
const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct ParseColorMapRequest<'a> {
    map_image_b64: &'a str,
}

#[derive(Debug, Deserialize)]
struct ParseColorMapResponse {
    map_colors: Vec<CardColor>,
}

#[derive(Debug, Serialize)]
struct ParseBoardRequest<'a> {
    board_image_b64: &'a str,
    language: &'a str,
}

#[derive(Debug, Deserialize)]
struct ParseBoardResponse {
    words: Vec<String>,
}

#[derive(Debug, Serialize)]
struct LoadLanguagesRequest<'a> {
    languages: &'a [String],
}

#[derive(Debug, Deserialize)]
struct LoadLanguagesResponse {
    loaded: Vec<String>,
}

#[async_trait]
pub trait ParserApi: Send + Sync {
    /// Extracts the per-cell color map from a photo of the key card.
    async fn parse_color_map(&self, image_b64: &str) -> BotResult<Vec<CardColor>>;

    /// Extracts the per-cell words from a photo of the board.
    async fn parse_board_words(&self, image_b64: &str, language: &str) -> BotResult<Vec<String>>;

    /// Pre-loads recognition languages, returning the ones now loaded.
    async fn load_languages(&self, languages: &[String]) -> BotResult<Vec<String>>;
}

pub struct HttpParserClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpParserClient {
    pub fn new(base_url: &str) -> BotResult<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
        timeout: Duration,
    ) -> BotResult<T> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, "Parser service request");
        let response = self
            .http
            .post(&url)
            .json(body)
            .timeout(timeout)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BotError::Unexpected(anyhow!(
                "parser service returned {status} for {path}"
            )));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ParserApi for HttpParserClient {
    async fn parse_color_map(&self, image_b64: &str) -> BotResult<Vec<CardColor>> {
        let request = ParseColorMapRequest {
            map_image_b64: image_b64,
        };
        let response: ParseColorMapResponse =
            self.post("parse-color-map", &request, MAP_TIMEOUT).await?;
        Ok(response.map_colors)
    }

    async fn parse_board_words(&self, image_b64: &str, language: &str) -> BotResult<Vec<String>> {
        let request = ParseBoardRequest {
            board_image_b64: image_b64,
            language,
        };
        let response: ParseBoardResponse =
            self.post("parse-board", &request, BOARD_TIMEOUT).await?;
        Ok(response.words)
    }

    async fn load_languages(&self, languages: &[String]) -> BotResult<Vec<String>> {
        let request = LoadLanguagesRequest { languages };
        let response: LoadLanguagesResponse =
            self.post("load-languages", &request, LOAD_TIMEOUT).await?;
        Ok(response.loaded)
    }
}
