//! Process configuration, built once at startup and passed down explicitly.

use std::env;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_token: String,
    /// Base URL of the remote game/solver service.
    pub game_server_url: String,
    /// Base URL of the vision/parsing service.
    pub parser_url: String,
    /// When unset, sessions are kept in memory only.
    pub database_url: Option<String>,
    pub sentry_dsn: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            telegram_token: env::var("TELEGRAM_BOT_TOKEN")
                .context("TELEGRAM_BOT_TOKEN must be set")?,
            game_server_url: env::var("GAME_SERVER_URL")
                .context("GAME_SERVER_URL must be set")?,
            parser_url: env::var("PARSER_URL").context("PARSER_URL must be set")?,
            database_url: env::var("DATABASE_URL").ok(),
            sentry_dsn: env::var("SENTRY_DSN").ok(),
        })
    }
}
