//! Error taxonomy for one dispatch cycle.
//!
//! Every failure escaping a handler is classified exactly once at the
//! dispatch boundary. The variants mirror the classifier's ordered rules:
//! upstream client errors and bad user input are familiar conditions with a
//! user-facing rendering, transport blocks are log-only, and everything else
//! is an unexpected fault reported to the tracking sink.

use thiserror::Error;

pub type BotResult<T> = Result<T, BotError>;

#[derive(Debug, Error)]
pub enum BotError {
    /// The remote game service rejected the request as invalid (4xx).
    #[error("{}", upstream_text(.message, .details.as_deref()))]
    UpstreamClient {
        message: String,
        details: Option<String>,
    },

    /// A user-supplied value failed local validation (unknown language,
    /// difficulty, solver, model, or card).
    #[error("{0}")]
    BadInput(String),

    /// The remote service rejected a move as illegal under game rules.
    #[error("{0}")]
    RuleViolation(String),

    /// The delivery channel rejected us, e.g. the user blocked the bot.
    #[error("bot was blocked by the user")]
    TransportBlocked,

    /// Anything else: reported to the tracking sink with enriched context.
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

/// Renders an upstream error body as shown to the user:
/// `message` alone, or `message: details` when details are present.
pub fn upstream_text(message: &str, details: Option<&str>) -> String {
    match details {
        Some(details) => format!("{message}: {details}"),
        None => message.to_string(),
    }
}

impl From<reqwest::Error> for BotError {
    fn from(error: reqwest::Error) -> Self {
        BotError::Unexpected(anyhow::Error::new(error))
    }
}

impl From<sqlx::Error> for BotError {
    fn from(error: sqlx::Error) -> Self {
        BotError::Unexpected(anyhow::Error::new(error))
    }
}

impl From<serde_json::Error> for BotError {
    fn from(error: serde_json::Error) -> Self {
        BotError::Unexpected(anyhow::Error::new(error))
    }
}

impl From<teloxide::RequestError> for BotError {
    fn from(error: teloxide::RequestError) -> Self {
        match &error {
            teloxide::RequestError::Api(teloxide::ApiError::BotBlocked) => {
                BotError::TransportBlocked
            }
            _ => BotError::Unexpected(anyhow::Error::new(error)),
        }
    }
}
