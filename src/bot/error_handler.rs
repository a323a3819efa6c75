//! Classifies errors that escape a handler and renders them to the user.
//!
//! Ordered, first match wins. The classifier never re-raises: every arm ends
//! in a best-effort send or a log line, so one inbound update can never take
//! the dispatcher down.

use tracing::{error, info, warn};

use crate::errors::BotError;

use super::context::EventContext;

/// Reply classes for the familiar error families.
const BAD_INPUT_PREFIX: &str = "🧐";
const RULE_VIOLATION_PREFIX: &str = "🤬";
const APOLOGY: &str = "Something went wrong on our side, sorry! 😳";

pub async fn handle_error(ctx: &EventContext<'_>, error: &BotError) {
    match error {
        BotError::UpstreamClient { .. } => {
            info!(chat_id = ctx.chat_id, %error, "Upstream client error");
            send_best_effort(ctx, &error.to_string()).await;
        }
        BotError::BadInput(message) => {
            info!(chat_id = ctx.chat_id, %message, "Bad user input");
            send_best_effort(ctx, &format!("{BAD_INPUT_PREFIX} {message}")).await;
        }
        BotError::RuleViolation(message) => {
            info!(chat_id = ctx.chat_id, %message, "Game rule violation");
            send_best_effort(ctx, &format!("{RULE_VIOLATION_PREFIX} {message}")).await;
        }
        BotError::TransportBlocked => {
            warn!(chat_id = ctx.chat_id, "Bot is blocked by the user, dropping reply");
        }
        BotError::Unexpected(inner) => {
            error!(chat_id = ctx.chat_id, error = ?inner, "Unexpected error in handler");
            capture_unexpected(ctx, error);
            send_best_effort(ctx, APOLOGY).await;
        }
    }
}

/// Reports an unexpected error with whatever context the dispatch has.
/// Enrichment is best-effort and must never block classification.
fn capture_unexpected(ctx: &EventContext<'_>, error: &BotError) {
    sentry::with_scope(
        |scope| {
            scope.set_tag("chat_id", ctx.chat_id.to_string());
            if let Some(user) = &ctx.user {
                scope.set_tag("user_id", user.id.to_string());
                scope.set_tag("full_name", user.full_name.clone());
                if let Some(username) = &user.username {
                    scope.set_tag("username", username.clone());
                }
            }
            if let Some(state) = ctx.current_state() {
                scope.set_tag("bot_state", format!("{state:?}"));
            }
            if let Some(game_id) = ctx.game_id() {
                scope.set_tag("game_id", game_id);
            }
        },
        || sentry::capture_error(error),
    );
}

/// The reply itself can fail (network, block race); that failure is only
/// logged, never classified again.
async fn send_best_effort(ctx: &EventContext<'_>, text: &str) {
    if let Err(send_error) = ctx.send_markdown(text).await {
        warn!(chat_id = ctx.chat_id, error = %send_error, "Failed to deliver error reply");
    }
}
