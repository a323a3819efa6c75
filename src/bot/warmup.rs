//! Pre-loading side channel.
//!
//! Both remote services load their models lazily, so the first game after a
//! deploy pays a long cold start. The warmup runs both loads concurrently and
//! reports how long each took, either as a chat reply to `/warmup` or on the
//! `--warmup` command line path.

use std::time::Instant;

use tracing::info;

use crate::api::{GameApi, ParserApi};
use crate::errors::BotResult;
use crate::models::{available_models, BotState, SUPPORTED_LANGUAGES};

use super::context::EventContext;
use super::parse::language_code;

#[derive(Debug)]
pub struct WarmupTaskResult {
    pub name: &'static str,
    pub message: String,
    pub duration_secs: f64,
}

impl WarmupTaskResult {
    fn new(name: &'static str, message: String, started: Instant) -> Self {
        Self {
            name,
            message,
            duration_secs: started.elapsed().as_secs_f64(),
        }
    }
}

/// Runs all warmup tasks concurrently. A failed task reports its error text
/// instead of failing the whole warmup.
pub async fn run_warmup(
    game_api: &dyn GameApi,
    parser_api: &dyn ParserApi,
) -> Vec<WarmupTaskResult> {
    let (models, languages) = tokio::join!(
        load_solver_models(game_api),
        load_vision_languages(parser_api)
    );
    vec![models, languages]
}

async fn load_solver_models(game_api: &dyn GameApi) -> WarmupTaskResult {
    let started = Instant::now();
    let models = available_models();
    let message = match game_api.load_models(&models).await {
        Ok(success_count) => format!("loaded {success_count}/{} models", models.len()),
        Err(error) => format!("failed: {error}"),
    };
    WarmupTaskResult::new("solver models", message, started)
}

async fn load_vision_languages(parser_api: &dyn ParserApi) -> WarmupTaskResult {
    let started = Instant::now();
    let languages: Vec<String> = SUPPORTED_LANGUAGES
        .iter()
        .map(|language| language_code(language))
        .collect();
    let message = match parser_api.load_languages(&languages).await {
        Ok(loaded) => format!("loaded languages: {}", loaded.join(", ")),
        Err(error) => format!("failed: {error}"),
    };
    WarmupTaskResult::new("vision languages", message, started)
}

/// `/warmup` chat command: run the tasks and report one line per task.
pub async fn handle_warmup(ctx: &mut EventContext<'_>) -> BotResult<Option<BotState>> {
    info!(chat_id = ctx.chat_id, "Warmup requested");
    ctx.send_text("Warming up, this might take a minute... ⏳")
        .await?;
    let results = run_warmup(ctx.game_api, ctx.parser_api).await;
    let lines: Vec<String> = results
        .iter()
        .map(|result| {
            format!(
                "🐇 *{}*: {} in `{:.1}` sec",
                result.name, result.message, result.duration_secs
            )
        })
        .collect();
    ctx.send_markdown(&lines.join("\n")).await?;
    Ok(ctx.current_state())
}
