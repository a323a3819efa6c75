//! Conversation handlers, one per state transition.
//!
//! Each handler is an async function of the dispatch context: it reads the
//! session snapshot, optionally calls the game service, replaces the session
//! through copy-with-override and returns the next conversation state (`None`
//! meaning back to idle). Handlers re-trigger each other by plain calls, so a
//! whole chain still hits the single error boundary exactly once.

use tracing::info;

use crate::errors::{BotError, BotResult};
use crate::game::Board;
use crate::models::{
    available_models, command_card_index, find_model, parse_language, BotState, Difficulty,
    GameConfig, Session, Solver, QUIT_GAME, SUPPORTED_LANGUAGES,
};

use super::context::EventContext;
use super::fast_forward::{fast_forward, next_move};
use super::ui_builder::title_list;

const HELP_TEXT: &str = "Welcome! I'm *The Spymaster* 🕵🏼‍♂️
/start - start a new game.
/custom - start a new game with custom configurations.
/help - show this message.
In development: 👨🏻‍💻
/parse - get help with your camera.

How to play:
You are the blue operative. The bot will play all other roles. \
When the blue spymaster sends a hint, you can reply with a card index (1-25), \
or just click the word on the keyboard. \
Use '-pass' and '-quit' to pass the turn and quit the game.
";

/// Purely informational: no session write, conversation state unchanged.
pub async fn handle_help(ctx: &mut EventContext<'_>) -> BotResult<Option<BotState>> {
    info!("Sending help message");
    ctx.send_markdown(HELP_TEXT).await?;
    Ok(ctx.current_state())
}

/// Starts a game with the session's config (or defaults), then fast-forwards
/// the opening bot turns.
pub async fn handle_start(ctx: &mut EventContext<'_>) -> BotResult<Option<BotState>> {
    let config = ctx.config();
    info!(
        language = %config.language,
        solver = config.solver.name(),
        "Got start event"
    );
    let response = ctx
        .game_api
        .start_game(&config.language, config.first_team)
        .await?;
    info!(game_id = %response.game_id, "Game starting");
    let session = Session::new_game(response.game_id.clone(), config);
    ctx.set_session(Some(session)).await?;
    let short_id = short_game_id(&response.game_id);
    ctx.send_markdown(&format!("Game *{short_id}* is starting! 🥳"))
        .await?;
    fast_forward(ctx, response.game_state).await
}

/// Entry to the configuration dialog: fresh session, language prompt.
pub async fn handle_custom(ctx: &mut EventContext<'_>) -> BotResult<Option<BotState>> {
    let config = GameConfig::default().with_difficulty(Difficulty::Hard);
    ctx.set_session(Some(Session::default().with_config(config)))
        .await?;
    let keyboard = vec![title_list(SUPPORTED_LANGUAGES)];
    ctx.send_text_with_keyboard("🌍 Pick language:", &keyboard)
        .await?;
    Ok(Some(BotState::ConfigLanguage))
}

pub async fn handle_config_language(ctx: &mut EventContext<'_>) -> BotResult<Option<BotState>> {
    let text = ctx.require_text()?;
    let language = parse_language(&text)?;
    info!(%language, "Setting language");
    ctx.update_game_config(ctx.config().with_language(language))
        .await?;
    let keyboard = vec![vec!["Naive".to_string(), "GPT".to_string()]];
    ctx.send_text_with_keyboard("🧮 Pick solver:", &keyboard)
        .await?;
    Ok(Some(BotState::ConfigSolver))
}

/// The GPT solver needs no difficulty or model, so it starts immediately.
pub async fn handle_config_solver(ctx: &mut EventContext<'_>) -> BotResult<Option<BotState>> {
    let text = ctx.require_text()?;
    let solver = Solver::parse(&text)?;
    info!(solver = solver.name(), "Setting solver");
    ctx.update_game_config(ctx.config().with_solver(solver))
        .await?;
    if !solver.requires_model() {
        return handle_start(ctx).await;
    }
    let names: Vec<&str> = Difficulty::ALL.iter().map(Difficulty::name).collect();
    let keyboard = vec![title_list(&names)];
    ctx.send_text_with_keyboard("🥵 Pick difficulty:", &keyboard)
        .await?;
    Ok(Some(BotState::ConfigDifficulty))
}

pub async fn handle_config_difficulty(ctx: &mut EventContext<'_>) -> BotResult<Option<BotState>> {
    let text = ctx.require_text()?;
    let difficulty = Difficulty::parse(&text)?;
    info!(difficulty = difficulty.name(), "Setting difficulty");
    ctx.update_game_config(ctx.config().with_difficulty(difficulty))
        .await?;
    let language = ctx.config().language;
    let model_names: Vec<String> = available_models()
        .into_iter()
        .filter(|model| model.language == language)
        .map(|model| model.model_name)
        .collect();
    ctx.send_text_with_keyboard("🧠 Pick language model:", &vec![model_names])
        .await?;
    Ok(Some(BotState::ConfigModel))
}

pub async fn handle_config_model(ctx: &mut EventContext<'_>) -> BotResult<Option<BotState>> {
    let text = ctx.require_text()?;
    let config = ctx.config();
    let model = find_model(&config.language, &text)?;
    info!(model = %model.model_name, "Setting model");
    ctx.update_game_config(config.with_model_identifier(Some(model)))
        .await?;
    handle_start(ctx).await
}

/// In-game free text: resolves to a card index and submits the guess, or
/// re-renders the board with guidance when the text matches nothing.
pub async fn handle_process_message(ctx: &mut EventContext<'_>) -> BotResult<Option<BotState>> {
    let text = ctx.require_text()?;
    info!(%text, "Processing message");
    if ctx.session.is_none() {
        return handle_help(ctx).await;
    }
    ctx.remove_last_keyboard().await?;
    let Some(game_id) = ctx.game_id() else {
        return handle_help(ctx).await;
    };
    let state = ctx.get_game_state().await?;
    if !state.is_human_turn() {
        return fast_forward(ctx, state).await;
    }
    let card_index = match resolve_card_index(&state.board, &text) {
        Ok(card_index) => card_index,
        Err(_) => {
            let message = format!(
                "Card '*{text}*' not found. Please reply with a card index (1-{}) or a word on the board.",
                state.board.size()
            );
            ctx.send_board(&state, Some(&message)).await?;
            return Ok(Some(BotState::Playing));
        }
    };
    let response = ctx.game_api.guess(&game_id, card_index).await?;
    if let Some(given_guess) = &response.given_guess {
        let text = super::ui_builder::guess_result_text(given_guess);
        ctx.send_markdown(&text).await?;
    }
    // A missing given_guess means the turn was passed.
    fast_forward(ctx, response.game_state).await
}

/// Forces one bot move regardless of whose turn it nominally is.
pub async fn handle_next_move(ctx: &mut EventContext<'_>) -> BotResult<Option<BotState>> {
    if ctx.game_id().is_none() {
        return handle_help(ctx).await;
    }
    let state = ctx.get_game_state().await?;
    let new_state = next_move(ctx, state).await?;
    fast_forward(ctx, new_state).await
}

/// `/quit`: concede an active game via the quit sentinel, or just reset.
pub async fn handle_quit(ctx: &mut EventContext<'_>) -> BotResult<Option<BotState>> {
    match ctx.game_id() {
        Some(game_id) => {
            info!(%game_id, "Player quits the game");
            let response = ctx.game_api.guess(&game_id, QUIT_GAME).await?;
            fast_forward(ctx, response.game_state).await
        }
        None => {
            ctx.reset_session().await?;
            handle_help(ctx).await
        }
    }
}

/// Resolves free text to a card index: sentinel commands first, then 1-based
/// numeric input (non-positive values pass through unchanged), then
/// case-insensitive word lookup.
pub fn resolve_card_index(board: &Board, text: &str) -> BotResult<i32> {
    let text = text.trim();
    if let Some(sentinel) = command_card_index(text) {
        return Ok(sentinel);
    }
    if let Ok(index) = text.parse::<i32>() {
        let index = if index > 0 { index - 1 } else { index };
        return Ok(index);
    }
    board
        .find_card_index(text)
        .map(|index| index as i32)
        .ok_or_else(|| BotError::BadInput(format!("Card '*{text}*' not found")))
}

fn short_game_id(game_id: &str) -> &str {
    &game_id[game_id.len().saturating_sub(4)..]
}
