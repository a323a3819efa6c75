//! Turn-advancement engine.
//!
//! After any handler obtains a fresh game state, every turn owned by a
//! bot-controlled role is resolved synchronously, inside the same dispatch,
//! until it is the human's turn to guess or the game ends. Moves are strictly
//! sequential: each one depends on the state produced by the previous one.

use anyhow::anyhow;
use tracing::{debug, info};

use crate::errors::{BotError, BotResult};
use crate::game::{GameState, PlayerRole};
use crate::models::{BotState, PASS_GUESS};

use super::context::EventContext;
use super::handlers;
use super::ui_builder;

/// Resolves all bot-owned turns, renders the resulting board and either
/// returns to idle (game over, session cleared, help re-triggered) or yields
/// `Playing`, awaiting the human guess.
pub async fn fast_forward(
    ctx: &mut EventContext<'_>,
    mut state: GameState,
) -> BotResult<Option<BotState>> {
    while !state.is_game_over && !state.is_human_turn() {
        state = next_move(ctx, state).await?;
    }
    ctx.send_board(&state, None).await?;
    if state.is_game_over {
        ctx.send_game_summary(&state).await?;
        ctx.reset_session().await?;
        return handlers::handle_help(ctx).await;
    }
    Ok(Some(BotState::Playing))
}

/// Resolves exactly one bot turn and returns the new game state.
pub async fn next_move(ctx: &mut EventContext<'_>, state: GameState) -> BotResult<GameState> {
    let config = ctx.config();
    let game_id = ctx
        .game_id()
        .ok_or_else(|| BotError::Unexpected(anyhow!("no active game id, cannot run next move")))?;
    let team = state.current_team.title();

    if state.current_player_role == PlayerRole::Spymaster {
        ctx.send_score(&state).await?;
        ctx.send_text(&format!("{team} spymaster is thinking... 🤔"))
            .await?;
    }

    let dice: f64 = rand::random();
    if should_skip_turn(
        state.current_player_role,
        config.difficulty.pass_probability(),
        dice,
    ) {
        debug!(dice, "Bot operative skips the turn");
        ctx.send_text(&format!("{team} operative has skipped the turn."))
            .await?;
        let response = ctx.game_api.guess(&game_id, PASS_GUESS).await?;
        return Ok(response.game_state);
    }

    let response = ctx.game_api.next_move(&game_id, config.solver).await?;
    if let Some(clue) = &response.given_clue {
        let text = format!(
            "{team} spymaster says '*{}*' with *{}* card(s).",
            clue.word, clue.card_amount
        );
        info!("{text}");
        ctx.send_markdown(&text).await?;
    }
    if let Some(given_guess) = &response.given_guess {
        let text = format!(
            "{team} operative: {}",
            ui_builder::guess_result_text(given_guess)
        );
        ctx.send_markdown(&text).await?;
    }
    Ok(response.game_state)
}

/// The skip check applies only to the guessing role, never to hinting.
pub fn should_skip_turn(role: PlayerRole, pass_probability: f64, dice: f64) -> bool {
    if role != PlayerRole::Operative {
        return false;
    }
    dice < pass_probability
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_skips_with_zero_probability() {
        for dice in [0.0, 0.1, 0.5, 0.999] {
            assert!(!should_skip_turn(PlayerRole::Operative, 0.0, dice));
        }
    }

    #[test]
    fn test_always_skips_with_certain_probability() {
        // dice is drawn from [0, 1), so probability 1 always hits.
        for dice in [0.0, 0.1, 0.5, 0.999] {
            assert!(should_skip_turn(PlayerRole::Operative, 1.0, dice));
        }
    }

    #[test]
    fn test_spymaster_never_skips() {
        for dice in [0.0, 0.5, 0.999] {
            assert!(!should_skip_turn(PlayerRole::Spymaster, 1.0, dice));
        }
    }

    #[test]
    fn test_skip_threshold_is_exclusive() {
        assert!(should_skip_turn(PlayerRole::Operative, 0.5, 0.499));
        assert!(!should_skip_turn(PlayerRole::Operative, 0.5, 0.5));
    }
}
