//! Physical-board parsing pipeline.
//!
//! A linear photo dialog: pick a recognition language, photograph the color
//! key card, photograph the word board, then fix individual cells until the
//! result is right. The heavy lifting happens in the vision service; these
//! handlers shuttle photos out and render what came back.

use tracing::info;

use crate::errors::{BotError, BotResult};
use crate::game::{Board, Card, CardColor};
use crate::models::{BotState, ParsingState, Session, SUPPORTED_LANGUAGES};

use super::context::EventContext;
use super::ui_builder::{self, title_list};

/// Recognition language codes understood by the vision service.
pub fn language_code(language: &str) -> String {
    match language {
        "english" => "eng".to_string(),
        "hebrew" => "heb".to_string(),
        "russian" => "rus".to_string(),
        other => other.chars().take(3).collect(),
    }
}

/// `/parse` entry: fresh parsing state, language prompt.
pub async fn handle_parse(ctx: &mut EventContext<'_>) -> BotResult<Option<BotState>> {
    info!("Starting board parsing");
    let session = Session::default().with_parsing_state(Some(ParsingState::default()));
    ctx.set_session(Some(session)).await?;
    let keyboard = vec![title_list(SUPPORTED_LANGUAGES)];
    ctx.send_text_with_keyboard("🌍 Pick the board language:", &keyboard)
        .await?;
    Ok(Some(BotState::ParseLanguage))
}

pub async fn handle_parse_language(ctx: &mut EventContext<'_>) -> BotResult<Option<BotState>> {
    let text = ctx.require_text()?;
    let language = crate::models::parse_language(&text)?;
    info!(%language, "Setting parsing language");
    let parsing_state = ctx.parsing_state()?.with_language(language);
    ctx.update_parsing_state(parsing_state).await?;
    ctx.send_text("📷 Send me a photo of the color map!").await?;
    Ok(Some(BotState::ParseMap))
}

/// Key-card photo: extract the color grid and preview it.
pub async fn handle_parse_map(ctx: &mut EventContext<'_>) -> BotResult<Option<BotState>> {
    let image_b64 = ctx.photo_base64().await?;
    ctx.send_text("Parsing, please wait... ⏳").await?;
    let card_colors = ctx.parser_api.parse_color_map(&image_b64).await?;
    info!(cells = card_colors.len(), "Color map parsed");
    let preview = ui_builder::color_emoji_table(&card_colors);
    let stats = ui_builder::color_stats(&card_colors)
        .into_iter()
        .map(|(color, count)| format!("{} {}", color.emoji(), count))
        .collect::<Vec<_>>()
        .join("  ");
    ctx.send_text(&format!("{preview}\n{stats}")).await?;
    let parsing_state = ctx.parsing_state()?.with_card_colors(card_colors);
    ctx.update_parsing_state(parsing_state).await?;
    ctx.send_text("📷 Now send me a photo of the board!").await?;
    Ok(Some(BotState::ParseBoard))
}

/// Board photo: extract the words, align them with the color grid and enter
/// the fix loop.
pub async fn handle_parse_board(ctx: &mut EventContext<'_>) -> BotResult<Option<BotState>> {
    let image_b64 = ctx.photo_base64().await?;
    let parsing_state = ctx.parsing_state()?;
    let language = parsing_state
        .language
        .clone()
        .unwrap_or_else(|| "english".to_string());
    ctx.send_text("Parsing, this might take a while... ⏳").await?;
    let words = ctx
        .parser_api
        .parse_board_words(&image_b64, &language_code(&language))
        .await?;
    info!(words = words.len(), "Board words parsed");
    let words = fill_blank_words(words);
    if let Some(card_colors) = &parsing_state.card_colors {
        if card_colors.len() != words.len() {
            return Err(BotError::BadInput(format!(
                "Board has {} words but the color map has {} cells, please retake the photo.",
                words.len(),
                card_colors.len()
            )));
        }
    }
    let parsing_state = parsing_state.with_words(words);
    ctx.update_parsing_state(parsing_state.clone()).await?;
    send_parsing_state(ctx, &parsing_state).await?;
    Ok(Some(BotState::ParseFixes))
}

/// Fix selection: the user names a cell (by word or index) that came out wrong.
pub async fn handle_parse_fixes(ctx: &mut EventContext<'_>) -> BotResult<Option<BotState>> {
    let text = ctx.require_text()?;
    let parsing_state = ctx.parsing_state()?;
    let board = parsing_board(&parsing_state)?;
    let fix_index = match super::handlers::resolve_card_index(&board, &text) {
        Ok(index) if index >= 0 && (index as usize) < board.size() => index as usize,
        _ => {
            return Err(BotError::BadInput(format!(
                "Card '*{text}*' not found, pick a word from the keyboard."
            )))
        }
    };
    ctx.update_parsing_state(parsing_state.with_fix_index(Some(fix_index)))
        .await?;
    ctx.send_markdown(&format!("What should card *{}* say?", fix_index + 1))
        .await?;
    Ok(Some(BotState::ParseFix))
}

/// Correction reply: overwrite the selected cell and re-render.
pub async fn handle_parse_fix_word(ctx: &mut EventContext<'_>) -> BotResult<Option<BotState>> {
    let text = ctx.require_text()?;
    let parsing_state = ctx.parsing_state()?;
    let fix_index = parsing_state
        .fix_index
        .ok_or_else(|| BotError::BadInput("No card is being fixed right now.".to_string()))?;
    let mut words = parsing_state.words.clone().unwrap_or_default();
    if fix_index >= words.len() {
        return Err(BotError::BadInput(format!(
            "Card index {} is out of range.",
            fix_index + 1
        )));
    }
    info!(fix_index, word = %text, "Fixing parsed word");
    words[fix_index] = text;
    let parsing_state = parsing_state.with_words(words).with_fix_index(None);
    ctx.update_parsing_state(parsing_state.clone()).await?;
    send_parsing_state(ctx, &parsing_state).await?;
    Ok(Some(BotState::ParseFixes))
}

/// `/done`: final render, clear the parsing state, back to idle.
pub async fn handle_parse_done(ctx: &mut EventContext<'_>) -> BotResult<Option<BotState>> {
    let parsing_state = ctx.parsing_state()?;
    let board = parsing_board(&parsing_state)?;
    let keyboard = ui_builder::build_board_keyboard(&board, true);
    ctx.send_markdown_with_keyboard("Here is your board! 🎉", &keyboard)
        .await?;
    let session = ctx
        .session
        .clone()
        .unwrap_or_default()
        .with_parsing_state(None)
        .with_state(None);
    ctx.set_session(Some(session)).await?;
    Ok(None)
}

/// Renders the parsed board so far with its fix keyboard.
async fn send_parsing_state(
    ctx: &mut EventContext<'_>,
    parsing_state: &ParsingState,
) -> BotResult<()> {
    let board = parsing_board(parsing_state)?;
    let mut keyboard = ui_builder::build_board_keyboard(&board, true);
    keyboard.pop(); // no -pass / -quit during parsing
    keyboard.push(vec!["/done".to_string()]);
    ctx.send_markdown_with_keyboard(
        "Pick any card that needs fixing, or /done when it looks right.",
        &keyboard,
    )
    .await?;
    Ok(())
}

/// Unrecognized cells become index placeholders the user can fix by number.
fn fill_blank_words(words: Vec<String>) -> Vec<String> {
    words
        .into_iter()
        .enumerate()
        .map(|(i, word)| {
            if word.trim().is_empty() {
                format!("#{}", i + 1)
            } else {
                word
            }
        })
        .collect()
}

/// Assembles a board from whatever the parse has produced so far.
fn parsing_board(parsing_state: &ParsingState) -> BotResult<Board> {
    let words = parsing_state
        .words
        .clone()
        .ok_or_else(|| BotError::BadInput("No parsed board yet.".to_string()))?;
    let colors: Vec<Option<CardColor>> = match &parsing_state.card_colors {
        Some(colors) => colors.iter().copied().map(Some).collect(),
        None => vec![None; words.len()],
    };
    let cards = words
        .into_iter()
        .zip(colors)
        .map(|(word, color)| Card {
            word,
            color,
            revealed: false,
        })
        .collect();
    Ok(Board {
        language: parsing_state
            .language
            .clone()
            .unwrap_or_else(|| "english".to_string()),
        cards,
    })
}
