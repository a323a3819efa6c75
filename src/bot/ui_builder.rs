//! UI builder module for creating keyboards and formatting messages.

use std::collections::HashMap;

use crate::game::{Board, CardColor, Clue, GivenGuess, Score, Team, Winner};
use crate::transport::KeyboardRows;

/// Builds the board reply keyboard: one button per cell, row-aligned with the
/// board, plus a trailing command row. Revealed cards show their color; when
/// the game is over every identity is shown next to its word.
pub fn build_board_keyboard(board: &Board, is_game_over: bool) -> KeyboardRows {
    let mut rows: KeyboardRows = board
        .rows()
        .map(|row| {
            row.iter()
                .map(|card| {
                    if is_game_over {
                        match card.color {
                            Some(color) => format!("{} {}", color.emoji(), card.word),
                            None => card.word.clone(),
                        }
                    } else if card.revealed {
                        match card.color {
                            Some(color) => color.emoji().to_string(),
                            None => card.word.clone(),
                        }
                    } else {
                        card.word.clone()
                    }
                })
                .collect()
        })
        .collect();
    rows.push(vec!["-pass".to_string(), "-quit".to_string()]);
    rows
}

/// Emoji preview of a parsed color map, five cells per row.
pub fn color_emoji_table(colors: &[CardColor]) -> String {
    colors
        .chunks(Board::WIDTH)
        .map(|row| {
            row.iter()
                .map(|color| color.emoji())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Color histogram of a parsed board, most frequent first.
pub fn color_stats(colors: &[CardColor]) -> Vec<(CardColor, usize)> {
    let mut counts: HashMap<CardColor, usize> = HashMap::new();
    for color in colors {
        *counts.entry(*color).or_default() += 1;
    }
    let mut stats: Vec<_> = counts.into_iter().collect();
    stats.sort_by(|a, b| b.1.cmp(&a.1));
    stats
}

pub fn score_line(score: &Score) -> String {
    format!(
        "{}  *{}*  remaining card(s)  *{}*  {}",
        Team::Blue.emoji(),
        score.blue.unrevealed,
        score.red.unrevealed,
        Team::Red.emoji()
    )
}

/// Correct/incorrect verdict for one resolved guess.
pub fn guess_result_text(given_guess: &GivenGuess) -> String {
    let card = &given_guess.guessed_card;
    let color_emoji = card.color.map(|color| color.emoji()).unwrap_or("❓");
    let result = if given_guess.correct {
        "Correct! ✅"
    } else {
        "Wrong! ❌"
    };
    format!("Card '*{}*' is {}, {}", card.word, color_emoji, result)
}

pub fn clue_intent_line(clue: &Clue) -> String {
    format!("'*{}*' for {:?}", clue.word, clue.for_words)
}

pub fn winner_text(winner: &Winner) -> String {
    let player_won = winner.team == Team::Blue;
    let status = if player_won { "won" } else { "lose" };
    let winning_emoji = if player_won { "🎉" } else { "😭" };
    format!(
        "You {}! {}\n{} team won: {} {}",
        status,
        winning_emoji,
        winner.team.title(),
        winner.reason.describe(),
        winner.reason.emoji()
    )
}

pub fn title_list(strings: &[&str]) -> Vec<String> {
    strings.iter().map(|s| title_case(s)).collect()
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
