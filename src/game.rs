//! Wire-level game types shared with the remote game service.
//!
//! The remote service owns all board and rule logic; these types only carry
//! its responses and render them. The human player always occupies the blue
//! operative seat, every other (team, role) pair is bot-controlled.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Blue,
    Red,
}

impl Team {
    pub fn emoji(&self) -> &'static str {
        match self {
            Team::Blue => "🟦",
            Team::Red => "🟥",
        }
    }

    /// Title-cased team name for chat messages.
    pub fn title(&self) -> &'static str {
        match self {
            Team::Blue => "Blue",
            Team::Red => "Red",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerRole {
    /// The hint-giving role.
    Spymaster,
    /// The guessing role.
    Operative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardColor {
    Blue,
    Red,
    Neutral,
    Assassin,
}

impl CardColor {
    pub fn emoji(&self) -> &'static str {
        match self {
            CardColor::Blue => "🟦",
            CardColor::Red => "🟥",
            CardColor::Neutral => "⬜",
            CardColor::Assassin => "💀",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub word: String,
    /// Hidden (`None`) on censored boards until the card is revealed.
    #[serde(default)]
    pub color: Option<CardColor>,
    #[serde(default)]
    pub revealed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub language: String,
    pub cards: Vec<Card>,
}

impl Board {
    /// Cards per keyboard row.
    pub const WIDTH: usize = 5;

    pub fn size(&self) -> usize {
        self.cards.len()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Card]> {
        self.cards.chunks(Self::WIDTH)
    }

    /// Copy of the board with unrevealed card identities hidden.
    pub fn censored(&self) -> Board {
        let cards = self
            .cards
            .iter()
            .map(|card| Card {
                word: card.word.clone(),
                color: if card.revealed { card.color } else { None },
                revealed: card.revealed,
            })
            .collect();
        Board {
            language: self.language.clone(),
            cards,
        }
    }

    /// Case-insensitive word lookup.
    pub fn find_card_index(&self, word: &str) -> Option<usize> {
        let needle = word.trim().to_lowercase();
        self.cards
            .iter()
            .position(|card| card.word.to_lowercase() == needle)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamScore {
    pub unrevealed: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub blue: TeamScore,
    pub red: TeamScore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinningReason {
    TargetScoreReached,
    OpponentHitAssassin,
    OpponentQuit,
}

impl WinningReason {
    pub fn describe(&self) -> &'static str {
        match self {
            WinningReason::TargetScoreReached => "target score reached",
            WinningReason::OpponentHitAssassin => "opponent hit assassin",
            WinningReason::OpponentQuit => "opponent quit",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            WinningReason::TargetScoreReached => "🤓",
            WinningReason::OpponentHitAssassin => "😵",
            WinningReason::OpponentQuit => "🥴",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    pub team: Team,
    pub reason: WinningReason,
}

/// A hint issued by a spymaster. `for_words` records the spymaster's intent
/// and is revealed in the game summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clue {
    pub word: String,
    pub card_amount: u32,
    #[serde(default)]
    pub for_words: Vec<String>,
}

/// The resolved outcome of one guess.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GivenGuess {
    pub guessed_card: Card,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub current_team: Team,
    pub current_player_role: PlayerRole,
    pub is_game_over: bool,
    pub board: Board,
    pub score: Score,
    #[serde(default)]
    pub left_guesses: u32,
    #[serde(default)]
    pub winner: Option<Winner>,
    #[serde(default)]
    pub clues: Vec<Clue>,
}

impl GameState {
    /// The human always plays the blue operative; every other combination is
    /// resolved by the turn-advancement engine.
    pub fn is_human_turn(&self) -> bool {
        self.current_team == Team::Blue && self.current_player_role == PlayerRole::Operative
    }
}
