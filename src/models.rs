//! Session and configuration model.
//!
//! A [`Session`] is the durable unit of conversation state, persisted through
//! the session store on every mutation. Sessions are replaced wholesale via
//! copy-with-override builders, never mutated in place, so a handler always
//! works on a snapshot.

use serde::{Deserialize, Serialize};

use crate::errors::{BotError, BotResult};
use crate::game::{CardColor, Team};

/// Sentinel card index meaning "no guess, pass the turn".
pub const PASS_GUESS: i32 = -1;
/// Sentinel card index meaning "quit the game".
pub const QUIT_GAME: i32 = -2;

pub const SUPPORTED_LANGUAGES: &[&str] = &["english", "hebrew"];

/// Maps the special keyboard commands to their sentinel card indices.
pub fn command_card_index(text: &str) -> Option<i32> {
    match text {
        "-pass" => Some(PASS_GUESS),
        "-quit" => Some(QUIT_GAME),
        _ => None,
    }
}

/// Discrete step in the dialog state machine, persisted between updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotState {
    Playing,
    // Config
    ConfigLanguage,
    ConfigSolver,
    ConfigDifficulty,
    ConfigModel,
    // Parsing
    ParseLanguage,
    ParseMap,
    ParseBoard,
    ParseFixes,
    ParseFix,
}

/// Controls the bot guesser's turn-skip probability. Skipping never applies
/// to the hinting role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: &'static [Difficulty] = &[Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Probability that a bot operative passes its turn instead of guessing.
    pub fn pass_probability(&self) -> f64 {
        match self {
            Difficulty::Easy => 0.4,
            Difficulty::Medium => 0.2,
            Difficulty::Hard => 0.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn parse(text: &str) -> BotResult<Difficulty> {
        match text.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(BotError::BadInput(format!("Unknown difficulty: '*{text}*'"))),
        }
    }
}

/// Algorithm identity the remote service uses for bot-controlled turns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Solver {
    #[default]
    Naive,
    Gpt,
}

impl Solver {
    pub fn name(&self) -> &'static str {
        match self {
            Solver::Naive => "naive",
            Solver::Gpt => "gpt",
        }
    }

    /// The GPT solver needs no difficulty or model selection.
    pub fn requires_model(&self) -> bool {
        matches!(self, Solver::Naive)
    }

    pub fn parse(text: &str) -> BotResult<Solver> {
        match text.trim().to_lowercase().as_str() {
            "naive" => Ok(Solver::Naive),
            "gpt" => Ok(Solver::Gpt),
            _ => Err(BotError::BadInput(format!("Unknown solver: '*{text}*'"))),
        }
    }
}

/// Language-model selection for solvers that need one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelIdentifier {
    pub language: String,
    pub model_name: String,
    pub is_stemmed: bool,
}

impl ModelIdentifier {
    pub fn new(language: &str, model_name: &str, is_stemmed: bool) -> Self {
        Self {
            language: language.to_string(),
            model_name: model_name.to_string(),
            is_stemmed,
        }
    }
}

/// The models the remote solver service can load, per language.
pub fn available_models() -> Vec<ModelIdentifier> {
    vec![
        ModelIdentifier::new("english", "wiki-50", false),
        ModelIdentifier::new("hebrew", "skv-ft-150", true),
    ]
}

/// Finds a loadable model by language and name.
pub fn find_model(language: &str, model_name: &str) -> BotResult<ModelIdentifier> {
    available_models()
        .into_iter()
        .find(|model| model.language == language && model.model_name == model_name)
        .ok_or_else(|| {
            BotError::BadInput(format!(
                "Unknown model '*{model_name}*' for language '*{language}*'"
            ))
        })
}

pub fn parse_language(text: &str) -> BotResult<String> {
    let language = text.trim().to_lowercase();
    if SUPPORTED_LANGUAGES.contains(&language.as_str()) {
        Ok(language)
    } else {
        Err(BotError::BadInput(format!("Unknown language: '*{text}*'")))
    }
}

/// Immutable configuration selected before a game starts. Each config step
/// produces a new copy with one field overridden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub language: String,
    pub difficulty: Difficulty,
    pub solver: Solver,
    pub model_identifier: Option<ModelIdentifier>,
    pub first_team: Team,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            language: "english".to_string(),
            difficulty: Difficulty::Easy,
            solver: Solver::Naive,
            model_identifier: None,
            first_team: Team::Blue,
        }
    }
}

impl GameConfig {
    pub fn with_language(self, language: String) -> Self {
        Self { language, ..self }
    }

    pub fn with_difficulty(self, difficulty: Difficulty) -> Self {
        Self { difficulty, ..self }
    }

    pub fn with_solver(self, solver: Solver) -> Self {
        Self { solver, ..self }
    }

    pub fn with_model_identifier(self, model_identifier: Option<ModelIdentifier>) -> Self {
        Self {
            model_identifier,
            ..self
        }
    }
}

/// In-progress physical-board parse. Mutually exclusive with active gameplay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsingState {
    pub language: Option<String>,
    pub card_colors: Option<Vec<CardColor>>,
    pub words: Option<Vec<String>>,
    /// Index currently being corrected, set only while awaiting the reply.
    pub fix_index: Option<usize>,
}

impl ParsingState {
    pub fn with_language(self, language: String) -> Self {
        Self {
            language: Some(language),
            ..self
        }
    }

    pub fn with_card_colors(self, card_colors: Vec<CardColor>) -> Self {
        Self {
            card_colors: Some(card_colors),
            ..self
        }
    }

    pub fn with_words(self, words: Vec<String>) -> Self {
        Self {
            words: Some(words),
            ..self
        }
    }

    pub fn with_fix_index(self, fix_index: Option<usize>) -> Self {
        Self { fix_index, ..self }
    }
}

/// Durable per-conversation state. A session is either idle (no game, no
/// parse), playing (`game_id` set) or parsing (`parsing_state` set); the
/// builders below keep those mutually exclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub state: Option<BotState>,
    pub game_id: Option<String>,
    #[serde(default)]
    pub config: GameConfig,
    pub parsing_state: Option<ParsingState>,
    pub last_keyboard_message_id: Option<i32>,
}

impl Session {
    /// Fresh session for a newly started game.
    pub fn new_game(game_id: String, config: GameConfig) -> Self {
        Self {
            state: Some(BotState::Playing),
            game_id: Some(game_id),
            config,
            parsing_state: None,
            last_keyboard_message_id: None,
        }
    }

    pub fn is_game_active(&self) -> bool {
        self.game_id.is_some()
    }

    pub fn with_state(self, state: Option<BotState>) -> Self {
        Self { state, ..self }
    }

    pub fn with_config(self, config: GameConfig) -> Self {
        Self { config, ..self }
    }

    /// Entering a parse clears any active game.
    pub fn with_parsing_state(self, parsing_state: Option<ParsingState>) -> Self {
        let game_id = if parsing_state.is_some() {
            None
        } else {
            self.game_id
        };
        Self {
            game_id,
            parsing_state,
            ..self
        }
    }

    /// Attaching a game clears any in-progress parse.
    pub fn with_game_id(self, game_id: Option<String>) -> Self {
        let parsing_state = if game_id.is_some() {
            None
        } else {
            self.parsing_state
        };
        Self {
            game_id,
            parsing_state,
            ..self
        }
    }

    pub fn with_last_keyboard_message_id(self, last_keyboard_message_id: Option<i32>) -> Self {
        Self {
            last_keyboard_message_id,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_card_index() {
        assert_eq!(command_card_index("-pass"), Some(PASS_GUESS));
        assert_eq!(command_card_index("-quit"), Some(QUIT_GAME));
        assert_eq!(command_card_index("apple"), None);
    }

    #[test]
    fn test_difficulty_parse() {
        assert_eq!(Difficulty::parse("Easy").unwrap(), Difficulty::Easy);
        assert_eq!(Difficulty::parse(" hard ").unwrap(), Difficulty::Hard);
        assert!(matches!(
            Difficulty::parse("nightmare"),
            Err(BotError::BadInput(_))
        ));
    }

    #[test]
    fn test_solver_parse_is_case_insensitive() {
        assert_eq!(Solver::parse("GPT").unwrap(), Solver::Gpt);
        assert_eq!(Solver::parse("naive").unwrap(), Solver::Naive);
        assert!(Solver::parse("minimax").is_err());
    }

    #[test]
    fn test_find_model() {
        let model = find_model("english", "wiki-50").unwrap();
        assert!(!model.is_stemmed);
        assert!(matches!(
            find_model("english", "skv-ft-150"),
            Err(BotError::BadInput(_))
        ));
    }

    #[test]
    fn test_language_parse() {
        assert_eq!(parse_language("English").unwrap(), "english");
        assert!(parse_language("klingon").is_err());
    }

    #[test]
    fn test_config_copy_with_override() {
        let config = GameConfig::default()
            .with_language("hebrew".to_string())
            .with_solver(Solver::Gpt)
            .with_difficulty(Difficulty::Medium)
            .with_model_identifier(Some(ModelIdentifier::new("hebrew", "skv-ft-150", true)));
        assert_eq!(config.language, "hebrew");
        assert_eq!(config.solver, Solver::Gpt);
        assert_eq!(config.difficulty, Difficulty::Medium);
        assert_eq!(config.first_team, Team::Blue);
    }

    #[test]
    fn test_session_exclusivity_invariant() {
        let playing = Session::new_game("abc123".to_string(), GameConfig::default());
        assert!(playing.parsing_state.is_none());

        // Starting a parse drops the active game.
        let parsing = playing.with_parsing_state(Some(ParsingState::default()));
        assert!(parsing.game_id.is_none());
        assert!(parsing.parsing_state.is_some());

        // Starting a game drops the in-progress parse.
        let playing_again = parsing.with_game_id(Some("def456".to_string()));
        assert!(playing_again.parsing_state.is_none());
        assert!(playing_again.game_id.is_some());
    }

    #[test]
    fn test_session_roundtrips_through_json() {
        let session = Session::new_game("abc123".to_string(), GameConfig::default())
            .with_last_keyboard_message_id(Some(42));
        let json = serde_json::to_string(&session).unwrap();
        let restored: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, session);
    }

    #[test]
    fn test_pass_probability_ordering() {
        assert!(Difficulty::Easy.pass_probability() > Difficulty::Medium.pass_probability());
        assert_eq!(Difficulty::Hard.pass_probability(), 0.0);
    }
}
