//! Typed clients for the remote collaborators.
//!
//! - `game_client`: the game/solver service that owns all board and rule logic
//! - `parser_client`: the vision service that reads physical boards from photos

pub mod game_client;
pub mod parser_client;

pub use game_client::{GameApi, HttpGameClient};
pub use parser_client::{HttpParserClient, ParserApi};
