//! # The Spymaster Bot
//!
//! Telegram front-end for a Codenames-style word-guessing game. The bot walks
//! the user through a configuration dialog, delegates all game logic to a
//! remote game/solver service, plays every bot-owned turn synchronously and
//! renders boards and verdicts as chat messages with reply keyboards. A
//! secondary flow reads physical boards from photos through an external
//! vision service.

pub mod api;
pub mod bot;
pub mod config;
pub mod errors;
pub mod game;
pub mod models;
pub mod store;
pub mod transport;
