//! Bot module for handling Telegram interactions
//!
//! Split into submodules:
//! - `dispatch`: routes (state, event) pairs to handlers behind one error boundary
//! - `context`: per-dispatch snapshot and collaborator handles
//! - `handlers` / `parse`: the conversation state machine
//! - `fast_forward`: plays bot-owned turns until it's the human's move
//! - `ui_builder`: creates keyboards and formats messages

pub mod context;
pub mod dispatch;
pub mod error_handler;
pub mod fast_forward;
pub mod handlers;
pub mod parse;
pub mod ui_builder;
pub mod warmup;

pub use context::{EventContext, EventKind, UserInfo};
pub use dispatch::{handle_update, select_handler, AppDeps, HandlerKind};
