//! Update routing: one static table from (persisted state, event kind) to a
//! handler, one error boundary around the whole dispatch.
//!
//! Routing is a closed enum plus a pure match, so the table is inspectable in
//! tests without touching the network. Commands override the state machine;
//! text and photos go to whatever the persisted state expects; everything
//! else is a no-op fallback.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{debug, error};

use crate::api::{GameApi, ParserApi};
use crate::errors::BotResult;
use crate::models::{BotState, Session};
use crate::store::SessionStore;
use crate::transport::{Messenger, PhotoMeta};

use super::context::{EventContext, EventKind, UserInfo};
use super::{error_handler, handlers, parse, warmup};

/// Everything a dispatch needs besides the update itself.
pub struct AppDeps {
    pub messenger: Box<dyn Messenger>,
    pub game_api: Box<dyn GameApi>,
    pub parser_api: Box<dyn ParserApi>,
    pub store: Box<dyn SessionStore>,
}

/// The closed set of handlers an update can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Help,
    Start,
    Custom,
    ConfigLanguage,
    ConfigSolver,
    ConfigDifficulty,
    ConfigModel,
    ProcessMessage,
    NextMove,
    Quit,
    Parse,
    ParseLanguage,
    ParseMap,
    ParseBoard,
    ParseFixes,
    ParseFixWord,
    ParseDone,
    Warmup,
    /// Input the table has no use for; dispatch ignores it silently.
    Fallback,
}

/// Pure routing table. Commands win over conversation state, with the one
/// exception of `/done`, which only means something inside the fix loop.
pub fn select_handler(state: Option<BotState>, event: &EventKind) -> HandlerKind {
    if let EventKind::Command(command) = event {
        return match command.as_str() {
            "help" => HandlerKind::Help,
            "start" => HandlerKind::Start,
            "custom" => HandlerKind::Custom,
            "next" => HandlerKind::NextMove,
            "quit" => HandlerKind::Quit,
            "parse" => HandlerKind::Parse,
            "warmup" => HandlerKind::Warmup,
            "done" => match state {
                Some(BotState::ParseFixes) | Some(BotState::ParseFix) => HandlerKind::ParseDone,
                _ => HandlerKind::Fallback,
            },
            _ => HandlerKind::Fallback,
        };
    }
    match (state, event) {
        (None | Some(BotState::Playing), EventKind::Text(_)) => HandlerKind::ProcessMessage,
        (Some(BotState::ConfigLanguage), EventKind::Text(_)) => HandlerKind::ConfigLanguage,
        (Some(BotState::ConfigSolver), EventKind::Text(_)) => HandlerKind::ConfigSolver,
        (Some(BotState::ConfigDifficulty), EventKind::Text(_)) => HandlerKind::ConfigDifficulty,
        (Some(BotState::ConfigModel), EventKind::Text(_)) => HandlerKind::ConfigModel,
        (Some(BotState::ParseLanguage), EventKind::Text(_)) => HandlerKind::ParseLanguage,
        (Some(BotState::ParseMap), EventKind::Photo(_)) => HandlerKind::ParseMap,
        (Some(BotState::ParseBoard), EventKind::Photo(_)) => HandlerKind::ParseBoard,
        (Some(BotState::ParseFixes), EventKind::Text(_)) => HandlerKind::ParseFixes,
        (Some(BotState::ParseFix), EventKind::Text(_)) => HandlerKind::ParseFixWord,
        _ => HandlerKind::Fallback,
    }
}

async fn run_handler(
    kind: HandlerKind,
    ctx: &mut EventContext<'_>,
) -> BotResult<Option<BotState>> {
    match kind {
        HandlerKind::Help => handlers::handle_help(ctx).await,
        HandlerKind::Start => handlers::handle_start(ctx).await,
        HandlerKind::Custom => handlers::handle_custom(ctx).await,
        HandlerKind::ConfigLanguage => handlers::handle_config_language(ctx).await,
        HandlerKind::ConfigSolver => handlers::handle_config_solver(ctx).await,
        HandlerKind::ConfigDifficulty => handlers::handle_config_difficulty(ctx).await,
        HandlerKind::ConfigModel => handlers::handle_config_model(ctx).await,
        HandlerKind::ProcessMessage => handlers::handle_process_message(ctx).await,
        HandlerKind::NextMove => handlers::handle_next_move(ctx).await,
        HandlerKind::Quit => handlers::handle_quit(ctx).await,
        HandlerKind::Parse => parse::handle_parse(ctx).await,
        HandlerKind::ParseLanguage => parse::handle_parse_language(ctx).await,
        HandlerKind::ParseMap => parse::handle_parse_map(ctx).await,
        HandlerKind::ParseBoard => parse::handle_parse_board(ctx).await,
        HandlerKind::ParseFixes => parse::handle_parse_fixes(ctx).await,
        HandlerKind::ParseFixWord => parse::handle_parse_fix_word(ctx).await,
        HandlerKind::ParseDone => parse::handle_parse_done(ctx).await,
        HandlerKind::Warmup => warmup::handle_warmup(ctx).await,
        HandlerKind::Fallback => Ok(ctx.current_state()),
    }
}

/// Runs one dispatch cycle: route, execute, persist the next state, and route
/// any failure to the classifier. The single place errors are caught.
pub async fn handle_event(ctx: &mut EventContext<'_>) {
    let kind = select_handler(ctx.current_state(), &ctx.event);
    debug!(chat_id = ctx.chat_id, ?kind, "Dispatching event");
    match run_handler(kind, ctx).await {
        Ok(next_state) => {
            if let Err(persist_error) = persist_next_state(ctx, next_state).await {
                error!(chat_id = ctx.chat_id, error = %persist_error, "Failed to persist state");
                error_handler::handle_error(ctx, &persist_error).await;
            }
        }
        Err(handler_error) => error_handler::handle_error(ctx, &handler_error).await,
    }
}

/// Writes the next conversation state only when it actually changed, so
/// informational handlers cost zero session writes.
async fn persist_next_state(
    ctx: &mut EventContext<'_>,
    next_state: Option<BotState>,
) -> BotResult<()> {
    if next_state == ctx.current_state() {
        return Ok(());
    }
    let session = ctx.session.clone().unwrap_or_default().with_state(next_state);
    ctx.update_session(session).await
}

/// Teloxide endpoint: reduce the message to an event, load the session
/// snapshot and run the dispatch cycle.
pub async fn handle_update(msg: Message, deps: Arc<AppDeps>) -> anyhow::Result<()> {
    let Some(event) = extract_event(&msg) else {
        debug!(chat_id = msg.chat.id.0, "Ignoring unsupported message kind");
        return Ok(());
    };
    let chat_id = msg.chat.id.0;
    let user = msg.from.as_ref().map(|user| UserInfo {
        id: user.id.0 as i64,
        username: user.username.clone(),
        full_name: user.full_name(),
    });
    let session = match deps.store.get(chat_id).await {
        Ok(session) => session,
        Err(load_error) => {
            error!(chat_id, error = %load_error, "Failed to load session, starting clean");
            Option::<Session>::None
        }
    };
    let mut ctx = EventContext {
        chat_id,
        user,
        event,
        session,
        messenger: deps.messenger.as_ref(),
        game_api: deps.game_api.as_ref(),
        parser_api: deps.parser_api.as_ref(),
        store: deps.store.as_ref(),
    };
    handle_event(&mut ctx).await;
    Ok(())
}

/// Reduces a Telegram message to the event kinds the table understands.
/// Commands are lowercased and stripped of the leading slash and any
/// `@botname` mention.
fn extract_event(msg: &Message) -> Option<EventKind> {
    if let Some(text) = msg.text() {
        let text = text.trim();
        if let Some(command) = text.strip_prefix('/') {
            let command = command
                .split('@')
                .next()
                .unwrap_or_default()
                .to_lowercase();
            return Some(EventKind::Command(command));
        }
        return Some(EventKind::Text(text.to_string()));
    }
    if let Some(photos) = msg.photo() {
        let photos = photos
            .iter()
            .map(|photo| PhotoMeta {
                file_id: photo.file.id.0.clone(),
                file_size: photo.file.size,
            })
            .collect();
        return Some(EventKind::Photo(photos));
    }
    None
}
