use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use spymaster_bot::api::{HttpGameClient, HttpParserClient};
use spymaster_bot::bot::{self, warmup, AppDeps};
use spymaster_bot::config::Config;
use spymaster_bot::store::{self, MemorySessionStore, PgSessionStore, SessionStore};
use spymaster_bot::transport::TelegramMessenger;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;

    // Errors are only tracked when a DSN is configured.
    let _sentry_guard = config.sentry_dsn.as_ref().map(|dsn| {
        sentry::init((
            dsn.as_str(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let game_api = HttpGameClient::new(&config.game_server_url)?;
    let parser_api = HttpParserClient::new(&config.parser_url)?;

    // `--warmup` pre-loads remote models and exits, for use right after deploy.
    if std::env::args().any(|arg| arg == "--warmup") {
        info!("Running warmup tasks");
        for result in warmup::run_warmup(&game_api, &parser_api).await {
            info!(
                task = result.name,
                duration_secs = result.duration_secs,
                "{}",
                result.message
            );
        }
        return Ok(());
    }

    info!("Starting The Spymaster Bot");

    let store: Box<dyn SessionStore> = match &config.database_url {
        Some(database_url) => {
            info!("Using Postgres session store");
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            store::init_schema(&pool).await?;
            Box::new(PgSessionStore::new(pool))
        }
        None => {
            info!("DATABASE_URL not set, using in-memory session store");
            Box::new(MemorySessionStore::default())
        }
    };

    let telegram_bot = Bot::new(&config.telegram_token);
    let deps = Arc::new(AppDeps {
        messenger: Box::new(TelegramMessenger::new(telegram_bot.clone())),
        game_api: Box::new(game_api),
        parser_api: Box::new(parser_api),
        store,
    });

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry().branch(Update::filter_message().endpoint({
        let deps = Arc::clone(&deps);
        move |msg: Message| {
            let deps = Arc::clone(&deps);
            async move { bot::handle_update(msg, deps).await }
        }
    }));

    Dispatcher::builder(telegram_bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
