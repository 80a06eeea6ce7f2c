pub mod constants;
pub mod error;
pub mod gateway;
pub mod geocode;
pub mod handlers;
pub mod telegram;
pub mod weather;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use taskbot_core::commands::COMMAND_CATALOG;
use taskbot_core::intent::DEFAULT_INTENT_TTL;
use taskbot_core::{AppConfig, PendingIntents, TaskStore};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

pub use error::{ResolveError, ServiceError};
pub use gateway::{InboundEvent, LocationResolver, MessagingGateway, WeatherProvider};
pub use handlers::Assistant;

use crate::geocode::NominatimResolver;
use crate::telegram::{update_into_event, TelegramClient, LONG_POLL_TIMEOUT_SECS, TELEGRAM_API_BASE};
use crate::weather::GismeteoProvider;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Runtime configuration for the bot process.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub app: AppConfig,
    pub telegram_token: String,
    pub gismeteo_token: String,
    pub telegram_api_base: String,
    pub log_filter: Option<String>,
    /// Deadline for geocoding and weather calls.
    pub request_timeout: Duration,
    pub intent_ttl: Duration,
}

impl BotConfig {
    pub fn new(
        app: AppConfig,
        telegram_token: impl Into<String>,
        gismeteo_token: impl Into<String>,
    ) -> Self {
        Self {
            app,
            telegram_token: telegram_token.into(),
            gismeteo_token: gismeteo_token.into(),
            telegram_api_base: TELEGRAM_API_BASE.to_string(),
            log_filter: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            intent_ttl: DEFAULT_INTENT_TTL,
        }
    }
}

/// Poll Telegram and answer updates until Ctrl-C, then flush the store.
pub async fn run(config: BotConfig) -> Result<()> {
    init_tracing(config.log_filter.clone())?;

    let store = TaskStore::open(&config.app);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        data_path = %config.app.data_path().display(),
        chats = store.chat_count(),
        "task data loaded"
    );

    let poll_timeout = Duration::from_secs(LONG_POLL_TIMEOUT_SECS) + config.request_timeout;
    let telegram = Arc::new(
        TelegramClient::new(&config.telegram_token, &config.telegram_api_base, poll_timeout)
            .context("failed to build Telegram client")?,
    );
    let locations = Arc::new(
        NominatimResolver::new(config.request_timeout)
            .context("failed to build geocoding client")?,
    );
    let weather = Arc::new(
        GismeteoProvider::new(&config.gismeteo_token, config.request_timeout)
            .context("failed to build weather client")?,
    );

    register_bot(&telegram).await;

    let mut assistant = Assistant::new(
        store,
        PendingIntents::new(config.intent_ttl),
        config.app.limits(),
        telegram.clone(),
        locations,
        weather,
    );

    tracing::info!("bot started, polling for updates");
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut offset = 0_i64;

    loop {
        let polled = tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("shutdown requested");
                break;
            }
            polled = telegram.poll_updates(offset) => polled,
        };

        match polled {
            Ok((updates, next_offset)) => {
                offset = next_offset;
                for update in updates {
                    if let Some(event) = update_into_event(update) {
                        assistant.handle(event).await;
                    }
                }
            }
            Err(ServiceError::RateLimited { retry_after_secs }) => {
                tracing::warn!(retry_after_secs, "polling rate limited");
                tokio::time::sleep(Duration::from_secs(retry_after_secs)).await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "polling failed, retrying");
                tokio::time::sleep(POLL_RETRY_DELAY).await;
            }
        }
    }

    // Updates handled in the last batch are only confirmed by the next getUpdates.
    if offset > 0 {
        if let Err(err) = telegram.acknowledge(offset).await {
            tracing::warn!(offset, error = %err, "failed to confirm processed updates");
        }
    }

    match assistant.flush() {
        Ok(()) => tracing::info!(chats = assistant.store().chat_count(), "task data flushed"),
        Err(err) => tracing::error!(error = %err, "failed to flush task data on shutdown"),
    }
    Ok(())
}

/// Run the bot on an internal single-threaded Tokio runtime.
pub fn run_blocking(config: BotConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    runtime.block_on(run(config))
}

async fn register_bot(telegram: &TelegramClient) {
    if let Err(err) = telegram.set_my_commands(COMMAND_CATALOG).await {
        tracing::warn!(error = %err, "failed to register bot commands");
    }
    if let Err(err) = telegram.set_my_description(constants::BOT_DESCRIPTION).await {
        tracing::warn!(error = %err, "failed to set bot description");
    }
}

fn init_tracing(filter: Option<String>) -> Result<()> {
    let filter = filter.unwrap_or_else(|| "info".to_string());
    let directive: Directive = filter
        .parse()
        .with_context(|| format!("invalid log filter '{filter}'"))?;
    let env_filter = EnvFilter::builder()
        .with_default_directive(directive)
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .try_init();
    Ok(())
}
