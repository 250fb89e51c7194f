mod config;
mod error;
mod handler;
mod platform;
mod summary;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::Bot;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::handler::Handler;
use crate::platform::telegram::{self, TelegramTransport};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    // Initialize logging; RUST_LOG wins over the configured level
    let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => config.log_filter()?,
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Configuration loaded from: {}", config_path.display());

    let bot = Bot::new(&config.telegram.bot_token);
    let handler = Arc::new(Handler::new(Arc::new(TelegramTransport::new(bot.clone()))));

    info!("Bot is starting...");
    telegram::run(bot, handler).await?;

    Ok(())
}
