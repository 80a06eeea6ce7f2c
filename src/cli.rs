use std::path::PathBuf;

use clap::builder::RangedU64ValueParser;
use clap::Parser;
use taskbot_core::render::{DEFAULT_PAGE_SIZE, DEFAULT_RECENT_COUNT};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "taskbot",
    version,
    about = "Telegram assistant: a personal to-do list and current weather lookups.",
    after_help = "Environment:\n  TELEGRAM_BOT_TOKEN   Bot API token (required)\n  GISMETEO_API_TOKEN   Gismeteo API token (required)\n\nExamples:\n  taskbot\n  taskbot --log debug --page-size 8"
)]
pub struct Cli {
    /// Telegram Bot API token
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub telegram_token: String,

    /// Gismeteo weather API token
    #[arg(long, env = "GISMETEO_API_TOKEN", hide_env_values = true)]
    pub gismeteo_token: String,

    /// Override the data directory (defaults to TASKBOT_DATA_DIR or the platform app dir)
    #[arg(long, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Tracing filter directive (e.g. "info", "debug", "taskbot_bot=trace")
    #[arg(long = "log", value_name = "DIRECTIVE", env = "TASKBOT_LOG")]
    pub log_filter: Option<String>,

    /// Tasks per page in paginated lists
    #[arg(long, value_name = "N", default_value_t = DEFAULT_PAGE_SIZE, value_parser = RangedU64ValueParser::<usize>::new().range(1..=50))]
    pub page_size: usize,

    /// Tasks shown by /last
    #[arg(long, value_name = "N", default_value_t = DEFAULT_RECENT_COUNT, value_parser = RangedU64ValueParser::<usize>::new().range(1..=50))]
    pub recent_count: usize,

    /// Base URL of the Telegram Bot API
    #[arg(long, value_name = "URL", default_value = taskbot_bot::telegram::TELEGRAM_API_BASE)]
    pub telegram_api_base: String,
}
