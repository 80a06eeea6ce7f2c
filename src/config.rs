pub use taskbot_core::config::*;

use taskbot_bot::BotConfig;
use taskbot_core::ListLimits;

use crate::cli::Cli;

pub fn from_cli(cli: &Cli) -> anyhow::Result<BotConfig> {
    let app = AppConfig::discover(cli.data_dir.clone())?.with_limits(ListLimits {
        page_size: cli.page_size,
        recent_count: cli.recent_count,
    });

    let mut config = BotConfig::new(app, cli.telegram_token.clone(), cli.gismeteo_token.clone());
    config.telegram_api_base = cli.telegram_api_base.clone();
    config.log_filter = cli.log_filter.clone();
    Ok(config)
}
