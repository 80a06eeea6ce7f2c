pub mod cli;
pub mod config;

pub use taskbot_core as core;
pub use taskbot_core::model;
pub use taskbot_core::store;

pub use taskbot_bot as bot;
pub use taskbot_bot::BotConfig;
