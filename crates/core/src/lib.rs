pub mod action;
pub mod capture;
pub mod commands;
pub mod config;
pub mod error;
pub mod intent;
pub mod model;
pub mod render;
pub mod router;
pub mod services;
pub mod store;

pub use action::{Action, Verb};
pub use capture::CaptureInput;
pub use commands::{parse_command, parse_menu_button, Command};
pub use config::AppConfig;
pub use error::{ActionError, StoreError, TaskError};
pub use intent::{IntentKind, PendingIntents};
pub use model::*;
pub use render::{render, Button, Keyboard, ListLimits, Rendered};
pub use router::{Notice, Reply};
pub use services::TasksService;
pub use store::{JsonFile, TaskStore};
