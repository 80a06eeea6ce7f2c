use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::ViewKind;

static COMMAND_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/([A-Za-z0-9_]+)(?:@[A-Za-z0-9_]+)?(?:\s+([\s\S]*))?$").expect("valid regex")
});

pub const MENU_TASKS: &str = "📋 Tasks";
pub const MENU_WEATHER: &str = "☀️ Weather";
pub const MENU_HELP: &str = "ℹ️ Help";

/// A slash command recognised by the assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Menu,
    Help,
    TasksSection,
    Add(Option<String>),
    List(ViewKind),
    Weather(Option<String>),
    Unknown(String),
}

/// Commands advertised to the chat platform: (name, description).
pub const COMMAND_CATALOG: &[(&str, &str)] = &[
    ("start", "🚀 Start / greeting"),
    ("menu", "📌 Show the main menu"),
    ("help", "ℹ️ Command reference"),
    ("add", "➕ Add a task (<text>)"),
    ("list", "📋 Show all tasks"),
    ("last", "🕙 Show recent tasks"),
    ("completed", "✅ Show completed tasks"),
    ("weather", "☀️ Current weather (<city>)"),
];

/// Split `/name@bot argument` into a [`Command`]. Returns `None` for plain text.
pub fn parse_command(text: &str) -> Option<Command> {
    let captures = COMMAND_RE.captures(text.trim())?;
    let name = captures.get(1)?.as_str().to_ascii_lowercase();
    let argument = captures
        .get(2)
        .map(|m| m.as_str().trim().to_string())
        .filter(|arg| !arg.is_empty());

    let command = match name.as_str() {
        "start" => Command::Start,
        "menu" => Command::Menu,
        "help" => Command::Help,
        "add" => Command::Add(argument),
        "list" => Command::List(ViewKind::All),
        "last" | "last10" => Command::List(ViewKind::Recent),
        "completed" => Command::List(ViewKind::Completed),
        "weather" => Command::Weather(argument),
        _ => Command::Unknown(name),
    };
    Some(command)
}

/// Reply-keyboard buttons of the main menu, mapped onto their commands.
pub fn parse_menu_button(text: &str) -> Option<Command> {
    match text.trim() {
        MENU_TASKS => Some(Command::TasksSection),
        MENU_WEATHER => Some(Command::Weather(None)),
        MENU_HELP => Some(Command::Help),
        _ => None,
    }
}
