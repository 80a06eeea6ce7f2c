//! User-facing message texts. All of them are sent in HTML parse mode.

use taskbot_core::render::escape_html;

pub const BOT_DESCRIPTION: &str = "Personal assistant: keep a to-do list and check the current \
weather. Use the buttons below or /help to get started.";

pub const MENU_TITLE: &str = "📌 Main menu:";

pub const TASKS_SECTION: &str = "📁 <b>Tasks</b>\n\n\
Pick a command:\n\
▪️ /list\n\
▪️ /last\n\
▪️ /completed\n\
▪️ /add &lt;text&gt;";

pub const ADD_PROMPT: &str = "📝 Enter the text of the new task:";
pub const CITY_PROMPT: &str = "🌍 Enter a city name:";

pub const EMPTY_TASK_REPLY: &str =
    "You sent an empty text. The task was not added. Try /add &lt;text&gt;.";
pub const EMPTY_CITY_REPLY: &str = "You sent an empty name. Try /weather &lt;city&gt;.";

pub const UNKNOWN_COMMAND: &str = "🤷 Unknown command. See /help.";
pub const INTERNAL_ERROR: &str = "❌ Something went wrong. Please try again.";

pub const LOCATION_FOUND: &str = "📍 Location found. Fetching weather...";

pub fn greeting(first_name: Option<&str>) -> String {
    let name = first_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(escape_html)
        .unwrap_or_else(|| "there".to_string());
    format!(
        "👋 <b>Hi, {name}! I'm your assistant bot.</b>\n\n\
         Use the buttons below or the /help command for a reference."
    )
}

pub fn help_text(recent_count: usize) -> String {
    format!(
        "📖 <b>Command reference:</b>\n\
         (The command list is also available via the '/' or 'Menu' button)\n\n\
         🚀 /start - Start / greeting\n\
         📌 /menu - Show the main menu with buttons\n\
         ℹ️ /help - Show this reference\n\n\
         <b>Tasks:</b>\n\
         ➕ /add &lt;text&gt; - Add a new task\n\
         📋 /list - Show all tasks\n\
         🕙 /last - Show the last {recent_count} tasks\n\
         ✅ /completed - Show completed tasks\n\n\
         <b>Weather:</b>\n\
         ☀️ /weather &lt;city&gt; - Current weather"
    )
}

pub fn task_added(id: u64) -> String {
    format!("✅ Task added! (ID: <code>{id}</code>)")
}

pub fn looking_up(city: &str) -> String {
    format!("🌍 Looking up '{}'...", escape_html(city))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn greeting_escapes_and_falls_back() {
        assert!(greeting(Some("<Ana>")).contains("Hi, &lt;Ana&gt;!"));
        assert!(greeting(None).contains("Hi, there!"));
        assert!(greeting(Some("  ")).contains("Hi, there!"));
    }

    #[test]
    fn help_mentions_recent_count() {
        assert!(help_text(7).contains("Show the last 7 tasks"));
    }

    #[test]
    fn progress_messages() {
        assert_eq!(task_added(3), "✅ Task added! (ID: <code>3</code>)");
        assert_eq!(looking_up("A&B"), "🌍 Looking up 'A&amp;B'...");
    }
}
