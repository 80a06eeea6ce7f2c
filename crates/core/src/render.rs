//! Turns a chat's tasks into a list message plus inline controls.
//!
//! Rendering is a pure function of the task slice, the view, the requested page,
//! and [`ListLimits`]; the same inputs always produce the same [`Rendered`].
//! Text is emitted for the transport's HTML parse mode.

use crate::action::{Action, Verb};
use crate::model::{Task, TaskStatus, ViewKind};

pub const DEFAULT_PAGE_SIZE: usize = 5;
pub const DEFAULT_RECENT_COUNT: usize = 10;

const EMPTY_ALL: &str = "📭 Your task list is empty.";
const EMPTY_COMPLETED: &str = "✅ You have no completed tasks yet.";
const EMPTY_RECENT: &str = "🕙 You have no tasks yet.";
const EMPTY_PAGE: &str = "🤔 No tasks on this page.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListLimits {
    pub page_size: usize,
    pub recent_count: usize,
}

impl Default for ListLimits {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            recent_count: DEFAULT_RECENT_COUNT,
        }
    }
}

impl ListLimits {
    fn page_size(&self) -> usize {
        self.page_size.max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: Action,
}

impl Button {
    fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }

    pub fn contains(&self, action: &Action) -> bool {
        self.buttons().any(|button| &button.action == action)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub keyboard: Option<Keyboard>,
    /// Page actually shown after clamping (always 1 for unpaginated views).
    pub page: usize,
    pub total_pages: usize,
}

impl Rendered {
    fn plain(text: impl Into<String>, page: usize, total_pages: usize) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
            page,
            total_pages,
        }
    }
}

/// Tasks of `view` in display order. Recent views are already truncated.
pub fn ordered<'a>(tasks: &'a [Task], view: ViewKind, limits: ListLimits) -> Vec<&'a Task> {
    match view {
        ViewKind::All => {
            let mut sorted: Vec<&Task> = tasks.iter().collect();
            sorted.sort_by(|a, b| {
                (!a.is_pending())
                    .cmp(&!b.is_pending())
                    .then_with(|| b.id.cmp(&a.id))
            });
            sorted
        }
        ViewKind::Completed => {
            let mut sorted: Vec<&Task> = tasks
                .iter()
                .filter(|task| task.status == TaskStatus::Completed)
                .collect();
            sorted.sort_by(|a, b| b.id.cmp(&a.id));
            sorted
        }
        ViewKind::Recent => {
            let mut sorted: Vec<&Task> = tasks.iter().collect();
            sorted.sort_by(|a, b| b.id.cmp(&a.id));
            sorted.truncate(limits.recent_count);
            sorted
        }
    }
}

pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1)).max(1)
}

/// Highest page number `view` currently has.
pub fn last_page(tasks: &[Task], view: ViewKind, limits: ListLimits) -> usize {
    if !view.is_paginated() {
        return 1;
    }
    total_pages(ordered(tasks, view, limits).len(), limits.page_size())
}

pub fn render(tasks: &[Task], view: ViewKind, page: usize, limits: ListLimits) -> Rendered {
    let entries = ordered(tasks, view, limits);
    if entries.is_empty() {
        return Rendered::plain(empty_message(view), 1, 1);
    }

    if !view.is_paginated() {
        let title = format!("🕙 <b>Last {} tasks:</b>", entries.len());
        return render_entries(&title, &entries, view, 1, 1);
    }

    let page_size = limits.page_size();
    let total = total_pages(entries.len(), page_size);
    let page = page.clamp(1, total);
    let start = (page - 1) * page_size;
    let on_page: Vec<&Task> = entries.iter().skip(start).take(page_size).copied().collect();
    let title = list_title(view);

    if on_page.is_empty() {
        return Rendered::plain(format!("{title}\n\n{EMPTY_PAGE}"), page, total);
    }

    let heading = format!("{title} (page {page}/{total}):");
    let mut rendered = render_entries(&heading, &on_page, view, page, total);

    let mut nav = Vec::new();
    if page > 1 {
        nav.push(Button::new("⬅️ Back", Action::page(view, page - 1)));
    }
    if page < total {
        nav.push(Button::new("Next ➡️", Action::page(view, page + 1)));
    }
    if !nav.is_empty() {
        rendered.keyboard.get_or_insert_with(Keyboard::default).rows.push(nav);
    }
    rendered
}

fn render_entries(
    heading: &str,
    entries: &[&Task],
    view: ViewKind,
    page: usize,
    total_pages: usize,
) -> Rendered {
    let mut text = format!("{heading}\n\n");
    let mut rows = Vec::with_capacity(entries.len());

    for task in entries {
        text.push_str(&format!(
            "{} <code>[ID: {}]</code> {}\n",
            task.status.indicator(),
            task.id,
            escape_html(&task.text)
        ));
        rows.push(task_controls(task, view, page));
    }

    Rendered {
        text,
        keyboard: Some(Keyboard { rows }),
        page,
        total_pages,
    }
}

fn task_controls(task: &Task, view: ViewKind, page: usize) -> Vec<Button> {
    let toggle = match task.status {
        TaskStatus::Pending => Button::new(
            format!("✅ Done {}", task.id),
            Action::new(view, Verb::Complete(task.id), page),
        ),
        TaskStatus::Completed => Button::new(
            format!("↩️ Undo {}", task.id),
            Action::new(view, Verb::Revert(task.id), page),
        ),
    };
    let delete = Button::new(
        format!("❌ Delete {}", task.id),
        Action::new(view, Verb::Delete(task.id), page),
    );
    vec![toggle, delete]
}

fn list_title(view: ViewKind) -> &'static str {
    match view {
        ViewKind::All => "📋 <b>Your tasks</b>",
        ViewKind::Completed => "✔️ <b>Completed tasks</b>",
        ViewKind::Recent => "🕙 <b>Recent tasks</b>",
    }
}

fn empty_message(view: ViewKind) -> &'static str {
    match view {
        ViewKind::All => EMPTY_ALL,
        ViewKind::Completed => EMPTY_COMPLETED,
        ViewKind::Recent => EMPTY_RECENT,
    }
}

/// Escape user-supplied text for Telegram's HTML parse mode.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len().saturating_add(8));
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}
