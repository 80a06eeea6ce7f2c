//! Maps inline-button actions onto task mutations and the refreshed list view.

use crate::action::{Action, Verb};
use crate::error::TaskError;
use crate::model::ViewKind;
use crate::render::{self, ListLimits, Rendered};
use crate::services::TasksService;
use crate::store::TaskStore;

/// Short transient message shown to the user who pressed the button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub urgent: bool,
}

impl Notice {
    fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            urgent: false,
        }
    }

    fn alert(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            urgent: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub notice: Notice,
    /// Replacement for the message that carried the button; `None` leaves it as is.
    pub view: Option<Rendered>,
}

pub const INVALID_ACTION: &str = "⚠️ Invalid action.";

/// Parse `descriptor` and apply it for `chat_id`. Malformed descriptors never mutate.
pub fn route(store: &mut TaskStore, chat_id: &str, descriptor: &str, limits: ListLimits) -> Reply {
    match descriptor.parse::<Action>() {
        Ok(action) => apply(store, chat_id, action, limits),
        Err(err) => {
            tracing::debug!(chat_id, descriptor, error = %err, "rejected action descriptor");
            Reply {
                notice: Notice::alert(INVALID_ACTION),
                view: None,
            }
        }
    }
}

pub fn apply(store: &mut TaskStore, chat_id: &str, action: Action, limits: ListLimits) -> Reply {
    let mut service = TasksService::new(store, chat_id);
    let Action { view, verb, page } = action;

    let outcome = match verb {
        Verb::Page => {
            let rendered = render::render(service.get_all(), view, page, limits);
            let notice = Notice::info(format!("Page {}", rendered.page));
            return Reply {
                notice,
                view: Some(rendered),
            };
        }
        Verb::Complete(id) => service
            .mark_completed(id)
            .map(|_| format!("✅ Task {id} completed!")),
        Verb::Revert(id) => service
            .mark_pending(id)
            .map(|_| format!("↩️ Task {id} moved back to pending!")),
        Verb::Delete(id) => service.delete(id).map(|_| format!("🗑️ Task {id} deleted!")),
    };

    match outcome {
        Ok(message) => {
            let page = match verb {
                Verb::Delete(_) => page.min(render::last_page(service.get_all(), view, limits)),
                _ => page,
            };
            Reply {
                notice: Notice::info(message),
                view: Some(render::render(service.get_all(), view, page, limits)),
            }
        }
        Err(TaskError::NotFound(id)) => Reply {
            notice: Notice::alert(format!("❓ Task {id} not found.")),
            view: Some(render::render(service.get_all(), view, page, limits)),
        },
        Err(err) => Reply {
            notice: Notice::alert(format!("⚠️ {err}")),
            view: None,
        },
    }
}

/// First page of `view` for a chat, as sent by the list commands.
pub fn show(store: &mut TaskStore, chat_id: &str, view: ViewKind, limits: ListLimits) -> Rendered {
    let service = TasksService::new(store, chat_id);
    render::render(service.get_all(), view, 1, limits)
}
