//! Compact interaction descriptors carried by inline buttons.
//!
//! Wire format: `<view>_page_<page>` or `<view>_<verb>_<task id>_<page>`, where
//! `<view>` is one of `list`, `completed`, `last10` and `<verb>` is one of
//! `done`, `undo`, `delete`. Descriptors are parsed once at the boundary and
//! anything that does not match exactly is rejected.

use std::fmt;
use std::str::FromStr;

use crate::error::ActionError;
use crate::model::ViewKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Page,
    Complete(u64),
    Revert(u64),
    Delete(u64),
}

impl Verb {
    fn code(&self) -> &'static str {
        match self {
            Verb::Page => "page",
            Verb::Complete(_) => "done",
            Verb::Revert(_) => "undo",
            Verb::Delete(_) => "delete",
        }
    }

    pub fn task_id(&self) -> Option<u64> {
        match self {
            Verb::Page => None,
            Verb::Complete(id) | Verb::Revert(id) | Verb::Delete(id) => Some(*id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
    pub view: ViewKind,
    pub verb: Verb,
    pub page: usize,
}

impl Action {
    pub fn new(view: ViewKind, verb: Verb, page: usize) -> Self {
        Self { view, verb, page }
    }

    pub fn page(view: ViewKind, page: usize) -> Self {
        Self::new(view, Verb::Page, page)
    }

    pub fn task_id(&self) -> Option<u64> {
        self.verb.task_id()
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.verb.task_id() {
            None => write!(f, "{}_{}_{}", self.view.code(), self.verb.code(), self.page),
            Some(id) => write!(
                f,
                "{}_{}_{}_{}",
                self.view.code(),
                self.verb.code(),
                id,
                self.page
            ),
        }
    }
}

impl FromStr for Action {
    type Err = ActionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ActionError::Empty);
        }

        let parts: Vec<&str> = raw.split('_').collect();
        let view = ViewKind::from_code(parts[0])
            .ok_or_else(|| ActionError::UnknownView(parts[0].to_string()))?;
        let verb_code = parts
            .get(1)
            .ok_or_else(|| ActionError::Malformed(raw.to_string()))?;

        let (verb, page) = match *verb_code {
            "page" => {
                if parts.len() != 3 {
                    return Err(ActionError::Malformed(raw.to_string()));
                }
                (Verb::Page, parse_number(parts[2])?)
            }
            "done" | "undo" | "delete" => {
                if !(3..=4).contains(&parts.len()) {
                    return Err(ActionError::Malformed(raw.to_string()));
                }
                let id = parse_number(parts[2])?;
                let page = match parts.get(3) {
                    Some(page) => parse_number(page)?,
                    None => 1,
                };
                let verb = match *verb_code {
                    "done" => Verb::Complete(id),
                    "undo" => Verb::Revert(id),
                    _ => Verb::Delete(id),
                };
                (verb, page)
            }
            other => return Err(ActionError::UnknownVerb(other.to_string())),
        };

        let page = usize::try_from(page).map_err(|_| ActionError::InvalidNumber(page.to_string()))?;
        let page = match (page, view.is_paginated()) {
            (0, true) => return Err(ActionError::ZeroPage),
            // Recent lists are unpaginated; older buttons carried page 0.
            (_, false) => 1,
            (page, true) => page,
        };

        Ok(Action { view, verb, page })
    }
}

fn parse_number(raw: &str) -> Result<u64, ActionError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ActionError::InvalidNumber(raw.to_string()));
    }
    raw.parse::<u64>()
        .map_err(|_| ActionError::InvalidNumber(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("list_page_2", Action::page(ViewKind::All, 2))]
    #[case("completed_page_1", Action::page(ViewKind::Completed, 1))]
    #[case("list_done_7_3", Action::new(ViewKind::All, Verb::Complete(7), 3))]
    #[case("completed_undo_4_1", Action::new(ViewKind::Completed, Verb::Revert(4), 1))]
    #[case("list_delete_12_2", Action::new(ViewKind::All, Verb::Delete(12), 2))]
    #[case("last10_done_5_0", Action::new(ViewKind::Recent, Verb::Complete(5), 1))]
    #[case("list_delete_9", Action::new(ViewKind::All, Verb::Delete(9), 1))]
    fn parses_descriptors(#[case] raw: &str, #[case] expected: Action) {
        assert_eq!(raw.parse::<Action>(), Ok(expected));
    }

    #[rstest]
    #[case("", ActionError::Empty)]
    #[case("inbox_page_1", ActionError::UnknownView("inbox".into()))]
    #[case("list_archive_1_1", ActionError::UnknownVerb("archive".into()))]
    #[case("list_done_x_1", ActionError::InvalidNumber("x".into()))]
    #[case("list_done_-1_1", ActionError::InvalidNumber("-1".into()))]
    #[case("list_page_abc", ActionError::InvalidNumber("abc".into()))]
    #[case("list_page_0", ActionError::ZeroPage)]
    #[case("list", ActionError::Malformed("list".into()))]
    #[case("list_page", ActionError::Malformed("list_page".into()))]
    #[case("list_done_1_2_3", ActionError::Malformed("list_done_1_2_3".into()))]
    fn rejects_malformed_descriptors(#[case] raw: &str, #[case] expected: ActionError) {
        assert_eq!(raw.parse::<Action>(), Err(expected));
    }

    #[test]
    fn encoded_descriptors_parse_back() {
        let action = Action::new(ViewKind::Completed, Verb::Delete(31), 4);
        assert_eq!(action.encode(), "completed_delete_31_4");
        assert_eq!(action.encode().parse::<Action>(), Ok(action));
    }

    #[test]
    fn descriptors_fit_callback_limit() {
        let action = Action::new(ViewKind::Completed, Verb::Delete(u64::MAX), usize::MAX);
        assert!(action.encode().len() <= 64);
    }

    #[test]
    fn page_verbs_carry_no_task_id() {
        assert_eq!(Action::page(ViewKind::All, 1).task_id(), None);
        assert_eq!(
            Action::new(ViewKind::All, Verb::Revert(3), 1).task_id(),
            Some(3)
        );
    }
}
