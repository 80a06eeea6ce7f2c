use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
        }
    }

    /// Marker shown in front of every rendered task line.
    pub fn indicator(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "⏳",
            TaskStatus::Completed => "✔️",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which slice of a chat's tasks a rendered list shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    All,
    Completed,
    Recent,
}

impl ViewKind {
    /// Compact code used inside interaction descriptors.
    pub fn code(&self) -> &'static str {
        match self {
            ViewKind::All => "list",
            ViewKind::Completed => "completed",
            ViewKind::Recent => "last10",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "list" => Some(ViewKind::All),
            "completed" => Some(ViewKind::Completed),
            "last10" => Some(ViewKind::Recent),
            _ => None,
        }
    }

    pub fn is_paginated(&self) -> bool {
        !matches!(self, ViewKind::Recent)
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: u64,
    pub text: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }
}

/// One chat's task collection together with its id counter.
///
/// `next_id` only ever grows, so ids freed by deletion are never handed out again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatTasks {
    pub tasks: Vec<Task>,
    pub next_id: u64,
}

impl Default for ChatTasks {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 1,
        }
    }
}

impl ChatTasks {
    pub fn max_id(&self) -> Option<u64> {
        self.tasks.iter().map(|task| task.id).max()
    }

    /// Raise `next_id` above every stored id. Returns `true` when a repair was needed.
    pub fn repair_counter(&mut self) -> bool {
        let floor = self.max_id().map_or(1, |id| id + 1);
        if self.next_id < floor {
            self.next_id = floor;
            return true;
        }
        false
    }

    pub fn position(&self, id: u64) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatusUpdate {
    pub id: u64,
    pub status: TaskStatus,
    pub changed: bool,
}
