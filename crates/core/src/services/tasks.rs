use chrono::Utc;

use crate::capture::CaptureInput;
use crate::error::TaskError;
use crate::model::{StatusUpdate, Task, TaskStatus};
use crate::store::TaskStore;

/// Task operations scoped to one chat. Every successful mutation is persisted
/// before returning.
#[derive(Debug)]
pub struct TasksService<'a> {
    store: &'a mut TaskStore,
    chat_id: String,
}

impl<'a> TasksService<'a> {
    pub fn new(store: &'a mut TaskStore, chat_id: impl Into<String>) -> Self {
        Self {
            store,
            chat_id: chat_id.into(),
        }
    }

    /// Append a pending task and return its id.
    pub fn add(&mut self, text: &str) -> Result<u64, TaskError> {
        let input = CaptureInput::new(text);
        let text = input.require_text()?.to_string();

        let chat = self.store.chat_mut(&self.chat_id);
        let id = chat.next_id;
        chat.tasks.push(Task {
            id,
            text,
            status: TaskStatus::Pending,
            created_at: Utc::now(),
        });
        chat.next_id += 1;

        tracing::debug!(chat_id = self.chat_id.as_str(), task_id = id, "task added");
        self.store.persist();
        Ok(id)
    }

    pub fn set_status(&mut self, id: u64, status: TaskStatus) -> Result<StatusUpdate, TaskError> {
        let chat = self.store.chat_mut(&self.chat_id);
        let task = chat
            .tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or(TaskError::NotFound(id))?;

        let changed = task.status != status;
        task.status = status;

        tracing::debug!(
            chat_id = self.chat_id.as_str(),
            task_id = id,
            status = status.as_str(),
            changed,
            "task status set"
        );
        self.store.persist();
        Ok(StatusUpdate {
            id,
            status,
            changed,
        })
    }

    pub fn mark_completed(&mut self, id: u64) -> Result<StatusUpdate, TaskError> {
        self.set_status(id, TaskStatus::Completed)
    }

    pub fn mark_pending(&mut self, id: u64) -> Result<StatusUpdate, TaskError> {
        self.set_status(id, TaskStatus::Pending)
    }

    pub fn delete(&mut self, id: u64) -> Result<Task, TaskError> {
        let chat = self.store.chat_mut(&self.chat_id);
        let index = chat.position(id).ok_or(TaskError::NotFound(id))?;
        let removed = chat.tasks.remove(index);

        tracing::debug!(chat_id = self.chat_id.as_str(), task_id = id, "task deleted");
        self.store.persist();
        Ok(removed)
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.get_all().iter().find(|task| task.id == id)
    }

    pub fn get_all(&self) -> &[Task] {
        self.store
            .chat(&self.chat_id)
            .map(|chat| chat.tasks.as_slice())
            .unwrap_or(&[])
    }
}
