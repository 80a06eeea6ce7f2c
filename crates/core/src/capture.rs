use crate::error::TaskError;

/// Normalized text for capturing a task from any inbound surface
/// (`/add` argument or a reply to the add prompt).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureInput {
    pub text: String,
}

impl CaptureInput {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self {
            text: raw.as_ref().trim().to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn require_text(&self) -> Result<&str, TaskError> {
        if self.text.is_empty() {
            return Err(TaskError::EmptyText);
        }
        Ok(&self.text)
    }
}
