use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::AppConfig;
use crate::error::StoreError;
use crate::model::ChatTasks;

/// Full persisted document: chat identity -> that chat's tasks.
pub type Document = BTreeMap<String, ChatTasks>;

/// JSON file holding the whole [`Document`]. Every save replaces the file.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document. A missing or blank file is `Ok(None)`.
    ///
    /// Chat entries that do not decode are skipped with a warning so one broken
    /// chat cannot take the others down with it.
    pub fn load(&self) -> Result<Option<Document>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }

        let value: Value = serde_json::from_str(&raw).map_err(|source| StoreError::Decode {
            path: self.path.clone(),
            source,
        })?;
        let Value::Object(entries) = value else {
            return Err(StoreError::NotAnObject {
                path: self.path.clone(),
            });
        };

        let mut document = Document::new();
        for (chat_id, entry) in entries {
            match serde_json::from_value::<ChatTasks>(entry) {
                Ok(mut chat) => {
                    if chat.repair_counter() {
                        tracing::warn!(
                            chat_id = chat_id.as_str(),
                            next_id = chat.next_id,
                            "next_id was behind stored ids; repaired"
                        );
                    }
                    document.insert(chat_id, chat);
                }
                Err(err) => {
                    tracing::warn!(
                        chat_id = chat_id.as_str(),
                        error = %err,
                        "dropping malformed chat entry"
                    );
                }
            }
        }
        Ok(Some(document))
    }

    /// Replace the file with `document`. The write goes to a sibling temp file
    /// first and is renamed into place.
    pub fn save(&self, document: &Document) -> Result<(), StoreError> {
        let encoded = serde_json::to_string_pretty(document)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, encoded).map_err(|source| StoreError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// In-memory task lists for every chat, backed by an optional [`JsonFile`].
///
/// The process holds exactly one instance and hands it to handlers by `&mut`.
#[derive(Debug, Default)]
pub struct TaskStore {
    file: Option<JsonFile>,
    chats: Document,
}

impl TaskStore {
    /// Load the store for `config`. Unreadable or corrupt documents start empty.
    pub fn open(config: &AppConfig) -> Self {
        Self::open_file(JsonFile::new(config.data_path()))
    }

    pub fn open_file(file: JsonFile) -> Self {
        let chats = match file.load() {
            Ok(Some(document)) => document,
            Ok(None) => {
                tracing::info!(path = %file.path().display(), "no task document yet; starting empty");
                Document::new()
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to load task document; starting empty");
                Document::new()
            }
        };
        Self {
            file: Some(file),
            chats,
        }
    }

    /// A store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().map(JsonFile::path)
    }

    pub fn chat_count(&self) -> usize {
        self.chats.len()
    }

    pub fn chat(&self, chat_id: &str) -> Option<&ChatTasks> {
        self.chats.get(chat_id)
    }

    /// The chat's collection, created as `{tasks: [], next_id: 1}` on first access.
    pub fn chat_mut(&mut self, chat_id: &str) -> &mut ChatTasks {
        self.chats.entry(chat_id.to_string()).or_default()
    }

    pub fn save(&self) -> Result<(), StoreError> {
        match &self.file {
            Some(file) => file.save(&self.chats),
            None => Ok(()),
        }
    }

    /// Save after a mutation. Failures are logged and the in-memory state stays
    /// authoritative until the next successful save.
    pub fn persist(&self) -> bool {
        match self.save() {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(error = %err, "failed to persist task document");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Task, TaskStatus};
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn temp_file() -> (JsonFile, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let file = JsonFile::new(dir.path().join("user_tasks.json"));
        (file, dir)
    }

    fn sample_document() -> Document {
        let mut document = Document::new();
        document.insert(
            "42".into(),
            ChatTasks {
                tasks: vec![
                    Task {
                        id: 1,
                        text: "buy milk".into(),
                        status: TaskStatus::Pending,
                        created_at: Utc::now(),
                    },
                    Task {
                        id: 3,
                        text: "позвонить маме".into(),
                        status: TaskStatus::Completed,
                        created_at: Utc::now(),
                    },
                ],
                next_id: 4,
            },
        );
        document.insert("7".into(), ChatTasks::default());
        document
    }

    #[test]
    fn save_then_load_roundtrip() {
        let (file, _dir) = temp_file();
        let document = sample_document();
        file.save(&document).expect("save");

        let loaded = file.load().expect("load").expect("document");
        assert_eq!(loaded, document);
    }

    #[test]
    fn missing_and_blank_files_load_as_none() {
        let (file, _dir) = temp_file();
        assert!(file.load().expect("load missing").is_none());

        fs::write(file.path(), "  \n").expect("write blank");
        assert!(file.load().expect("load blank").is_none());
    }

    #[test]
    fn non_object_document_is_rejected() {
        let (file, _dir) = temp_file();
        fs::write(file.path(), "[1, 2, 3]").expect("write");
        assert!(matches!(file.load(), Err(StoreError::NotAnObject { .. })));
    }

    #[test]
    fn malformed_chat_entries_are_dropped() {
        let (file, _dir) = temp_file();
        fs::write(
            file.path(),
            r#"{"1": {"tasks": [], "next_id": 5}, "2": "garbage", "3": {"tasks": []}}"#,
        )
        .expect("write");

        let loaded = file.load().expect("load").expect("document");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["1"].next_id, 5);
    }

    #[test]
    fn stale_counter_is_repaired_on_load() {
        let (file, _dir) = temp_file();
        fs::write(
            file.path(),
            r#"{"1": {"tasks": [{"id": 9, "text": "x", "status": "pending",
                "created_at": "2026-01-01T00:00:00Z"}], "next_id": 2}}"#,
        )
        .expect("write");

        let loaded = file.load().expect("load").expect("document");
        assert_eq!(loaded["1"].next_id, 10);
    }

    #[test]
    fn corrupt_document_opens_empty() {
        let (file, _dir) = temp_file();
        fs::write(file.path(), "{not json").expect("write");

        let store = TaskStore::open_file(file);
        assert_eq!(store.chat_count(), 0);
    }

    #[test]
    fn chat_mut_creates_lazily_and_persist_writes() {
        let (file, _dir) = temp_file();
        let path = file.path().to_path_buf();
        let mut store = TaskStore::open_file(file);
        assert!(store.chat("99").is_none());

        store.chat_mut("99").next_id = 2;
        assert!(store.persist());

        let reopened = TaskStore::open_file(JsonFile::new(path));
        assert_eq!(reopened.chat("99").map(|c| c.next_id), Some(2));
    }

    #[test]
    fn in_memory_store_saves_nowhere() {
        let mut store = TaskStore::in_memory();
        store.chat_mut("1");
        assert!(store.path().is_none());
        assert!(store.save().is_ok());
    }
}
