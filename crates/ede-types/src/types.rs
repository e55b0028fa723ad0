use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Loosely-typed record as returned by the admin API
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Record identifiers are kept as strings, numeric ids are stringified
pub type RecordId = String;

/// Extract the `id` field of a record, accepting string or numeric ids
pub fn record_id(record: &Record) -> Option<RecordId> {
    match record.get("id")? {
        serde_json::Value::String(id) if !id.is_empty() => Some(id.clone()),
        serde_json::Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Asc),
            "desc" | "descending" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary file staged for upload next to a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Success => "ok",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

/// Transient toast shown to the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: Uuid,
    pub level: NotificationLevel,
    pub message: String,
}

/// User intents coming from the console input
#[derive(Debug, Clone, PartialEq)]
pub enum UiCommand {
    Search(String),
    Filter { name: String, value: String },
    ClearFilter(String),
    Sort {
        key: String,
        direction: Option<SortDirection>,
    },
    Page(u32),
    NextPage,
    PrevPage,
    PageSize(u32),
    Refresh,
    Select(RecordId),
    SelectAll,
    ClearSelection,
    New,
    Edit(RecordId),
    SetField { name: String, value: String },
    Attach(PathBuf),
    Save,
    Discard,
    Delete(RecordId),
    Deactivate(RecordId),
    Purge(RecordId),
    BulkDelete,
    RegenerateAudio,
    Confirm,
    Cancel,
    Poll(bool),
    Dismiss,
    Show,
    Help,
    Quit,
}
