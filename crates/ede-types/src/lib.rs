pub mod types;

pub use types::{
    Attachment, Notification, NotificationLevel, Record, RecordId, SortDirection, UiCommand,
    record_id,
};
