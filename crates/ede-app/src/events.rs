use ede_api::{ApiError, ListPage};
use ede_core::SubmitOutcome;
use ede_types::{Attachment, Record, RecordId, UiCommand};

/// Everything the view loop reacts to
#[derive(Debug, Clone)]
pub enum ConsoleEvent {
    Command(UiCommand),
    /// Search text after the debounce window
    SearchSettled(String),
    ListLoaded {
        generation: u64,
        result: Result<ListPage, ApiError>,
    },
    /// A record requested for editing that was not on the loaded page
    RecordLoaded {
        id: RecordId,
        result: Result<Record, ApiError>,
    },
    AttachmentLoaded(Result<Attachment, String>),
    Submitted(SubmitOutcome),
    ActionFinished(Result<(), ApiError>),
    PollTick,
    Tick,
    InputClosed,
}
