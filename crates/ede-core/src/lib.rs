pub mod confirm;
pub mod debounce;
pub mod display;
pub mod entities;
pub mod form;
pub mod list;
pub mod location;
pub mod notify;
pub mod pagination;
pub mod poll;
pub mod preprocess;
pub mod query;
pub mod schema;
pub mod selection;

pub use confirm::{ActionKind, ConfirmGate, DestructiveAction, GateError, GateState, Resolution};
pub use entities::{EntityKind, UnknownEntity};
pub use form::{Draft, DraftMode, FormController, FormError, SubmitOutcome, SubmitPlan};
pub use list::{FetchTicket, ListController};
pub use location::UrlSync;
pub use notify::NotificationQueue;
pub use pagination::PageWindow;
pub use poll::Poller;
pub use query::{FilterKind, FilterSpec, FilterValue, ListSchema, QueryChange, QueryError, QueryState, Sort};
pub use schema::{AttachmentRule, EntitySchema, FieldDescriptor, FieldKind};
pub use selection::Selection;
