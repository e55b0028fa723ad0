use ede_api::{ApiClient, ApiError, ApiRequest, Resource};
use ede_types::{NotificationLevel, RecordId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Delete,
    Deactivate,
    Purge,
    BulkDelete,
    RegenerateAudio,
}

impl ActionKind {
    pub fn is_bulk(&self) -> bool {
        matches!(self, Self::BulkDelete | Self::RegenerateAudio)
    }

    fn verb(&self) -> &'static str {
        match self {
            Self::Delete | Self::BulkDelete => "Deleted",
            Self::Deactivate => "Deactivated",
            Self::Purge => "Purged",
            Self::RegenerateAudio => "Queued audio regeneration for",
        }
    }
}

/// An irreversible action waiting on, or carrying, operator confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestructiveAction {
    pub kind: ActionKind,
    pub ids: Vec<RecordId>,
    /// Prompt shown while confirmation is pending
    pub description: String,
}

impl DestructiveAction {
    pub fn delete(id: impl Into<RecordId>, label: &str) -> Self {
        let id = id.into();
        Self {
            kind: ActionKind::Delete,
            description: format!("Delete {label} {id}? This cannot be undone."),
            ids: vec![id],
        }
    }

    pub fn deactivate(id: impl Into<RecordId>, label: &str) -> Self {
        let id = id.into();
        Self {
            kind: ActionKind::Deactivate,
            description: format!("Deactivate {label} {id}?"),
            ids: vec![id],
        }
    }

    pub fn purge(id: impl Into<RecordId>, label: &str) -> Self {
        let id = id.into();
        Self {
            kind: ActionKind::Purge,
            description: format!("Permanently purge {label} {id} and all its data?"),
            ids: vec![id],
        }
    }

    pub fn bulk_delete(ids: Vec<RecordId>, plural: &str) -> Self {
        Self {
            kind: ActionKind::BulkDelete,
            description: format!("Delete {} {plural}? This cannot be undone.", ids.len()),
            ids,
        }
    }

    pub fn regenerate_audio(ids: Vec<RecordId>, plural: &str) -> Self {
        Self {
            kind: ActionKind::RegenerateAudio,
            description: format!("Regenerate audio for {} {plural}?", ids.len()),
            ids,
        }
    }

    /// The single request that carries out this action
    pub fn request(&self, resource: &Resource) -> ApiRequest {
        let first = self.ids.first().map(String::as_str).unwrap_or_default();
        match self.kind {
            ActionKind::Delete => resource.delete_request(first),
            ActionKind::Deactivate => resource.deactivate_request(first),
            ActionKind::Purge => resource.purge_request(first),
            ActionKind::BulkDelete => resource.bulk_delete_request(&self.ids),
            ActionKind::RegenerateAudio => resource.regenerate_audio_request(&self.ids),
        }
    }

    fn target(&self) -> String {
        match self.ids.as_slice() {
            [id] if !self.kind.is_bulk() => id.clone(),
            ids => format!("{} records", ids.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("another action is already awaiting confirmation")]
    Busy,

    #[error("nothing is selected")]
    EmptySelection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GateState {
    #[default]
    Idle,
    Pending(DestructiveAction),
    InFlight(DestructiveAction),
}

/// Outcome of a confirmed action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub action: DestructiveAction,
    pub result: Result<(), String>,
}

impl Resolution {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    /// Successful actions invalidate the loaded list
    pub fn needs_refresh(&self) -> bool {
        self.succeeded()
    }

    pub fn notification(&self) -> (NotificationLevel, String) {
        match &self.result {
            Ok(()) => (
                NotificationLevel::Success,
                format!("{} {}", self.action.kind.verb(), self.action.target()),
            ),
            Err(message) => (NotificationLevel::Error, message.clone()),
        }
    }
}

/// Gates irreversible actions:
/// `Idle -> Pending -> InFlight -> Idle` on confirm, `Pending -> Idle` on cancel.
#[derive(Debug, Default)]
pub struct ConfirmGate {
    state: GateState,
}

impl ConfirmGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn pending(&self) -> Option<&DestructiveAction> {
        match &self.state {
            GateState::Pending(action) => Some(action),
            _ => None,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.state, GateState::InFlight(_))
    }

    pub fn request(&mut self, action: DestructiveAction) -> Result<(), GateError> {
        if action.ids.is_empty() {
            return Err(GateError::EmptySelection);
        }
        if self.state != GateState::Idle {
            return Err(GateError::Busy);
        }

        tracing::debug!("awaiting confirmation: {}", action.description);
        self.state = GateState::Pending(action);
        Ok(())
    }

    /// Hand out the pending action exactly once
    pub fn confirm(&mut self) -> Option<DestructiveAction> {
        match std::mem::take(&mut self.state) {
            GateState::Pending(action) => {
                self.state = GateState::InFlight(action.clone());
                Some(action)
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Discard the pending action without side effects
    pub fn cancel(&mut self) -> Option<DestructiveAction> {
        match std::mem::take(&mut self.state) {
            GateState::Pending(action) => {
                tracing::debug!("cancelled: {}", action.description);
                Some(action)
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    pub fn resolve(&mut self, result: Result<(), ApiError>) -> Option<Resolution> {
        match std::mem::take(&mut self.state) {
            GateState::InFlight(action) => Some(Resolution {
                action,
                result: result.map_err(|e| e.message()),
            }),
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Confirm, send and resolve in one step
    pub async fn run(&mut self, client: &dyn ApiClient, resource: &Resource) -> Option<Resolution> {
        let action = self.confirm()?;
        let result = client.send(action.request(resource)).await.map(|_| ());
        self.resolve(result)
    }
}
