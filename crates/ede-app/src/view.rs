use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ede_api::ApiClient;
use ede_config::Config;
use ede_core::debounce::Debouncer;
use ede_core::form::execute;
use ede_core::{
    ActionKind, ConfirmGate, DestructiveAction, EntitySchema, FormController, FormError,
    ListController, NotificationQueue, Poller, QueryChange, QueryError, Selection, UrlSync,
};
use ede_types::{Attachment, NotificationLevel, Record, RecordId, UiCommand};
use kanal::{AsyncReceiver, AsyncSender};
use tokio_util::sync::CancellationToken;

use crate::events::ConsoleEvent;
use crate::input::HELP;
use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Root view of the console. Owns every piece of view state; network work
/// runs in spawned tasks that report back as [`ConsoleEvent`]s.
pub struct ConsoleView {
    client: Arc<dyn ApiClient>,
    schema: EntitySchema,
    view_path: String,
    list: ListController,
    form: FormController,
    /// Record requested by `edit` that was not on the loaded page
    pending_edit: Option<RecordId>,
    selection: Selection,
    gate: ConfirmGate,
    notifications: NotificationQueue,
    url: UrlSync,
    search: Debouncer<String>,
    poller: Poller,
    /// Poll pollable views from the start
    poll_by_default: bool,
    events: AsyncSender<ConsoleEvent>,
    output: AsyncSender<String>,
}

impl ConsoleView {
    pub fn new(
        config: &Config,
        schema: EntitySchema,
        location: &str,
        view_path: impl Into<String>,
        client: Arc<dyn ApiClient>,
        events: AsyncSender<ConsoleEvent>,
        output: AsyncSender<String>,
    ) -> Self {
        let list = ListController::hydrate(schema.resource.clone(), schema.list.clone(), location);
        let url = UrlSync::new(&list.location());
        let search = Debouncer::spawn(
            Duration::from_millis(config.list.debounce_ms),
            events.clone(),
            ConsoleEvent::SearchSettled,
        );

        Self {
            client,
            schema,
            view_path: view_path.into(),
            list,
            form: FormController::new(),
            pending_edit: None,
            selection: Selection::new(),
            gate: ConfirmGate::new(),
            notifications: NotificationQueue::new(&config.notifications),
            url,
            search,
            poller: Poller::new(Duration::from_millis(config.polling.interval_ms)),
            poll_by_default: config.polling.enabled,
            events,
            output,
        }
    }

    pub fn list(&self) -> &ListController {
        &self.list
    }

    pub fn form(&self) -> &FormController {
        &self.form
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn gate(&self) -> &ConfirmGate {
        &self.gate
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_running()
    }

    /// Initial load
    pub async fn start(&mut self, poll: bool) {
        self.emit(format!("location: {}", self.url.link(&self.view_path)))
            .await;
        self.fetch();
        if poll || (self.poll_by_default && self.schema.pollable) {
            self.set_polling(true).await;
        }
    }

    pub async fn handle(&mut self, event: ConsoleEvent) -> Flow {
        match event {
            ConsoleEvent::Command(command) => return self.command(command).await,
            ConsoleEvent::SearchSettled(text) => self.apply(QueryChange::Search(text)).await,
            ConsoleEvent::ListLoaded { generation, result } => {
                let failure = result.as_ref().err().map(|e| e.message());
                if self.list.complete_fetch(generation, result) {
                    if let Some(message) = failure {
                        self.notify(
                            NotificationLevel::Error,
                            format!("Could not load {}: {message}", self.schema.name),
                        )
                        .await;
                    }
                    if self.list.needs_refetch() {
                        self.query_changed().await;
                    } else {
                        self.show_page().await;
                    }
                }
            }
            ConsoleEvent::RecordLoaded { id, result } => {
                if self.pending_edit.as_ref() != Some(&id) {
                    tracing::debug!("dropping record {id}, no longer requested");
                    return Flow::Continue;
                }
                self.pending_edit = None;
                match result {
                    Ok(record) => self.open_edit(&record).await,
                    Err(e) => self.notify(NotificationLevel::Error, e.message()).await,
                }
            }
            ConsoleEvent::AttachmentLoaded(Ok(attachment)) => {
                let name = attachment.file_name.clone();
                match self.form.stage_attachment(&self.schema, attachment) {
                    Ok(()) => self.emit(format!("staged {name}")).await,
                    Err(e) => self.notify(NotificationLevel::Error, e.to_string()).await,
                }
            }
            ConsoleEvent::AttachmentLoaded(Err(message)) => {
                self.notify(NotificationLevel::Error, message).await
            }
            ConsoleEvent::Submitted(outcome) => {
                self.form.finish_submit(&outcome);
                let (level, message) = outcome.notification(&self.schema.label);
                self.notify(level, message).await;
                if outcome.needs_refresh() {
                    self.fetch();
                } else {
                    self.show_draft().await;
                }
            }
            ConsoleEvent::ActionFinished(result) => {
                if let Some(resolution) = self.gate.resolve(result) {
                    let (level, message) = resolution.notification();
                    self.notify(level, message).await;
                    if resolution.needs_refresh() {
                        if resolution.action.kind.is_bulk() {
                            self.selection.clear();
                        } else {
                            for id in &resolution.action.ids {
                                if self.selection.contains(id) {
                                    self.selection.toggle(id);
                                }
                            }
                        }
                        self.fetch();
                    }
                }
            }
            ConsoleEvent::PollTick => {
                if !self.list.is_loading() {
                    self.fetch();
                }
            }
            ConsoleEvent::Tick => {
                let expired = self.notifications.expire(Instant::now());
                if !expired.is_empty() {
                    tracing::debug!("{} notifications expired", expired.len());
                }
            }
            ConsoleEvent::InputClosed => return Flow::Quit,
        }
        Flow::Continue
    }

    async fn command(&mut self, command: UiCommand) -> Flow {
        tracing::debug!("command {:?}", command);
        match command {
            UiCommand::Search(text) => self.search.push(text),
            UiCommand::Filter { name, value } => {
                let parsed = match self.list.schema().filter(&name) {
                    Some(spec) => spec.parse_input(&value),
                    None => Err(QueryError::UnknownFilter(name.clone())),
                };
                match parsed {
                    Ok(value) => self.apply(QueryChange::Filter { name, value }).await,
                    Err(e) => self.notify(NotificationLevel::Error, e.to_string()).await,
                }
            }
            UiCommand::ClearFilter(name) => {
                self.apply(QueryChange::Filter { name, value: None }).await
            }
            UiCommand::Sort { key, direction } => {
                self.apply(QueryChange::Sort { key, direction }).await
            }
            UiCommand::Page(page) => self.apply(QueryChange::Page(page)).await,
            UiCommand::NextPage => {
                if self.list.next_page() {
                    self.query_changed().await;
                }
            }
            UiCommand::PrevPage => {
                if self.list.prev_page() {
                    self.query_changed().await;
                }
            }
            UiCommand::PageSize(size) => self.apply(QueryChange::PageSize(size)).await,
            UiCommand::Refresh => self.fetch(),
            UiCommand::Show => self.show_all().await,
            UiCommand::Select(id) => {
                if self.list.find(&id).is_some() {
                    self.selection.toggle(&id);
                    self.emit(format!("selected {}", self.selection.len())).await;
                } else {
                    self.notify(NotificationLevel::Warning, format!("{id} is not on this page"))
                        .await;
                }
            }
            UiCommand::SelectAll => {
                self.selection.toggle_all(&self.list.loaded_ids());
                self.emit(format!("selected {}", self.selection.len())).await;
            }
            UiCommand::ClearSelection => {
                self.selection.clear();
                self.emit("selected 0".to_string()).await;
            }
            UiCommand::New => {
                if self.read_only().await {
                    return Flow::Continue;
                }
                self.pending_edit = None;
                match self.form.open_create(&self.schema, self.list.query()) {
                    Ok(_) => self.show_draft().await,
                    Err(e) => self.notify(NotificationLevel::Error, e.to_string()).await,
                }
            }
            UiCommand::Edit(id) => {
                if self.read_only().await {
                    return Flow::Continue;
                }
                if self.form.is_in_flight() {
                    self.notify(NotificationLevel::Error, FormError::InFlight.to_string())
                        .await;
                    return Flow::Continue;
                }
                self.pending_edit = None;
                let loaded = self.list.find(&id).cloned();
                match loaded {
                    Some(record) => self.open_edit(&record).await,
                    None => {
                        self.pending_edit = Some(id.clone());
                        let resource = self.schema.resource.clone();
                        let client = self.client.clone();
                        self.spawn(async move {
                            let result = resource.get(client.as_ref(), &id).await;
                            ConsoleEvent::RecordLoaded { id, result }
                        });
                    }
                }
            }
            UiCommand::SetField { name, value } => {
                match self.form.set_field(&self.schema, &name, &value) {
                    Ok(()) => self.show_draft().await,
                    Err(e) => self.notify(NotificationLevel::Error, e.to_string()).await,
                }
            }
            UiCommand::Attach(path) => {
                if !self.form.is_open() {
                    self.notify(NotificationLevel::Error, FormError::NotOpen.to_string())
                        .await;
                    return Flow::Continue;
                }
                self.spawn(async move { ConsoleEvent::AttachmentLoaded(read_attachment(&path).await) });
            }
            UiCommand::Save => self.save().await,
            UiCommand::Discard => {
                self.pending_edit = None;
                if self.form.cancel().is_some() {
                    self.emit("discarded".to_string()).await;
                }
            }
            UiCommand::Delete(id) => {
                let action = DestructiveAction::delete(id, &self.schema.label);
                self.request_action(action).await
            }
            UiCommand::Deactivate(id) => {
                let action = DestructiveAction::deactivate(id, &self.schema.label);
                self.request_action(action).await
            }
            UiCommand::Purge(id) => {
                let action = DestructiveAction::purge(id, &self.schema.label);
                self.request_action(action).await
            }
            UiCommand::BulkDelete => {
                let action = DestructiveAction::bulk_delete(self.selection.ids(), &self.schema.name);
                self.request_action(action).await
            }
            UiCommand::RegenerateAudio => {
                let action =
                    DestructiveAction::regenerate_audio(self.selection.ids(), &self.schema.name);
                self.request_action(action).await
            }
            UiCommand::Confirm => match self.gate.confirm() {
                Some(action) => {
                    let request = action.request(&self.schema.resource);
                    let client = self.client.clone();
                    self.spawn(async move {
                        ConsoleEvent::ActionFinished(client.send(request).await.map(|_| ()))
                    });
                    self.emit("working...".to_string()).await;
                }
                None => {
                    self.notify(NotificationLevel::Info, "Nothing to confirm").await;
                }
            },
            UiCommand::Cancel => {
                if self.gate.cancel().is_some() {
                    self.emit("cancelled".to_string()).await;
                }
            }
            UiCommand::Poll(on) => self.set_polling(on).await,
            UiCommand::Dismiss => {
                self.notifications.dismiss_oldest();
            }
            UiCommand::Help => self.emit(HELP.to_string()).await,
            UiCommand::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    async fn apply(&mut self, change: QueryChange) {
        match self.list.apply(change) {
            Ok(true) => self.query_changed().await,
            Ok(false) => {}
            Err(e) => self.notify(NotificationLevel::Error, e.to_string()).await,
        }
    }

    /// Single path for every settled query change: location first, then fetch
    async fn query_changed(&mut self) {
        self.selection.clear();
        if self
            .url
            .sync(self.list.query(), self.list.schema())
            .is_some()
        {
            self.emit(format!("location: {}", self.url.link(&self.view_path)))
                .await;
        }
        self.fetch();
    }

    fn fetch(&mut self) {
        let ticket = self.list.begin_fetch();
        let resource = self.list.resource().clone();
        let client = self.client.clone();
        self.spawn(async move {
            let result = resource.list(client.as_ref(), ticket.params).await;
            ConsoleEvent::ListLoaded {
                generation: ticket.generation,
                result,
            }
        });
    }

    fn spawn<F>(&self, work: F)
    where
        F: Future<Output = ConsoleEvent> + Send + 'static,
    {
        let events = self.events.clone();
        tokio::spawn(async move {
            let event = work.await;
            if events.send(event).await.is_err() {
                tracing::debug!("view is gone, dropping result");
            }
        });
    }

    async fn save(&mut self) {
        match self.form.begin_submit(&self.schema) {
            Ok(plan) => {
                let resource = self.schema.resource.clone();
                let client = self.client.clone();
                self.spawn(async move {
                    ConsoleEvent::Submitted(execute(plan, &resource, client.as_ref()).await)
                });
                self.emit("saving...".to_string()).await;
            }
            Err(e) => {
                self.notify(NotificationLevel::Error, e.to_string()).await;
                if matches!(e, FormError::Required(_)) {
                    self.show_draft().await;
                }
            }
        }
    }

    async fn open_edit(&mut self, record: &Record) {
        match self.form.open_edit(&self.schema, record) {
            Ok(_) => self.show_draft().await,
            Err(e) => self.notify(NotificationLevel::Error, e.to_string()).await,
        }
    }

    async fn request_action(&mut self, action: DestructiveAction) {
        if !self.schema.supports(action.kind) {
            let message = format!("{} cannot be {}", self.schema.name, action_name(action.kind));
            self.notify(NotificationLevel::Warning, message).await;
            return;
        }
        match self.gate.request(action) {
            Ok(()) => {
                if let Some(prompt) = render::render_prompt(&self.gate) {
                    self.emit(prompt).await;
                }
            }
            Err(e) => self.notify(NotificationLevel::Warning, e.to_string()).await,
        }
    }

    async fn set_polling(&mut self, on: bool) {
        if on && !self.schema.pollable {
            let message = format!("polling is not available for {}", self.schema.name);
            self.notify(NotificationLevel::Warning, message).await;
            return;
        }
        if on {
            self.poller.start(self.events.clone(), ConsoleEvent::PollTick);
            self.emit(format!("polling every {:?}", self.poller.interval()))
                .await;
        } else {
            self.poller.stop();
            self.emit("polling off".to_string()).await;
        }
    }

    async fn read_only(&mut self) -> bool {
        if self.schema.fields.is_empty() {
            let message = format!("{} are read-only here", self.schema.name);
            self.notify(NotificationLevel::Warning, message).await;
            true
        } else {
            false
        }
    }

    async fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        let id = self.notifications.push(level, message);
        let line = self
            .notifications
            .active()
            .find(|n| n.id == id)
            .map(render::render_notification);
        if let Some(line) = line {
            self.emit(line).await;
        }
    }

    async fn show_page(&self) {
        self.emit(render::render_page(&self.schema, &self.list, &self.selection))
            .await;
    }

    async fn show_draft(&self) {
        if let Some(draft) = self.form.draft() {
            self.emit(render::render_draft(&self.schema, draft)).await;
        }
    }

    async fn show_all(&self) {
        self.show_page().await;
        self.show_draft().await;
        if let Some(prompt) = render::render_prompt(&self.gate) {
            self.emit(prompt).await;
        }
        for notification in self.notifications.active() {
            self.emit(render::render_notification(notification)).await;
        }
    }

    async fn emit(&self, text: String) {
        if self.output.send(text).await.is_err() {
            tracing::debug!("output closed");
        }
    }
}

fn action_name(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::Delete | ActionKind::BulkDelete => "deleted",
        ActionKind::Deactivate => "deactivated",
        ActionKind::Purge => "purged",
        ActionKind::RegenerateAudio => "given regenerated audio",
    }
}

async fn read_attachment(path: &Path) -> Result<Attachment, String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| format!("{}: {e}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(Attachment::new(file_name, mime_for(path), bytes))
}

pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" | "oga" => "audio/ogg",
        "m4a" => "audio/mp4",
        "webm" => "audio/webm",
        "flac" => "audio/flac",
        _ => "application/octet-stream",
    }
}

/// Drives one [`ConsoleView`] until quit or cancellation
pub async fn view_loop(
    mut view: ConsoleView,
    events: AsyncReceiver<ConsoleEvent>,
    cancel: CancellationToken,
    poll: bool,
) -> anyhow::Result<()> {
    view.start(poll).await;

    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => event?,
        };

        if view.handle(event).await == Flow::Quit {
            tracing::info!("Quit requested");
            break;
        }
    }

    cancel.cancel();
    Ok(())
}
