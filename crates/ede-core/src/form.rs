use std::collections::BTreeMap;

use ede_api::{ApiClient, ApiRequest, Resource};
use ede_types::{Attachment, NotificationLevel, Record, RecordId, record_id};
use serde_json::Value;

use crate::query::{FilterValue, QueryState};
use crate::schema::{EntitySchema, FieldKind};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("required: {}", .0.join(", "))]
    Required(Vec<String>),

    #[error("invalid value for {name}: {reason}")]
    InvalidField { name: String, reason: String },

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("attachment must be {expected}, got {actual}")]
    AttachmentType { expected: String, actual: String },

    #[error("attachment is {size} bytes, the limit is {max}")]
    AttachmentTooLarge { size: usize, max: usize },

    #[error("{0} do not take attachments")]
    AttachmentNotSupported(String),

    #[error("no form is open")]
    NotOpen,

    #[error("a save is already in progress")]
    InFlight,

    #[error("record has no id")]
    MissingId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftMode {
    Create,
    Edit(RecordId),
}

/// In-progress create or edit. Owned by the form until closed.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub mode: DraftMode,
    pub values: Record,
    pub attachment: Option<Attachment>,
    /// Last server-side failure, shown inline
    pub error: Option<String>,
    pub field_errors: BTreeMap<String, String>,
}

impl Draft {
    fn new(mode: DraftMode, values: Record) -> Self {
        Self {
            mode,
            values,
            attachment: None,
            error: None,
            field_errors: BTreeMap::new(),
        }
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }
}

/// Everything needed to carry out one save, detached from the form
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitPlan {
    pub request: ApiRequest,
    pub attachment: Option<Attachment>,
    /// Known id in edit mode; on create it comes from the response
    pub id: Option<RecordId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Saved { id: Option<RecordId>, record: Value },
    /// Primary save went through, the upload did not. Nothing is rolled back.
    AttachmentFailed { id: Option<RecordId>, message: String },
    Failed { message: String },
}

impl SubmitOutcome {
    pub fn needs_refresh(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    pub fn notification(&self, label: &str) -> (NotificationLevel, String) {
        match self {
            Self::Saved { id: Some(id), .. } => {
                (NotificationLevel::Success, format!("Saved {label} {id}"))
            }
            Self::Saved { id: None, .. } => (NotificationLevel::Success, format!("Saved {label}")),
            Self::AttachmentFailed { message, .. } => (
                NotificationLevel::Warning,
                format!("Record saved but attachment failed: {message}"),
            ),
            Self::Failed { message } => (NotificationLevel::Error, message.clone()),
        }
    }
}

/// Owns at most one draft and gates its submission
#[derive(Debug, Default)]
pub struct FormController {
    draft: Option<Draft>,
    in_flight: bool,
}

impl FormController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.draft.is_some()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Start a create draft from declared defaults, seeded with the list's
    /// current filters where a field inherits one
    pub fn open_create(&mut self, schema: &EntitySchema, query: &QueryState) -> Result<&Draft, FormError> {
        if self.in_flight {
            return Err(FormError::InFlight);
        }
        let values = schema
            .fields
            .iter()
            .map(|field| {
                let inherited = field
                    .inherit_filter
                    .as_ref()
                    .and_then(|name| query.filters.get(name))
                    .and_then(|value| inherited_value(&field.kind, value));
                (field.name.clone(), inherited.unwrap_or_else(|| field.initial_value()))
            })
            .collect();

        Ok(&*self.draft.insert(Draft::new(DraftMode::Create, values)))
    }

    /// Start an edit draft from a loaded record. Absent or null fields take
    /// the declared default.
    pub fn open_edit(&mut self, schema: &EntitySchema, record: &Record) -> Result<&Draft, FormError> {
        if self.in_flight {
            return Err(FormError::InFlight);
        }
        let id = record_id(record).ok_or(FormError::MissingId)?;
        let values = schema
            .fields
            .iter()
            .map(|field| {
                let value = match record.get(&field.name) {
                    None | Some(Value::Null) => field.initial_value(),
                    Some(value) => value.clone(),
                };
                (field.name.clone(), value)
            })
            .collect();

        Ok(&*self.draft.insert(Draft::new(DraftMode::Edit(id), values)))
    }

    pub fn set_field(&mut self, schema: &EntitySchema, name: &str, input: &str) -> Result<(), FormError> {
        let draft = self.draft.as_mut().ok_or(FormError::NotOpen)?;
        let field = schema
            .field(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;

        match field.parse_input(input) {
            Ok(value) => {
                draft.field_errors.remove(name);
                draft.values.insert(name.to_string(), value);
                Ok(())
            }
            Err(e) => {
                draft.field_errors.insert(name.to_string(), e.to_string());
                Err(e)
            }
        }
    }

    /// Validate and hold a file for upload after the primary save
    pub fn stage_attachment(&mut self, schema: &EntitySchema, attachment: Attachment) -> Result<(), FormError> {
        let draft = self.draft.as_mut().ok_or(FormError::NotOpen)?;
        let rule = schema
            .attachment
            .as_ref()
            .ok_or_else(|| FormError::AttachmentNotSupported(schema.name.clone()))?;

        rule.validate(&attachment)?;
        tracing::debug!(
            "staged {} ({} bytes)",
            attachment.file_name,
            attachment.size()
        );
        draft.attachment = Some(attachment);
        Ok(())
    }

    /// Validate the draft and lock it for submission. Nothing is sent when
    /// this fails.
    pub fn begin_submit(&mut self, schema: &EntitySchema) -> Result<SubmitPlan, FormError> {
        if self.in_flight {
            return Err(FormError::InFlight);
        }
        let draft = self.draft.as_mut().ok_or(FormError::NotOpen)?;

        let missing: Vec<String> = schema
            .fields
            .iter()
            .filter(|f| f.required && f.is_missing(draft.values.get(&f.name).unwrap_or(&Value::Null)))
            .map(|f| f.name.clone())
            .collect();

        if !missing.is_empty() {
            for name in &missing {
                draft.field_errors.insert(name.clone(), "required".to_string());
            }
            return Err(FormError::Required(missing));
        }

        let body = draft.values.clone();
        let (request, id) = match &draft.mode {
            DraftMode::Create => (
                ApiRequest::post(&schema.resource.path, Value::Object(body)),
                None,
            ),
            DraftMode::Edit(id) => (schema.resource.update_request(id, body), Some(id.clone())),
        };

        draft.error = None;
        self.in_flight = true;
        Ok(SubmitPlan {
            request,
            attachment: draft.attachment.clone(),
            id,
        })
    }

    /// Close the draft on success, keep it with its error on failure
    pub fn finish_submit(&mut self, outcome: &SubmitOutcome) {
        self.in_flight = false;
        match outcome {
            SubmitOutcome::Failed { message } => {
                if let Some(draft) = self.draft.as_mut() {
                    draft.error = Some(message.clone());
                }
            }
            _ => self.draft = None,
        }
    }

    pub async fn submit(
        &mut self,
        schema: &EntitySchema,
        client: &dyn ApiClient,
    ) -> Result<SubmitOutcome, FormError> {
        let plan = self.begin_submit(schema)?;
        let outcome = execute(plan, &schema.resource, client).await;
        self.finish_submit(&outcome);
        Ok(outcome)
    }

    /// Drop the draft. A submit already sent stays in flight until its
    /// outcome arrives, so no new draft can be closed by it.
    pub fn cancel(&mut self) -> Option<Draft> {
        self.draft.take()
    }
}

/// Send the primary request, then the attachment against the saved id
pub async fn execute(plan: SubmitPlan, resource: &Resource, client: &dyn ApiClient) -> SubmitOutcome {
    let record = match client.send(plan.request).await {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!("save to {} failed: {}", resource.path, e);
            return SubmitOutcome::Failed { message: e.message() };
        }
    };

    let id = record
        .as_object()
        .and_then(record_id)
        .or(plan.id);

    let Some(attachment) = plan.attachment else {
        return SubmitOutcome::Saved { id, record };
    };

    let Some(saved) = id.clone() else {
        return SubmitOutcome::AttachmentFailed {
            id,
            message: FormError::MissingId.to_string(),
        };
    };

    match resource.upload_audio(client, &saved, attachment).await {
        Ok(_) => SubmitOutcome::Saved { id, record },
        Err(e) => {
            tracing::warn!("upload for {} failed: {}", saved, e);
            SubmitOutcome::AttachmentFailed {
                id,
                message: e.message(),
            }
        }
    }
}

fn inherited_value(kind: &FieldKind, filter: &FilterValue) -> Option<Value> {
    match (kind, filter) {
        (FieldKind::Text | FieldKind::LongText | FieldKind::Choice(_), FilterValue::Text(text)) => {
            Some(Value::String(text.clone()))
        }
        (FieldKind::Bool, FilterValue::Flag(flag)) => Some(Value::Bool(*flag)),
        (FieldKind::Tags, FilterValue::Set(values)) => Some(Value::Array(
            values.iter().cloned().map(Value::String).collect(),
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::ListController;
    use crate::query::{FilterKind, FilterSpec, ListSchema, QueryChange};
    use crate::schema::{AttachmentRule, FieldDescriptor};
    use ede_api::testing::ScriptedClient;
    use ede_api::{ApiError, Method};
    use ede_config::list::ListConfig;
    use serde_json::json;

    const WORDS: &str = "/api/v1/admin/words";

    fn schema() -> EntitySchema {
        let list = ListSchema::new(&ListConfig::default())
            .with_filter(FilterSpec::new("language", FilterKind::Text));
        EntitySchema::new("words", "word", Resource::new(WORDS), list)
            .with_field(FieldDescriptor::new("word", "Word", FieldKind::Text).required())
            .with_field(
                FieldDescriptor::new("language", "Language", FieldKind::Text)
                    .required()
                    .inherits("language"),
            )
            .with_field(
                FieldDescriptor::new("difficulty_level", "Difficulty", FieldKind::Integer)
                    .with_default(json!(1)),
            )
            .with_field(FieldDescriptor::new("translation", "Translation", FieldKind::Text))
            .with_attachment(AttachmentRule {
                mime_prefix: "audio/".into(),
                max_bytes: 1024,
            })
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn mp3() -> Attachment {
        Attachment::new("ile.mp3", "audio/mpeg", vec![1, 2, 3])
    }

    #[tokio::test]
    async fn test_missing_required_field_sends_nothing() {
        let client = ScriptedClient::new();
        let schema = schema();
        let mut form = FormController::new();
        form.open_create(&schema, &schema.list.initial_state()).unwrap();

        let err = form.submit(&schema, &client).await.unwrap_err();
        assert_eq!(
            err,
            FormError::Required(vec!["word".to_string(), "language".to_string()])
        );
        assert!(client.requests().is_empty());
        assert!(!form.is_in_flight());

        let draft = form.draft().unwrap();
        assert_eq!(draft.field_errors.get("word").map(String::as_str), Some("required"));
    }

    #[test]
    fn test_create_inherits_filtered_language() {
        let schema = schema();
        let mut query = schema.list.initial_state();
        query
            .apply(
                &schema.list,
                QueryChange::Filter {
                    name: "language".into(),
                    value: Some(FilterValue::text("yo")),
                },
            )
            .unwrap();

        let mut form = FormController::new();
        let draft = form.open_create(&schema, &query).unwrap();
        assert_eq!(draft.mode, DraftMode::Create);
        assert_eq!(draft.value("language"), Some(&json!("yo")));
        assert_eq!(draft.value("difficulty_level"), Some(&json!(1)));
        assert_eq!(draft.value("translation"), Some(&json!("")));
    }

    #[test]
    fn test_edit_substitutes_declared_default_for_null() {
        let schema = schema();
        let mut form = FormController::new();
        let draft = form
            .open_edit(
                &schema,
                &record(json!({ "id": 4, "word": "ile", "language": "yo", "difficulty_level": null })),
            )
            .unwrap();

        assert_eq!(draft.mode, DraftMode::Edit("4".into()));
        assert_eq!(draft.value("difficulty_level"), Some(&json!(1)));
        assert_eq!(draft.value("translation"), Some(&json!("")));
        assert_eq!(draft.value("word"), Some(&json!("ile")));
    }

    #[test]
    fn test_edit_requires_id() {
        let mut form = FormController::new();
        assert_eq!(
            form.open_edit(&schema(), &record(json!({ "word": "ile" }))).err(),
            Some(FormError::MissingId)
        );
    }

    #[test]
    fn test_duplicate_submit_is_rejected() {
        let schema = schema();
        let mut form = FormController::new();
        form.open_edit(&schema, &record(json!({ "id": 4, "word": "ile", "language": "yo" })))
            .unwrap();

        let plan = form.begin_submit(&schema).unwrap();
        assert_eq!(plan.request.method, Method::Put);
        assert_eq!(plan.request.path, "/api/v1/admin/words/4");
        assert_eq!(form.begin_submit(&schema), Err(FormError::InFlight));
    }

    #[test]
    fn test_new_draft_waits_for_submit_outcome() {
        let schema = schema();
        let mut form = FormController::new();
        form.open_create(&schema, &schema.list.initial_state()).unwrap();
        form.set_field(&schema, "word", "omi").unwrap();
        form.set_field(&schema, "language", "yo").unwrap();
        form.begin_submit(&schema).unwrap();

        assert_eq!(
            form.open_create(&schema, &schema.list.initial_state()).err(),
            Some(FormError::InFlight)
        );
        assert_eq!(
            form.open_edit(&schema, &record(json!({ "id": 9, "word": "ina" }))).err(),
            Some(FormError::InFlight)
        );
        assert_eq!(form.draft().and_then(|d| d.value("word")), Some(&json!("omi")));

        // discarding does not release the lock either
        assert!(form.cancel().is_some());
        assert!(form.is_in_flight());
        assert_eq!(
            form.open_create(&schema, &schema.list.initial_state()).err(),
            Some(FormError::InFlight)
        );

        form.finish_submit(&SubmitOutcome::Saved {
            id: Some("12".into()),
            record: json!({ "id": 12 }),
        });
        form.open_create(&schema, &schema.list.initial_state()).unwrap();
        form.set_field(&schema, "word", "ina").unwrap();
        assert_eq!(form.draft().and_then(|d| d.value("word")), Some(&json!("ina")));
    }

    #[test]
    fn test_attachment_checked_before_staging() {
        let schema = schema();
        let mut form = FormController::new();
        assert_eq!(form.stage_attachment(&schema, mp3()), Err(FormError::NotOpen));

        form.open_create(&schema, &schema.list.initial_state()).unwrap();
        assert!(matches!(
            form.stage_attachment(&schema, Attachment::new("a.txt", "text/plain", vec![])),
            Err(FormError::AttachmentType { .. })
        ));
        assert!(form.stage_attachment(&schema, mp3()).is_ok());
        assert!(form.draft().unwrap().attachment.is_some());
    }

    #[test]
    fn test_set_field_records_errors() {
        let schema = schema();
        let mut form = FormController::new();
        form.open_create(&schema, &schema.list.initial_state()).unwrap();

        assert!(form.set_field(&schema, "difficulty_level", "hard").is_err());
        assert!(form.draft().unwrap().field_errors.contains_key("difficulty_level"));

        form.set_field(&schema, "difficulty_level", "3").unwrap();
        let draft = form.draft().unwrap();
        assert!(draft.field_errors.is_empty());
        assert_eq!(draft.value("difficulty_level"), Some(&json!(3)));

        assert_eq!(
            form.set_field(&schema, "nope", "x"),
            Err(FormError::UnknownField("nope".into()))
        );
    }

    #[tokio::test]
    async fn test_server_rejection_keeps_draft() {
        let client = ScriptedClient::new();
        client.respond(
            Method::Post,
            WORDS,
            Err(ApiError::Status {
                status: 422,
                detail: Some("Word already exists".into()),
            }),
        );

        let schema = schema();
        let mut form = FormController::new();
        form.open_create(&schema, &schema.list.initial_state()).unwrap();
        form.set_field(&schema, "word", "ile").unwrap();
        form.set_field(&schema, "language", "yo").unwrap();

        let outcome = form.submit(&schema, &client).await.unwrap();
        assert!(!outcome.needs_refresh());
        assert_eq!(
            outcome.notification("word"),
            (NotificationLevel::Error, "Word already exists".to_string())
        );
        assert_eq!(
            form.draft().and_then(|d| d.error.as_deref()),
            Some("Word already exists")
        );
    }

    #[tokio::test]
    async fn test_create_then_upload() {
        let client = ScriptedClient::new();
        client.respond(Method::Post, WORDS, Ok(json!({ "id": 51, "word": "ile" })));
        client.respond(
            Method::Post,
            "/api/v1/admin/words/51/audio",
            Ok(json!({ "url": "https://cdn.example/ile.mp3" })),
        );

        let schema = schema();
        let mut form = FormController::new();
        form.open_create(&schema, &schema.list.initial_state()).unwrap();
        form.set_field(&schema, "word", "ile").unwrap();
        form.set_field(&schema, "language", "yo").unwrap();
        form.stage_attachment(&schema, mp3()).unwrap();

        let outcome = form.submit(&schema, &client).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Saved { id: Some(ref id), .. } if id == "51"));
        assert!(!form.is_open());

        let sent = client.requests();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].body.as_ref().unwrap()["language"], "yo");
        assert_eq!(sent[1].path, "/api/v1/admin/words/51/audio");
    }

    #[tokio::test]
    async fn test_attachment_failure_keeps_saved_record() {
        let client = ScriptedClient::new();
        client.respond(Method::Post, WORDS, Ok(json!({ "id": 51, "word": "ile" })));
        client.respond(
            Method::Post,
            "/api/v1/admin/words/51/audio",
            Err(ApiError::Status {
                status: 413,
                detail: None,
            }),
        );
        client.respond(
            Method::Get,
            WORDS,
            Ok(json!({ "items": [{ "id": 51, "word": "ile" }], "total": 1 })),
        );

        let schema = schema();
        let mut list = ListController::new(schema.resource.clone(), schema.list.clone());
        let mut form = FormController::new();
        form.open_create(&schema, list.query()).unwrap();
        form.set_field(&schema, "word", "ile").unwrap();
        form.set_field(&schema, "language", "yo").unwrap();
        form.stage_attachment(&schema, mp3()).unwrap();

        let outcome = form.submit(&schema, &client).await.unwrap();
        let (level, message) = outcome.notification("word");
        assert_eq!(level, NotificationLevel::Warning);
        assert_eq!(message, "Record saved but attachment failed: Request failed (HTTP 413)");
        assert!(!form.is_open());

        assert!(outcome.needs_refresh());
        list.refresh(&client).await;
        assert!(list.find("51").is_some());
    }
}
