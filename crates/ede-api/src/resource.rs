use ede_types::{Attachment, Record, RecordId};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde_json::{Value, json};

use crate::client::{ApiClient, ApiRequest};
use crate::error::ApiError;
use crate::fetch::{FetchStrategy, fetch_by_id};

/// Characters escaped inside a single path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'?')
    .add(b'<')
    .add(b'>');

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpdateMethod {
    #[default]
    Put,
    Patch,
}

/// One page of a list endpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPage {
    pub items: Vec<Record>,
    pub total: u64,
}

impl ListPage {
    /// Accepts `{items, total}`, `{<alias>, total}` or a bare array
    pub fn from_value(value: Value, alias: Option<&str>) -> Result<Self, ApiError> {
        let (items, total) = match value {
            Value::Array(items) => (items, None),
            Value::Object(mut obj) => {
                let items = obj
                    .remove("items")
                    .or_else(|| alias.and_then(|key| obj.remove(key)))
                    .ok_or_else(|| ApiError::Decode("list response has no items".into()))?;
                let Value::Array(items) = items else {
                    return Err(ApiError::Decode("list items is not an array".into()));
                };
                (items, obj.get("total").and_then(Value::as_u64))
            }
            other => {
                return Err(ApiError::Decode(format!(
                    "unexpected list response: {other}"
                )));
            }
        };

        let items = items
            .into_iter()
            .map(|item| match item {
                Value::Object(record) => Ok(record),
                other => Err(ApiError::Decode(format!("list item is not an object: {other}"))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let total = total.unwrap_or(items.len() as u64);
        Ok(Self { items, total })
    }
}

/// An entity family exposed by the admin API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub path: String,
    /// Alternative key for the list array, e.g. `jobs`
    pub alias: Option<String>,
    pub update: UpdateMethod,
    pub fetch: FetchStrategy,
}

impl Resource {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into().trim_end_matches('/').to_string(),
            alias: None,
            update: UpdateMethod::default(),
            fetch: FetchStrategy::default(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_update(mut self, update: UpdateMethod) -> Self {
        self.update = update;
        self
    }

    pub fn with_fetch(mut self, fetch: FetchStrategy) -> Self {
        self.fetch = fetch;
        self
    }

    pub fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.path, utf8_percent_encode(id, SEGMENT))
    }

    pub async fn list(
        &self,
        client: &dyn ApiClient,
        params: Vec<(String, String)>,
    ) -> Result<ListPage, ApiError> {
        let value = client
            .send(ApiRequest::get(&self.path).with_params(params))
            .await?;
        ListPage::from_value(value, self.alias.as_deref())
    }

    pub async fn get(&self, client: &dyn ApiClient, id: &str) -> Result<Record, ApiError> {
        fetch_by_id(client, self, id).await
    }

    pub async fn create(&self, client: &dyn ApiClient, body: Record) -> Result<Value, ApiError> {
        client
            .send(ApiRequest::post(&self.path, Value::Object(body)))
            .await
    }

    pub async fn update(
        &self,
        client: &dyn ApiClient,
        id: &str,
        body: Record,
    ) -> Result<Value, ApiError> {
        client.send(self.update_request(id, body)).await
    }

    pub fn update_request(&self, id: &str, body: Record) -> ApiRequest {
        match self.update {
            UpdateMethod::Put => ApiRequest::put(self.item_path(id), Value::Object(body)),
            UpdateMethod::Patch => ApiRequest::patch(self.item_path(id), Value::Object(body)),
        }
    }

    pub async fn delete(&self, client: &dyn ApiClient, id: &str) -> Result<(), ApiError> {
        client.send(self.delete_request(id)).await.map(|_| ())
    }

    pub fn delete_request(&self, id: &str) -> ApiRequest {
        ApiRequest::delete(self.item_path(id))
    }

    pub fn purge_request(&self, id: &str) -> ApiRequest {
        ApiRequest::delete(self.item_path(id))
            .with_params(vec![("purge".to_string(), "true".to_string())])
    }

    pub fn deactivate_request(&self, id: &str) -> ApiRequest {
        ApiRequest::post(format!("{}/deactivate", self.item_path(id)), Value::Null)
    }

    pub fn bulk_delete_request(&self, ids: &[RecordId]) -> ApiRequest {
        ApiRequest::post(format!("{}/bulk-delete", self.path), json!({ "ids": ids }))
    }

    pub fn regenerate_audio_request(&self, ids: &[RecordId]) -> ApiRequest {
        ApiRequest::post(
            format!("{}/regenerate-audio", self.path),
            json!({ "ids": ids }),
        )
    }

    /// Attach an audio file to an existing record
    pub async fn upload_audio(
        &self,
        client: &dyn ApiClient,
        id: &str,
        attachment: Attachment,
    ) -> Result<Value, ApiError> {
        client
            .upload(&format!("{}/audio", self.item_path(id)), "audio", attachment)
            .await
    }
}
