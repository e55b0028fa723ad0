use ede_types::{Record, record_id};
use serde_json::Value;

use crate::client::{ApiClient, ApiRequest};
use crate::error::ApiError;
use crate::resource::{ListPage, Resource};

/// How a single record is loaded when the backend lacks a uniform
/// `GET /{resource}/{id}`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FetchStrategy {
    /// `GET /{resource}/{id}`
    #[default]
    Direct,
    /// Page through the list endpoint until the id shows up
    ListAndFind { page_size: u32 },
    /// Direct first, then a content-version snapshot; `{id}` in `path` is
    /// substituted
    Snapshot { path: String },
}

pub async fn fetch_by_id(
    client: &dyn ApiClient,
    resource: &Resource,
    id: &str,
) -> Result<Record, ApiError> {
    match &resource.fetch {
        FetchStrategy::Direct => fetch_direct(client, resource, id).await,
        FetchStrategy::ListAndFind { page_size } => {
            list_and_find(client, resource, id, (*page_size).max(1)).await
        }
        FetchStrategy::Snapshot { path } => match fetch_direct(client, resource, id).await {
            Err(e) if e.is_not_found() || e.status() == Some(405) => {
                tracing::debug!("direct fetch of {id} unavailable ({e}), trying snapshot");
                fetch_snapshot(client, path, id).await
            }
            other => other,
        },
    }
}

async fn fetch_direct(
    client: &dyn ApiClient,
    resource: &Resource,
    id: &str,
) -> Result<Record, ApiError> {
    let value = client.send(ApiRequest::get(resource.item_path(id))).await?;
    into_record(value)
}

async fn list_and_find(
    client: &dyn ApiClient,
    resource: &Resource,
    id: &str,
    page_size: u32,
) -> Result<Record, ApiError> {
    let mut page = 1u64;
    let mut last_page = None;

    loop {
        let params = vec![
            ("page".to_string(), page.to_string()),
            ("limit".to_string(), page_size.to_string()),
        ];
        let ListPage { items, total } = resource.list(client, params).await?;

        if let Some(found) = items
            .iter()
            .find(|record| record_id(record).as_deref() == Some(id))
        {
            return Ok(found.clone());
        }

        let last = *last_page.get_or_insert_with(|| total.div_ceil(u64::from(page_size)));
        if items.is_empty() || page >= last {
            return Err(ApiError::not_found(format!("Record {id} not found")));
        }
        page += 1;
    }
}

async fn fetch_snapshot(client: &dyn ApiClient, path: &str, id: &str) -> Result<Record, ApiError> {
    let value = client.send(ApiRequest::get(path.replace("{id}", id))).await?;

    let mut record = match value {
        Value::Object(obj) => {
            let inner = ["snapshot", "content", "data"]
                .iter()
                .find_map(|key| match obj.get(*key) {
                    Some(Value::Object(inner)) => Some(inner.clone()),
                    _ => None,
                });
            inner.unwrap_or(obj)
        }
        other => return Err(ApiError::Decode(format!("snapshot is not an object: {other}"))),
    };

    if record_id(&record).is_none() {
        record.insert("id".to_string(), Value::String(id.to_string()));
    }
    Ok(record)
}

fn into_record(value: Value) -> Result<Record, ApiError> {
    match value {
        Value::Object(record) => Ok(record),
        other => Err(ApiError::Decode(format!("record is not an object: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Method;
    use crate::testing::ScriptedClient;
    use serde_json::json;

    #[tokio::test]
    async fn test_direct_fetch() {
        let client = ScriptedClient::new();
        client.respond(Method::Get, "/words/3", Ok(json!({ "id": 3, "word": "omi" })));

        let record = Resource::new("/words").get(&client, "3").await.unwrap();
        assert_eq!(record["word"], "omi");
    }

    #[tokio::test]
    async fn test_list_and_find_walks_pages() {
        let client = ScriptedClient::new();
        client.respond(
            Method::Get,
            "/voices",
            Ok(json!({ "items": [{ "id": "v1" }, { "id": "v2" }], "total": 3 })),
        );
        client.respond(
            Method::Get,
            "/voices",
            Ok(json!({ "items": [{ "id": "v3", "name": "Ada" }], "total": 3 })),
        );

        let voices =
            Resource::new("/voices").with_fetch(FetchStrategy::ListAndFind { page_size: 2 });
        let record = voices.get(&client, "v3").await.unwrap();

        assert_eq!(record["name"], "Ada");
        let sent = client.requests();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].param("page"), Some("2"));
    }

    #[tokio::test]
    async fn test_list_and_find_reports_not_found() {
        let client = ScriptedClient::new();
        client.respond(
            Method::Get,
            "/voices",
            Ok(json!({ "items": [{ "id": "v1" }], "total": 1 })),
        );

        let voices =
            Resource::new("/voices").with_fetch(FetchStrategy::ListAndFind { page_size: 20 });
        let err = voices.get(&client, "v9").await.unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_fallback_on_missing_endpoint() {
        let client = ScriptedClient::new();
        client.respond(Method::Get, "/lessons/5", Err(ApiError::not_found("Not Found")));
        client.respond(
            Method::Get,
            "/versions/lessons/5/latest",
            Ok(json!({ "version": 4, "snapshot": { "title": "Greetings" } })),
        );

        let lessons = Resource::new("/lessons").with_fetch(FetchStrategy::Snapshot {
            path: "/versions/lessons/{id}/latest".to_string(),
        });
        let record = lessons.get(&client, "5").await.unwrap();

        assert_eq!(record["title"], "Greetings");
        assert_eq!(record["id"], "5");
    }

    #[tokio::test]
    async fn test_snapshot_not_used_for_other_errors() {
        let client = ScriptedClient::new();
        client.respond(
            Method::Get,
            "/lessons/5",
            Err(ApiError::Status {
                status: 500,
                detail: None,
            }),
        );

        let lessons = Resource::new("/lessons").with_fetch(FetchStrategy::Snapshot {
            path: "/versions/lessons/{id}/latest".to_string(),
        });
        let err = lessons.get(&client, "5").await.unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert_eq!(client.requests().len(), 1);
    }
}
