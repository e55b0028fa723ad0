//! Scripted client used by tests across the workspace

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use ede_types::Attachment;
use serde_json::{Value, json};

use crate::client::{ApiClient, ApiRequest, Method};
use crate::error::ApiError;

type Reply = Result<Value, ApiError>;

/// Replies are queued per `(method, path)`; the last queued reply for a key
/// is reused once the queue drains to a single entry.
#[derive(Default)]
pub struct ScriptedClient {
    replies: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: Method, path: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }

    /// Every request seen so far; uploads are logged as POSTs whose body
    /// describes the multipart part
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn reply(&self, method: Method, path: &str) -> Reply {
        let mut replies = self.replies.lock().unwrap();
        match replies.get_mut(&(method, path.to_string())) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Err(ApiError::Network(format!("no scripted reply for {method:?} {path}"))),
        }
    }
}

#[async_trait::async_trait]
impl ApiClient for ScriptedClient {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let reply = self.reply(request.method, &request.path);
        self.requests.lock().unwrap().push(request);
        reply
    }

    async fn upload(
        &self,
        path: &str,
        field: &str,
        attachment: Attachment,
    ) -> Result<Value, ApiError> {
        let reply = self.reply(Method::Post, path);
        self.requests.lock().unwrap().push(ApiRequest::post(
            path,
            json!({
                "field": field,
                "file_name": attachment.file_name,
                "mime_type": attachment.mime_type,
                "size": attachment.size(),
            }),
        ));
        reply
    }
}
