use std::time::Duration;

use ede_config::api::ApiConfig;
use ede_types::Attachment;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::client::{ApiClient, ApiRequest};
use crate::error::ApiError;

/// reqwest-backed client for the platform's REST API
#[derive(Clone)]
pub struct HttpClient {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn finish(&self, builder: reqwest::RequestBuilder) -> Result<Value, ApiError> {
        let response = self.authorize(builder).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        parse_body(status, &body)
    }
}

#[async_trait::async_trait]
impl ApiClient for HttpClient {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        tracing::debug!(
            "{:?} {} params={:?}",
            request.method,
            request.path,
            request.params
        );

        let mut builder = self
            .client
            .request(request.method.into(), self.url(&request.path));

        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let result = self.finish(builder).await;
        if let Err(e) = &result {
            tracing::warn!("{:?} {} failed: {}", request.method, request.path, e);
        }
        result
    }

    async fn upload(
        &self,
        path: &str,
        field: &str,
        attachment: Attachment,
    ) -> Result<Value, ApiError> {
        tracing::debug!(
            "upload {} ({} bytes, {}) to {}",
            attachment.file_name,
            attachment.size(),
            attachment.mime_type,
            path
        );

        let part = Part::bytes(attachment.bytes)
            .file_name(attachment.file_name)
            .mime_str(&attachment.mime_type)?;
        let form = Form::new().part(field.to_string(), part);

        let builder = self.client.post(self.url(path)).multipart(form);
        self.finish(builder).await
    }
}

/// Map a raw response onto the client's result shape.
///
/// Empty 2xx bodies decode to `Null`.
pub fn parse_body(status: u16, body: &[u8]) -> Result<Value, ApiError> {
    if !(200..300).contains(&status) {
        return Err(ApiError::from_response(status, body));
    }

    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }

    Ok(serde_json::from_slice(body)?)
}
