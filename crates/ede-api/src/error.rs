use serde_json::Value;

/// Every failure of the remote data client collapses into this shape so
/// callers need a single handling path
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Request never reached the server or no response came back
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx response, `detail` taken from the JSON body when present
    #[error("HTTP {status}: {}", .detail.as_deref().unwrap_or("request failed"))]
    Status { status: u16, detail: Option<String> },

    /// 2xx response whose body could not be understood
    #[error("malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        Self::Status {
            status,
            detail: extract_detail(body),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::Status {
            status: 404,
            detail: Some(what.into()),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Network(_) | Self::Decode(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Text suitable for a toast or an inline form error
    pub fn message(&self) -> String {
        match self {
            Self::Network(_) => "Could not reach the server. Please try again.".to_string(),
            Self::Status {
                detail: Some(detail),
                ..
            } => detail.clone(),
            Self::Status {
                status,
                detail: None,
            } => format!("Request failed (HTTP {status})"),
            Self::Decode(_) => "The server returned an unexpected response.".to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Pull the human-readable `detail` out of an error body.
///
/// Accepts a plain string or a list of validation items carrying `msg`.
pub fn extract_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;

    match value.get("detail")? {
        Value::String(detail) if !detail.trim().is_empty() => Some(detail.clone()),
        Value::Array(items) => {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Value::String(msg) => Some(msg.clone()),
                    Value::Object(obj) => obj.get("msg").and_then(Value::as_str).map(str::to_string),
                    _ => None,
                })
                .collect();

            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        Value::Object(obj) => obj
            .get("message")
            .or_else(|| obj.get("msg"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}
