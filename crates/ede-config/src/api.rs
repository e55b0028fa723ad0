use std::env;

use serde::{Deserialize, Serialize};

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_api_prefix() -> String {
    "/api/v1".to_string()
}

fn default_admin_prefix() -> String {
    "/api/v1/admin".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    /// Scheme and host of the platform backend
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    #[serde(default = "default_admin_prefix")]
    pub admin_prefix: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Bearer token attached to every request when set
    #[serde(default)]
    pub token: Option<String>,
}

impl ApiConfig {
    pub fn new() -> Self {
        let base_url = env::var("EDE_API_URL").unwrap_or_else(|_| default_base_url());

        let timeout_seconds = env::var("EDE_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_timeout_seconds);

        let token = env::var("EDE_API_TOKEN").ok().filter(|t| !t.is_empty());

        Self {
            base_url,
            timeout_seconds,
            token,
            ..Self::default()
        }
    }

    /// Path of a public resource, e.g. `/api/v1/languages`
    pub fn public_path(&self, resource: &str) -> String {
        join_path(&self.api_prefix, resource)
    }

    /// Path of an admin resource, e.g. `/api/v1/admin/words`
    pub fn admin_path(&self, resource: &str) -> String {
        join_path(&self.admin_prefix, resource)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_prefix: default_api_prefix(),
            admin_prefix: default_admin_prefix(),
            timeout_seconds: default_timeout_seconds(),
            token: None,
        }
    }
}

fn join_path(prefix: &str, resource: &str) -> String {
    format!(
        "{}/{}",
        prefix.trim_end_matches('/'),
        resource.trim_start_matches('/')
    )
}
