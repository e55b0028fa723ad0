use serde::{Deserialize, Serialize};

fn default_debounce_ms() -> u64 {
    300
}

fn default_page_sizes() -> Vec<u32> {
    vec![20, 50, 100]
}

fn default_page_size() -> u32 {
    20
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ListConfig {
    /// Quiet period before search input triggers a fetch and a location update
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_page_sizes")]
    pub page_sizes: Vec<u32>,
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            page_sizes: default_page_sizes(),
            default_page_size: default_page_size(),
        }
    }
}
