use serde::{Deserialize, Serialize};

fn default_max_audio_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_audio_mime_prefix() -> String {
    "audio/".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct UploadConfig {
    #[serde(default = "default_max_audio_bytes")]
    pub max_audio_bytes: usize,
    #[serde(default = "default_audio_mime_prefix")]
    pub audio_mime_prefix: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_audio_bytes: default_max_audio_bytes(),
            audio_mime_prefix: default_audio_mime_prefix(),
        }
    }
}
