use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use ede_config::Config;
use serde::{Deserialize, Serialize};

const MAIN_PROFILE: &str = "main";

/// `$EDE_CONFIG_DIR`, else `$HOME/.config/ede`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("EDE_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".config").join("ede")
}

fn profiles_dir(root: &Path) -> PathBuf {
    root.join("profiles")
}

/// Represents a saved profile
#[derive(Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub value: Config,
}

fn read_profile(file: &Path) -> anyhow::Result<Config> {
    let data = fs::read_to_string(file).with_context(|| format!("read {}", file.display()))?;
    let profile: Profile =
        serde_json::from_str(&data).with_context(|| format!("parse {}", file.display()))?;
    Ok(profile.value)
}

/// Load a profile by name, falling back to `main`, then to the environment
pub fn load_profile(root: &Path, name: Option<&str>) -> anyhow::Result<Config> {
    let dir = profiles_dir(root);

    if let Some(name) = name {
        let file = dir.join(format!("{name}.json"));
        if file.exists() {
            tracing::info!("Loading profile {name}");
            return read_profile(&file);
        }
        tracing::warn!("Profile {name} not found, falling back to main profile or environment");
    }

    let main_file = dir.join(format!("{MAIN_PROFILE}.json"));
    if main_file.exists() {
        read_profile(&main_file)
    } else {
        Ok(Config::new())
    }
}

/// Write `config` as a named profile, returning its path
pub fn save_profile(root: &Path, name: &str, config: &Config) -> anyhow::Result<PathBuf> {
    let dir = profiles_dir(root);
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;

    let profile = Profile {
        name: name.into(),
        value: config.clone(),
    };
    let file = dir.join(format!("{name}.json"));
    fs::write(&file, serde_json::to_string_pretty(&profile)?)?;
    tracing::info!("Saved profile: {name}");
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ede-profile-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_save_then_load() {
        let root = scratch("roundtrip");
        let mut config = Config::default();
        config.list.debounce_ms = 120;
        config.api.base_url = "https://admin.example".into();

        let file = save_profile(&root, "staging", &config).unwrap();
        assert!(file.ends_with("profiles/staging.json"));

        let loaded = load_profile(&root, Some("staging")).unwrap();
        assert_eq!(loaded.list.debounce_ms, 120);
        assert_eq!(loaded.api.base_url, "https://admin.example");

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_missing_profile_falls_back_to_main() {
        let root = scratch("fallback");
        let mut main = Config::default();
        main.polling.interval_ms = 2500;
        save_profile(&root, MAIN_PROFILE, &main).unwrap();

        let loaded = load_profile(&root, Some("nope")).unwrap();
        assert_eq!(loaded.polling.interval_ms, 2500);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_partial_profile_uses_defaults() {
        let root = scratch("partial");
        fs::create_dir_all(profiles_dir(&root)).unwrap();
        fs::write(
            profiles_dir(&root).join("lean.json"),
            r#"{ "name": "lean", "value": { "list": { "debounce_ms": 50 } } }"#,
        )
        .unwrap();

        let loaded = load_profile(&root, Some("lean")).unwrap();
        assert_eq!(loaded.list.debounce_ms, 50);
        assert_eq!(loaded.list.default_page_size, 20);
        assert_eq!(loaded.notifications.dismiss_after_ms, 4000);

        let _ = fs::remove_dir_all(&root);
    }
}
