// src/config/settings.rs
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const APP_DIR_NAME: &str = "plflow";
pub const ENV_PREFIX: &str = "PLFLOW";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// RON documents under `data_dir`.
    File,
    /// Nothing survives a restart.
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub uid: String,
    pub display_name: String,
    pub email: String,
}

impl Default for UserProfile {
    fn default() -> Self {
        let display_name = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "Local User".to_string());
        Self {
            uid: "local-user".to_string(),
            display_name,
            email: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramSettings {
    pub width: f32,
    pub height: f32,
}

impl Default for DiagramSettings {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_dir: Option<PathBuf>,
    pub storage: StorageBackend,
    pub user: UserProfile,
    pub diagram: DiagramSettings,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: None,
            storage: StorageBackend::File,
            user: UserProfile::default(),
            diagram: DiagramSettings::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl Settings {
    /// `settings.ron` from the user config dir, then `PLFLOW_*` environment overrides.
    pub fn load() -> Result<Self> {
        let file = dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join("settings.ron"));
        Self::load_from(file.as_deref())
    }

    pub fn load_from(file: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(::config::File::from(path).required(false));
        }
        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        );

        builder
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Failed to parse settings")
    }

    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR_NAME)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(Some(&dir.path().join("settings.ron"))).unwrap();
        assert_eq!(settings.storage, StorageBackend::File);
        assert_eq!(settings.diagram, DiagramSettings::default());
        assert_eq!(settings.log_filter, "info");
    }

    #[test]
    fn ron_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.ron");
        fs::write(
            &path,
            r#"{
                "storage": "memory",
                "diagram": { "width": 640.0, "height": 320.0 },
                "user": { "uid": "alice", "display_name": "Alice", "email": "alice@example.com" },
            }"#,
        )
        .unwrap();

        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.storage, StorageBackend::Memory);
        assert_eq!(settings.diagram.width, 640.0);
        assert_eq!(settings.diagram.height, 320.0);
        assert_eq!(settings.user.uid, "alice");
    }

    #[test]
    fn environment_overrides_nested_fields() {
        // Process-wide; no other test here reads the email.
        std::env::set_var("PLFLOW_USER__EMAIL", "env@example.com");
        let dir = tempfile::tempdir().unwrap();
        let loaded = Settings::load_from(Some(&dir.path().join("settings.ron")));
        std::env::remove_var("PLFLOW_USER__EMAIL");

        let settings = loaded.unwrap();
        assert_eq!(settings.user.email, "env@example.com");
        assert_eq!(settings.user.uid, "local-user");
    }

    #[test]
    fn explicit_data_dir_wins() {
        let settings = Settings {
            data_dir: Some(PathBuf::from("/tmp/plflow-data")),
            ..Default::default()
        };
        assert_eq!(settings.resolved_data_dir(), PathBuf::from("/tmp/plflow-data"));
    }
}
