use serde::{Deserialize, Serialize};
use std::path::Path;

// ===== CONFIG TYPES =====

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub viewer: ViewerSection,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unsupported config version `{0}`")]
    UnsupportedVersion(String),
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        match config.app.get_migration_strategy() {
            MigrationStrategy::Recreate => Err(ConfigError::UnsupportedVersion(config.app.version)),
            MigrationStrategy::None => Ok(config),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

// AppSection carries the config format version so older files can be migrated
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AppSection {
    pub version: String,
}

impl AppSection {
    /// Current configuration format version
    pub const CURRENT_VERSION: &'static str = "1.0.0";

    pub fn get_migration_strategy(&self) -> MigrationStrategy {
        match self.version.as_str() {
            Self::CURRENT_VERSION => MigrationStrategy::None,
            _ => MigrationStrategy::Recreate,
        }
    }
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MigrationStrategy {
    None,
    Recreate,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ViewerSection {
    pub default_normalization: String,
    /// Keep the current zoom index on goto and zoom gestures.
    pub resolution_locked: bool,
    /// Propagate locally authored states to synchronized peers.
    pub sync_enabled: bool,
    pub viewport_width: f64,
    pub viewport_height: f64,
}

impl Default for ViewerSection {
    fn default() -> Self {
        Self {
            default_normalization: "NONE".to_string(),
            resolution_locked: false,
            sync_enabled: true,
            viewport_width: 800.0,
            viewport_height: 800.0,
        }
    }
}
