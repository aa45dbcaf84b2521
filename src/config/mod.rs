//! Configuration management.
//!
//! A configuration file holds named connection profiles and the client
//! settings (page sizes, timeouts, retries). It is plain TOML:
//!
//! ```toml
//! default_profile = "work"
//!
//! [settings]
//! max_issues_per_request = 50
//!
//! [[profiles]]
//! name = "work"
//! url = "https://company.atlassian.net"
//! email = "me@company.com"
//! ```

mod profile;
mod settings;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use profile::{Profile, DEFAULT_TOKEN_ENV};
pub use settings::{
    ClientSettings, DEFAULT_MAX_RETRIES, DEFAULT_SERVER_MAX_RESULTS, DEFAULT_TIMEOUT_SECS,
};

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No platform configuration directory could be determined.
    #[error("could not determine configuration directory")]
    NoConfigDir,

    /// Creating the configuration directory failed.
    #[error("failed to create configuration directory: {0}")]
    CreateDirError(std::io::Error),

    /// Reading the configuration file failed.
    #[error("failed to read configuration file: {0}")]
    ReadError(std::io::Error),

    /// Writing the configuration file failed.
    #[error("failed to write configuration file: {0}")]
    WriteError(std::io::Error),

    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("failed to serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// A value failed validation.
    #[error("invalid configuration: {0}")]
    ValidationError(String),

    /// No profile with this name exists.
    #[error("profile '{0}' not found")]
    ProfileNotFound(String),

    /// The API token environment variable is not set.
    #[error("API token not found in environment variable {0}")]
    MissingToken(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// The contents of a configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// The name of the profile used when none is requested.
    #[serde(default)]
    pub default_profile: Option<String>,
    /// Client settings.
    #[serde(default)]
    pub settings: ClientSettings,
    /// Connection profiles.
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

impl Config {
    /// The platform default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join("jqlkit").join("config.toml"))
    }

    /// Load the configuration from the platform default path.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load and validate a configuration file.
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading configuration");
        let content = fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let mut config: Config = toml::from_str(&content)?;
        config.settings = config.settings.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::CreateDirError)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(ConfigError::WriteError)?;
        debug!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Validate every profile and check profile names are unique.
    pub fn validate(&self) -> Result<()> {
        for (i, profile) in self.profiles.iter().enumerate() {
            profile.validate()?;
            if self.profiles[..i].iter().any(|p| p.name == profile.name) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate profile name '{}'",
                    profile.name
                )));
            }
        }

        if let Some(name) = &self.default_profile {
            if self.profile(name).is_none() {
                return Err(ConfigError::ProfileNotFound(name.clone()));
            }
        }

        Ok(())
    }

    /// Look up a profile by name.
    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// The named profile, or the default one when `name` is `None`.
    pub fn resolve_profile(&self, name: Option<&str>) -> Result<&Profile> {
        let name = match name.or(self.default_profile.as_deref()) {
            Some(name) => name,
            None => {
                return self
                    .profiles
                    .first()
                    .ok_or_else(|| ConfigError::ProfileNotFound("<default>".to_string()))
            }
        };
        self.profile(name)
            .ok_or_else(|| ConfigError::ProfileNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
default_profile = "work"

[settings]
max_issues_per_request = 500

[[profiles]]
name = "work"
url = "https://company.atlassian.net"
email = "me@company.com"

[[profiles]]
name = "local"
url = "http://localhost:8080"
email = "admin@localhost"
token_env = "LOCAL_JIRA_TOKEN"
"#;

    #[test]
    fn test_load_from_file_normalizes_settings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, SAMPLE).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.profiles.len(), 2);
        assert_eq!(config.settings.max_issues_per_request, 100);
        assert_eq!(
            config.resolve_profile(None).unwrap().url,
            "https://company.atlassian.net"
        );
        assert_eq!(
            config.resolve_profile(Some("local")).unwrap().token_env_var(),
            "LOCAL_JIRA_TOKEN"
        );
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempdir().unwrap();
        let result = Config::load_from(&dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError(_))));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "profiles = 3").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_duplicate_profiles_rejected() {
        let profile = Profile::new(
            "work".to_string(),
            "https://a.atlassian.net".to_string(),
            "me@a.com".to_string(),
        );
        let config = Config {
            profiles: vec![profile.clone(), profile],
            ..Default::default()
        };
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("duplicate profile"));
    }

    #[test]
    fn test_unknown_default_profile_rejected() {
        let config = Config {
            default_profile: Some("missing".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ProfileNotFound(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            default_profile: None,
            settings: ClientSettings::default().with_max_issues_per_request(10),
            profiles: vec![Profile::new(
                "work".to_string(),
                "https://a.atlassian.net".to_string(),
                "me@a.com".to_string(),
            )],
        };

        config.save_to(&path).unwrap();
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded, config);
    }
}
