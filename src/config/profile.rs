//! JIRA connection profile.

use serde::{Deserialize, Serialize};

use super::{ConfigError, Result};

/// Environment variable read for the API token when a profile names none.
pub const DEFAULT_TOKEN_ENV: &str = "JIRA_API_TOKEN";

/// A JIRA profile configuration.
///
/// Profiles store connection details for a JIRA instance. The API token is
/// never written to the configuration file; it is read from the environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    /// The name of this profile.
    ///
    /// Must be non-empty and unique across all profiles.
    pub name: String,

    /// The JIRA instance URL.
    pub url: String,

    /// The user's email address, used for Basic Auth.
    pub email: String,

    /// Environment variable holding the API token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,
}

impl Profile {
    /// Create a new profile.
    pub fn new(name: String, url: String, email: String) -> Self {
        Self {
            name,
            url,
            email,
            token_env: None,
        }
    }

    /// Validate this profile.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError::ValidationError` with details if validation fails.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ConfigError::ValidationError(
                "profile name cannot be empty".to_string(),
            ));
        }

        if self.name.contains(char::is_whitespace) {
            return Err(ConfigError::ValidationError(format!(
                "profile name '{}' cannot contain whitespace",
                self.name
            )));
        }

        if self.url.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "profile '{}': URL cannot be empty",
                self.name
            )));
        }

        if !self.url.starts_with("https://") && !self.url.starts_with("http://") {
            return Err(ConfigError::ValidationError(format!(
                "profile '{}': URL must start with http:// or https://",
                self.name
            )));
        }

        if self.email.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "profile '{}': email cannot be empty",
                self.name
            )));
        }

        if !self.email.contains('@') {
            return Err(ConfigError::ValidationError(format!(
                "profile '{}': '{}' does not appear to be a valid email address",
                self.name, self.email
            )));
        }

        Ok(())
    }

    /// The environment variable this profile reads its token from.
    pub fn token_env_var(&self) -> &str {
        self.token_env.as_deref().unwrap_or(DEFAULT_TOKEN_ENV)
    }

    /// Read the API token from the environment.
    pub fn token_from_env(&self) -> Result<String> {
        let var = self.token_env_var();
        std::env::var(var).map_err(|_| ConfigError::MissingToken(var.to_string()))
    }
}
