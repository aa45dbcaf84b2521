//! Crate-wide error type.
//!
//! Transport failures, query translation failures and configuration
//! failures each keep their own error enum; [`Error`] aggregates them
//! together with the lookup and scalar-reduction failures raised by the
//! handle itself.

use thiserror::Error;

use crate::api::error::ApiError;
use crate::config::ConfigError;
use crate::query::TranslationError;

/// The main error type of the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A remote call failed.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// A query could not be compiled to JQL. Raised before any search request.
    #[error("{0}")]
    Translation(#[from] TranslationError),

    /// Configuration could not be loaded or is invalid.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// A named lookup found nothing after checking the server.
    #[error("{0}")]
    NotFound(String),

    /// `first` or `single` was applied to an empty result.
    #[error("Sequence contains no elements")]
    Empty,

    /// `single` was applied to a result with more than one element.
    #[error("Sequence contains more than one element")]
    MoreThanOne,
}

impl Error {
    /// Create a lookup-miss error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Check whether this error means the requested entity does not exist,
    /// either because the server answered 404 or a named lookup missed.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::Api(ApiError::NotFound(_)))
    }

    /// Check whether the operation was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Api(ApiError::Cancelled))
    }

    /// Get a user-friendly message for display.
    pub fn user_message(&self) -> String {
        match self {
            Error::Api(e) => match e {
                ApiError::Unauthorized => {
                    "Authentication failed. Please check your email and API token.".to_string()
                }
                ApiError::Forbidden => {
                    "Access denied. You don't have permission to access this resource.".to_string()
                }
                ApiError::NotFound(resource) => format!("'{}' was not found.", resource),
                ApiError::Validation(msg) => format!("JIRA rejected the request: {}", msg),
                ApiError::Conflict(_) => {
                    "The entity was modified by someone else. Please refresh and try again."
                        .to_string()
                }
                ApiError::RateLimited => {
                    "Too many requests. Please wait a moment and try again.".to_string()
                }
                ApiError::ServerError(_) => "JIRA server error. Please try again later.".to_string(),
                ApiError::Network(_) => {
                    "Connection failed. Please check your internet connection.".to_string()
                }
                ApiError::InvalidUrl(_) => "Invalid JIRA URL in configuration.".to_string(),
                ApiError::InvalidResponse(_) => {
                    "Unexpected response from JIRA. Please try again.".to_string()
                }
                ApiError::Encode(_) => "Could not encode the request.".to_string(),
                ApiError::Cancelled => "The operation was cancelled.".to_string(),
            },
            Error::Translation(e) => format!("Query cannot be translated to JQL: {}", e),
            Error::Config(e) => match e {
                ConfigError::NoConfigDir => {
                    "Could not find configuration directory. Please check your system settings."
                        .to_string()
                }
                ConfigError::ReadError(_) => {
                    "Could not read configuration file. Please check the file exists and is readable.".to_string()
                }
                ConfigError::ParseError(_) => {
                    "Configuration file is invalid. Please check the file format.".to_string()
                }
                ConfigError::MissingToken(var) => {
                    format!("Set the {} environment variable to your API token.", var)
                }
                other => format!("Configuration error: {}", other),
            },
            Error::NotFound(msg) => msg.clone(),
            Error::Empty | Error::MoreThanOne => self.to_string(),
        }
    }
}

/// Result type for crate operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_api_error() {
        let err: Error = ApiError::Unauthorized.into();
        assert!(matches!(err, Error::Api(ApiError::Unauthorized)));
    }

    #[test]
    fn test_error_from_translation_error() {
        let err: Error = TranslationError::UnsupportedOperation("StartsWith".to_string()).into();
        assert!(matches!(err, Error::Translation(_)));
        assert!(err.user_message().contains("StartsWith"));
    }

    #[test]
    fn test_is_not_found_covers_http_and_lookup() {
        assert!(Error::Api(ApiError::NotFound("status/9".to_string())).is_not_found());
        assert!(Error::not_found("Filter 'Mine' not found").is_not_found());
        assert!(!Error::Empty.is_not_found());
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = Error::Api(ApiError::Validation(
            "'Custom Number Field' expects a number".to_string(),
        ));
        assert_eq!(err.to_string(), "'Custom Number Field' expects a number");
        assert!(err.user_message().contains("expects a number"));
    }

    #[test]
    fn test_user_message_missing_token() {
        let err = Error::Config(ConfigError::MissingToken("JIRA_API_TOKEN".to_string()));
        assert!(err.user_message().contains("JIRA_API_TOKEN"));
    }

    #[test]
    fn test_scalar_errors() {
        assert_eq!(Error::Empty.user_message(), "Sequence contains no elements");
        assert_eq!(
            Error::MoreThanOne.to_string(),
            "Sequence contains more than one element"
        );
        assert!(Error::Api(ApiError::Cancelled).is_cancelled());
    }
}
