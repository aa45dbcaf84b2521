//! Query translation errors.

use thiserror::Error;

/// A query that cannot be compiled to JQL.
///
/// These are raised before any search request is sent and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslationError {
    /// The tree contains an operator or method with no JQL equivalent.
    #[error("'{0}' cannot be translated to JQL")]
    UnsupportedOperation(String),

    /// Several custom fields share the display name.
    #[error(
        "More than one custom field named '{name}' was found ({}); search by project to disambiguate",
        .ids.join(", ")
    )]
    AmbiguousField { name: String, ids: Vec<String> },

    /// No custom field has the display name.
    #[error("Could not find custom field with name '{0}' on the Jira server")]
    UnknownField(String),

    /// An operand does not fit the operator.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type for translation.
pub type Result<T> = std::result::Result<T, TranslationError>;
