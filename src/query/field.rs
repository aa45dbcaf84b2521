//! Issue fields as they appear in JQL.

use std::fmt;

/// A field that can be compared or ordered on.
///
/// Built-in fields render with their JQL name. Custom fields are either
/// named by their display name, which is resolved through the metadata
/// cache, or by their numeric ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    Key,
    Summary,
    Description,
    Environment,
    Comment,
    Status,
    Priority,
    Resolution,
    IssueType,
    Project,
    Assignee,
    Reporter,
    Labels,
    Component,
    FixVersion,
    AffectedVersion,
    Created,
    Updated,
    DueDate,
    Resolved,
    Votes,
    /// A custom field referenced by display name.
    Custom(String),
    /// A custom field referenced by ID, either `10000` or `customfield_10000`.
    CustomId(String),
}

const BUILT_INS: &[(&str, Field)] = &[
    ("key", Field::Key),
    ("summary", Field::Summary),
    ("description", Field::Description),
    ("environment", Field::Environment),
    ("comment", Field::Comment),
    ("status", Field::Status),
    ("priority", Field::Priority),
    ("resolution", Field::Resolution),
    ("issuetype", Field::IssueType),
    ("project", Field::Project),
    ("assignee", Field::Assignee),
    ("reporter", Field::Reporter),
    ("labels", Field::Labels),
    ("component", Field::Component),
    ("fixVersion", Field::FixVersion),
    ("affectedVersion", Field::AffectedVersion),
    ("created", Field::Created),
    ("updated", Field::Updated),
    ("due", Field::DueDate),
    ("resolved", Field::Resolved),
    ("votes", Field::Votes),
];

impl Field {
    /// Look up a built-in field by its JQL name or a common alias.
    pub fn built_in(name: &str) -> Option<Field> {
        let name = match name.to_ascii_lowercase().as_str() {
            "type" => "issuetype",
            "duedate" => "due",
            "resolutiondate" => "resolved",
            "components" => "component",
            "fixversions" => "fixVersion",
            "versions" | "affectsversion" => "affectedVersion",
            "labels" | "label" => "labels",
            _ => name,
        };
        BUILT_INS
            .iter()
            .find(|(jql, _)| jql.eq_ignore_ascii_case(name))
            .map(|(_, field)| field.clone())
    }

    /// JQL name of a built-in field. `None` for custom fields.
    pub fn jql_name(&self) -> Option<&'static str> {
        BUILT_INS
            .iter()
            .find(|(_, field)| field == self)
            .map(|(jql, _)| *jql)
    }

    /// Free-text fields compare with `~` unless an exact match is requested.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            Field::Summary | Field::Description | Field::Environment | Field::Comment
        )
    }

    /// Fields holding a list of values.
    pub fn is_multi_valued(&self) -> bool {
        matches!(
            self,
            Field::Labels | Field::Component | Field::FixVersion | Field::AffectedVersion
        )
    }

    /// Check whether resolving this field requires the custom field catalog.
    pub fn needs_catalog(&self) -> bool {
        matches!(self, Field::Custom(_))
    }
}

impl From<&str> for Field {
    /// Built-in names map to their field; `cf[N]` and `customfield_N` map to
    /// [`Field::CustomId`]; anything else is taken as a custom field name.
    fn from(name: &str) -> Self {
        if let Some(field) = Field::built_in(name) {
            return field;
        }
        if let Some(id) = name
            .strip_prefix("cf[")
            .and_then(|rest| rest.strip_suffix(']'))
        {
            return Field::CustomId(id.to_string());
        }
        if name.starts_with("customfield_") {
            return Field::CustomId(name.to_string());
        }
        Field::Custom(name.to_string())
    }
}

impl From<String> for Field {
    fn from(name: String) -> Self {
        Field::from(name.as_str())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Custom(name) => write!(f, "{}", name),
            Field::CustomId(id) => write!(f, "{}", id),
            builtin => write!(f, "{}", builtin.jql_name().unwrap_or_default()),
        }
    }
}
