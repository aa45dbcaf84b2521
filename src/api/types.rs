//! JIRA API request and response types.
//!
//! These types model the JIRA REST API v2 payloads used by the search and
//! metadata endpoints.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// One page of a larger result set.
///
/// The search endpoint calls the items `issues`; other paged endpoints call
/// them `values`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// The index of the first item of this page.
    #[serde(default)]
    pub start_at: u32,
    /// The page size the server applied.
    #[serde(default)]
    pub max_results: u32,
    /// Total number of matching items.
    #[serde(default)]
    pub total: u32,
    /// The items of this page.
    #[serde(default = "Vec::new", alias = "issues", alias = "values")]
    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// Check if there are more pages of results.
    pub fn has_more(&self) -> bool {
        self.start_at + (self.items.len() as u32) < self.total
    }

    /// Get the starting index for the next page.
    pub fn next_start(&self) -> u32 {
        self.start_at + self.items.len() as u32
    }
}

/// Search result from a JQL query.
pub type SearchResult = Page<Issue>;

/// Body of `POST /rest/api/2/search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// The JQL query.
    pub jql: String,
    /// Index of the first issue to return.
    pub start_at: u32,
    /// Page size.
    pub max_results: u32,
    /// Fields to return; `*all` for everything.
    pub fields: Vec<String>,
    /// Entities to expand.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expand: Vec<String>,
}

/// A JIRA issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// The issue ID.
    pub id: String,
    /// The issue key (e.g., "PROJ-123").
    pub key: String,
    /// REST URL of the issue.
    #[serde(rename = "self", default)]
    pub self_url: String,
    /// The issue fields.
    #[serde(default)]
    pub fields: IssueFields,
}

impl Issue {
    /// Get the issue summary, if it was fetched.
    pub fn summary(&self) -> Option<&str> {
        self.fields.summary.as_deref()
    }

    /// Get the issue status name.
    pub fn status(&self) -> Option<&str> {
        self.fields.status.as_ref().map(|s| s.name.as_str())
    }

    /// Get the issue type name.
    pub fn issue_type(&self) -> Option<&str> {
        self.fields.issuetype.as_ref().map(|t| t.name.as_str())
    }

    /// Get the issue priority name, if set.
    pub fn priority(&self) -> Option<&str> {
        self.fields.priority.as_ref().map(|p| p.name.as_str())
    }

    /// Get the resolution name, if resolved.
    pub fn resolution(&self) -> Option<&str> {
        self.fields.resolution.as_ref().map(|r| r.name.as_str())
    }

    /// Get the assignee display name, if assigned.
    pub fn assignee(&self) -> Option<&str> {
        self.fields.assignee.as_ref().map(|a| a.display_name.as_str())
    }

    /// Get the project key, if available.
    pub fn project_key(&self) -> Option<&str> {
        self.fields.project.as_ref().map(|p| p.key.as_str())
    }

    /// Check whether the issue carries a label.
    pub fn has_label(&self, label: &str) -> bool {
        self.fields.labels.iter().any(|l| l == label)
    }

    /// Raw value of a field not modelled above, e.g. `customfield_10000`.
    pub fn field(&self, id: &str) -> Option<&serde_json::Value> {
        self.fields.other.get(id).filter(|v| !v.is_null())
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.summary().unwrap_or(""))
    }
}

/// Issue fields.
///
/// Every field is optional because a search may select a subset of fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueFields {
    /// The issue summary/title.
    #[serde(default)]
    pub summary: Option<String>,
    /// The issue description.
    #[serde(default)]
    pub description: Option<String>,
    /// The issue status.
    #[serde(default)]
    pub status: Option<Status>,
    /// The issue type (Bug, Story, Task, etc.).
    #[serde(default)]
    pub issuetype: Option<IssueType>,
    /// The issue priority.
    #[serde(default)]
    pub priority: Option<Priority>,
    /// The issue resolution.
    #[serde(default)]
    pub resolution: Option<Resolution>,
    /// The issue assignee.
    #[serde(default)]
    pub assignee: Option<User>,
    /// The issue reporter.
    #[serde(default)]
    pub reporter: Option<User>,
    /// The project this issue belongs to.
    #[serde(default)]
    pub project: Option<Project>,
    /// Labels attached to the issue.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Components the issue is associated with.
    #[serde(default)]
    pub components: Vec<Component>,
    /// Fix versions.
    #[serde(default, rename = "fixVersions")]
    pub fix_versions: Vec<Version>,
    /// When the issue was created.
    #[serde(default)]
    pub created: Option<String>,
    /// When the issue was last updated.
    #[serde(default)]
    pub updated: Option<String>,
    /// When the issue is due.
    #[serde(default)]
    pub duedate: Option<String>,
    /// Custom fields and any other field without a typed slot.
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

/// Issue status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    /// The status ID.
    pub id: String,
    /// The status name (e.g., "Open", "In Progress", "Done").
    pub name: String,
    /// The status description.
    #[serde(default)]
    pub description: Option<String>,
    /// URL to the status icon.
    #[serde(default)]
    pub icon_url: Option<String>,
    /// The status category.
    #[serde(default)]
    pub status_category: Option<StatusCategory>,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Status category (groups statuses into to-do, in-progress, done).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCategory {
    /// The category ID.
    pub id: u32,
    /// The category key.
    pub key: String,
    /// The category name.
    pub name: String,
    /// The category colour.
    #[serde(default)]
    pub color_name: Option<String>,
}

/// Issue type (Bug, Story, Task, Epic, etc.).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueType {
    /// The issue type ID.
    pub id: String,
    /// The issue type name.
    pub name: String,
    /// Whether this is a subtask type.
    #[serde(default)]
    pub subtask: bool,
    /// The issue type description.
    #[serde(default)]
    pub description: Option<String>,
    /// URL to the issue type icon.
    #[serde(default)]
    pub icon_url: Option<String>,
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Issue priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Priority {
    /// The priority ID.
    pub id: String,
    /// The priority name (e.g., "Blocker", "Major", "Minor").
    pub name: String,
    /// URL to the priority icon.
    #[serde(default)]
    pub icon_url: Option<String>,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Issue resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// The resolution ID.
    pub id: String,
    /// The resolution name (e.g., "Fixed", "Won't Fix").
    pub name: String,
    /// The resolution description.
    #[serde(default)]
    pub description: Option<String>,
}

/// A JIRA user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// The user's account ID (cloud).
    #[serde(default)]
    pub account_id: Option<String>,
    /// The user's name (server / data center).
    #[serde(default)]
    pub name: Option<String>,
    /// The user's display name.
    #[serde(default)]
    pub display_name: String,
    /// The user's email address (may be hidden).
    #[serde(default)]
    pub email_address: Option<String>,
    /// Whether the user is active.
    #[serde(default = "default_true")]
    pub active: bool,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name)
    }
}

/// A JIRA project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// The project ID.
    pub id: String,
    /// The project key (e.g., "PROJ").
    pub key: String,
    /// The project name.
    #[serde(default)]
    pub name: String,
    /// The project lead.
    #[serde(default)]
    pub lead: Option<User>,
    /// The project URL.
    #[serde(default)]
    pub url: Option<String>,
}

/// A project component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// The component ID.
    pub id: String,
    /// The component name.
    pub name: String,
    /// The component description.
    #[serde(default)]
    pub description: Option<String>,
    /// Key of the owning project. Filled in by the client when the
    /// endpoint leaves it out.
    #[serde(default)]
    pub project: Option<String>,
}

/// A project version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    /// The version ID.
    pub id: String,
    /// The version name (e.g., "1.0").
    pub name: String,
    /// Whether the version is archived.
    #[serde(default)]
    pub archived: bool,
    /// Whether the version is released.
    #[serde(default)]
    pub released: bool,
    /// The release date, if set.
    #[serde(default)]
    pub release_date: Option<String>,
}

/// A field definition returned by `GET /rest/api/2/field` or createmeta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    /// The field ID (e.g., "customfield_10000").
    pub id: String,
    /// The display name.
    pub name: String,
    /// Whether this is a custom field.
    #[serde(default)]
    pub custom: bool,
    /// The field's value schema.
    #[serde(default)]
    pub schema: Option<FieldSchema>,
}

impl CustomField {
    /// The numeric part of the field ID, used in `cf[N]` JQL references.
    pub fn numeric_id(&self) -> Option<&str> {
        custom_field_number(&self.id)
    }

    /// Check whether values of this field are free text.
    pub fn is_text(&self) -> bool {
        self.schema.as_ref().is_some_and(FieldSchema::is_text)
    }

    /// Check whether this field holds a list of values.
    pub fn is_multi_valued(&self) -> bool {
        self.schema
            .as_ref()
            .is_some_and(|s| s.field_type == "array")
    }
}

/// Extract `N` from `customfield_N`.
pub fn custom_field_number(id: &str) -> Option<&str> {
    let number = id.strip_prefix("customfield_")?;
    if !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit()) {
        Some(number)
    } else {
        None
    }
}

/// Value schema of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    /// The value type ("string", "number", "array", "option", ...).
    #[serde(rename = "type")]
    pub field_type: String,
    /// Element type for arrays.
    #[serde(default)]
    pub items: Option<String>,
    /// Plugin key for custom fields.
    #[serde(default)]
    pub custom: Option<String>,
    /// Numeric custom field id.
    #[serde(default)]
    pub custom_id: Option<u64>,
}

impl FieldSchema {
    /// Free-text custom fields are searched with the contains operator.
    pub fn is_text(&self) -> bool {
        match &self.custom {
            Some(custom) => custom.ends_with(":textfield") || custom.ends_with(":textarea"),
            None => false,
        }
    }
}

/// A saved filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    /// The filter ID.
    pub id: String,
    /// The filter name.
    pub name: String,
    /// The filter's JQL.
    pub jql: String,
    /// The filter description.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the filter is a favourite of the current user.
    #[serde(default)]
    pub favourite: bool,
}

/// A field as listed on a screen or screen tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenField {
    /// The field ID (e.g. `summary`, `customfield_10000`).
    pub id: String,
    /// The field name.
    pub name: String,
    /// Field type, reported for tab fields only.
    #[serde(default, rename = "type")]
    pub field_type: Option<String>,
}

/// A tab of a screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenTab {
    /// The tab ID. Numeric on the wire.
    pub id: u64,
    /// The tab name.
    pub name: String,
}

/// Response of `GET /rest/api/2/issue/createmeta?expand=projects.issuetypes.fields`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMeta {
    /// Projects matching the request.
    #[serde(default)]
    pub projects: Vec<CreateMetaProject>,
}

/// A project entry of the createmeta response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMetaProject {
    /// The project key.
    pub key: String,
    /// Issue types available in the project.
    #[serde(default)]
    pub issuetypes: Vec<CreateMetaIssueType>,
}

/// An issue type entry of the createmeta response.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMetaIssueType {
    /// The issue type ID.
    pub id: String,
    /// The issue type name.
    pub name: String,
    /// Fields keyed by field ID.
    #[serde(default)]
    pub fields: BTreeMap<String, CreateMetaField>,
}

/// A field entry of the createmeta response. The ID is the map key.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMetaField {
    /// The display name.
    pub name: String,
    /// The value schema.
    #[serde(default)]
    pub schema: Option<FieldSchema>,
}

impl CreateMetaIssueType {
    /// Custom fields available for this issue type.
    pub fn custom_fields(&self) -> impl Iterator<Item = CustomField> + '_ {
        self.fields
            .iter()
            .filter(|(id, _)| id.to_ascii_lowercase().starts_with("customfield_"))
            .map(|(id, field)| CustomField {
                id: id.clone(),
                name: field.name.clone(),
                custom: true,
                schema: field.schema.clone(),
            })
    }
}
