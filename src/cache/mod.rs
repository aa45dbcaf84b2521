//! Metadata caching.
//!
//! Reference data (custom fields, issue types, priorities, resolutions,
//! statuses, projects, components, versions) changes rarely and is needed
//! repeatedly to resolve names in queries. Each kind lives in an
//! append-only [`EntityStore`]; project-scoped kinds live in a
//! [`ScopedStore`] keyed by project (and issue type for custom fields).
//!
//! A cache belongs to one [`crate::Jira`] handle and lives as long as it
//! does. There is no TTL and no eviction; create a new handle to refresh.

mod store;

use std::fmt;

use tokio::sync::OnceCell;

use crate::api::types::{
    Component, CustomField, IssueType, Priority, Project, Resolution, Status, User, Version,
};

pub(crate) use store::same_name;
pub use store::{EntityStore, NamedEntity, ScopedStore};

/// Scope of a project-level custom field lookup.
///
/// Custom field availability varies per issue type, so the issue type
/// (by id or by name) is part of the cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldScope {
    /// Project key.
    pub project_key: String,
    /// Restrict to one issue type by ID.
    pub issue_type_id: Option<String>,
    /// Restrict to one issue type by name.
    pub issue_type_name: Option<String>,
}

impl FieldScope {
    /// Scope covering every issue type of a project.
    pub fn project(project_key: impl Into<String>) -> Self {
        Self {
            project_key: project_key.into(),
            ..Default::default()
        }
    }

    /// Restrict the scope to an issue type ID.
    pub fn with_issue_type_id(mut self, id: impl Into<String>) -> Self {
        self.issue_type_id = Some(id.into());
        self
    }

    /// Restrict the scope to an issue type name.
    pub fn with_issue_type_name(mut self, name: impl Into<String>) -> Self {
        self.issue_type_name = Some(name.into());
        self
    }
}

impl fmt::Display for FieldScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.project_key)?;
        if let Some(id) = &self.issue_type_id {
            write!(f, "/{}", id)?;
        }
        if let Some(name) = &self.issue_type_name {
            write!(f, "/{}", name)?;
        }
        Ok(())
    }
}

/// Reference data cached for one client handle.
#[derive(Debug, Default)]
pub struct MetadataCache {
    pub custom_fields: EntityStore<CustomField>,
    pub project_custom_fields: ScopedStore<FieldScope, CustomField>,
    pub issue_types: EntityStore<IssueType>,
    pub project_issue_types: ScopedStore<String, IssueType>,
    pub priorities: EntityStore<Priority>,
    pub resolutions: EntityStore<Resolution>,
    pub statuses: EntityStore<Status>,
    pub projects: EntityStore<Project>,
    pub components: ScopedStore<String, Component>,
    pub versions: ScopedStore<String, Version>,
    pub current_user: OnceCell<User>,
}

impl MetadataCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_scope_display() {
        assert_eq!(FieldScope::project("TST").to_string(), "TST");
        assert_eq!(
            FieldScope::project("TST")
                .with_issue_type_id("1")
                .with_issue_type_name("Bug")
                .to_string(),
            "TST/1/Bug"
        );
    }

    #[test]
    fn test_field_scope_is_composite_key() {
        let cache = MetadataCache::new();
        let bugs = FieldScope::project("TST").with_issue_type_name("Bug");
        let all = FieldScope::project("TST");

        cache.project_custom_fields.scope(&bugs).seed(vec![CustomField {
            id: "customfield_10000".to_string(),
            name: "Custom Text Field".to_string(),
            custom: true,
            schema: None,
        }]);

        assert!(cache.project_custom_fields.is_complete(&bugs));
        assert!(!cache.project_custom_fields.is_complete(&all));
    }

    #[test]
    fn test_new_cache_is_empty() {
        let cache = MetadataCache::new();
        assert!(cache.priorities.is_empty());
        assert!(!cache.statuses.is_complete());
        assert!(cache.current_user.get().is_none());
    }
}
