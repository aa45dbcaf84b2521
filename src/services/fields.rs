//! Custom field discovery.

use tracing::{debug, instrument};

use crate::api::types::{CreateMeta, CustomField};
use crate::cache::FieldScope;
use crate::error::{Error, Result};
use crate::jira::Jira;

impl Jira {
    /// Every custom field defined on the server.
    ///
    /// Fetched from `GET /rest/api/2/field` once per handle.
    #[instrument(skip(self))]
    pub async fn custom_fields(&self) -> Result<Vec<CustomField>> {
        self.cache()
            .custom_fields
            .get_or_populate(|| self.fetch_custom_fields())
            .await
    }

    /// Custom fields available in a project, optionally for one issue type.
    ///
    /// Fetched from the create metadata endpoint once per distinct scope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the project does not exist.
    #[instrument(skip_all, fields(scope = %scope))]
    pub async fn custom_fields_for(&self, scope: &FieldScope) -> Result<Vec<CustomField>> {
        self.cache()
            .project_custom_fields
            .scope(scope)
            .get_or_populate(|| self.fetch_create_meta_fields(scope))
            .await
    }

    /// A custom field by ID or, failing that, by display name.
    pub async fn custom_field(&self, id_or_name: &str) -> Result<CustomField> {
        self.custom_fields().await?;
        self.cache()
            .custom_fields
            .get_by_id_or_name(id_or_name)
            .ok_or_else(|| {
                Error::not_found(format!(
                    "Could not find custom field with id or name '{}' on the Jira server",
                    id_or_name
                ))
            })
    }

    async fn fetch_custom_fields(&self) -> Result<Vec<CustomField>> {
        let fields: Vec<CustomField> = self.get("field").await?;
        let custom: Vec<CustomField> = fields.into_iter().filter(|f| f.custom).collect();
        debug!(count = custom.len(), "Fetched custom fields");
        Ok(custom)
    }

    async fn fetch_create_meta_fields(&self, scope: &FieldScope) -> Result<Vec<CustomField>> {
        let mut path = format!(
            "issue/createmeta?expand=projects.issuetypes.fields&projectKeys={}",
            urlencoding::encode(&scope.project_key)
        );
        if let Some(id) = &scope.issue_type_id {
            path.push_str(&format!("&issuetypeIds={}", urlencoding::encode(id)));
        }
        if let Some(name) = &scope.issue_type_name {
            path.push_str(&format!("&issuetypeNames={}", urlencoding::encode(name)));
        }

        let meta: CreateMeta = self.get(&path).await?;
        let project = meta.projects.into_iter().next().ok_or_else(|| {
            Error::not_found(format!(
                "Project with key '{}' was not found on the Jira server.",
                scope.project_key
            ))
        })?;

        let mut fields: Vec<CustomField> = Vec::new();
        for field in project.issuetypes.iter().flat_map(|t| t.custom_fields()) {
            if !fields.iter().any(|f| f.id == field.id) {
                fields.push(field);
            }
        }
        debug!(count = fields.len(), "Fetched project custom fields");
        Ok(fields)
    }
}
