//! Projects and their components and versions.

use tracing::{debug, instrument};

use crate::api::types::{Component, Project, Version};
use crate::error::{Error, Result};
use crate::jira::Jira;

impl Jira {
    /// All projects visible to the current user, with lead and URL expanded.
    #[instrument(skip(self))]
    pub async fn projects(&self) -> Result<Vec<Project>> {
        self.cache()
            .projects
            .get_or_populate(|| self.get::<Vec<Project>>("project?expand=lead,url"))
            .await
    }

    /// One project by key.
    #[instrument(skip(self))]
    pub async fn project(&self, key: &str) -> Result<Project> {
        let store = &self.cache().projects;
        if let Some(project) = store.get_by_id(key) {
            return Ok(project);
        }

        let path = format!("project/{}?expand=lead,url", urlencoding::encode(key));
        match self.get::<Project>(&path).await {
            Ok(project) => {
                store.try_add(project.clone());
                Ok(project)
            }
            Err(e) if e.is_not_found() => Err(Error::not_found(format!(
                "Project with key '{}' was not found on the Jira server.",
                key
            ))),
            Err(e) => Err(e),
        }
    }

    /// Components of a project. Each component carries the project key.
    #[instrument(skip(self))]
    pub async fn components(&self, project_key: &str) -> Result<Vec<Component>> {
        self.cache()
            .components
            .scope(&project_key.to_string())
            .get_or_populate(|| self.fetch_components(project_key))
            .await
    }

    /// Versions of a project.
    #[instrument(skip(self))]
    pub async fn versions(&self, project_key: &str) -> Result<Vec<Version>> {
        let path = format!("project/{}/versions", urlencoding::encode(project_key));
        self.cache()
            .versions
            .scope(&project_key.to_string())
            .get_or_populate(|| self.get::<Vec<Version>>(&path))
            .await
    }

    async fn fetch_components(&self, project_key: &str) -> Result<Vec<Component>> {
        let path = format!("project/{}/components", urlencoding::encode(project_key));
        let mut components: Vec<Component> = self.get(&path).await?;
        for component in &mut components {
            component.project = Some(project_key.to_string());
        }
        debug!(count = components.len(), "Fetched components");
        Ok(components)
    }
}
