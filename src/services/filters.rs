//! Saved filters.

use tracing::{debug, instrument};

use crate::api::types::{Filter, Issue};
use crate::cache::same_name;
use crate::error::{Error, Result};
use crate::jira::Jira;
use crate::search::SearchOptions;

impl Jira {
    /// The current user's favourite filters.
    #[instrument(skip(self))]
    pub async fn favourite_filters(&self) -> Result<Vec<Filter>> {
        self.get("filter/favourite").await
    }

    /// One filter by ID.
    #[instrument(skip(self))]
    pub async fn filter(&self, id: &str) -> Result<Filter> {
        match self.get(&format!("filter/{}", urlencoding::encode(id))).await {
            Err(e) if e.is_not_found() => Err(Error::not_found(format!(
                "Could not find filter with id '{}'",
                id
            ))),
            other => other,
        }
    }

    /// Run the JQL of a saved filter.
    #[instrument(skip(self, options))]
    pub async fn issues_from_filter(&self, id: &str, options: SearchOptions) -> Result<Vec<Issue>> {
        let filter = self.filter(id).await?;
        debug!(jql = %filter.jql, "Running filter");
        self.issues_from_jql(&filter.jql, options).await
    }

    /// Run the JQL of the favourite filter with the given name (case-insensitive).
    #[instrument(skip(self, options))]
    pub async fn issues_from_favourite(
        &self,
        name: &str,
        options: SearchOptions,
    ) -> Result<Vec<Issue>> {
        let filter = self
            .favourite_filters()
            .await?
            .into_iter()
            .find(|f| same_name(&f.name, name))
            .ok_or_else(|| {
                Error::not_found(format!("Could not find favourite filter named '{}'", name))
            })?;
        debug!(id = %filter.id, jql = %filter.jql, "Running favourite filter");
        self.issues_from_jql(&filter.jql, options).await
    }
}
