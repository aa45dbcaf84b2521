//! Issue types, priorities, resolutions and statuses.

use tracing::{debug, instrument};

use crate::api::types::{IssueType, Priority, Resolution, Status};
use crate::error::{Error, Result};
use crate::jira::Jira;

impl Jira {
    /// All issue types on the server.
    #[instrument(skip(self))]
    pub async fn issue_types(&self) -> Result<Vec<IssueType>> {
        self.cache()
            .issue_types
            .get_or_populate(|| self.get::<Vec<IssueType>>("issuetype"))
            .await
    }

    /// The issue types used by one project.
    #[instrument(skip(self))]
    pub async fn issue_types_for_project(&self, project_key: &str) -> Result<Vec<IssueType>> {
        let path = format!("project/{}/statuses", urlencoding::encode(project_key));
        self.cache()
            .project_issue_types
            .scope(&project_key.to_string())
            .get_or_populate(|| self.get::<Vec<IssueType>>(&path))
            .await
    }

    #[instrument(skip(self))]
    pub async fn priorities(&self) -> Result<Vec<Priority>> {
        self.cache()
            .priorities
            .get_or_populate(|| self.get::<Vec<Priority>>("priority"))
            .await
    }

    #[instrument(skip(self))]
    pub async fn resolutions(&self) -> Result<Vec<Resolution>> {
        self.cache()
            .resolutions
            .get_or_populate(|| self.get::<Vec<Resolution>>("resolution"))
            .await
    }

    #[instrument(skip(self))]
    pub async fn statuses(&self) -> Result<Vec<Status>> {
        self.cache()
            .statuses
            .get_or_populate(|| self.get::<Vec<Status>>("status"))
            .await
    }

    /// One status by ID or name.
    ///
    /// Served from the cache when possible. A miss against a fully loaded
    /// cache is answered without a remote call.
    #[instrument(skip(self))]
    pub async fn status(&self, id_or_name: &str) -> Result<Status> {
        let store = &self.cache().statuses;
        if let Some(status) = store.get_by_id_or_name(id_or_name) {
            return Ok(status);
        }

        let not_found = || Error::not_found(format!("Could not find status '{}'", id_or_name));
        if store.is_complete() {
            return Err(not_found());
        }

        let path = format!("status/{}", urlencoding::encode(id_or_name));
        let status: Status = match self.get(&path).await {
            Ok(status) => status,
            Err(e) if e.is_not_found() => return Err(not_found()),
            Err(e) => return Err(e),
        };
        if store.try_add(status.clone()) {
            debug!(id = %status.id, "Cached status");
        }
        Ok(status)
    }
}
