//! Screens and their tabs.

use tracing::instrument;

use crate::api::types::{ScreenField, ScreenTab};
use crate::error::Result;
use crate::jira::Jira;

impl Jira {
    /// Fields that can still be added to a screen.
    #[instrument(skip(self))]
    pub async fn screen_available_fields(&self, screen_id: &str) -> Result<Vec<ScreenField>> {
        self.get(&format!(
            "screens/{}/availableFields",
            urlencoding::encode(screen_id)
        ))
        .await
    }

    /// Tabs of a screen, optionally as seen from one project.
    #[instrument(skip(self))]
    pub async fn screen_tabs(
        &self,
        screen_id: &str,
        project_key: Option<&str>,
    ) -> Result<Vec<ScreenTab>> {
        let path = format!("screens/{}/tabs", urlencoding::encode(screen_id));
        self.get(&with_project_key(path, project_key)).await
    }

    /// Fields on one tab of a screen, optionally as seen from one project.
    #[instrument(skip(self))]
    pub async fn screen_tab_fields(
        &self,
        screen_id: &str,
        tab_id: &str,
        project_key: Option<&str>,
    ) -> Result<Vec<ScreenField>> {
        let path = format!(
            "screens/{}/tabs/{}/fields",
            urlencoding::encode(screen_id),
            urlencoding::encode(tab_id)
        );
        self.get(&with_project_key(path, project_key)).await
    }
}

/// Append `projectKey` unless it is missing or blank.
fn with_project_key(mut path: String, project_key: Option<&str>) -> String {
    if let Some(key) = project_key.map(str::trim).filter(|k| !k.is_empty()) {
        path.push_str(&format!("?projectKey={}", urlencoding::encode(key)));
    }
    path
}
