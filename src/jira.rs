//! The client handle.

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::api::types::Issue;
use crate::api::{Auth, JiraClient, API_PREFIX};
use crate::cache::MetadataCache;
use crate::config::{ClientSettings, Profile};
use crate::error::Result;
use crate::query::IssueQuery;
use crate::search::{IssueStream, SearchExecutor, SearchOptions};

/// A connection to one JIRA server.
///
/// The handle owns the transport, the settings and a metadata cache.
/// Clones share the transport and the cache; a handle built with
/// [`Jira::new`] always starts with an empty cache.
#[derive(Debug, Clone)]
pub struct Jira {
    client: Arc<JiraClient>,
    cache: Arc<MetadataCache>,
    settings: ClientSettings,
    cancel: CancellationToken,
}

impl Jira {
    /// Connect to `url`, anonymously when `auth` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or the HTTP client cannot be built.
    pub fn new(url: &str, auth: Option<Auth>, settings: ClientSettings) -> Result<Self> {
        let settings = settings.normalize();
        let client = JiraClient::new(url, auth, &settings)?;
        info!(
            url = client.base_url(),
            page_size = settings.page_size(),
            "Created JIRA client"
        );

        Ok(Self {
            client: Arc::new(client),
            cache: Arc::new(MetadataCache::new()),
            settings,
            cancel: CancellationToken::new(),
        })
    }

    /// Connect with a profile, reading the API token from its environment variable.
    pub fn from_profile(profile: &Profile, settings: ClientSettings) -> Result<Self> {
        profile.validate()?;
        let token = profile.token_from_env()?;
        Self::new(&profile.url, Some(Auth::basic(&profile.email, &token)), settings)
    }

    /// Use `cancel` for every remote call made through this handle.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The token cancelling this handle's remote calls.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Change the search page size, clamped to the server maximum.
    pub fn set_max_issues_per_request(&mut self, max: u32) {
        self.settings = self.settings.clone().with_max_issues_per_request(max);
    }

    /// The server URL.
    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    /// The underlying transport.
    pub fn client(&self) -> &JiraClient {
        &self.client
    }

    /// The metadata cache of this handle.
    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Start a query over all issues.
    pub fn issues(&self) -> IssueQuery {
        IssueQuery::new(self.clone())
    }

    /// A pager using this handle's transport and page size.
    pub fn search_executor(&self) -> SearchExecutor {
        SearchExecutor::new(Arc::clone(&self.client), self.settings.page_size())
    }

    /// Stream the issues matching a raw JQL string.
    pub fn stream_jql(&self, jql: impl Into<String>, options: SearchOptions) -> IssueStream {
        self.search_executor()
            .stream(jql.into(), options, self.cancel.clone())
    }

    /// Fetch every issue matching a raw JQL string.
    #[instrument(skip(self, options))]
    pub async fn issues_from_jql(&self, jql: &str, options: SearchOptions) -> Result<Vec<Issue>> {
        use futures::TryStreamExt;

        Ok(self.stream_jql(jql, options).try_collect().await?)
    }

    /// Fetch one issue by key or ID.
    #[instrument(skip(self))]
    pub async fn issue(&self, key: &str) -> Result<Issue> {
        self.get(&format!("issue/{}", urlencoding::encode(key))).await
    }

    /// `GET rest/api/2/{path}`.
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let path = format!("{}/{}", API_PREFIX, path);
        Ok(self
            .client
            .execute(Method::GET, &path, None, &self.cancel)
            .await?)
    }
}
