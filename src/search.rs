//! Paged issue search.
//!
//! A search is exposed as a lazy stream of issues. Pages are requested one
//! at a time, in increasing `startAt` order, and only when the consumer
//! has drained the previous page. The stream is forward-only: an error on
//! any page ends it after the issues already yielded.

use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use reqwest::Method;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::error::{ApiError, Result};
use crate::api::types::{Issue, SearchRequest, SearchResult};
use crate::api::{JiraClient, API_PREFIX};

/// A lazy stream of search results.
pub type IssueStream = BoxStream<'static, std::result::Result<Issue, ApiError>>;

/// Which issue fields a search returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldSelection {
    /// Every field (`*all`).
    #[default]
    All,
    /// Only the listed field IDs.
    Only(Vec<String>),
}

impl FieldSelection {
    /// Select the given field IDs.
    pub fn only<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldSelection::Only(fields.into_iter().map(Into::into).collect())
    }

    /// The `fields` value of the search request body.
    pub fn to_wire(&self) -> Vec<String> {
        match self {
            FieldSelection::All => vec!["*all".to_string()],
            FieldSelection::Only(fields) => fields.clone(),
        }
    }
}

/// Options of a raw JQL search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Fields to return.
    pub fields: FieldSelection,
    /// Entities to expand (e.g. `changelog`).
    pub expand: Vec<String>,
    /// Number of leading issues to skip.
    pub start_at: u32,
    /// Maximum number of issues; `None` fetches every match.
    pub max_issues: Option<u32>,
}

impl SearchOptions {
    /// Limit the number of issues.
    pub fn with_max_issues(mut self, max: u32) -> Self {
        self.max_issues = Some(max);
        self
    }

    /// Skip leading issues.
    pub fn with_start_at(mut self, start_at: u32) -> Self {
        self.start_at = start_at;
        self
    }

    /// Select the returned fields.
    pub fn with_fields(mut self, fields: FieldSelection) -> Self {
        self.fields = fields;
        self
    }
}

/// Runs JQL searches against `POST /rest/api/2/search`.
#[derive(Debug, Clone)]
pub struct SearchExecutor {
    client: Arc<JiraClient>,
    page_size: u32,
}

impl SearchExecutor {
    /// Create an executor fetching at most `page_size` issues per request.
    pub fn new(client: Arc<JiraClient>, page_size: u32) -> Self {
        Self {
            client,
            page_size: page_size.max(1),
        }
    }

    /// Stream every issue matching `jql`, within the limits of `options`.
    ///
    /// Nothing is fetched until the stream is polled.
    pub fn stream(&self, jql: String, options: SearchOptions, cancel: CancellationToken) -> IssueStream {
        let pager = Pager {
            client: Arc::clone(&self.client),
            jql,
            fields: options.fields.to_wire(),
            expand: options.expand,
            page_size: self.page_size,
            limit: options.max_issues,
            start_at: options.start_at,
            yielded: 0,
            state: PagerState::Start,
            cancel,
        };

        stream::try_unfold(pager, Pager::next_page)
            .map_ok(|issues| stream::iter(issues.into_iter().map(Ok::<Issue, ApiError>)))
            .try_flatten()
            .boxed()
    }

    /// Number of issues matching `jql`, from a single request that returns no issues.
    pub async fn total(&self, jql: &str, cancel: &CancellationToken) -> Result<u32> {
        let request = SearchRequest {
            jql: jql.to_string(),
            start_at: 0,
            max_results: 0,
            fields: vec!["key".to_string()],
            expand: Vec::new(),
        };
        let page = fetch(&self.client, &request, cancel).await?;
        Ok(page.total)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PagerState {
    Start,
    HasMore,
    Done,
}

struct Pager {
    client: Arc<JiraClient>,
    jql: String,
    fields: Vec<String>,
    expand: Vec<String>,
    page_size: u32,
    limit: Option<u32>,
    start_at: u32,
    yielded: u32,
    state: PagerState,
    cancel: CancellationToken,
}

impl Pager {
    async fn next_page(mut self) -> Result<Option<(Vec<Issue>, Self)>> {
        if self.state == PagerState::Done {
            return Ok(None);
        }

        let remaining = self.limit.map(|limit| limit.saturating_sub(self.yielded));
        if remaining == Some(0) {
            self.state = PagerState::Done;
            return Ok(None);
        }
        if self.cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        let request = SearchRequest {
            jql: self.jql.clone(),
            start_at: self.start_at,
            max_results: remaining.map_or(self.page_size, |r| r.min(self.page_size)),
            fields: self.fields.clone(),
            expand: self.expand.clone(),
        };
        let page = fetch(&self.client, &request, &self.cancel).await?;

        let mut issues = page.items;
        if let Some(remaining) = remaining {
            issues.truncate(remaining as usize);
        }
        let received = issues.len() as u32;
        self.yielded += received;
        self.start_at += received;

        self.state = if received == 0 {
            if self.start_at < page.total {
                warn!(
                    start_at = self.start_at,
                    total = page.total,
                    "Search returned an empty page before the reported total"
                );
            }
            PagerState::Done
        } else if self.limit.is_some_and(|limit| self.yielded >= limit) || self.start_at >= page.total {
            PagerState::Done
        } else {
            PagerState::HasMore
        };
        debug!(received, yielded = self.yielded, total = page.total, state = ?self.state, "Fetched search page");

        Ok(Some((issues, self)))
    }
}

async fn fetch(client: &JiraClient, request: &SearchRequest, cancel: &CancellationToken) -> Result<SearchResult> {
    let body: Value = serde_json::to_value(request)?;
    client
        .execute(Method::POST, &format!("{}/search", API_PREFIX), Some(&body), cancel)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Auth;
    use crate::config::ClientSettings;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn issues(range: std::ops::Range<u32>) -> Vec<Value> {
        range
            .map(|i| json!({"id": i.to_string(), "key": format!("TST-{}", i), "fields": {"summary": "same"}}))
            .collect()
    }

    async fn mount_page(server: &MockServer, start_at: u32, max_results: u32, total: u32, expected_calls: u64) {
        let end = (start_at + max_results).min(total);
        Mock::given(method("POST"))
            .and(path("/rest/api/2/search"))
            .and(body_partial_json(json!({"startAt": start_at, "maxResults": max_results})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "startAt": start_at,
                "maxResults": max_results,
                "total": total,
                "issues": issues(start_at..end),
            })))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    fn executor(server: &MockServer, page_size: u32) -> SearchExecutor {
        let client = JiraClient::new(
            &server.uri(),
            Some(Auth::basic("user@example.com", "token")),
            &ClientSettings::default().with_max_retries(1),
        )
        .unwrap();
        SearchExecutor::new(Arc::new(client), page_size)
    }

    async fn collect(stream: IssueStream) -> Vec<Issue> {
        stream.try_collect().await.unwrap()
    }

    #[tokio::test]
    async fn test_pages_are_fetched_in_order() {
        let server = MockServer::start().await;
        mount_page(&server, 0, 2, 5, 1).await;
        mount_page(&server, 2, 2, 5, 1).await;
        mount_page(&server, 4, 2, 5, 1).await;

        let result = collect(executor(&server, 2).stream(
            "project = TST".to_string(),
            SearchOptions::default(),
            CancellationToken::new(),
        ))
        .await;

        let keys: Vec<&str> = result.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["TST-0", "TST-1", "TST-2", "TST-3", "TST-4"]);
    }

    #[tokio::test]
    async fn test_take_limits_requests() {
        let server = MockServer::start().await;
        mount_page(&server, 0, 2, 10, 1).await;
        mount_page(&server, 2, 1, 10, 1).await;

        let result = collect(executor(&server, 2).stream(
            "project = TST".to_string(),
            SearchOptions::default().with_max_issues(3),
            CancellationToken::new(),
        ))
        .await;
        assert_eq!(result.len(), 3);
    }

    #[tokio::test]
    async fn test_take_one_issues_single_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/api/2/search"))
            .and(body_partial_json(json!({"jql": "summary ~ \"same\"", "maxResults": 1})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "startAt": 0, "maxResults": 1, "total": 2, "issues": issues(0..1),
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = collect(executor(&server, 100).stream(
            "summary ~ \"same\"".to_string(),
            SearchOptions::default().with_max_issues(1),
            CancellationToken::new(),
        ))
        .await;
        assert_eq!(result.len(), 1);
    }

    #[tokio::test]
    async fn test_zero_total_is_empty() {
        let server = MockServer::start().await;
        mount_page(&server, 0, 50, 0, 1).await;

        let result = collect(executor(&server, 50).stream(
            "project = NONE".to_string(),
            SearchOptions::default(),
            CancellationToken::new(),
        ))
        .await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_start_at_offsets_first_request() {
        let server = MockServer::start().await;
        mount_page(&server, 3, 10, 5, 1).await;

        let result = collect(executor(&server, 10).stream(
            "project = TST".to_string(),
            SearchOptions::default().with_start_at(3),
            CancellationToken::new(),
        ))
        .await;
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].key, "TST-3");
    }

    #[tokio::test]
    async fn test_fields_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/api/2/search"))
            .and(body_partial_json(json!({"fields": ["summary", "status"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "startAt": 0, "maxResults": 10, "total": 0, "issues": [],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = collect(executor(&server, 10).stream(
            "project = TST".to_string(),
            SearchOptions::default().with_fields(FieldSelection::only(["summary", "status"])),
            CancellationToken::new(),
        ))
        .await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_error_after_first_page_keeps_yielded_items() {
        let server = MockServer::start().await;
        mount_page(&server, 0, 2, 4, 1).await;
        Mock::given(method("POST"))
            .and(path("/rest/api/2/search"))
            .and(body_partial_json(json!({"startAt": 2})))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "errorMessages": ["The value 'x' does not exist for the field 'project'."]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut stream = executor(&server, 2).stream(
            "project = TST".to_string(),
            SearchOptions::default(),
            CancellationToken::new(),
        );
        assert_eq!(stream.next().await.unwrap().unwrap().key, "TST-0");
        assert_eq!(stream.next().await.unwrap().unwrap().key, "TST-1");
        match stream.next().await {
            Some(Err(ApiError::Validation(msg))) => assert!(msg.contains("does not exist")),
            other => panic!("Expected validation error, got {:?}", other),
        }
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_pages_are_pulled_lazily() {
        let server = MockServer::start().await;
        mount_page(&server, 0, 2, 6, 1).await;
        mount_page(&server, 2, 2, 6, 0).await;

        let mut stream = executor(&server, 2).stream(
            "project = TST".to_string(),
            SearchOptions::default(),
            CancellationToken::new(),
        );
        assert!(stream.next().await.unwrap().is_ok());
        assert!(stream.next().await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_cancel_stops_before_next_page() {
        let server = MockServer::start().await;
        mount_page(&server, 0, 2, 6, 1).await;
        mount_page(&server, 2, 2, 6, 0).await;

        let cancel = CancellationToken::new();
        let mut stream = executor(&server, 2).stream(
            "project = TST".to_string(),
            SearchOptions::default(),
            cancel.clone(),
        );
        assert!(stream.next().await.unwrap().is_ok());
        assert!(stream.next().await.unwrap().is_ok());
        cancel.cancel();
        assert!(matches!(stream.next().await, Some(Err(ApiError::Cancelled))));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_total_uses_zero_page() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/api/2/search"))
            .and(body_partial_json(json!({"maxResults": 0})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "startAt": 0, "maxResults": 0, "total": 42, "issues": [],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let total = executor(&server, 10)
            .total("project = TST", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(total, 42);
    }
}
