//! Execution of compiled queries.
//!
//! The provider compiles a [`QueryRequest`] with the [`JqlVisitor`],
//! resolving custom field names through the handle's metadata cache, and
//! hands the JQL to the search pager. Client-side residual predicates are
//! applied to the returned stream before any skip, take or scalar reduction.

use futures::future;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use super::expr::QueryOp;
use super::visitor::{JqlVisitor, Translation};
use crate::api::types::Issue;
use crate::cache::FieldScope;
use crate::error::{Error, Result};
use crate::jira::Jira;
use crate::search::{FieldSelection, SearchOptions};

/// A lazy stream of query results.
pub type QueryStream = BoxStream<'static, Result<Issue>>;

/// Where custom field display names are looked up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CustomFieldScope {
    /// Every custom field on the server.
    #[default]
    Global,
    /// Only the fields available in one project (and optionally issue type).
    /// Used to tell apart fields that share a display name.
    Project(FieldScope),
}

/// Everything a query needs besides the client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRequest {
    pub ops: Vec<QueryOp>,
    pub fields: FieldSelection,
    pub scope: CustomFieldScope,
}

impl QueryRequest {
    fn needs_catalog(&self) -> bool {
        self.ops.iter().any(|op| match op {
            QueryOp::Where(expr) => expr.fields().iter().any(|f| f.needs_catalog()),
            QueryOp::OrderBy(field, _) | QueryOp::ThenBy(field, _) => field.needs_catalog(),
            QueryOp::Take(_) | QueryOp::Skip(_) => false,
        })
    }
}

/// Scalar reductions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    /// The first issue; [`Error::Empty`] if there is none.
    First,
    /// The first issue, if any.
    FirstOrNone,
    /// The only issue; [`Error::Empty`] or [`Error::MoreThanOne`] otherwise.
    Single,
    /// Number of issues.
    Count,
    /// Whether any issue matches.
    Any,
}

impl Scalar {
    /// Number of issues the reduction needs at most.
    fn item_limit(&self) -> Option<u32> {
        match self {
            Scalar::First | Scalar::FirstOrNone | Scalar::Any => Some(1),
            Scalar::Single => Some(2),
            Scalar::Count => None,
        }
    }
}

/// Result of a scalar reduction.
#[derive(Debug, Clone)]
pub enum ScalarValue {
    Issue(Option<Issue>),
    Count(u64),
    Bool(bool),
}

impl ScalarValue {
    pub fn into_issue(self) -> Option<Issue> {
        match self {
            ScalarValue::Issue(issue) => issue,
            _ => None,
        }
    }

    pub fn as_count(&self) -> Option<u64> {
        match self {
            ScalarValue::Count(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScalarValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Compiles and runs issue queries for one client handle.
#[derive(Debug, Clone)]
pub struct QueryProvider {
    jira: Jira,
    cancel: CancellationToken,
}

impl QueryProvider {
    /// Create a provider using the handle's cancellation token.
    pub fn new(jira: Jira) -> Self {
        let cancel = jira.cancellation_token().clone();
        Self { jira, cancel }
    }

    /// Use a different cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Compile a request to JQL.
    ///
    /// The custom field catalog is fetched (once per handle) only when the
    /// request names a custom field, and honours this provider's cancellation.
    #[instrument(skip_all)]
    pub async fn translate(&self, request: &QueryRequest) -> Result<Translation> {
        let catalog = if request.needs_catalog() {
            // The clone shares the cache but fetches under this query's token.
            let jira = self.jira.clone().with_cancellation(self.cancel.clone());
            match &request.scope {
                CustomFieldScope::Global => jira.custom_fields().await?,
                CustomFieldScope::Project(scope) => jira.custom_fields_for(scope).await?,
            }
        } else {
            Vec::new()
        };

        let visitor = JqlVisitor::new(&catalog, self.jira.settings().server_max_results);
        Ok(visitor.translate(&request.ops)?)
    }

    /// Compile a request and return its results as a lazy stream.
    pub async fn execute(&self, request: &QueryRequest) -> Result<QueryStream> {
        let translation = self.translate(request).await?;
        Ok(self.run(translation, &request.fields))
    }

    /// Compile a request and reduce its results to a scalar.
    ///
    /// Without residual predicates the reduction's own limit is pushed to
    /// the server, and a count is read from the search total.
    pub async fn execute_scalar(&self, request: &QueryRequest, scalar: Scalar) -> Result<ScalarValue> {
        let mut translation = self.translate(request).await?;

        if !translation.has_residual() {
            let descriptor = &mut translation.descriptor;
            if let Some(cap) = scalar.item_limit() {
                descriptor.limit = Some(descriptor.limit.map_or(cap, |l| l.min(cap)));
            }

            if scalar == Scalar::Count {
                let total = self
                    .jira
                    .search_executor()
                    .total(&descriptor.jql(), &self.cancel)
                    .await?;
                let count = total.saturating_sub(descriptor.skip.unwrap_or(0));
                let count = descriptor.limit.map_or(count, |l| count.min(l));
                debug!(total, count, "Counted issues from search total");
                return Ok(ScalarValue::Count(u64::from(count)));
            }
        }

        let mut stream = self.run(translation, &request.fields);
        match scalar {
            Scalar::First => stream
                .try_next()
                .await?
                .map(|issue| ScalarValue::Issue(Some(issue)))
                .ok_or(Error::Empty),
            Scalar::FirstOrNone => Ok(ScalarValue::Issue(stream.try_next().await?)),
            Scalar::Single => {
                let first = stream.try_next().await?.ok_or(Error::Empty)?;
                if stream.try_next().await?.is_some() {
                    return Err(Error::MoreThanOne);
                }
                Ok(ScalarValue::Issue(Some(first)))
            }
            Scalar::Count => {
                let mut count = 0u64;
                while stream.try_next().await?.is_some() {
                    count += 1;
                }
                Ok(ScalarValue::Count(count))
            }
            Scalar::Any => Ok(ScalarValue::Bool(stream.try_next().await?.is_some())),
        }
    }

    fn run(&self, translation: Translation, fields: &FieldSelection) -> QueryStream {
        let Translation {
            descriptor,
            residual,
        } = translation;
        let executor = self.jira.search_executor();
        let jql = descriptor.jql();

        if residual.is_empty() {
            let options = SearchOptions {
                fields: fields.clone(),
                start_at: descriptor.skip.unwrap_or(0),
                max_issues: descriptor.limit,
                ..Default::default()
            };
            return executor
                .stream(jql, options, self.cancel.clone())
                .err_into::<Error>()
                .boxed();
        }

        // The server cannot apply skip/take to issues that are filtered
        // afterwards, so every match is fetched and paged here.
        let options = SearchOptions {
            fields: fields.clone(),
            ..Default::default()
        };
        let mut to_skip = descriptor.skip.unwrap_or(0);
        let filtered = executor
            .stream(jql, options, self.cancel.clone())
            .err_into::<Error>()
            .try_filter(move |issue| {
                let mut keep = residual.iter().all(|filter| filter.matches(issue));
                if keep && to_skip > 0 {
                    to_skip -= 1;
                    keep = false;
                }
                future::ready(keep)
            });

        match descriptor.limit {
            Some(limit) => filtered.take(limit as usize).boxed(),
            None => filtered.boxed(),
        }
    }
}
