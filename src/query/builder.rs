//! Fluent issue queries.

use futures::TryStreamExt;
use tokio_util::sync::CancellationToken;

use super::expr::{Direction, Expr, QueryOp};
use super::field::Field;
use super::provider::{
    CustomFieldScope, QueryProvider, QueryRequest, QueryStream, Scalar, ScalarValue,
};
use super::visitor::Translation;
use crate::api::types::Issue;
use crate::cache::FieldScope;
use crate::error::{Error, Result};
use crate::jira::Jira;
use crate::search::FieldSelection;

/// A query over the issues of one JIRA server.
///
/// Operators are recorded in call order and compiled to JQL when a
/// terminal method runs:
///
/// ```no_run
/// # async fn demo(jira: jqlkit::Jira) -> jqlkit::Result<()> {
/// use jqlkit::query::{Expr, Field};
///
/// let open = jira
///     .issues()
///     .filter(Expr::eq(Field::Status, "Open").and(Expr::eq(Field::Priority, "Major")))
///     .order_by_descending(Field::Created)
///     .take(10)
///     .to_vec()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct IssueQuery {
    provider: QueryProvider,
    request: QueryRequest,
}

impl IssueQuery {
    pub(crate) fn new(jira: Jira) -> Self {
        Self {
            provider: QueryProvider::new(jira),
            request: QueryRequest::default(),
        }
    }

    fn push(mut self, op: QueryOp) -> Self {
        self.request.ops.push(op);
        self
    }

    /// Keep issues matching the predicate. Several filters are ANDed.
    pub fn filter(self, predicate: Expr) -> Self {
        self.push(QueryOp::Where(predicate))
    }

    /// Sort ascending, replacing any previous ordering.
    pub fn order_by(self, field: impl Into<Field>) -> Self {
        self.push(QueryOp::OrderBy(field.into(), Direction::Asc))
    }

    /// Sort descending, replacing any previous ordering.
    pub fn order_by_descending(self, field: impl Into<Field>) -> Self {
        self.push(QueryOp::OrderBy(field.into(), Direction::Desc))
    }

    /// Add an ascending secondary ordering.
    pub fn then_by(self, field: impl Into<Field>) -> Self {
        self.push(QueryOp::ThenBy(field.into(), Direction::Asc))
    }

    /// Add a descending secondary ordering.
    pub fn then_by_descending(self, field: impl Into<Field>) -> Self {
        self.push(QueryOp::ThenBy(field.into(), Direction::Desc))
    }

    /// Return at most `n` issues.
    pub fn take(self, n: u32) -> Self {
        self.push(QueryOp::Take(n))
    }

    /// Skip the first `n` issues.
    pub fn skip(self, n: u32) -> Self {
        self.push(QueryOp::Skip(n))
    }

    /// Select the returned issue fields.
    pub fn fields(mut self, fields: FieldSelection) -> Self {
        self.request.fields = fields;
        self
    }

    /// Resolve custom field names among the fields of one project only.
    pub fn search_by_project(self, project_key: impl Into<String>) -> Self {
        self.search_in(FieldScope::project(project_key))
    }

    /// Resolve custom field names within a project and issue type scope.
    pub fn search_in(mut self, scope: FieldScope) -> Self {
        self.request.scope = CustomFieldScope::Project(scope);
        self
    }

    /// Cancel the query's remote calls through `cancel`.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.provider = self.provider.with_cancellation(cancel);
        self
    }

    /// The recorded operators.
    pub fn ops(&self) -> &[QueryOp] {
        &self.request.ops
    }

    /// Compile the query without running it.
    pub async fn translate(&self) -> Result<Translation> {
        self.provider.translate(&self.request).await
    }

    /// The JQL text the query compiles to.
    pub async fn jql(&self) -> Result<String> {
        Ok(self.translate().await?.descriptor.jql())
    }

    /// Run the query as a lazy stream.
    pub async fn stream(&self) -> Result<QueryStream> {
        self.provider.execute(&self.request).await
    }

    /// Run the query and collect every issue.
    pub async fn to_vec(&self) -> Result<Vec<Issue>> {
        self.stream().await?.try_collect().await
    }

    /// The first issue.
    pub async fn first(&self) -> Result<Issue> {
        self.scalar(Scalar::First)
            .await?
            .into_issue()
            .ok_or(Error::Empty)
    }

    /// The first issue, if any.
    pub async fn first_or_none(&self) -> Result<Option<Issue>> {
        Ok(self.scalar(Scalar::FirstOrNone).await?.into_issue())
    }

    /// The only issue.
    pub async fn single(&self) -> Result<Issue> {
        self.scalar(Scalar::Single)
            .await?
            .into_issue()
            .ok_or(Error::Empty)
    }

    /// Number of matching issues.
    pub async fn count(&self) -> Result<u64> {
        Ok(self.scalar(Scalar::Count).await?.as_count().unwrap_or_default())
    }

    /// Whether any issue matches.
    pub async fn any(&self) -> Result<bool> {
        Ok(self.scalar(Scalar::Any).await?.as_bool().unwrap_or_default())
    }

    async fn scalar(&self, scalar: Scalar) -> Result<ScalarValue> {
        self.provider.execute_scalar(&self.request, scalar).await
    }
}
