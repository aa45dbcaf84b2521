//! jqlkit - a typed JIRA REST client with LINQ-style queries.
//!
//! Queries are built as expression trees, compiled to JQL and paged through
//! the search endpoint as a lazy stream. Reference data (custom fields,
//! statuses, projects, ...) is cached per [`Jira`] handle.
//!
//! ```no_run
//! use jqlkit::query::{Expr, Field};
//! use jqlkit::{ClientSettings, Jira};
//!
//! # async fn demo() -> jqlkit::Result<()> {
//! let jira = Jira::new("https://example.atlassian.net", None, ClientSettings::default())?;
//! let count = jira
//!     .issues()
//!     .filter(Expr::eq(Field::Project, "TST").and(Expr::eq("Team", "Core")))
//!     .count()
//!     .await?;
//! println!("{count} issues");
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod query;
pub mod search;

mod jira;
mod services;

pub use api::{ApiError, Auth};
pub use cache::{FieldScope, MetadataCache};
pub use config::{ClientSettings, Config, Profile};
pub use error::{Error, Result};
pub use jira::Jira;
pub use query::IssueQuery;
pub use search::{FieldSelection, SearchOptions};
