//! LINQ-style issue queries compiled to JQL.
//!
//! A query is a list of operators ([`QueryOp`]) over a predicate tree
//! ([`Expr`]). The [`JqlVisitor`] compiles it into JQL text plus paging
//! directives; the [`QueryProvider`] runs the result through the search
//! pager and applies anything that could not be sent to the server.

mod builder;
mod error;
mod expr;
mod field;
mod provider;
mod visitor;

pub use builder::IssueQuery;
pub use error::TranslationError;
pub use expr::{
    exact_match, CompareOp, Comparison, Direction, Expr, Literal, LocalFilter, Method, MethodCall,
    QueryOp,
};
pub use field::Field;
pub use provider::{
    CustomFieldScope, QueryProvider, QueryRequest, QueryStream, Scalar, ScalarValue,
};
pub use visitor::{render_literal, JqlVisitor, QueryDescriptor, Translation};
