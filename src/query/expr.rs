//! Query expression trees.
//!
//! Predicates are built explicitly:
//!
//! ```
//! use jqlkit::query::{exact_match, Expr, Field};
//!
//! let predicate = Expr::eq(Field::Status, "Open")
//!     .and(Expr::eq(Field::Priority, "Major"))
//!     .or(exact_match("Custom Text Field", "Test Project"));
//! ```

use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use super::field::Field;
use crate::api::types::Issue;

/// A value on the right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Text(String),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    /// `EMPTY`; compared with `is` / `is not`.
    Empty,
    /// A JQL function call rendered verbatim, e.g. `currentUser()`.
    Function(String),
    List(Vec<Literal>),
}

impl Literal {
    /// A JQL function call such as `currentUser()` or `startOfDay(-1)`.
    pub fn function(call: impl Into<String>) -> Self {
        Literal::Function(call.into())
    }

    /// A list literal.
    pub fn list<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Literal>,
    {
        Literal::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Text(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Text(value)
    }
}

impl From<&String> for Literal {
    fn from(value: &String) -> Self {
        Literal::Text(value.clone())
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Integer(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Integer(i64::from(value))
    }
}

impl From<u32> for Literal {
    fn from(value: u32) -> Self {
        Literal::Integer(i64::from(value))
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Float(value)
    }
}

impl From<NaiveDate> for Literal {
    fn from(value: NaiveDate) -> Self {
        Literal::Date(value)
    }
}

impl From<NaiveDateTime> for Literal {
    fn from(value: NaiveDateTime) -> Self {
        Literal::DateTime(value)
    }
}

impl<T: Into<Literal>> From<Vec<T>> for Literal {
    fn from(values: Vec<T>) -> Self {
        Literal::list(values)
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    In,
    NotIn,
    /// `~`
    Like,
    /// `!~`
    NotLike,
}

impl CompareOp {
    /// The JQL token.
    pub fn as_jql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::In => "in",
            CompareOp::NotIn => "not in",
            CompareOp::Like => "~",
            CompareOp::NotLike => "!~",
        }
    }
}

/// `field OP value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub field: Field,
    pub op: CompareOp,
    pub value: Literal,
    /// Keep `=`/`!=` even on fields that default to `~`/`!~`.
    pub exact: bool,
}

/// Method calls on a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Contains,
    StartsWith,
    EndsWith,
    /// Any other method by name. Never translatable.
    Named(String),
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Contains => write!(f, "Contains"),
            Method::StartsWith => write!(f, "StartsWith"),
            Method::EndsWith => write!(f, "EndsWith"),
            Method::Named(name) => write!(f, "{}", name),
        }
    }
}

/// `field.method(args)`.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method: Method,
    pub field: Field,
    pub args: Vec<Literal>,
}

/// A client-side predicate evaluated on returned issues.
#[derive(Clone)]
pub struct LocalFilter(Arc<dyn Fn(&Issue) -> bool + Send + Sync>);

impl LocalFilter {
    pub fn new(f: impl Fn(&Issue) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Evaluate the predicate.
    pub fn matches(&self, issue: &Issue) -> bool {
        (self.0)(issue)
    }
}

impl fmt::Debug for LocalFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LocalFilter(..)")
    }
}

impl PartialEq for LocalFilter {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Compare(Comparison),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Call(MethodCall),
    /// Evaluated client-side. Only allowed as a top-level AND conjunct.
    Local(LocalFilter),
}

impl Expr {
    /// A comparison node.
    pub fn compare(field: impl Into<Field>, op: CompareOp, value: impl Into<Literal>) -> Self {
        Expr::Compare(Comparison {
            field: field.into(),
            op,
            value: value.into(),
            exact: false,
        })
    }

    /// `field = value`, or `field ~ value` on text fields.
    pub fn eq(field: impl Into<Field>, value: impl Into<Literal>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    /// `field != value`, or `field !~ value` on text fields.
    pub fn ne(field: impl Into<Field>, value: impl Into<Literal>) -> Self {
        Self::compare(field, CompareOp::Ne, value)
    }

    pub fn gt(field: impl Into<Field>, value: impl Into<Literal>) -> Self {
        Self::compare(field, CompareOp::Gt, value)
    }

    pub fn ge(field: impl Into<Field>, value: impl Into<Literal>) -> Self {
        Self::compare(field, CompareOp::Ge, value)
    }

    pub fn lt(field: impl Into<Field>, value: impl Into<Literal>) -> Self {
        Self::compare(field, CompareOp::Lt, value)
    }

    pub fn le(field: impl Into<Field>, value: impl Into<Literal>) -> Self {
        Self::compare(field, CompareOp::Le, value)
    }

    /// `field ~ value`.
    pub fn like(field: impl Into<Field>, value: impl Into<Literal>) -> Self {
        Self::compare(field, CompareOp::Like, value)
    }

    /// `field !~ value`.
    pub fn not_like(field: impl Into<Field>, value: impl Into<Literal>) -> Self {
        Self::compare(field, CompareOp::NotLike, value)
    }

    /// `field in (values)`.
    pub fn is_in<I, T>(field: impl Into<Field>, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Literal>,
    {
        Self::compare(field, CompareOp::In, Literal::list(values))
    }

    /// `field not in (values)`.
    pub fn not_in<I, T>(field: impl Into<Field>, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Literal>,
    {
        Self::compare(field, CompareOp::NotIn, Literal::list(values))
    }

    /// `field is EMPTY`.
    pub fn is_empty(field: impl Into<Field>) -> Self {
        Self::compare(field, CompareOp::Eq, Literal::Empty)
    }

    /// `field is not EMPTY`.
    pub fn is_not_empty(field: impl Into<Field>) -> Self {
        Self::compare(field, CompareOp::Ne, Literal::Empty)
    }

    /// `field.contains(value)`.
    pub fn contains(field: impl Into<Field>, value: impl Into<Literal>) -> Self {
        Self::call(Method::Contains, field, vec![value.into()])
    }

    /// `field.contains(any of values)`, rendered as `in`.
    pub fn contains_any<I, T>(field: impl Into<Field>, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Literal>,
    {
        Self::call(
            Method::Contains,
            field,
            values.into_iter().map(Into::into).collect(),
        )
    }

    pub fn starts_with(field: impl Into<Field>, value: impl Into<Literal>) -> Self {
        Self::call(Method::StartsWith, field, vec![value.into()])
    }

    pub fn ends_with(field: impl Into<Field>, value: impl Into<Literal>) -> Self {
        Self::call(Method::EndsWith, field, vec![value.into()])
    }

    /// A method call node.
    pub fn call(method: Method, field: impl Into<Field>, args: Vec<Literal>) -> Self {
        Expr::Call(MethodCall {
            method,
            field: field.into(),
            args,
        })
    }

    /// A client-side predicate.
    pub fn local(f: impl Fn(&Issue) -> bool + Send + Sync + 'static) -> Self {
        Expr::Local(LocalFilter::new(f))
    }

    /// `self AND other`.
    pub fn and(self, other: Expr) -> Self {
        Expr::And(Box::new(self), Box::new(other))
    }

    /// `self OR other`.
    pub fn or(self, other: Expr) -> Self {
        Expr::Or(Box::new(self), Box::new(other))
    }

    /// `NOT self`.
    pub fn negate(self) -> Self {
        Expr::Not(Box::new(self))
    }

    /// Visit every field referenced by the tree.
    pub fn fields(&self) -> Vec<&Field> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a Field>) {
        match self {
            Expr::Compare(c) => out.push(&c.field),
            Expr::Call(call) => out.push(&call.field),
            Expr::And(l, r) | Expr::Or(l, r) => {
                l.collect_fields(out);
                r.collect_fields(out);
            }
            Expr::Not(inner) => inner.collect_fields(out),
            Expr::Local(_) => {}
        }
    }
}

/// Equality that never falls back to `~`, even on text fields.
pub fn exact_match(field: impl Into<Field>, value: impl Into<Literal>) -> Expr {
    Expr::Compare(Comparison {
        field: field.into(),
        op: CompareOp::Eq,
        value: value.into(),
        exact: true,
    })
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_jql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// One query operator, in the order the caller applied them.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOp {
    Where(Expr),
    /// Replaces any previous ordering.
    OrderBy(Field, Direction),
    /// Appends a secondary ordering.
    ThenBy(Field, Direction),
    Take(u32),
    Skip(u32),
}
