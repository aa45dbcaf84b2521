//! Compilation of query operators into JQL.
//!
//! The visitor is a recursive descent over [`Expr`]. It resolves custom
//! field names against a catalog supplied by the caller and never touches
//! the network, so identical input always yields identical text.

use tracing::debug;

use super::error::{Result, TranslationError};
use super::expr::{CompareOp, Comparison, Direction, Expr, Literal, LocalFilter, Method, MethodCall, QueryOp};
use super::field::Field;
use crate::api::types::{custom_field_number, CustomField};
use crate::cache::same_name;

/// The server-side part of a compiled query.
///
/// Paging is carried here and never in the predicate text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryDescriptor {
    /// JQL predicate without `ORDER BY`. Empty when nothing is filtered.
    pub predicate: String,
    /// Rendered field names with their direction, primary first.
    pub orderings: Vec<(String, Direction)>,
    /// Maximum number of issues to return.
    pub limit: Option<u32>,
    /// Number of leading issues to skip.
    pub skip: Option<u32>,
}

impl QueryDescriptor {
    /// The full JQL text including `ORDER BY`.
    pub fn jql(&self) -> String {
        let mut jql = self.predicate.clone();
        if !self.orderings.is_empty() {
            if !jql.is_empty() {
                jql.push(' ');
            }
            let order = self
                .orderings
                .iter()
                .map(|(field, direction)| format!("{} {}", field, direction.as_jql()))
                .collect::<Vec<_>>()
                .join(", ");
            jql.push_str("ORDER BY ");
            jql.push_str(&order);
        }
        jql
    }
}

/// Result of compiling a query.
#[derive(Debug, Clone)]
pub struct Translation {
    pub descriptor: QueryDescriptor,
    /// Client-side predicates that must hold for every returned issue.
    pub residual: Vec<LocalFilter>,
}

impl Translation {
    /// Check whether some filtering happens client-side.
    pub fn has_residual(&self) -> bool {
        !self.residual.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Parent {
    And,
    Or,
    Not,
}

struct ResolvedField {
    name: String,
    text: bool,
    multi: bool,
}

/// Translates query operators into a [`Translation`].
#[derive(Debug, Clone, Copy)]
pub struct JqlVisitor<'a> {
    catalog: &'a [CustomField],
    server_max: u32,
}

impl<'a> JqlVisitor<'a> {
    /// Create a visitor resolving custom field names against `catalog`.
    ///
    /// `server_max` caps the result limit.
    pub fn new(catalog: &'a [CustomField], server_max: u32) -> Self {
        Self {
            catalog,
            server_max: server_max.max(1),
        }
    }

    /// Compile a sequence of query operators.
    pub fn translate(&self, ops: &[QueryOp]) -> Result<Translation> {
        let mut conjuncts: Vec<&Expr> = Vec::new();
        let mut orderings: Vec<(&Field, Direction)> = Vec::new();
        let mut limit: Option<u32> = None;
        let mut skip: Option<u32> = None;

        for op in ops {
            let paged = limit.is_some() || skip.is_some();
            match op {
                QueryOp::Where(expr) => {
                    if paged {
                        return Err(TranslationError::UnsupportedOperation(
                            "Where after Take or Skip".to_string(),
                        ));
                    }
                    flatten_and(expr, &mut conjuncts);
                }
                QueryOp::OrderBy(field, direction) => {
                    if paged {
                        return Err(TranslationError::UnsupportedOperation(
                            "OrderBy after Take or Skip".to_string(),
                        ));
                    }
                    orderings.clear();
                    orderings.push((field, *direction));
                }
                QueryOp::ThenBy(field, direction) => {
                    if paged {
                        return Err(TranslationError::UnsupportedOperation(
                            "ThenBy after Take or Skip".to_string(),
                        ));
                    }
                    if orderings.is_empty() {
                        return Err(TranslationError::InvalidArgument(
                            "ThenBy requires a preceding OrderBy".to_string(),
                        ));
                    }
                    orderings.push((field, *direction));
                }
                QueryOp::Take(n) => {
                    limit = Some(limit.map_or(*n, |l| l.min(*n)));
                }
                QueryOp::Skip(n) => {
                    skip = Some(skip.unwrap_or(0).saturating_add(*n));
                    limit = limit.map(|l| l.saturating_sub(*n));
                }
            }
        }

        let mut parts = Vec::new();
        let mut residual = Vec::new();
        for conjunct in &conjuncts {
            match conjunct {
                Expr::Local(filter) => residual.push(filter.clone()),
                expr => parts.push(*expr),
            }
        }

        let predicate = match parts.as_slice() {
            [single] => self.visit(single, None)?,
            parts => parts
                .iter()
                .map(|part| self.visit(part, Some(Parent::And)))
                .collect::<Result<Vec<_>>>()?
                .join(" AND "),
        };

        let orderings = orderings
            .into_iter()
            .map(|(field, direction)| Ok((self.resolve_field(field)?.name, direction)))
            .collect::<Result<Vec<_>>>()?;

        if let Some(requested) = limit.filter(|l| *l > self.server_max) {
            debug!(requested, max = self.server_max, "Result limit capped at server maximum");
        }

        let descriptor = QueryDescriptor {
            predicate,
            orderings,
            limit: limit.map(|l| l.min(self.server_max)),
            skip,
        };
        debug!(jql = %descriptor.jql(), limit = ?descriptor.limit, skip = ?descriptor.skip, residual = residual.len(), "Translated query");

        Ok(Translation {
            descriptor,
            residual,
        })
    }

    /// Compile a single predicate. Client-side predicates are rejected.
    pub fn translate_predicate(&self, expr: &Expr) -> Result<String> {
        self.visit(expr, None)
    }

    fn visit(&self, expr: &Expr, parent: Option<Parent>) -> Result<String> {
        match expr {
            Expr::Compare(comparison) => self.visit_comparison(comparison),
            Expr::Call(call) => self.visit_call(call),
            Expr::And(..) => self.visit_combinator(expr, Parent::And, parent),
            Expr::Or(..) => self.visit_combinator(expr, Parent::Or, parent),
            Expr::Not(inner) => Ok(format!("NOT {}", self.visit(inner, Some(Parent::Not))?)),
            Expr::Local(_) => Err(TranslationError::UnsupportedOperation(
                "client-side predicate inside OR or NOT".to_string(),
            )),
        }
    }

    fn visit_combinator(&self, expr: &Expr, kind: Parent, parent: Option<Parent>) -> Result<String> {
        let mut operands = Vec::new();
        flatten(expr, kind, &mut operands);

        let keyword = if kind == Parent::And { " AND " } else { " OR " };
        let text = operands
            .iter()
            .map(|operand| self.visit(operand, Some(kind)))
            .collect::<Result<Vec<_>>>()?
            .join(keyword);

        match parent {
            Some(parent) if parent != kind => Ok(format!("({})", text)),
            _ => Ok(text),
        }
    }

    fn visit_comparison(&self, comparison: &Comparison) -> Result<String> {
        let field = self.resolve_field(&comparison.field)?;
        check_literal(&comparison.value)?;

        if comparison.value == Literal::Empty {
            return match comparison.op {
                CompareOp::Eq => Ok(format!("{} is EMPTY", field.name)),
                CompareOp::Ne => Ok(format!("{} is not EMPTY", field.name)),
                op => Err(TranslationError::InvalidArgument(format!(
                    "EMPTY cannot be compared with '{}'",
                    op.as_jql()
                ))),
            };
        }

        let op = match comparison.op {
            CompareOp::Eq if field.text && !comparison.exact => CompareOp::Like,
            CompareOp::Ne if field.text && !comparison.exact => CompareOp::NotLike,
            op => op,
        };

        let value = match (op, &comparison.value) {
            (CompareOp::In | CompareOp::NotIn, Literal::List(items)) if items.is_empty() => {
                return Err(TranslationError::InvalidArgument(format!(
                    "'{}' needs at least one value for field '{}'",
                    op.as_jql(),
                    comparison.field
                )));
            }
            (CompareOp::In | CompareOp::NotIn, Literal::List(_)) => render_literal(&comparison.value),
            (CompareOp::In | CompareOp::NotIn, single) => format!("({})", render_literal(single)),
            (_, Literal::List(_)) => {
                return Err(TranslationError::InvalidArgument(format!(
                    "a list can only be compared with 'in' or 'not in', not '{}'",
                    op.as_jql()
                )));
            }
            (_, value) => render_literal(value),
        };

        Ok(format!("{} {} {}", field.name, op.as_jql(), value))
    }

    fn visit_call(&self, call: &MethodCall) -> Result<String> {
        if call.method != Method::Contains {
            return Err(TranslationError::UnsupportedOperation(format!(
                "{}.{}",
                call.field, call.method
            )));
        }

        let field = self.resolve_field(&call.field)?;
        let values: Vec<&Literal> = call
            .args
            .iter()
            .flat_map(|arg| match arg {
                Literal::List(items) => items.iter().collect::<Vec<_>>(),
                other => vec![other],
            })
            .collect();

        if values.is_empty() {
            return Err(TranslationError::InvalidArgument(format!(
                "Contains on field '{}' needs a value",
                call.field
            )));
        }
        for value in &values {
            check_literal(value)?;
        }

        if field.text && !field.multi {
            return match values.as_slice() {
                [Literal::Empty] => Err(TranslationError::InvalidArgument(format!(
                    "Contains on text field '{}' cannot search for EMPTY",
                    call.field
                ))),
                [value] => Ok(format!("{} ~ {}", field.name, render_literal(value))),
                _ => Err(TranslationError::InvalidArgument(format!(
                    "Contains on text field '{}' takes exactly one value",
                    call.field
                ))),
            };
        }

        let list = values
            .iter()
            .map(|value| render_literal(value))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("{} in ({})", field.name, list))
    }

    fn resolve_field(&self, field: &Field) -> Result<ResolvedField> {
        match field {
            Field::Custom(name) => {
                let mut matches: Vec<&CustomField> = Vec::new();
                for candidate in self.catalog.iter().filter(|f| same_name(&f.name, name)) {
                    if !matches.iter().any(|m| m.id == candidate.id) {
                        matches.push(candidate);
                    }
                }

                match matches.as_slice() {
                    [] => Err(TranslationError::UnknownField(name.clone())),
                    [custom] => Ok(ResolvedField {
                        name: match custom.numeric_id() {
                            Some(number) => format!("cf[{}]", number),
                            None => quote(&custom.name),
                        },
                        text: custom.is_text(),
                        multi: custom.is_multi_valued(),
                    }),
                    many => Err(TranslationError::AmbiguousField {
                        name: name.clone(),
                        ids: many.iter().map(|f| f.id.clone()).collect(),
                    }),
                }
            }
            Field::CustomId(id) => {
                let number = custom_field_number(id)
                    .or_else(|| {
                        (!id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())).then_some(id.as_str())
                    })
                    .ok_or_else(|| {
                        TranslationError::InvalidArgument(format!("'{}' is not a custom field id", id))
                    })?;
                let known = self.catalog.iter().find(|f| f.numeric_id() == Some(number));
                Ok(ResolvedField {
                    name: format!("cf[{}]", number),
                    text: known.is_some_and(CustomField::is_text),
                    multi: known.is_some_and(CustomField::is_multi_valued),
                })
            }
            built_in => Ok(ResolvedField {
                name: built_in.to_string(),
                text: built_in.is_text(),
                multi: built_in.is_multi_valued(),
            }),
        }
    }
}

fn flatten_and<'e>(expr: &'e Expr, out: &mut Vec<&'e Expr>) {
    flatten(expr, Parent::And, out)
}

fn flatten<'e>(expr: &'e Expr, kind: Parent, out: &mut Vec<&'e Expr>) {
    match (expr, kind) {
        (Expr::And(l, r), Parent::And) | (Expr::Or(l, r), Parent::Or) => {
            flatten(l, kind, out);
            flatten(r, kind, out);
        }
        (other, _) => out.push(other),
    }
}

/// Reject literals that have no JQL spelling.
fn check_literal(value: &Literal) -> Result<()> {
    match value {
        Literal::Float(n) if !n.is_finite() => Err(TranslationError::InvalidArgument(format!(
            "'{}' is not a valid JQL number",
            n
        ))),
        Literal::List(items) => items.iter().try_for_each(check_literal),
        _ => Ok(()),
    }
}

/// Render a literal as JQL.
pub fn render_literal(value: &Literal) -> String {
    match value {
        Literal::Text(text) => quote(text),
        Literal::Integer(n) => n.to_string(),
        Literal::Float(n) => n.to_string(),
        Literal::Date(date) => format!("\"{}\"", date.format("%Y/%m/%d")),
        Literal::DateTime(dt) => format!("\"{}\"", dt.format("%Y/%m/%d %H:%M")),
        Literal::Empty => "EMPTY".to_string(),
        Literal::Function(call) => call.clone(),
        Literal::List(items) => format!(
            "({})",
            items.iter().map(render_literal).collect::<Vec<_>>().join(", ")
        ),
    }
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::FieldSchema;
    use crate::query::expr::exact_match;
    use chrono::NaiveDate;

    fn text_field(id: &str, name: &str) -> CustomField {
        CustomField {
            id: id.to_string(),
            name: name.to_string(),
            custom: true,
            schema: Some(FieldSchema {
                field_type: "string".to_string(),
                items: None,
                custom: Some(
                    "com.atlassian.jira.plugin.system.customfieldtypes:textfield".to_string(),
                ),
                custom_id: None,
            }),
        }
    }

    fn number_field(id: &str, name: &str) -> CustomField {
        CustomField {
            id: id.to_string(),
            name: name.to_string(),
            custom: true,
            schema: Some(FieldSchema {
                field_type: "number".to_string(),
                items: None,
                custom: Some("com.atlassian.jira.plugin.system.customfieldtypes:float".to_string()),
                custom_id: None,
            }),
        }
    }

    fn catalog() -> Vec<CustomField> {
        vec![
            text_field("customfield_10000", "Custom Text Field"),
            number_field("customfield_10001", "Custom Number Field"),
            CustomField {
                id: "customfield_10002".to_string(),
                name: "Custom Labels".to_string(),
                custom: true,
                schema: Some(FieldSchema {
                    field_type: "array".to_string(),
                    items: Some("string".to_string()),
                    custom: Some("com.atlassian.jira.plugin.system.customfieldtypes:labels".to_string()),
                    custom_id: None,
                }),
            },
        ]
    }

    fn jql(ops: Vec<QueryOp>) -> String {
        let catalog = catalog();
        JqlVisitor::new(&catalog, 100)
            .translate(&ops)
            .unwrap()
            .descriptor
            .jql()
    }

    fn predicate(expr: Expr) -> String {
        jql(vec![QueryOp::Where(expr)])
    }

    fn translate_err(ops: Vec<QueryOp>) -> TranslationError {
        let catalog = catalog();
        JqlVisitor::new(&catalog, 100).translate(&ops).unwrap_err()
    }

    #[test]
    fn test_built_in_fields_pass_through_verbatim() {
        assert_eq!(
            predicate(Expr::eq("status", "Open").and(Expr::eq("priority", "Major"))),
            r#"status = "Open" AND priority = "Major""#
        );
    }

    #[test]
    fn test_translation_is_deterministic() {
        let ops = vec![
            QueryOp::Where(
                Expr::eq(Field::Status, "Open")
                    .or(Expr::gt(Field::Votes, 5))
                    .and(Expr::contains("Custom Labels", "a")),
            ),
            QueryOp::OrderBy(Field::Created, Direction::Desc),
            QueryOp::Take(10),
        ];
        let catalog = catalog();
        let visitor = JqlVisitor::new(&catalog, 100);
        let first = visitor.translate(&ops).unwrap().descriptor;
        let second = visitor.translate(&ops).unwrap().descriptor;
        assert_eq!(first, second);
        assert_eq!(first.jql(), second.jql());
    }

    #[test]
    fn test_comparison_operators() {
        assert_eq!(predicate(Expr::ne("status", "Done")), r#"status != "Done""#);
        assert_eq!(predicate(Expr::gt("votes", 2)), "votes > 2");
        assert_eq!(predicate(Expr::ge("votes", 2)), "votes >= 2");
        assert_eq!(predicate(Expr::lt("votes", 2)), "votes < 2");
        assert_eq!(predicate(Expr::le("votes", 2)), "votes <= 2");
        assert_eq!(
            predicate(Expr::is_in("priority", ["Major", "Minor"])),
            r#"priority in ("Major", "Minor")"#
        );
        assert_eq!(
            predicate(Expr::not_in("status", vec!["Done"])),
            r#"status not in ("Done")"#
        );
    }

    #[test]
    fn test_text_fields_default_to_contains() {
        assert_eq!(predicate(Expr::eq("summary", "crash")), r#"summary ~ "crash""#);
        assert_eq!(predicate(Expr::ne("summary", "crash")), r#"summary !~ "crash""#);
        assert_eq!(
            predicate(exact_match("summary", "crash")),
            r#"summary = "crash""#
        );
    }

    #[test]
    fn test_exact_match_on_custom_text_field() {
        assert_eq!(
            predicate(Expr::eq("Custom Text Field", "Test Project")),
            r#"cf[10000] ~ "Test Project""#
        );
        assert_eq!(
            predicate(exact_match("Custom Text Field", "Test Project")),
            r#"cf[10000] = "Test Project""#
        );
    }

    #[test]
    fn test_custom_field_names_are_case_insensitive() {
        assert_eq!(
            predicate(Expr::gt("custom number field", 1.5)),
            "cf[10001] > 1.5"
        );
        assert_eq!(predicate(Expr::eq("cf[10001]", 3)), "cf[10001] = 3");
        assert_eq!(
            predicate(Expr::eq(Field::CustomId("customfield_10000".to_string()), "x")),
            r#"cf[10000] ~ "x""#
        );
    }

    #[test]
    fn test_ambiguous_custom_field_fails() {
        let catalog = vec![
            text_field("customfield_1", "Team"),
            text_field("customfield_2", "Team"),
        ];
        let err = JqlVisitor::new(&catalog, 100)
            .translate_predicate(&Expr::eq("Team", "Core"))
            .unwrap_err();
        assert_eq!(
            err,
            TranslationError::AmbiguousField {
                name: "Team".to_string(),
                ids: vec!["customfield_1".to_string(), "customfield_2".to_string()],
            }
        );
    }

    #[test]
    fn test_duplicate_catalog_entries_are_not_ambiguous() {
        let catalog = vec![
            text_field("customfield_1", "Team"),
            text_field("customfield_1", "Team"),
        ];
        assert_eq!(
            JqlVisitor::new(&catalog, 100)
                .translate_predicate(&exact_match("Team", "Core"))
                .unwrap(),
            r#"cf[1] = "Core""#
        );
    }

    #[test]
    fn test_unknown_custom_field_fails() {
        assert_eq!(
            translate_err(vec![QueryOp::Where(Expr::eq("Nope", "x"))]),
            TranslationError::UnknownField("Nope".to_string())
        );
        assert!(matches!(
            translate_err(vec![QueryOp::Where(Expr::eq(
                Field::CustomId("abc".to_string()),
                "x"
            ))]),
            TranslationError::InvalidArgument(_)
        ));
    }

    #[test]
    fn test_precedence_is_preserved() {
        let expr = Expr::eq("status", "Open")
            .or(Expr::eq("status", "Reopened"))
            .and(Expr::eq("priority", "Major"));
        assert_eq!(
            predicate(expr),
            r#"(status = "Open" OR status = "Reopened") AND priority = "Major""#
        );

        let expr = Expr::eq("status", "Open")
            .and(Expr::eq("priority", "Major"))
            .or(Expr::eq("votes", 1).and(Expr::eq("votes", 2)));
        assert_eq!(
            predicate(expr),
            r#"(status = "Open" AND priority = "Major") OR (votes = 1 AND votes = 2)"#
        );
    }

    #[test]
    fn test_same_operator_chains_are_flat() {
        let expr = Expr::eq("votes", 1)
            .or(Expr::eq("votes", 2))
            .or(Expr::eq("votes", 3));
        assert_eq!(predicate(expr), "votes = 1 OR votes = 2 OR votes = 3");
    }

    #[test]
    fn test_not() {
        assert_eq!(
            predicate(Expr::eq("status", "Done").negate()),
            r#"NOT status = "Done""#
        );
        assert_eq!(
            predicate(Expr::eq("status", "Done").or(Expr::eq("votes", 0)).negate()),
            r#"NOT (status = "Done" OR votes = 0)"#
        );
    }

    #[test]
    fn test_multiple_where_clauses_are_anded() {
        assert_eq!(
            jql(vec![
                QueryOp::Where(Expr::eq("status", "Open").or(Expr::eq("votes", 1))),
                QueryOp::Where(Expr::eq("priority", "Major")),
            ]),
            r#"(status = "Open" OR votes = 1) AND priority = "Major""#
        );
    }

    #[test]
    fn test_contains_translations() {
        assert_eq!(
            predicate(Expr::contains("labels", "backend")),
            r#"labels in ("backend")"#
        );
        assert_eq!(
            predicate(Expr::contains_any("Custom Labels", ["a", "b"])),
            r#"cf[10002] in ("a", "b")"#
        );
        assert_eq!(
            predicate(Expr::contains_any("status", vec!["Open", "Done"])),
            r#"status in ("Open", "Done")"#
        );
        assert_eq!(
            predicate(Expr::contains("summary", "crash")),
            r#"summary ~ "crash""#
        );
        assert!(matches!(
            translate_err(vec![QueryOp::Where(Expr::contains_any("summary", ["a", "b"]))]),
            TranslationError::InvalidArgument(_)
        ));
    }

    #[test]
    fn test_untranslatable_methods_fail() {
        assert_eq!(
            translate_err(vec![QueryOp::Where(Expr::starts_with("summary", "x"))]),
            TranslationError::UnsupportedOperation("summary.StartsWith".to_string())
        );
        assert!(matches!(
            translate_err(vec![QueryOp::Where(Expr::call(
                Method::Named("ToUpper".to_string()),
                "summary",
                vec![]
            ))]),
            TranslationError::UnsupportedOperation(_)
        ));
    }

    #[test]
    fn test_empty_literal() {
        assert_eq!(predicate(Expr::is_empty("assignee")), "assignee is EMPTY");
        assert_eq!(
            predicate(Expr::is_not_empty("Custom Text Field")),
            "cf[10000] is not EMPTY"
        );
        assert!(matches!(
            translate_err(vec![QueryOp::Where(Expr::gt("due", Literal::Empty))]),
            TranslationError::InvalidArgument(_)
        ));
    }

    #[test]
    fn test_literal_rendering() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(predicate(Expr::lt("due", date)), r#"due < "2024/01/31""#);
        let datetime = date.and_hms_opt(14, 5, 0).unwrap();
        assert_eq!(
            predicate(Expr::ge("updated", datetime)),
            r#"updated >= "2024/01/31 14:05""#
        );
        assert_eq!(
            predicate(Expr::eq("assignee", Literal::function("currentUser()"))),
            "assignee = currentUser()"
        );
        assert_eq!(
            predicate(exact_match("summary", r#"say "hi" \o/"#)),
            r#"summary = "say \"hi\" \\o/""#
        );
    }

    #[test]
    fn test_list_with_scalar_operator_fails() {
        assert!(matches!(
            translate_err(vec![QueryOp::Where(Expr::eq("status", vec!["a", "b"]))]),
            TranslationError::InvalidArgument(_)
        ));
        assert!(matches!(
            translate_err(vec![QueryOp::Where(Expr::is_in("status", Vec::<&str>::new()))]),
            TranslationError::InvalidArgument(_)
        ));
    }

    #[test]
    fn test_ordering() {
        assert_eq!(
            jql(vec![
                QueryOp::Where(Expr::eq("project", "TST")),
                QueryOp::OrderBy(Field::Priority, Direction::Desc),
                QueryOp::ThenBy(Field::Custom("Custom Number Field".to_string()), Direction::Asc),
            ]),
            r#"project = "TST" ORDER BY priority DESC, cf[10001] ASC"#
        );
        assert_eq!(
            jql(vec![
                QueryOp::OrderBy(Field::Key, Direction::Asc),
                QueryOp::OrderBy(Field::Created, Direction::Desc),
            ]),
            "ORDER BY created DESC"
        );
        assert!(matches!(
            translate_err(vec![QueryOp::ThenBy(Field::Key, Direction::Asc)]),
            TranslationError::InvalidArgument(_)
        ));
    }

    #[test]
    fn test_paging_never_enters_predicate() {
        let catalog = catalog();
        let translation = JqlVisitor::new(&catalog, 100)
            .translate(&[
                QueryOp::Where(Expr::eq("status", "Open")),
                QueryOp::Skip(5),
                QueryOp::Take(10),
            ])
            .unwrap();
        assert_eq!(translation.descriptor.jql(), r#"status = "Open""#);
        assert_eq!(translation.descriptor.skip, Some(5));
        assert_eq!(translation.descriptor.limit, Some(10));
    }

    #[test]
    fn test_take_and_skip_compose() {
        let catalog = catalog();
        let visitor = JqlVisitor::new(&catalog, 100);

        let d = visitor
            .translate(&[QueryOp::Take(10), QueryOp::Skip(3)])
            .unwrap()
            .descriptor;
        assert_eq!((d.skip, d.limit), (Some(3), Some(7)));

        let d = visitor
            .translate(&[QueryOp::Take(10), QueryOp::Take(4), QueryOp::Take(6)])
            .unwrap()
            .descriptor;
        assert_eq!(d.limit, Some(4));

        let d = visitor
            .translate(&[QueryOp::Skip(2), QueryOp::Skip(3)])
            .unwrap()
            .descriptor;
        assert_eq!((d.skip, d.limit), (Some(5), None));
    }

    #[test]
    fn test_take_is_capped_at_server_max() {
        let translation = JqlVisitor::new(&[], 50).translate(&[QueryOp::Take(500)]).unwrap();
        assert_eq!(translation.descriptor.limit, Some(50));
    }

    #[test]
    fn test_where_after_take_fails() {
        assert!(matches!(
            translate_err(vec![QueryOp::Take(1), QueryOp::Where(Expr::eq("status", "Open"))]),
            TranslationError::UnsupportedOperation(_)
        ));
        assert!(matches!(
            translate_err(vec![QueryOp::Skip(1), QueryOp::OrderBy(Field::Key, Direction::Asc)]),
            TranslationError::UnsupportedOperation(_)
        ));
    }

    #[test]
    fn test_local_predicates_become_residual() {
        let catalog = catalog();
        let translation = JqlVisitor::new(&catalog, 100)
            .translate(&[QueryOp::Where(
                Expr::eq("status", "Open").and(Expr::local(|issue| issue.key.ends_with('1'))),
            )])
            .unwrap();
        assert_eq!(translation.descriptor.predicate, r#"status = "Open""#);
        assert_eq!(translation.residual.len(), 1);
        assert!(translation.has_residual());
    }

    #[test]
    fn test_local_predicate_under_or_fails() {
        assert!(matches!(
            translate_err(vec![QueryOp::Where(
                Expr::eq("status", "Open").or(Expr::local(|_| true))
            )]),
            TranslationError::UnsupportedOperation(_)
        ));
        assert!(matches!(
            translate_err(vec![QueryOp::Where(Expr::local(|_| true).negate())]),
            TranslationError::UnsupportedOperation(_)
        ));
    }

    #[test]
    fn test_non_finite_numbers_fail() {
        let err = translate_err(vec![QueryOp::Where(
            Expr::gt(Field::Votes, f64::NAN).or(Expr::lt(Field::Votes, f64::INFINITY)),
        )]);
        assert!(matches!(err, TranslationError::InvalidArgument(_)));
        assert!(matches!(
            translate_err(vec![QueryOp::Where(Expr::is_in(
                "Custom Number Field",
                [1.5, f64::NEG_INFINITY]
            ))]),
            TranslationError::InvalidArgument(_)
        ));
        assert!(matches!(
            translate_err(vec![QueryOp::Where(Expr::contains_any(
                "Custom Labels",
                [Literal::Float(f64::NAN)]
            ))]),
            TranslationError::InvalidArgument(_)
        ));
        assert_eq!(predicate(Expr::gt(Field::Votes, 2.5)), "votes > 2.5");
    }

    #[test]
    fn test_contains_empty_on_text_field_fails() {
        assert!(matches!(
            translate_err(vec![QueryOp::Where(Expr::contains("summary", Literal::Empty))]),
            TranslationError::InvalidArgument(_)
        ));
    }

    #[test]
    fn test_custom_field_names_match_non_ascii_case_insensitively() {
        let catalog = vec![text_field("customfield_10100", "Équipe")];
        let translation = JqlVisitor::new(&catalog, 100)
            .translate(&[QueryOp::Where(Expr::eq("ÉQUIPE", "Core"))])
            .unwrap();
        assert_eq!(translation.descriptor.predicate, r#"cf[10100] ~ "Core""#);
    }

    #[test]
    fn test_empty_query() {
        let translation = JqlVisitor::new(&[], 100).translate(&[]).unwrap();
        assert_eq!(translation.descriptor, QueryDescriptor::default());
        assert_eq!(translation.descriptor.jql(), "");
    }
}
