//! Primary matching path: JsonPath evaluation backed by `jsonpath_lib`.
//!
//! A path selecting zero nodes is a determinate no-match, not an error;
//! a body that is not valid JSON yields a `MalformedBody` outcome.

use super::{MatchResult, PathExpr, PathPredicate};
use serde_json::Value;

pub(super) fn evaluate(
    description: &str,
    path: &PathExpr,
    predicate: &PathPredicate,
    body: &[u8],
) -> MatchResult {
    let document: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(err) => return MatchResult::malformed(description, err.to_string()),
    };

    let nodes = match path.select(&document) {
        Ok(nodes) => nodes,
        Err(reason) => return MatchResult::fail(description, "evaluable JsonPath", reason),
    };

    match nodes.first() {
        None => match predicate {
            PathPredicate::Absent => MatchResult::pass(description),
            PathPredicate::Exists => {
                MatchResult::fail(description, "at least one matching node", "no nodes")
            }
            _ => MatchResult::fail(description, "a node to test", "no nodes matched the path"),
        },
        Some(value) => match predicate {
            PathPredicate::Absent => {
                MatchResult::fail(description, "no matching nodes", render(value))
            }
            PathPredicate::Exists => MatchResult::pass(description),
            PathPredicate::IsNull => verdict(description, value.is_null(), "null", value),
            PathPredicate::IsTrue => {
                verdict(description, value.as_bool() == Some(true), "true", value)
            }
            PathPredicate::IsFalse => {
                verdict(description, value.as_bool() == Some(false), "false", value)
            }
            PathPredicate::StringEquals(expected) => verdict(
                description,
                value.as_str() == Some(expected.as_str()),
                &format!("{expected:?}"),
                value,
            ),
            PathPredicate::Matches(regex) => verdict(
                description,
                value.as_str().map(|s| regex.is_match(s)).unwrap_or(false),
                &format!("string matching {regex}"),
                value,
            ),
            // Integer expectations compare exactly when the value is an
            // integer (f64 would lose precision past 2^53); decimal
            // representations of the same value still compare equal.
            PathPredicate::NumberEquals(expected) => verdict(
                description,
                match value.as_i64() {
                    Some(actual) => actual == *expected,
                    None => value.as_f64() == Some(*expected as f64),
                },
                &expected.to_string(),
                value,
            ),
            PathPredicate::DecimalEquals(expected) => verdict(
                description,
                value.as_f64() == Some(*expected),
                &expected.to_string(),
                value,
            ),
            PathPredicate::GreaterThan(expected) => verdict(
                description,
                value.as_f64().map(|v| v > *expected).unwrap_or(false),
                &format!("> {expected}"),
                value,
            ),
            PathPredicate::LessThan(expected) => verdict(
                description,
                value.as_f64().map(|v| v < *expected).unwrap_or(false),
                &format!("< {expected}"),
                value,
            ),
        },
    }
}

fn verdict(description: &str, passed: bool, expected: &str, actual: &Value) -> MatchResult {
    if passed {
        MatchResult::pass(description)
    } else {
        MatchResult::fail(description, expected, render(actual))
    }
}

fn render(value: &Value) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::super::{MatchExpression, MatchOutcome};
    use super::*;

    fn eval(expression: &MatchExpression, body: &str) -> MatchResult {
        match expression.kind() {
            super::super::MatchKind::JsonPath(path, predicate) => {
                evaluate(expression.description(), path, predicate, body.as_bytes())
            }
            _ => panic!("expected a JsonPath expression"),
        }
    }

    #[test]
    fn integer_matches_decimal_expectation() {
        let expr = MatchExpression::json_path("$.count").unwrap().decimal_equals(3.0);
        assert!(eval(&expr, r#"{"count": 3}"#).passed());
    }

    #[test]
    fn decimal_matches_integer_expectation() {
        let expr = MatchExpression::json_path("$.count").unwrap().number_equals(3);
        assert!(eval(&expr, r#"{"count": 3.0}"#).passed());
        assert!(!eval(&expr, r#"{"count": 3.5}"#).passed());
    }

    #[test]
    fn large_integers_compare_exactly() {
        // Adjacent values past 2^53 collapse under f64.
        let expr =
            MatchExpression::json_path("$.id").unwrap().number_equals(9_007_199_254_740_993);
        assert!(eval(&expr, r#"{"id": 9007199254740993}"#).passed());
        assert!(!eval(&expr, r#"{"id": 9007199254740992}"#).passed());
    }

    #[test]
    fn missing_path_is_a_determinate_no_match() {
        let expr = MatchExpression::json_path("$.missing").unwrap().exists();
        let result = eval(&expr, r#"{"a": 1}"#);
        assert!(matches!(result.outcome(), MatchOutcome::Fail { actual, .. } if actual == "no nodes"));
    }

    #[test]
    fn absent_passes_on_missing_path() {
        let expr = MatchExpression::json_path("$.missing").unwrap().absent();
        assert!(eval(&expr, r#"{"a": 1}"#).passed());

        let expr = MatchExpression::json_path("$.a").unwrap().absent();
        assert!(!eval(&expr, r#"{"a": 1}"#).passed());
    }

    #[test]
    fn string_and_regex_predicates() {
        let expr = MatchExpression::json_path("$.name").unwrap().string_equals("widget");
        assert!(eval(&expr, r#"{"name": "widget"}"#).passed());
        assert!(!eval(&expr, r#"{"name": "gadget"}"#).passed());
        // Type mismatch is a failure, not an error.
        assert!(!eval(&expr, r#"{"name": 42}"#).passed());

        let expr = MatchExpression::json_path("$.name").unwrap().matches("wid.*").unwrap();
        assert!(eval(&expr, r#"{"name": "widget"}"#).passed());
        // Whole-string semantics.
        let expr = MatchExpression::json_path("$.name").unwrap().matches("wid").unwrap();
        assert!(!eval(&expr, r#"{"name": "widget"}"#).passed());
    }

    #[test]
    fn null_and_boolean_predicates() {
        let null_expr = MatchExpression::json_path("$.value").unwrap().is_null();
        assert!(eval(&null_expr, r#"{"value": null}"#).passed());
        assert!(!eval(&null_expr, r#"{"value": 1}"#).passed());

        let true_expr = MatchExpression::json_path("$.flag").unwrap().is_true();
        assert!(eval(&true_expr, r#"{"flag": true}"#).passed());
        assert!(!eval(&true_expr, r#"{"flag": false}"#).passed());

        let false_expr = MatchExpression::json_path("$.flag").unwrap().is_false();
        assert!(eval(&false_expr, r#"{"flag": false}"#).passed());
    }

    #[test]
    fn numeric_ordering_predicates() {
        let gt = MatchExpression::json_path("$.count").unwrap().greater_than(2.5);
        assert!(eval(&gt, r#"{"count": 3}"#).passed());
        assert!(!eval(&gt, r#"{"count": 2}"#).passed());

        let lt = MatchExpression::json_path("$.count").unwrap().less_than(10.0);
        assert!(eval(&lt, r#"{"count": 3}"#).passed());
        assert!(!eval(&lt, r#"{"count": 10}"#).passed());
    }

    #[test]
    fn malformed_body_is_a_structured_outcome() {
        let expr = MatchExpression::json_path("$.a").unwrap().exists();
        let result = eval(&expr, "this is not json");
        assert!(matches!(result.outcome(), MatchOutcome::MalformedBody(_)));
        assert!(!result.passed());
    }

    #[test]
    fn nested_and_indexed_paths() {
        let body = r#"{"items": [{"id": 1}, {"id": 2}], "meta": {"total": 2}}"#;
        let expr = MatchExpression::json_path("$.items[1].id").unwrap().number_equals(2);
        assert!(eval(&expr, body).passed());
        let expr = MatchExpression::json_path("$.meta.total").unwrap().greater_than(1.0);
        assert!(eval(&expr, body).passed());
    }
}
