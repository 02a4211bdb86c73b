//! Assertion vocabulary ([`MatchExpression`]), evaluation outcomes
//! ([`MatchResult`]) and the dual-path [`MatchEngine`].

mod engine;
#[cfg(feature = "jsonpath")]
mod jsonpath;
mod unavailable;

pub use engine::{EvaluatorCapability, MatchEngine};

use crate::error::{ConfigResult, ConfigurationError};
use http::StatusCode;
use regex::Regex;

/// One assertion against a response. Constructed through the associated
/// functions, evaluated by [`MatchEngine`]; evaluation is pure and
/// independent of any other expression.
#[derive(Debug, Clone)]
pub struct MatchExpression {
    kind: MatchKind,
    description: String,
}

#[derive(Debug, Clone)]
pub(crate) enum MatchKind {
    Anything,
    Status(StatusCode),
    HeaderKey(String),
    HeaderPair(String, String),
    HeaderValues(String, Vec<String>),
    ContentType(String),
    BodyEquals(String),
    BodyContains(String),
    BodyContainsIgnoreCase(String),
    BodyMatches(Regex),
    JsonPath(PathExpr, PathPredicate),
    All(Vec<MatchExpression>),
    Any(Vec<MatchExpression>),
    Not(Box<MatchExpression>),
}

/// Validated JsonPath expression. When the evaluator is compiled in, the
/// path is compiled eagerly so syntax errors fail at construction time.
#[derive(Debug, Clone)]
pub(crate) struct PathExpr {
    path: String,
    #[cfg(feature = "jsonpath")]
    compiled: std::sync::Arc<jsonpath_lib::Compiled>,
}

impl PathExpr {
    fn compile(path: &str) -> ConfigResult<Self> {
        if path.trim().is_empty() {
            return Err(ConfigurationError::BlankJsonPath);
        }
        #[cfg(feature = "jsonpath")]
        {
            let compiled = jsonpath_lib::Compiled::compile(path).map_err(|err| {
                ConfigurationError::InvalidJsonPath { path: path.to_string(), reason: err.to_string() }
            })?;
            Ok(Self { path: path.to_string(), compiled: std::sync::Arc::new(compiled) })
        }
        #[cfg(not(feature = "jsonpath"))]
        Ok(Self { path: path.to_string() })
    }

    pub(crate) fn path(&self) -> &str {
        &self.path
    }

    #[cfg(feature = "jsonpath")]
    pub(crate) fn select<'a>(
        &self,
        document: &'a serde_json::Value,
    ) -> Result<Vec<&'a serde_json::Value>, String> {
        self.compiled.select(document).map_err(|err| err.to_string())
    }
}

#[derive(Debug, Clone)]
pub(crate) enum PathPredicate {
    Exists,
    Absent,
    IsNull,
    IsTrue,
    IsFalse,
    StringEquals(String),
    Matches(Regex),
    NumberEquals(i64),
    DecimalEquals(f64),
    GreaterThan(f64),
    LessThan(f64),
}

/// Compiles `pattern` so that the whole input must match, not just a
/// substring.
fn full_match_regex(pattern: &str) -> ConfigResult<Regex> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|err| ConfigurationError::InvalidRegex {
        pattern: pattern.to_string(),
        reason: err.to_string(),
    })
}

impl MatchExpression {
    fn new(kind: MatchKind, description: String) -> Self {
        Self { kind, description }
    }

    /// Always passes; useful as a neutral element in composites.
    pub fn anything() -> Self {
        Self::new(MatchKind::Anything, "anything".to_string())
    }

    pub fn status(expected: StatusCode) -> Self {
        Self::new(MatchKind::Status(expected), format!("status == {}", expected.as_u16()))
    }

    /// Header with the given name is present (case-insensitive).
    pub fn header_key(name: impl Into<String>) -> Self {
        let name = name.into();
        let description = format!("headers contain key '{name}'");
        Self::new(MatchKind::HeaderKey(name), description)
    }

    /// Some value of the named header equals `value`.
    pub fn header_pair(name: impl Into<String>, value: impl Into<String>) -> Self {
        let (name, value) = (name.into(), value.into());
        let description = format!("headers contain pair '{name}: {value}'");
        Self::new(MatchKind::HeaderPair(name, value), description)
    }

    /// The named header carries exactly `values`, in order.
    pub fn header_values(name: impl Into<String>, values: Vec<String>) -> Self {
        let name = name.into();
        let description = format!("header '{name}' values == {values:?}");
        Self::new(MatchKind::HeaderValues(name, values), description)
    }

    pub fn content_type_equals(expected: impl Into<String>) -> Self {
        let expected = expected.into();
        let description = format!("content type == '{expected}'");
        Self::new(MatchKind::ContentType(expected), description)
    }

    /// Body bytes decode (lossily) to exactly this string.
    pub fn body_equals(expected: impl Into<String>) -> Self {
        let expected = expected.into();
        let description = format!("body == {expected:?}");
        Self::new(MatchKind::BodyEquals(expected), description)
    }

    pub fn body_contains(substring: impl Into<String>) -> Self {
        let substring = substring.into();
        let description = format!("body contains {substring:?}");
        Self::new(MatchKind::BodyContains(substring), description)
    }

    pub fn body_contains_ignore_case(substring: impl Into<String>) -> Self {
        let substring = substring.into();
        let description = format!("body contains (ignore case) {substring:?}");
        Self::new(MatchKind::BodyContainsIgnoreCase(substring), description)
    }

    /// The whole body matches the regex pattern.
    pub fn body_matches(pattern: &str) -> ConfigResult<Self> {
        let regex = full_match_regex(pattern)?;
        Ok(Self::new(MatchKind::BodyMatches(regex), format!("body matches /{pattern}/")))
    }

    /// Starts a JsonPath assertion. Fails fast on a blank path and, when
    /// the evaluator is compiled in, on invalid path syntax.
    pub fn json_path(path: &str) -> ConfigResult<JsonPathMatch> {
        Ok(JsonPathMatch { expr: PathExpr::compile(path)? })
    }

    /// All expressions must pass.
    pub fn all(expressions: Vec<MatchExpression>) -> ConfigResult<Self> {
        if expressions.is_empty() {
            return Err(ConfigurationError::EmptyComposite);
        }
        let description =
            format!("all({})", expressions.iter().map(|e| e.description.as_str()).collect::<Vec<_>>().join(", "));
        Ok(Self::new(MatchKind::All(expressions), description))
    }

    /// At least one expression must pass.
    pub fn any(expressions: Vec<MatchExpression>) -> ConfigResult<Self> {
        if expressions.is_empty() {
            return Err(ConfigurationError::EmptyComposite);
        }
        let description =
            format!("any({})", expressions.iter().map(|e| e.description.as_str()).collect::<Vec<_>>().join(", "));
        Ok(Self::new(MatchKind::Any(expressions), description))
    }

    /// Inverts pass/fail. Indeterminate outcomes (evaluator unavailable,
    /// malformed body) are kept as-is rather than inverted.
    pub fn not(expression: MatchExpression) -> Self {
        let description = format!("not {}", expression.description);
        Self::new(MatchKind::Not(Box::new(expression)), description)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether evaluating this expression needs the JsonPath evaluator.
    pub fn requires_evaluator(&self) -> bool {
        match &self.kind {
            MatchKind::JsonPath(..) => true,
            MatchKind::All(nested) | MatchKind::Any(nested) => {
                nested.iter().any(MatchExpression::requires_evaluator)
            }
            MatchKind::Not(nested) => nested.requires_evaluator(),
            _ => false,
        }
    }

    /// Whether evaluating this expression reads the response body.
    pub fn requires_body(&self) -> bool {
        match &self.kind {
            MatchKind::BodyEquals(_)
            | MatchKind::BodyContains(_)
            | MatchKind::BodyContainsIgnoreCase(_)
            | MatchKind::BodyMatches(_)
            | MatchKind::JsonPath(..) => true,
            MatchKind::All(nested) | MatchKind::Any(nested) => {
                nested.iter().any(MatchExpression::requires_body)
            }
            MatchKind::Not(nested) => nested.requires_body(),
            _ => false,
        }
    }

    pub(crate) fn kind(&self) -> &MatchKind {
        &self.kind
    }
}

/// Fluent second half of a JsonPath assertion: the predicate applied to
/// the value(s) the path selects.
#[derive(Debug, Clone)]
pub struct JsonPathMatch {
    expr: PathExpr,
}

impl JsonPathMatch {
    fn finish(self, predicate: PathPredicate, suffix: String) -> MatchExpression {
        let description = format!("jsonPath({}) {}", self.expr.path(), suffix);
        MatchExpression::new(MatchKind::JsonPath(self.expr, predicate), description)
    }

    /// The path selects at least one node.
    pub fn exists(self) -> MatchExpression {
        self.finish(PathPredicate::Exists, "exists".to_string())
    }

    /// The path selects no nodes.
    pub fn absent(self) -> MatchExpression {
        self.finish(PathPredicate::Absent, "absent".to_string())
    }

    pub fn is_null(self) -> MatchExpression {
        self.finish(PathPredicate::IsNull, "isNull".to_string())
    }

    pub fn is_true(self) -> MatchExpression {
        self.finish(PathPredicate::IsTrue, "isTrue".to_string())
    }

    pub fn is_false(self) -> MatchExpression {
        self.finish(PathPredicate::IsFalse, "isFalse".to_string())
    }

    pub fn string_equals(self, expected: impl Into<String>) -> MatchExpression {
        let expected = expected.into();
        let suffix = format!("stringEquals({expected:?})");
        self.finish(PathPredicate::StringEquals(expected), suffix)
    }

    /// The selected string value matches the whole-string regex.
    pub fn matches(self, pattern: &str) -> ConfigResult<MatchExpression> {
        let regex = full_match_regex(pattern)?;
        let suffix = format!("matches(/{pattern}/)");
        Ok(self.finish(PathPredicate::Matches(regex), suffix))
    }

    /// Numeric equality by value: a JSON `3`, `3.0` or `3e0` all equal 3.
    pub fn number_equals(self, expected: i64) -> MatchExpression {
        let suffix = format!("numberEquals({expected})");
        self.finish(PathPredicate::NumberEquals(expected), suffix)
    }

    /// Numeric equality by value against a decimal expectation.
    pub fn decimal_equals(self, expected: f64) -> MatchExpression {
        let suffix = format!("decimalEquals({expected})");
        self.finish(PathPredicate::DecimalEquals(expected), suffix)
    }

    pub fn greater_than(self, expected: f64) -> MatchExpression {
        let suffix = format!("greaterThan({expected})");
        self.finish(PathPredicate::GreaterThan(expected), suffix)
    }

    pub fn less_than(self, expected: f64) -> MatchExpression {
        let suffix = format!("lessThan({expected})");
        self.finish(PathPredicate::LessThan(expected), suffix)
    }
}

/// Outcome of evaluating one expression against one response.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Pass,
    Fail { expected: String, actual: String },
    /// The expression needed JsonPath evaluation but no evaluator is
    /// configured. A determinate outcome, not an error.
    EvaluatorUnavailable,
    /// The body could not be parsed as JSON although a path expression
    /// required it.
    MalformedBody(String),
}

/// Evaluation result: the expression's description plus its outcome.
/// Produced fresh per evaluation, never cached across responses.
#[derive(Debug, Clone)]
pub struct MatchResult {
    description: String,
    outcome: MatchOutcome,
}

impl MatchResult {
    pub(crate) fn pass(description: &str) -> Self {
        Self { description: description.to_string(), outcome: MatchOutcome::Pass }
    }

    pub(crate) fn fail(
        description: &str,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            description: description.to_string(),
            outcome: MatchOutcome::Fail { expected: expected.into(), actual: actual.into() },
        }
    }

    pub(crate) fn unavailable(description: &str) -> Self {
        Self { description: description.to_string(), outcome: MatchOutcome::EvaluatorUnavailable }
    }

    pub(crate) fn malformed(description: &str, reason: impl Into<String>) -> Self {
        Self {
            description: description.to_string(),
            outcome: MatchOutcome::MalformedBody(reason.into()),
        }
    }

    pub(crate) fn with_outcome(description: &str, outcome: MatchOutcome) -> Self {
        Self { description: description.to_string(), outcome }
    }

    pub fn passed(&self) -> bool {
        self.outcome == MatchOutcome::Pass
    }

    pub fn outcome(&self) -> &MatchOutcome {
        &self.outcome
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl std::fmt::Display for MatchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.outcome {
            MatchOutcome::Pass => write!(f, "PASS: {}", self.description),
            MatchOutcome::Fail { expected, actual } => {
                write!(f, "FAIL: {} (expected {expected}, got {actual})", self.description)
            }
            MatchOutcome::EvaluatorUnavailable => {
                write!(f, "UNAVAILABLE: {} ({})", self.description, unavailable::EVALUATOR_HINT)
            }
            MatchOutcome::MalformedBody(reason) => {
                write!(f, "MALFORMED BODY: {} ({reason})", self.description)
            }
        }
    }
}
