//! Evaluates match expressions against a response descriptor.

use super::{MatchExpression, MatchKind, MatchOutcome, MatchResult};
#[cfg(feature = "jsonpath")]
use super::jsonpath;
use super::unavailable;
use crate::content_type;
use crate::response::ResponseDescriptor;

/// Presence of the optional JsonPath evaluator, resolved once at startup
/// and threaded through the engine as configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluatorCapability {
    Available,
    Unavailable,
}

impl EvaluatorCapability {
    /// Detects whether the `jsonpath` cargo feature compiled the
    /// evaluator in.
    pub fn detect() -> Self {
        if cfg!(feature = "jsonpath") {
            Self::Available
        } else {
            Self::Unavailable
        }
    }

    pub fn is_available(self) -> bool {
        self == Self::Available
    }
}

/// The matching engine. Stateless apart from its evaluator capability;
/// evaluation never mutates the response, so any number of expressions
/// can be evaluated against one response in any order.
#[derive(Debug, Clone)]
pub struct MatchEngine {
    evaluator: EvaluatorCapability,
}

impl MatchEngine {
    pub fn new() -> Self {
        Self { evaluator: EvaluatorCapability::detect() }
    }

    /// Engine with an explicit capability, overriding detection. Used to
    /// exercise the degraded path without rebuilding.
    pub fn with_evaluator(evaluator: EvaluatorCapability) -> Self {
        Self { evaluator }
    }

    pub fn evaluator(&self) -> EvaluatorCapability {
        self.evaluator
    }

    /// Evaluate one expression against one response. The response body
    /// must already be materialized (the facade guarantees this before
    /// any matcher runs).
    pub fn evaluate(&self, expression: &MatchExpression, response: &ResponseDescriptor) -> MatchResult {
        let description = expression.description();
        match expression.kind() {
            MatchKind::Anything => MatchResult::pass(description),

            MatchKind::Status(expected) => {
                if response.status() == *expected {
                    MatchResult::pass(description)
                } else {
                    MatchResult::fail(
                        description,
                        expected.as_u16().to_string(),
                        response.status().as_u16().to_string(),
                    )
                }
            }

            MatchKind::HeaderKey(name) => {
                if response.headers().contains_key(name.as_str()) {
                    MatchResult::pass(description)
                } else {
                    MatchResult::fail(description, format!("header '{name}' present"), "absent")
                }
            }

            MatchKind::HeaderPair(name, value) => {
                let found = response
                    .headers()
                    .get_all(name.as_str())
                    .iter()
                    .any(|v| v.to_str().map(|v| v == value).unwrap_or(false));
                if found {
                    MatchResult::pass(description)
                } else {
                    let actual = header_values(response, name).join(", ");
                    MatchResult::fail(description, value.clone(), actual)
                }
            }

            MatchKind::HeaderValues(name, expected) => {
                let actual = header_values(response, name);
                if &actual == expected {
                    MatchResult::pass(description)
                } else {
                    MatchResult::fail(description, format!("{expected:?}"), format!("{actual:?}"))
                }
            }

            MatchKind::ContentType(expected) => {
                match content_type::content_type(response.headers()) {
                    Some(actual) if actual == expected => MatchResult::pass(description),
                    Some(actual) => MatchResult::fail(description, expected.clone(), actual),
                    None => MatchResult::fail(description, expected.clone(), "no content type"),
                }
            }

            MatchKind::BodyEquals(expected) => self.with_body_text(description, response, |text| {
                if text == expected.as_str() {
                    MatchOutcome::Pass
                } else {
                    MatchOutcome::Fail { expected: expected.clone(), actual: preview(text) }
                }
            }),

            MatchKind::BodyContains(substring) => {
                self.with_body_text(description, response, |text| {
                    if text.contains(substring) {
                        MatchOutcome::Pass
                    } else {
                        MatchOutcome::Fail {
                            expected: format!("body containing {substring:?}"),
                            actual: preview(text),
                        }
                    }
                })
            }

            MatchKind::BodyContainsIgnoreCase(substring) => {
                self.with_body_text(description, response, |text| {
                    if text.to_lowercase().contains(&substring.to_lowercase()) {
                        MatchOutcome::Pass
                    } else {
                        MatchOutcome::Fail {
                            expected: format!("body containing (ignore case) {substring:?}"),
                            actual: preview(text),
                        }
                    }
                })
            }

            MatchKind::BodyMatches(regex) => self.with_body_text(description, response, |text| {
                if regex.is_match(text) {
                    MatchOutcome::Pass
                } else {
                    MatchOutcome::Fail {
                        expected: format!("body matching {regex}"),
                        actual: preview(text),
                    }
                }
            }),

            MatchKind::JsonPath(path, predicate) => {
                if !self.evaluator.is_available() {
                    return unavailable::result(description);
                }
                #[cfg(feature = "jsonpath")]
                {
                    match response.cached_bytes() {
                        Some(bytes) => jsonpath::evaluate(description, path, predicate, bytes),
                        None => MatchResult::fail(
                            description,
                            "materialized response body",
                            "body not materialized",
                        ),
                    }
                }
                #[cfg(not(feature = "jsonpath"))]
                {
                    // Capability was forced to Available without the
                    // evaluator compiled in; degrade instead of panicking.
                    let _ = (path, predicate);
                    unavailable::result(description)
                }
            }

            MatchKind::All(nested) => {
                let mut first_fail: Option<MatchResult> = None;
                let mut saw_unavailable = false;
                let mut first_malformed: Option<MatchResult> = None;
                for expression in nested {
                    let result = self.evaluate(expression, response);
                    match result.outcome() {
                        MatchOutcome::Pass => {}
                        MatchOutcome::EvaluatorUnavailable => saw_unavailable = true,
                        MatchOutcome::MalformedBody(_) => {
                            first_malformed.get_or_insert(result);
                        }
                        MatchOutcome::Fail { .. } => {
                            first_fail.get_or_insert(result);
                        }
                    }
                }
                if let Some(fail) = first_fail {
                    MatchResult::with_outcome(description, fail.outcome().clone())
                } else if saw_unavailable {
                    MatchResult::unavailable(description)
                } else if let Some(malformed) = first_malformed {
                    MatchResult::with_outcome(description, malformed.outcome().clone())
                } else {
                    MatchResult::pass(description)
                }
            }

            MatchKind::Any(nested) => {
                let mut saw_unavailable = false;
                let mut first_malformed: Option<MatchResult> = None;
                for expression in nested {
                    let result = self.evaluate(expression, response);
                    match result.outcome() {
                        MatchOutcome::Pass => return MatchResult::pass(description),
                        MatchOutcome::EvaluatorUnavailable => saw_unavailable = true,
                        MatchOutcome::MalformedBody(_) => {
                            first_malformed.get_or_insert(result);
                        }
                        MatchOutcome::Fail { .. } => {}
                    }
                }
                if saw_unavailable {
                    MatchResult::unavailable(description)
                } else if let Some(malformed) = first_malformed {
                    MatchResult::with_outcome(description, malformed.outcome().clone())
                } else {
                    MatchResult::fail(description, "at least one passing expression", "all failed")
                }
            }

            MatchKind::Not(nested) => {
                let result = self.evaluate(nested, response);
                match result.outcome() {
                    MatchOutcome::Pass => {
                        MatchResult::fail(description, "expression not to match", "matched")
                    }
                    MatchOutcome::Fail { .. } => MatchResult::pass(description),
                    outcome => MatchResult::with_outcome(description, outcome.clone()),
                }
            }
        }
    }

    fn with_body_text(
        &self,
        description: &str,
        response: &ResponseDescriptor,
        check: impl FnOnce(&str) -> MatchOutcome,
    ) -> MatchResult {
        match response.cached_bytes() {
            Some(bytes) => {
                let text = String::from_utf8_lossy(bytes);
                MatchResult::with_outcome(description, check(text.as_ref()))
            }
            None => MatchResult::fail(description, "materialized response body", "body not materialized"),
        }
    }
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn header_values(response: &ResponseDescriptor, name: &str) -> Vec<String> {
    response
        .headers()
        .get_all(name)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect()
}

/// Shortened body excerpt for failure diagnostics.
fn preview(text: &str) -> String {
    const LIMIT: usize = 120;
    if text.len() <= LIMIT {
        text.to_string()
    } else {
        let cut = text
            .char_indices()
            .take_while(|(i, _)| *i < LIMIT)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}... ({} bytes total)", &text[..cut], text.len())
    }
}
