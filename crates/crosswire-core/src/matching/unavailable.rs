//! Degraded matching path used when the JsonPath evaluator is absent.
//!
//! Path-based expressions resolve to a distinct
//! [`MatchOutcome::EvaluatorUnavailable`](super::MatchOutcome) value
//! instead of crashing, so status, header and raw-body expressions keep
//! working feature-by-feature.

use super::MatchResult;

/// Guidance included with every unavailable outcome's description when
/// callers print results.
pub const EVALUATOR_HINT: &str =
    "JsonPath evaluator is not configured; enable the `jsonpath` feature of \
     crosswire-core (or construct the engine with EvaluatorCapability::Available) \
     to use path matchers";

pub(super) fn result(description: &str) -> MatchResult {
    MatchResult::unavailable(description)
}
