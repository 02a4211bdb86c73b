//! Core facade: request execution through an injected bridge and
//! assertion evaluation over the resulting response.

use crate::bridge::Bridge;
use crate::error::{TransportError, TransportResult};
use crate::matching::{MatchEngine, MatchExpression, MatchResult};
use crate::request::RequestDescriptor;
use crate::response::ResponseDescriptor;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

/// Executes requests through one configured bridge and evaluates match
/// expressions against the responses. Transport-model-agnostic: it
/// neither knows nor cares whether the bridge blocks or runs an event
/// loop internally.
pub struct Courier {
    bridge: Arc<dyn Bridge>,
    engine: MatchEngine,
}

impl Courier {
    /// Courier with the default matching engine (evaluator capability
    /// detected once from the compiled features).
    pub fn new(bridge: Arc<dyn Bridge>) -> Self {
        Self { bridge, engine: MatchEngine::new() }
    }

    /// Courier with an explicitly configured engine.
    pub fn with_engine(bridge: Arc<dyn Bridge>, engine: MatchEngine) -> Self {
        Self { bridge, engine }
    }

    pub fn bridge_name(&self) -> &'static str {
        self.bridge.name()
    }

    pub fn engine(&self) -> &MatchEngine {
        &self.engine
    }

    /// Execute the request through the configured bridge.
    ///
    /// The descriptor's total timeout is enforced here as a hard upper
    /// bound: if the bridge does not resolve in time, the in-flight
    /// future is dropped (releasing the bridge's connection/stream) and
    /// a [`TransportError::Timeout`] is returned.
    pub async fn send(&self, request: RequestDescriptor) -> TransportResult<ResponseDescriptor> {
        let execution_id = Uuid::new_v4();
        let total = request.timeout().total;
        let started = Instant::now();
        debug!(
            %execution_id,
            bridge = self.bridge.name(),
            method = %request.method(),
            url = %request.url(),
            "dispatching request"
        );

        match tokio::time::timeout(total, self.bridge.execute(&request)).await {
            Ok(Ok(response)) => {
                debug!(
                    %execution_id,
                    status = response.status().as_u16(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "request completed"
                );
                Ok(response)
            }
            Ok(Err(err)) => {
                warn!(%execution_id, error = %err, "request failed");
                Err(err)
            }
            Err(_) => {
                warn!(%execution_id, timeout_ms = total.as_millis() as u64, "request timed out");
                Err(TransportError::Timeout(total))
            }
        }
    }

    /// Evaluate one expression against a response.
    ///
    /// Materializes the body first when the expression reads it (at most
    /// once per response, cached), so every expression sees identical
    /// bytes and the request is never re-executed. Expressions that only
    /// look at status or headers never touch the body, so they keep
    /// working even when the body cannot be read.
    pub async fn assert(
        &self,
        response: &ResponseDescriptor,
        expression: &MatchExpression,
    ) -> MatchResult {
        if expression.requires_body() {
            if let Err(err) = response.body_bytes().await {
                return MatchResult::fail(
                    expression.description(),
                    "readable response body",
                    err.to_string(),
                );
            }
        }
        self.engine.evaluate(expression, response)
    }

    /// Evaluate a batch of independent expressions, running to
    /// completion and reporting every outcome.
    pub async fn assert_all(
        &self,
        response: &ResponseDescriptor,
        expressions: &[MatchExpression],
    ) -> Vec<MatchResult> {
        let mut results = Vec::with_capacity(expressions.len());
        for expression in expressions {
            results.push(self.assert(response, expression).await);
        }
        results
    }
}
