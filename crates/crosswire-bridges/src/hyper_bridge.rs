//! Low-level native bridge over the hyper HTTP/1 stack.

use async_trait::async_trait;
use bytes::Bytes;
use crosswire_core::{
    Bridge, RequestDescriptor, ResponseBody, ResponseDescriptor, TimeoutPolicy, TransportError,
    TransportInfo, TransportResult,
};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::time::{Duration, Instant};
use tracing::trace;

/// Bridge over a `hyper_util` legacy client with a plain TCP connector.
///
/// hyper has no per-request timeout of its own, so the total bound is
/// applied here around the exchange; the facade enforces the same bound
/// independently.
pub struct HyperBridge {
    client: Client<HttpConnector, Full<Bytes>>,
}

impl HyperBridge {
    pub fn new() -> Self {
        Self::with_connect_timeout(TimeoutPolicy::default().connect)
    }

    pub fn with_connect_timeout(connect: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect));
        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self { client }
    }
}

#[async_trait]
impl Bridge for HyperBridge {
    fn name(&self) -> &'static str {
        "hyper"
    }

    async fn execute(&self, request: &RequestDescriptor) -> TransportResult<ResponseDescriptor> {
        let started = Instant::now();
        let total = request.timeout().total;

        let uri: hyper::Uri = request
            .url()
            .as_str()
            .parse()
            .map_err(|e| TransportError::Protocol(format!("invalid uri: {e}")))?;
        let body = Full::new(request.body().cloned().unwrap_or_default());
        let mut outgoing = http::Request::builder()
            .method(request.method().clone())
            .uri(uri)
            .body(body)
            .map_err(|e| TransportError::Protocol(e.to_string()))?;
        *outgoing.headers_mut() = request.headers().clone();

        // One deadline for the whole exchange, headers and body alike.
        let deadline = tokio::time::Instant::now() + total;
        let response = tokio::time::timeout_at(deadline, self.client.request(outgoing))
            .await
            .map_err(|_| TransportError::Timeout(total))?
            .map_err(convert)?;

        let (parts, incoming) = response.into_parts();
        let elapsed = started.elapsed();
        trace!(
            status = parts.status.as_u16(),
            elapsed_ms = elapsed.as_millis() as u64,
            "hyper exchange"
        );

        let collected = tokio::time::timeout_at(deadline, incoming.collect())
            .await
            .map_err(|_| TransportError::Timeout(total))?
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(ResponseDescriptor::new(
            parts.status,
            parts.headers,
            TransportInfo { bridge: "hyper", version: parts.version, elapsed },
            ResponseBody::Buffered(collected.to_bytes()),
        ))
    }
}

impl Default for HyperBridge {
    fn default() -> Self {
        Self::new()
    }
}

fn convert(err: hyper_util::client::legacy::Error) -> TransportError {
    if err.is_connect() {
        TransportError::Connection(err.to_string())
    } else {
        TransportError::Protocol(err.to_string())
    }
}
