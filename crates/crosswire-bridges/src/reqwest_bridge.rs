//! Async event-loop bridge backed by `reqwest`.

use async_trait::async_trait;
use crosswire_core::{
    Bridge, RequestDescriptor, ResponseBody, ResponseDescriptor, TimeoutPolicy, TransportError,
    TransportInfo, TransportResult,
};
use futures::StreamExt;
use std::time::{Duration, Instant};
use tracing::trace;

/// Bridge over a shared [`reqwest::Client`].
///
/// The client is built once per bridge with the connect timeout applied;
/// the per-request total timeout rides on each request. Response bodies
/// are exposed as lazy streams and only read when an assertion
/// materializes them.
pub struct ReqwestBridge {
    client: reqwest::Client,
}

impl ReqwestBridge {
    pub fn new() -> TransportResult<Self> {
        Self::with_connect_timeout(TimeoutPolicy::default().connect)
    }

    pub fn with_connect_timeout(connect: Duration) -> TransportResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect)
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        Ok(Self { client })
    }

    /// Bridge over a caller-configured client. The caller is responsible
    /// for the connect timeout in this case.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Bridge for ReqwestBridge {
    fn name(&self) -> &'static str {
        "reqwest"
    }

    async fn execute(&self, request: &RequestDescriptor) -> TransportResult<ResponseDescriptor> {
        let started = Instant::now();
        let total = request.timeout().total;

        let mut builder = self
            .client
            .request(request.method().clone(), request.url().clone())
            .headers(request.headers().clone())
            .timeout(total);
        if let Some(body) = request.body() {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|e| convert(e, total))?;
        let status = response.status();
        let version = response.version();
        let headers = response.headers().clone();
        let elapsed = started.elapsed();
        trace!(status = status.as_u16(), elapsed_ms = elapsed.as_millis() as u64, "reqwest exchange");

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportError::Body(e.to_string())))
            .boxed();

        Ok(ResponseDescriptor::new(
            status,
            headers,
            TransportInfo { bridge: "reqwest", version, elapsed },
            ResponseBody::Streamed(stream),
        ))
    }
}

fn convert(err: reqwest::Error, total: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(total)
    } else if err.is_connect() {
        TransportError::Connection(err.to_string())
    } else if err.is_body() || err.is_decode() {
        TransportError::Body(err.to_string())
    } else {
        TransportError::Protocol(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use httpmock::{Method::POST, MockServer};

    #[tokio::test]
    async fn executes_request_and_streams_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/items").header("x-tag", "a").body(r#"{"name":"widget"}"#);
            then.status(201).header("content-type", "application/json").body(r#"{"id": 1}"#);
        });

        let bridge = ReqwestBridge::new().unwrap();
        let request = RequestDescriptor::post(server.url("/items"))
            .header("x-tag", "a")
            .json(serde_json::json!({"name": "widget"}))
            .build()
            .unwrap();

        let response = bridge.execute(&request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.transport().bridge, "reqwest");
        // Lazy: nothing read yet.
        assert!(response.cached_bytes().is_none());
        assert_eq!(response.body_bytes().await.unwrap().as_ref(), br#"{"id": 1}"#);
        mock.assert();
    }

    #[tokio::test]
    async fn connection_refused_is_a_connection_error() {
        let bridge = ReqwestBridge::new().unwrap();
        // Reserved port that nothing listens on.
        let request = RequestDescriptor::get("http://127.0.0.1:9/").build().unwrap();
        let err = bridge.execute(&request).await.unwrap_err();
        assert!(matches!(err, TransportError::Connection(_)));
    }
}
