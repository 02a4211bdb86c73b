//! Blocking classic bridge backed by `ureq`.
//!
//! Calls run on the tokio blocking pool so the async facade contract is
//! preserved. `ureq` reports 4xx/5xx statuses as errors; those are folded
//! back into ordinary response descriptors for parity with the other
//! bridges.

use async_trait::async_trait;
use bytes::Bytes;
use crosswire_core::{
    Bridge, RequestDescriptor, ResponseBody, ResponseDescriptor, TimeoutPolicy, TransportError,
    TransportInfo, TransportResult,
};
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{StatusCode, Version};
use std::io::Read;
use std::time::{Duration, Instant};
use tracing::trace;

/// Bridge over a shared [`ureq::Agent`].
pub struct UreqBridge {
    agent: ureq::Agent,
}

impl UreqBridge {
    pub fn new() -> Self {
        Self::with_connect_timeout(TimeoutPolicy::default().connect)
    }

    pub fn with_connect_timeout(connect: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout_connect(connect).build();
        Self { agent }
    }

    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqBridge {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Bridge for UreqBridge {
    fn name(&self) -> &'static str {
        "ureq"
    }

    async fn execute(&self, request: &RequestDescriptor) -> TransportResult<ResponseDescriptor> {
        let agent = self.agent.clone();
        let request = request.clone();
        tokio::task::spawn_blocking(move || execute_blocking(&agent, &request))
            .await
            .map_err(|e| TransportError::Protocol(format!("blocking task failed: {e}")))?
    }
}

fn execute_blocking(
    agent: &ureq::Agent,
    request: &RequestDescriptor,
) -> TransportResult<ResponseDescriptor> {
    let started = Instant::now();
    let total = request.timeout().total;

    let mut call = agent
        .request(request.method().as_str(), request.url().as_str())
        .timeout(total);
    for name in request.headers().keys() {
        let joined = join_values(request.headers(), name)?;
        call = call.set(name.as_str(), &joined);
    }

    let outcome = match request.body() {
        Some(body) => call.send_bytes(body),
        None => call.call(),
    };

    let response = match outcome {
        Ok(response) => response,
        // 4xx/5xx still carry a full response; fold it back in.
        Err(ureq::Error::Status(_, response)) => response,
        Err(ureq::Error::Transport(transport)) => return Err(convert(transport, total)),
    };
    adapt(response, started.elapsed())
}

fn join_values(headers: &HeaderMap, name: &HeaderName) -> TransportResult<String> {
    let values: Result<Vec<&str>, _> =
        headers.get_all(name).iter().map(HeaderValue::to_str).collect();
    values
        .map(|v| v.join(", "))
        .map_err(|_| TransportError::Protocol(format!("header {name} is not valid UTF-8")))
}

fn convert(err: ureq::Transport, total: Duration) -> TransportError {
    match err.kind() {
        ureq::ErrorKind::Dns | ureq::ErrorKind::ConnectionFailed | ureq::ErrorKind::ProxyConnect => {
            TransportError::Connection(err.to_string())
        }
        ureq::ErrorKind::Io => {
            let message = err.to_string();
            if message.contains("timed out") {
                TransportError::Timeout(total)
            } else {
                TransportError::Connection(message)
            }
        }
        _ => TransportError::Protocol(err.to_string()),
    }
}

fn adapt(response: ureq::Response, elapsed: Duration) -> TransportResult<ResponseDescriptor> {
    let status = StatusCode::from_u16(response.status())
        .map_err(|e| TransportError::Protocol(e.to_string()))?;
    let version = match response.http_version() {
        "HTTP/1.0" => Version::HTTP_10,
        "HTTP/1.1" => Version::HTTP_11,
        other => {
            return Err(TransportError::Protocol(format!("unexpected http version {other}")));
        }
    };

    let mut headers = HeaderMap::new();
    for name in response.headers_names() {
        let header_name = name
            .parse::<HeaderName>()
            .map_err(|_| TransportError::Protocol(format!("invalid header name {name}")))?;
        for value in response.all(&name) {
            let header_value = HeaderValue::from_str(value).map_err(|_| {
                TransportError::Protocol(format!("invalid value for header {name}"))
            })?;
            headers.append(header_name.clone(), header_value);
        }
    }
    trace!(status = status.as_u16(), elapsed_ms = elapsed.as_millis() as u64, "ureq exchange");

    let mut body = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut body)
        .map_err(|e| TransportError::Body(e.to_string()))?;

    Ok(ResponseDescriptor::new(
        status,
        headers,
        TransportInfo { bridge: "ureq", version, elapsed },
        ResponseBody::Buffered(Bytes::from(body)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, MockServer};

    #[tokio::test]
    async fn executes_request_on_the_blocking_pool() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/users");
            then.status(200).header("content-type", "application/json").body(r#"[]"#);
        });

        let bridge = UreqBridge::new();
        let request = RequestDescriptor::get(server.url("/users")).build().unwrap();
        let response = bridge.execute(&request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.transport().bridge, "ureq");
        assert_eq!(response.body_bytes().await.unwrap().as_ref(), b"[]");
        mock.assert();
    }

    #[tokio::test]
    async fn error_statuses_become_ordinary_responses() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404).body("not here");
        });

        let bridge = UreqBridge::new();
        let request = RequestDescriptor::get(server.url("/missing")).build().unwrap();
        let response = bridge.execute(&request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.body_text().await.unwrap(), "not here");
    }

    #[tokio::test]
    async fn connection_refused_is_a_connection_error() {
        let bridge = UreqBridge::new();
        let request = RequestDescriptor::get("http://127.0.0.1:9/").build().unwrap();
        let err = bridge.execute(&request).await.unwrap_err();
        assert!(matches!(err, TransportError::Connection(_)));
    }
}
