//! Transport-neutral response descriptor with at-most-once body
//! materialization.

use crate::error::{TransportError, TransportResult};
use bytes::{Bytes, BytesMut};
use futures::stream::BoxStream;
use futures::StreamExt;
use http::{HeaderMap, StatusCode, Version};
use std::fmt;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};

/// Metadata recorded by the bridge that produced a response.
#[derive(Debug, Clone)]
pub struct TransportInfo {
    /// Name of the bridge, e.g. `"reqwest"`.
    pub bridge: &'static str,
    /// Negotiated HTTP protocol version.
    pub version: Version,
    /// Wall-clock time the bridge spent on the exchange.
    pub elapsed: Duration,
}

/// Response body as delivered by a bridge: already buffered, or a lazy
/// stream that has not been read yet.
pub enum ResponseBody {
    Buffered(Bytes),
    Streamed(BoxStream<'static, TransportResult<Bytes>>),
}

impl ResponseBody {
    pub fn empty() -> Self {
        Self::Buffered(Bytes::new())
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffered(bytes) => f.debug_tuple("Buffered").field(&bytes.len()).finish(),
            Self::Streamed(_) => f.write_str("Streamed(..)"),
        }
    }
}

/// One HTTP response, adapted into the bridge model.
///
/// The body is materialized at most once: the first call to
/// [`ResponseDescriptor::body_bytes`] drains a streamed body and caches
/// the bytes, so any number of assertions observe identical content
/// without re-reading the transport.
#[derive(Debug)]
pub struct ResponseDescriptor {
    status: StatusCode,
    headers: HeaderMap,
    info: TransportInfo,
    pending: Mutex<Option<ResponseBody>>,
    cached: OnceCell<Bytes>,
}

impl ResponseDescriptor {
    pub fn new(status: StatusCode, headers: HeaderMap, info: TransportInfo, body: ResponseBody) -> Self {
        Self {
            status,
            headers,
            info,
            pending: Mutex::new(Some(body)),
            cached: OnceCell::new(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn transport(&self) -> &TransportInfo {
        &self.info
    }

    /// Materialized body bytes. Reads the underlying body on first call
    /// and serves the cached bytes afterwards.
    pub async fn body_bytes(&self) -> TransportResult<&Bytes> {
        self.cached
            .get_or_try_init(|| async {
                let body = self.pending.lock().await.take();
                match body {
                    Some(ResponseBody::Buffered(bytes)) => Ok(bytes),
                    Some(ResponseBody::Streamed(mut stream)) => {
                        let mut buf = BytesMut::new();
                        while let Some(chunk) = stream.next().await {
                            buf.extend_from_slice(&chunk?);
                        }
                        Ok(buf.freeze())
                    }
                    None => Err(TransportError::Body(
                        "response body was already consumed".to_string(),
                    )),
                }
            })
            .await
    }

    /// Body bytes if they have been materialized already.
    pub fn cached_bytes(&self) -> Option<&Bytes> {
        self.cached.get()
    }

    /// Lossy UTF-8 view of the materialized body.
    pub async fn body_text(&self) -> TransportResult<String> {
        let bytes = self.body_bytes().await?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn info() -> TransportInfo {
        TransportInfo { bridge: "test", version: Version::HTTP_11, elapsed: Duration::ZERO }
    }

    fn descriptor(body: ResponseBody) -> ResponseDescriptor {
        ResponseDescriptor::new(StatusCode::OK, HeaderMap::new(), info(), body)
    }

    #[tokio::test]
    async fn buffered_body_is_served_repeatedly() {
        let response = descriptor(ResponseBody::Buffered(Bytes::from_static(b"hello")));
        assert_eq!(response.body_bytes().await.unwrap().as_ref(), b"hello");
        assert_eq!(response.body_bytes().await.unwrap().as_ref(), b"hello");
        assert_eq!(response.cached_bytes().unwrap().as_ref(), b"hello");
    }

    #[tokio::test]
    async fn streamed_body_is_collected_once() {
        let chunks: Vec<TransportResult<Bytes>> =
            vec![Ok(Bytes::from_static(b"ab")), Ok(Bytes::from_static(b"cd"))];
        let response = descriptor(ResponseBody::Streamed(stream::iter(chunks).boxed()));
        assert!(response.cached_bytes().is_none());
        assert_eq!(response.body_bytes().await.unwrap().as_ref(), b"abcd");
        // Second read hits the cache; the stream is gone by now.
        assert_eq!(response.body_bytes().await.unwrap().as_ref(), b"abcd");
    }

    #[tokio::test]
    async fn streamed_read_failure_is_reported() {
        let chunks: Vec<TransportResult<Bytes>> = vec![
            Ok(Bytes::from_static(b"ab")),
            Err(TransportError::Body("truncated".to_string())),
        ];
        let response = descriptor(ResponseBody::Streamed(stream::iter(chunks).boxed()));
        assert!(response.body_bytes().await.is_err());
    }

    #[tokio::test]
    async fn body_text_is_lossy_utf8() {
        let response = descriptor(ResponseBody::Buffered(Bytes::from_static(b"ok")));
        assert_eq!(response.body_text().await.unwrap(), "ok");
    }
}
