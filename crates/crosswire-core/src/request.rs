//! Transport-neutral request descriptor and its builder.

use crate::content_type;
use crate::error::{ConfigResult, ConfigurationError};
use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Method;
use std::time::Duration;
use url::Url;

/// Per-request timeout settings applied uniformly across bridges.
///
/// `connect` bounds connection establishment, `total` bounds the whole
/// exchange. The facade enforces `total` as a hard upper bound by
/// cancellation even when the underlying transport has different timeout
/// semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    pub connect: Duration,
    pub total: Duration,
}

impl TimeoutPolicy {
    pub fn new(connect: Duration, total: Duration) -> ConfigResult<Self> {
        let policy = Self { connect, total };
        policy.validate()?;
        Ok(policy)
    }

    /// Total-bound-only policy with the default connect timeout.
    pub fn total(total: Duration) -> ConfigResult<Self> {
        let connect = Self::default().connect.min(total);
        Self::new(connect, total)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.connect.is_zero() {
            return Err(ConfigurationError::ZeroConnectTimeout);
        }
        if self.total.is_zero() {
            return Err(ConfigurationError::ZeroTotalTimeout);
        }
        if self.connect > self.total {
            return Err(ConfigurationError::ConnectExceedsTotal);
        }
        Ok(())
    }
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self { connect: Duration::from_secs(5), total: Duration::from_secs(30) }
    }
}

/// Immutable description of one HTTP request.
///
/// Built once through [`RequestBuilder`], then handed to a bridge for
/// execution. Never carries transport-specific types.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
    timeout: TimeoutPolicy,
}

impl RequestDescriptor {
    pub fn builder(method: Method, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(method, url)
    }

    pub fn get(url: impl Into<String>) -> RequestBuilder {
        Self::builder(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> RequestBuilder {
        Self::builder(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> RequestBuilder {
        Self::builder(Method::PUT, url)
    }

    pub fn delete(url: impl Into<String>) -> RequestBuilder {
        Self::builder(Method::DELETE, url)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn timeout(&self) -> TimeoutPolicy {
        self.timeout
    }
}

/// Builder for [`RequestDescriptor`]. All validation happens in
/// [`RequestBuilder::build`] so an invalid descriptor fails fast, before
/// any network call.
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    url: String,
    headers: Vec<(String, String)>,
    body: Option<Bytes>,
    timeout: TimeoutPolicy,
}

impl RequestBuilder {
    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout: TimeoutPolicy::default(),
        }
    }

    /// Append a header. Repeated names accumulate as a multi-valued
    /// header in insertion order.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// JSON body; sets `Content-Type: application/json` unless the caller
    /// already added one.
    pub fn json(mut self, value: serde_json::Value) -> Self {
        if !self
            .headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("content-type"))
        {
            self.headers
                .push(("content-type".to_string(), content_type::APPLICATION_JSON.to_string()));
        }
        self.body = Some(Bytes::from(value.to_string()));
        self
    }

    pub fn timeout(mut self, timeout: TimeoutPolicy) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> ConfigResult<RequestDescriptor> {
        let url = Url::parse(&self.url).map_err(|e| ConfigurationError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigurationError::UnsupportedScheme(self.url));
        }

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = name
                .parse::<HeaderName>()
                .map_err(|_| ConfigurationError::InvalidHeaderName(name.clone()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| ConfigurationError::InvalidHeaderValue(name.to_string()))?;
            headers.append(name, value);
        }

        self.timeout.validate()?;

        Ok(RequestDescriptor {
            method: self.method,
            url,
            headers,
            body: self.body,
            timeout: self.timeout,
        })
    }
}
