//! Shared error taxonomy for the bridge model and facade.
//!
//! Transport libraries never leak their own error types across the bridge
//! boundary; every bridge translates into [`TransportError`] before
//! returning. Construction-time problems surface as
//! [`ConfigurationError`] before any network call happens.

use std::time::Duration;

/// Errors raised while executing a request through a bridge.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Errors raised while building a request descriptor or match expression.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("URL '{0}' must use the http or https scheme")]
    UnsupportedScheme(String),

    #[error("invalid header name '{0}'")]
    InvalidHeaderName(String),

    #[error("invalid header value for '{0}'")]
    InvalidHeaderValue(String),

    #[error("connect timeout must be greater than zero")]
    ZeroConnectTimeout,

    #[error("total timeout must be greater than zero")]
    ZeroTotalTimeout,

    #[error("connect timeout cannot be greater than total timeout")]
    ConnectExceedsTotal,

    #[error("JsonPath expression must not be blank")]
    BlankJsonPath,

    #[error("invalid JsonPath expression '{path}': {reason}")]
    InvalidJsonPath { path: String, reason: String },

    #[error("invalid regex pattern '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("composite expression requires at least one operand")]
    EmptyComposite,
}

/// Result alias for transport-level operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result alias for construction-time validation.
pub type ConfigResult<T> = Result<T, ConfigurationError>;
