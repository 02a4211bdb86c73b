//! Transport-agnostic HTTP interaction layer.
//!
//! Callers describe a request once ([`RequestDescriptor`]), execute it
//! through any [`Bridge`] implementation, and evaluate assertions
//! ([`MatchExpression`]) against the resulting [`ResponseDescriptor`]
//! regardless of which transport produced it.

pub mod bridge;
pub mod content_type;
pub mod courier;
pub mod error;
pub mod matching;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use bridge::Bridge;
pub use content_type::{comparable_headers, content_type};
pub use courier::Courier;
pub use error::{ConfigResult, ConfigurationError, TransportError, TransportResult};
pub use matching::{
    EvaluatorCapability, JsonPathMatch, MatchEngine, MatchExpression, MatchOutcome, MatchResult,
};
pub use request::{RequestBuilder, RequestDescriptor, TimeoutPolicy};
pub use response::{ResponseBody, ResponseDescriptor, TransportInfo};
