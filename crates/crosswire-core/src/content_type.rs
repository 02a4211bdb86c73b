//! Content-type constants and header helpers shared by the matching
//! engine and the parity tooling.

use http::header::{HeaderMap, CONTENT_TYPE};
use std::collections::BTreeMap;

pub const TEXT_PLAIN: &str = "text/plain";
pub const TEXT_HTML: &str = "text/html";
pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_XML: &str = "application/xml";
pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";

/// First `Content-Type` header value, if present and valid UTF-8.
pub fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok())
}

/// Whether the headers advertise a JSON payload (`application/json`,
/// `application/problem+json`, ...).
pub fn is_json(headers: &HeaderMap) -> bool {
    content_type(headers).map(|ct| ct.contains("json")).unwrap_or(false)
}

/// Hop-by-hop and transport-added headers excluded from cross-bridge
/// comparison. Different clients negotiate these independently.
const TRANSPORT_HEADERS: &[&str] = &[
    "connection",
    "content-length",
    "date",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Normalized header view for assertion-equivalence checks: names
/// lowercased, value lists order-preserving per name, transport-added
/// headers removed.
pub fn comparable_headers(headers: &HeaderMap) -> BTreeMap<String, Vec<String>> {
    let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        let name = name.as_str().to_ascii_lowercase();
        if TRANSPORT_HEADERS.contains(&name.as_str()) {
            continue;
        }
        if let Ok(value) = value.to_str() {
            out.entry(name).or_default().push(value.to_string());
        }
    }
    out
}
