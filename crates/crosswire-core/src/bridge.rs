//! The capability contract every transport bridge implements.

use crate::error::TransportResult;
use crate::request::RequestDescriptor;
use crate::response::ResponseDescriptor;
use async_trait::async_trait;

/// Adapter over one concrete HTTP client library.
///
/// A bridge instance may be shared across many concurrent `execute`
/// calls; implementations must not share mutable per-call state.
/// Transport-library error types never cross this boundary; they are
/// translated into [`crate::TransportError`] inside the bridge.
///
/// Given the same descriptor and a reachable endpoint, all bridges must
/// produce assertion-equivalent responses: same status, same header
/// semantics (ignoring transport-added headers), identical body bytes.
#[async_trait]
pub trait Bridge: Send + Sync {
    /// Stable bridge name, recorded in response transport metadata.
    fn name(&self) -> &'static str;

    /// Perform the HTTP call described by `request`.
    ///
    /// Implementations must release any held connection or stream on
    /// every exit path, including cancellation of the returned future.
    async fn execute(&self, request: &RequestDescriptor) -> TransportResult<ResponseDescriptor>;
}
