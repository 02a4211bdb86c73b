//! Transport bridges for the crosswire bridge model.
//!
//! Each bridge adapts one HTTP client stack to the
//! [`Bridge`](crosswire_core::Bridge) trait and is compiled behind its
//! own cargo feature. All bridges honor the same behavioral contract:
//! identical status/header/body view for the same exchange, transport
//! errors translated into [`TransportError`](crosswire_core::TransportError),
//! and resources released when the in-flight future is dropped.

// Conditional compilation for each bridge
#[cfg(feature = "reqwest")]
pub mod reqwest_bridge;

#[cfg(feature = "ureq")]
pub mod ureq_bridge;

#[cfg(feature = "hyper")]
pub mod hyper_bridge;

// Re-export bridge types when enabled
#[cfg(feature = "reqwest")]
pub use reqwest_bridge::ReqwestBridge;

#[cfg(feature = "ureq")]
pub use ureq_bridge::UreqBridge;

#[cfg(feature = "hyper")]
pub use hyper_bridge::HyperBridge;
