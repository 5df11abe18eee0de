//! Structured request/response capture for one call (§4.7).

use std::time::Duration;

use crate::check::{RequestView, ResponseView};

/// One call's full capture: the request actually sent, the response
/// actually received, and the round-trip-only elapsed time (excludes
/// connection setup counted against the transport-level timeouts, per
/// §4.7: "elapsed timing covers the round trip only").
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Capture {
    /// The request sent to the SUT.
    pub request: RequestView,
    /// The response the SUT returned.
    pub response: ResponseView,
    /// Wall-clock time from first byte of the request to last byte of the response.
    pub elapsed: Duration,
}
