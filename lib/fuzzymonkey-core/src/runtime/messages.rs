//! The coordinator protocol's message types (§4.8).

use crate::check::CheckReport;
use crate::http::{Capture, RequestSkeleton};

/// Everything the initial `Fuzz` message announces about this campaign
/// (§6 "Coordinator protocol": `Fuzz{EIDs, EnvRead, Model, ModelKind,
/// Ntensity, Resetter, Seed, Tags, Usage}`).
///
/// `endpoint_count` stands in for the source's `EIDs` (a list of endpoint
/// identifiers): this crate does not assign endpoints a separate identifier
/// beyond their position in the endpoint table, so the count is what the
/// coordinator gets to size its own bookkeeping.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FuzzAnnounce {
    /// How many endpoints the bound spec declares.
    pub endpoint_count: usize,
    /// Every environment variable name the configuration script read.
    pub env_read: Vec<String>,
    /// The modeler kind bound by the configuration script, e.g. `"OpenAPIv3"`.
    pub model_kind: String,
    /// Requested campaign intensity (total tests ≈ 10 × intensity).
    pub intensity: u32,
    /// Whether a resetter is bound (any of `ExecStart`/`ExecReset`/`ExecStop`).
    pub resetter_bound: bool,
    /// The PRNG seed driving this campaign, if overridden.
    pub seed: Option<u64>,
    /// Free-form campaign tags, e.g. from CI metadata.
    pub tags: Vec<String>,
    /// A human-readable description of what is invoking this campaign.
    pub usage: Option<String>,
}

/// The phase a [`ClientMessage::ResetProgress`] reports (§6, grounded in
/// the coordinator's `started`/`failed`/`ended` reset status constants).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ResetStatus {
    /// Sent before the reset hook runs.
    Started,
    /// The reset hook exited non-zero.
    Failed,
    /// The reset hook completed successfully.
    Ended,
}

/// A message the client (this crate) sends to the remote coordinator.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind")]
pub enum ClientMessage {
    /// Announces readiness to receive `Call`/`Reset` instructions.
    Fuzz(FuzzAnnounce),
    /// The result of executing a `Call` instruction: the full capture plus
    /// the checks run against it.
    CallResponse {
        /// The captured request/response exchange.
        capture: Capture,
        /// The check results for this call.
        checks: CheckReport,
    },
    /// Progress of an in-flight `Reset` instruction: one `Started` message
    /// before the resetter runs, then exactly one of `Ended`/`Failed`.
    ResetProgress {
        /// Which phase of the reset this message reports.
        status: ResetStatus,
        /// Time elapsed running the reset hook, in nanoseconds. Zero for `Started`.
        elapsed_ns: u64,
        /// Failure reasons, one per line. Empty unless `status` is `Failed`.
        reason: Vec<String>,
    },
    /// Whether the client will keep attempting to shrink the current
    /// failing case, in response to a [`ServerMessage::ShrinkHint`].
    ShrinkProgress {
        /// Whether another shrink attempt will be made.
        continuing: bool,
    },
}

/// A message the remote coordinator sends to the client.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind")]
pub enum ServerMessage {
    /// Instructs the client to issue one HTTP call.
    Call(RequestSkeleton),
    /// Instructs the client to run the resetter's reset hook.
    Reset,
    /// Reports overall campaign progress. A `terminal` message ends the
    /// campaign: the client selects its outcome from `success` and stops
    /// waiting for further instructions (§4.8).
    FuzzingProgress {
        /// Total test cases planned for this campaign.
        total_tests: u32,
        /// Total HTTP calls made so far.
        total_calls: u32,
        /// Total checks evaluated so far.
        total_checks: u32,
        /// HTTP calls made in the current (possibly bug-producing) test.
        test_calls: u32,
        /// Checks evaluated against the current test's calls.
        call_checks: u32,
        /// Whether no bug has been found so far.
        success: bool,
        /// Whether this is the campaign's final progress message.
        terminal: bool,
    },
    /// Indicates the current failing case may be reproducible with fewer
    /// calls; the client should replay a reduced sequence if its shrink
    /// budget allows (§4.8 "Shrinking").
    ShrinkHint,
}
