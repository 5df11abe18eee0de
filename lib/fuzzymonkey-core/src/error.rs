//! Top-level error type for the fuzzing runtime.
//!
//! Individual subsystems (IR, config, check engine, resetter, HTTP caller)
//! define their own `derive_more`-based error enums; [`FuzzError`] wraps each
//! of them into the recovery-table kinds of the design (§7): some variants
//! are purely local data returned to the coordinator, the rest are fatal and
//! end the campaign after a single `Resetter::terminate` call.

use crate::check::CheckFailure;
use crate::config::ConfigError;
use crate::normalizer::SpecError;
use crate::resetter::ResetterError;
use crate::validator::ValidatorError;

/// Errors that can terminate or otherwise affect a fuzzing campaign.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum FuzzError {
    /// The user configuration script failed to load. No campaign starts.
    #[display("invalid configuration: {_0}")]
    ConfigInvalid(ConfigError),

    /// The OpenAPI document could not be normalized into a schema IR. No campaign starts.
    #[display("invalid spec: {_0}")]
    SpecInvalid(SpecError),

    /// Returned as structured data from the validator; never aborts a campaign by itself.
    #[display("{_0}")]
    Validator(ValidatorError),

    /// The resetter's subprocess exited non-zero. Ends the campaign with
    /// `FailureDueToResetterError`, never bubbles as a generic failure.
    #[display("resetter error: {_0}")]
    Resetter(ResetterError),

    /// A send/receive on the coordinator stream did not complete within `tx_timeout`.
    #[display("timed out waiting on coordinator stream")]
    TxTimeout,

    /// The server sent a message kind the client did not expect in the current state.
    #[display("unexpected server message: {kind}")]
    #[from(skip)]
    UnexpectedServerMessage {
        /// Debug-formatted tag of the message that was not expected.
        kind: String,
    },

    /// The campaign's cancellation signal fired.
    #[display("campaign cancelled")]
    Cancelled,

    /// A user or first-class check failed. Reported in `checks_report`; the
    /// campaign continues — the coordinator decides what happens next.
    #[display("check failed: {_0}")]
    Check(CheckFailure),
}

impl FuzzError {
    /// Whether this error is fatal to the campaign (ends the Runtime state machine),
    /// as opposed to being local data handed back to the coordinator.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::Validator(_) | Self::Check(_) | Self::Resetter(_)
        )
    }
}
