//! The check engine: evaluates first-class and user-registered checks
//! against a frozen per-call context (§4.5).

mod context;
mod engine;
mod report;
pub mod truth;

pub use context::{CheckContext, RequestView, ResponseView, StateFirstError};
pub use engine::{CheckEngine, UserCheck};
pub use report::{CheckOutcome, CheckReport, CheckResult};

/// A single check's failure, as surfaced to [`crate::error::FuzzError`].
#[derive(Debug, Clone, derive_more::Error, derive_more::Display)]
#[display("{name}: {}", messages.join("; "))]
pub struct CheckFailure {
    /// The failing check's name.
    pub name: String,
    /// One or more human-readable failure messages.
    pub messages: Vec<String>,
}

impl CheckFailure {
    /// Builds a [`CheckFailure`] from the first failing result in a report,
    /// if any.
    #[must_use]
    pub fn from_report(report: &CheckReport) -> Option<Self> {
        let failure = report.first_failure()?;
        let messages = match &failure.outcome {
            CheckOutcome::Fail(messages) => messages.clone(),
            CheckOutcome::StateFirst(message) => vec![message.clone()],
            CheckOutcome::Pass => return None,
        };
        Some(Self {
            name: failure.name.clone(),
            messages,
        })
    }
}
