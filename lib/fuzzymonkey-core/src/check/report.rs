//! Check outcomes and per-call reports (§4.5).

/// What one check concluded about a call.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CheckOutcome {
    /// The check held.
    Pass,
    /// The check failed, with one or more human-readable messages.
    Fail(Vec<String>),
    /// The check violated the state-first access rule: it read `ctx.state()`
    /// and then went on to read `ctx.request()`/`ctx.response()` (§4.5).
    StateFirst(String),
}

impl CheckOutcome {
    /// Whether this outcome is a pass.
    #[must_use]
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// A named check's result for one call.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CheckResult {
    /// The check's name, as registered.
    pub name: String,
    /// Whether it is one of the three fixed first-class checks.
    pub first_class: bool,
    /// The outcome.
    pub outcome: CheckOutcome,
}

/// The ordered results of running every applicable check against one call.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CheckReport {
    /// Results in evaluation order: first-class checks, then user checks.
    pub results: Vec<CheckResult>,
}

impl CheckReport {
    /// Whether every check in this report passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.outcome.is_pass())
    }

    /// The first failing result, if any, in evaluation order.
    #[must_use]
    pub fn first_failure(&self) -> Option<&CheckResult> {
        self.results.iter().find(|r| !r.outcome.is_pass())
    }
}
