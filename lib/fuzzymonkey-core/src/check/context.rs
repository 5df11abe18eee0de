//! The frozen context a check evaluates against (§4.5).

use std::cell::{Cell, Ref, RefCell};

use crate::config::{State, StateError, Value};

use super::report::CheckOutcome;

/// A read-only view of the HTTP request the SUT was sent.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RequestView {
    /// HTTP method, upper-case.
    pub method: String,
    /// The request path actually sent, including any path-parameter substitution.
    pub path: String,
    /// Request headers, lower-cased names.
    pub headers: indexmap::IndexMap<String, String>,
    /// The request body, if any, parsed as JSON.
    pub body: Option<serde_json::Value>,
}

/// A read-only view of the HTTP response the SUT returned.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResponseView {
    /// The numeric status code.
    pub status_code: u16,
    /// Response headers, lower-cased names.
    pub headers: indexmap::IndexMap<String, String>,
    /// The raw response body bytes.
    pub body: Vec<u8>,
    /// The response body parsed as JSON, if it parsed and `Content-Type` was JSON.
    pub json_body: Option<serde_json::Value>,
}

/// Violates the state-first access rule (§4.5, §8 Scenario 2): once
/// `ctx.state()` has been read inside a check, that same check may not go
/// on to read `ctx.request()`/`ctx.response()`.
#[derive(Debug, Clone, derive_more::Error, derive_more::Display)]
#[display("ctx.{field}() read after ctx.state() in the same check")]
pub struct StateFirstError {
    /// The field the check tried to read after already reading `state`.
    pub field: &'static str,
}

impl From<StateFirstError> for CheckOutcome {
    fn from(err: StateFirstError) -> Self {
        Self::StateFirst(err.to_string())
    }
}

/// The frozen context passed to every check for one call (§4.5: "exposes
/// request/response/state as a frozen context").
///
/// `request`/`response` never change once built; `state` is interior-
/// mutable so a check may write it back (§3: state "may only be mutated
/// through the CheckEngine during check evaluation"). Access order is
/// tracked per check: once [`CheckContext::state`] has been called, that
/// same check's further calls to [`CheckContext::request`]/
/// [`CheckContext::response`] return [`StateFirstError`] instead of a
/// view. [`CheckContext::reset_access_tracking`] clears this between
/// checks so the rule stays scoped to "the same check", not the whole
/// report.
#[derive(Debug)]
pub struct CheckContext {
    state: RefCell<State>,
    request: RequestView,
    response: ResponseView,
    state_read: Cell<bool>,
}

impl CheckContext {
    /// Builds a frozen context over one call's request/response, seeded
    /// with a snapshot of the campaign state.
    #[must_use]
    pub fn new(state: &State, request: RequestView, response: ResponseView) -> Self {
        Self {
            state: RefCell::new(state.clone()),
            request,
            response,
            state_read: Cell::new(false),
        }
    }

    /// Clears the state-first access tracker. Called by [`super::CheckEngine`]
    /// before each check runs, so a prior check's `state()` read cannot
    /// poison a later check's `request()`/`response()` reads.
    pub fn reset_access_tracking(&self) {
        self.state_read.set(false);
    }

    /// Reads the campaign state snapshot, marking it read for this check.
    #[must_use]
    pub fn state(&self) -> Ref<'_, State> {
        self.state_read.set(true);
        self.state.borrow()
    }

    /// Reads one state entry by key, marking state read for this check.
    #[must_use]
    pub fn state_get(&self, key: &str) -> Option<Value> {
        self.state_read.set(true);
        self.state.borrow().get(key).cloned()
    }

    /// Writes one state entry, marking state read for this check (a write
    /// observes the prior value's slot the same way a read would).
    ///
    /// # Errors
    /// Returns [`StateError`] if `key` violates the naming invariant.
    pub fn set_state(&self, key: impl Into<String>, value: Value) -> Result<(), StateError> {
        self.state_read.set(true);
        self.state.borrow_mut().set(key, value)
    }

    /// The request sent to the SUT.
    ///
    /// # Errors
    /// Returns [`StateFirstError`] if this check already read `state()`.
    pub fn request(&self) -> Result<&RequestView, StateFirstError> {
        if self.state_read.get() {
            return Err(StateFirstError { field: "request" });
        }
        Ok(&self.request)
    }

    /// The response the SUT returned.
    ///
    /// # Errors
    /// Returns [`StateFirstError`] if this check already read `state()`.
    pub fn response(&self) -> Result<&ResponseView, StateFirstError> {
        if self.state_read.get() {
            return Err(StateFirstError { field: "response" });
        }
        Ok(&self.response)
    }

    /// Direct, untracked access to the request view, for the engine's own
    /// fixed first-class checks (which never read `state()` and so cannot
    /// trip the state-first rule, but are not user closures subject to it).
    pub(crate) fn request_raw(&self) -> &RequestView {
        &self.request
    }

    /// Direct, untracked access to the response view. See [`Self::request_raw`].
    pub(crate) fn response_raw(&self) -> &ResponseView {
        &self.response
    }

    /// Takes the final state, after any checks have written to it, for the
    /// runtime to carry forward into the next call.
    #[must_use]
    pub fn into_state(self) -> State {
        self.state.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> CheckContext {
        CheckContext::new(
            &State::default(),
            RequestView {
                method: "GET".to_string(),
                path: "/pets/1".to_string(),
                headers: indexmap::IndexMap::new(),
                body: None,
            },
            ResponseView {
                status_code: 200,
                headers: indexmap::IndexMap::new(),
                body: Vec::new(),
                json_body: None,
            },
        )
    }

    #[test]
    fn request_and_response_read_before_state_succeed() {
        let ctx = ctx();
        assert!(ctx.request().is_ok());
        assert!(ctx.response().is_ok());
    }

    #[test]
    fn reading_response_after_state_is_rejected() {
        let ctx = ctx();
        let _ = ctx.state();
        assert!(matches!(ctx.response(), Err(StateFirstError { field: "response" })));
        assert!(matches!(ctx.request(), Err(StateFirstError { field: "request" })));
    }

    #[test]
    fn reset_access_tracking_clears_the_violation_for_the_next_check() {
        let ctx = ctx();
        let _ = ctx.state();
        assert!(ctx.response().is_err());
        ctx.reset_access_tracking();
        assert!(ctx.response().is_ok());
    }

    #[test]
    fn set_state_writes_back_and_is_visible_via_into_state() {
        let ctx = ctx();
        ctx.set_state("counter", Value::Int(1)).expect("valid key");
        let state = ctx.into_state();
        assert_eq!(state.get("counter"), Some(&Value::Int(1)));
    }
}
