//! HAR-like request skeleton handed down by the coordinator (§4.7).

use indexmap::IndexMap;

/// A fully-resolved HTTP request, as the coordinator describes it: method,
/// path (with path parameters already substituted), query parameters,
/// headers, and an optional JSON body.
///
/// Named "skeleton" because it carries no scheme/host/auth — those are
/// filled in by [`super::caller::HttpCaller`] from campaign-level
/// configuration, never by the coordinator.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RequestSkeleton {
    /// HTTP method, upper-case.
    pub method: String,
    /// The request path, including path-parameter substitution, starting with `/`.
    pub path: String,
    /// Query parameters, in declaration order.
    pub query: Vec<(String, String)>,
    /// Request headers, in declaration order. Header names are case-insensitive
    /// but preserved as authored for HAR-like capture fidelity.
    pub headers: IndexMap<String, String>,
    /// The JSON request body, if any.
    pub body: Option<serde_json::Value>,
}

impl RequestSkeleton {
    /// Builds a skeleton with no query parameters, headers, or body.
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            query: Vec::new(),
            headers: IndexMap::new(),
            body: None,
        }
    }
}
