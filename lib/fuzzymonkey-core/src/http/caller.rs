//! Builds and issues HTTP requests against the SUT (§4.7 "HTTPCaller").

use std::time::{Duration, Instant};

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::check::{RequestView, ResponseView};

use super::capture::Capture;
use super::skeleton::RequestSkeleton;

/// Transport-level timeouts, matching §4.7's fixed table.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const TLS_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const EXPECT_CONTINUE_TIMEOUT: Duration = Duration::from_secs(1);
const POOL_MAX_IDLE_PER_HOST: usize = 100;

/// Errors building the client or issuing a call.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum CallerError {
    /// The `reqwest::Client` could not be constructed from the configured timeouts.
    #[display("failed to build HTTP client: {_0}")]
    ClientBuild(reqwest::Error),
    /// The request itself failed (connect error, timeout, TLS failure, …).
    #[display("request failed: {_0}")]
    Request(reqwest::Error),
    /// The base URL plus skeleton path did not form a valid URL.
    #[display("invalid request URL: {_0}")]
    #[from(skip)]
    InvalidUrl(String),
}

/// Issues calls against one base URL, with the fixed transport timeouts and
/// connection-pool sizing of §4.7, optionally stamping every request with
/// an `Authorization` header and a `User-Agent`.
#[derive(Debug, Clone)]
pub struct HttpCaller {
    client: reqwest::Client,
    base_url: url::Url,
    api_key: Option<String>,
    user_agent: String,
}

impl HttpCaller {
    /// Builds a caller against `base_url`, applying the fixed §4.7 timeouts
    /// (30s connect, 10s TLS handshake, 90s idle, 1s expect-continue, 100
    /// max idle connections per host, dual-stack DNS via the OS resolver).
    ///
    /// # Errors
    /// Returns [`CallerError::ClientBuild`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(base_url: url::Url, api_key: Option<String>, user_agent: impl Into<String>) -> Result<Self, CallerError> {
        // reqwest exposes no separate TLS-handshake or expect-continue knobs
        // (both fold into hyper's connector internals); fold their budgets
        // into the one overall per-request ceiling reqwest does expose.
        let request_timeout = CONNECT_TIMEOUT + TLS_HANDSHAKE_TIMEOUT + EXPECT_CONTINUE_TIMEOUT;
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(request_timeout)
            .pool_idle_timeout(IDLE_TIMEOUT)
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .tcp_keepalive(IDLE_TIMEOUT)
            .build()?;
        debug!(
            ?CONNECT_TIMEOUT,
            ?TLS_HANDSHAKE_TIMEOUT,
            ?EXPECT_CONTINUE_TIMEOUT,
            ?request_timeout,
            "HTTP caller configured"
        );
        Ok(Self {
            client,
            base_url,
            api_key,
            user_agent: user_agent.into(),
        })
    }

    /// Issues one call described by `skeleton`, returning the full capture.
    ///
    /// # Errors
    /// Returns [`CallerError`] if the URL cannot be built or the request fails.
    pub async fn call(&self, skeleton: &RequestSkeleton) -> Result<Capture, CallerError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| CallerError::InvalidUrl(skeleton.path.clone()))?;
            segments.pop_if_empty();
            for segment in skeleton.path.split('/').filter(|s| !s.is_empty()) {
                segments.push(segment);
            }
        }
        if !skeleton.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &skeleton.query {
                pairs.append_pair(key, value);
            }
        }

        let method = reqwest::Method::from_bytes(skeleton.method.as_bytes())
            .map_err(|_| CallerError::InvalidUrl(skeleton.method.clone()))?;
        let mut builder = self
            .client
            .request(method, url)
            .header(reqwest::header::USER_AGENT, &self.user_agent);

        for (name, value) in &skeleton.headers {
            builder = builder.header(name, value);
        }
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }
        if let Some(body) = &skeleton.body {
            builder = builder.json(body);
        }

        let request_headers = skeleton.headers.clone();
        let start = Instant::now();
        let response = builder.send().await?;
        let status_code = response.status().as_u16();
        let mut response_headers = IndexMap::with_capacity(response.headers().len());
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                response_headers.insert(name.as_str().to_ascii_lowercase(), value.to_string());
            }
        }
        let content_type_is_json = response_headers
            .get("content-type")
            .is_some_and(|ct| ct.contains("json"));
        let body_bytes = response.bytes().await?;
        let elapsed = start.elapsed();

        let json_body = if content_type_is_json && !body_bytes.is_empty() {
            match serde_json::from_slice(&body_bytes) {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(%err, "response declared JSON content-type but did not parse");
                    None
                }
            }
        } else {
            None
        };

        Ok(Capture {
            request: RequestView {
                method: skeleton.method.clone(),
                path: skeleton.path.clone(),
                headers: request_headers,
                body: skeleton.body.clone(),
            },
            response: ResponseView {
                status_code,
                headers: response_headers,
                body: body_bytes.to_vec(),
                json_body,
            },
            elapsed,
        })
    }
}
