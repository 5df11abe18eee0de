//! # fuzzymonkey-core
//!
//! Property-based fuzzing for HTTP APIs described by an OpenAPI v3
//! document: a schema intermediate representation and JSON Schema
//! validator ([`ir`], [`validator`]), an embedded user-configuration
//! sandbox ([`config`]), a check engine evaluating first-class and
//! user-defined assertions against every call ([`check`]), SUT lifecycle
//! management via shell subprocesses ([`resetter`]), an HTTP transport
//! ([`http`]), and the coordinator-driven fuzzing loop itself ([`runtime`]).
//!
//! ## Quick start
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let sandbox = fuzzymonkey_core::config::load(r#"
//! api = OpenAPIv3(
//!     file = "openapi.yml",
//!     ExecStart = "docker compose up -d",
//!     ExecReset = "docker compose restart sut",
//! )
//! "#)?;
//! assert_eq!(sandbox.modelers.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! Normalizing the OpenAPI document itself and driving a campaign is the
//! job of [`normalizer::SpecNormalizer`] and [`runtime::Runtime`] — see
//! their module docs for the full pipeline.

pub mod check;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod ir;
pub mod normalizer;
pub mod resetter;
pub mod runtime;
pub mod validator;

pub use error::FuzzError;
