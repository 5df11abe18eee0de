//! Endpoint table: the HTTP surface extracted from an OpenAPI document (§3 "Endpoint").

use std::collections::BTreeMap;

use crate::ir::OptSid;

/// One fragment of a tokenized path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPartial {
    /// A literal path segment, possibly multi-segment (e.g. a base path).
    Literal(String),
    /// A `{name}` path parameter placeholder.
    Param(String),
}

/// Where a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// The (JSON) request body.
    Body,
    /// A path template placeholder.
    Path,
    /// A query string parameter.
    Query,
    /// An HTTP header.
    Header,
    /// A cookie.
    Cookie,
}

/// One declared input to an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Where this parameter is read from.
    pub kind: ParamKind,
    /// Its name (header/query/cookie/path name, or a synthetic name for `body`).
    pub name: String,
    /// Whether the endpoint requires this parameter to be present.
    pub required: bool,
    /// The schema SID describing valid values, or absent (SID 0).
    pub sid: OptSid,
}

/// A response-code discriminator (§ Glossary "Bucket").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bucket {
    /// The OpenAPI `"default"` response.
    Default,
    /// An `"1XX"`..`"5XX"` status-code class.
    Class(u8),
    /// A concrete three-digit status code in `[100, 599]`.
    Code(u16),
}

/// Errors parsing a response-code bucket key (§4.3, §8 "Boundary behaviors").
#[derive(Debug, Clone, derive_more::Error, derive_more::Display)]
#[display("invalid response bucket: {_0:?}")]
pub struct InvalidBucket(pub String);

impl Bucket {
    /// Parses a response map key into a [`Bucket`], per §4.3 and the §8
    /// boundary table: `"default"`, `"1XX"`..`"5XX"`, and `"100"`..`"599"`
    /// are accepted; everything else (`"099"`, `"600"`, `"5xx"`, `""`,
    /// `"6XX"`) is a fatal spec error.
    pub fn parse(key: &str) -> Result<Self, InvalidBucket> {
        if key == "default" {
            return Ok(Self::Default);
        }
        let bytes = key.as_bytes();
        if bytes.len() == 3 && bytes[1] == b'X' && bytes[2] == b'X' {
            if let Some(class) = (b'1'..=b'5').position(|d| d == bytes[0]) {
                return Ok(Self::Class(class as u8 + 1));
            }
            return Err(InvalidBucket(key.to_string()));
        }
        if key.len() == 3 && key.bytes().all(|b| b.is_ascii_digit()) {
            let code: u16 = key.parse().map_err(|_| InvalidBucket(key.to_string()))?;
            if (100..=599).contains(&code) {
                return Ok(Self::Code(code));
            }
        }
        Err(InvalidBucket(key.to_string()))
    }

    /// Numeric discriminator matching the Go original's `xxx2uint32` table
    /// (`default` → 0, `1XX`..`5XX` → 1..5, concrete codes pass through).
    #[must_use]
    pub fn as_u32(self) -> u32 {
        match self {
            Self::Default => 0,
            Self::Class(class) => u32::from(class),
            Self::Code(code) => u32::from(code),
        }
    }
}

/// An HTTP method + path + declared inputs/outputs (§3 "Endpoint").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// HTTP method, upper-case (`GET`, `POST`, …).
    pub method: String,
    /// Tokenized path template, base-path-prefixed.
    pub path_partials: Vec<PathPartial>,
    /// Declared inputs, in authoring order.
    pub inputs: Vec<Param>,
    /// Declared outputs, keyed by bucket; SID absent means "no body schema".
    pub outputs: BTreeMap<Bucket, OptSid>,
}

impl Endpoint {
    /// Reconstructs the path template string, e.g. `/pets/{id}`.
    #[must_use]
    pub fn path_template(&self) -> String {
        self.path_partials
            .iter()
            .map(|p| match p {
                PathPartial::Literal(lit) => lit.clone(),
                PathPartial::Param(name) => format!("{{{name}}}"),
            })
            .collect()
    }
}

/// The full set of endpoints extracted from an OpenAPI document, in
/// deterministic (path, then method) lexicographic order (§4.1).
pub type EndpointTable = Vec<Endpoint>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_boundary_buckets() {
        for ok in ["default", "1XX", "5XX", "100", "599", "200"] {
            assert!(Bucket::parse(ok).is_ok(), "{ok} should be accepted");
        }
    }

    #[test]
    fn rejects_out_of_range_and_malformed_buckets() {
        for bad in ["099", "600", "5xx", "", "6XX"] {
            assert!(Bucket::parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn class_numeric_discriminator_matches_original_table() {
        assert_eq!(Bucket::Default.as_u32(), 0);
        assert_eq!(Bucket::parse("3XX").unwrap().as_u32(), 3);
        assert_eq!(Bucket::parse("404").unwrap().as_u32(), 404);
    }

    #[test]
    fn path_template_round_trips() {
        let endpoint = Endpoint {
            method: "GET".to_string(),
            path_partials: vec![
                PathPartial::Literal("/pets/".to_string()),
                PathPartial::Param("id".to_string()),
            ],
            inputs: vec![],
            outputs: BTreeMap::new(),
        };
        assert_eq!(endpoint.path_template(), "/pets/{id}");
    }
}
