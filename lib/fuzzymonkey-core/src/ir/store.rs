use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::{debug, trace};

use super::body::{AdditionalProperties, Format, Literal, NumericBound, SchemaBody};
use super::sid::Sid;

/// A single admitted node: either a pointer to another node (a resolved
/// `$ref`) or a concrete, de-duplicated schema body.
#[derive(Debug, Clone)]
pub enum IrEntry {
    /// An absolute `$ref` anchor. `target_sid` is `None` only transiently,
    /// between pre-seed and seed (§4.1 admission protocol).
    Ref {
        /// The JSON Pointer naming this anchor, e.g. `#/components/schemas/Pet`.
        abs_ref: String,
        /// The concrete (or further-Ref) node this anchor currently resolves to.
        target_sid: Option<Sid>,
    },
    /// A concrete, structurally de-duplicated schema body.
    Inline(SchemaBody),
}

/// Errors raised while constructing or querying the schema IR.
#[derive(Debug, Clone, derive_more::Error, derive_more::Display)]
pub enum IrError {
    /// A `$ref` was used before it was pre-seeded — a fatal IR bug per §4.1,
    /// never silently created.
    #[display("$ref '{_0}' was not pre-seeded before admission")]
    RefNotPreSeeded(String),

    /// `resolve` walked more Ref hops than there are entries in the store,
    /// which can only happen if the no-cycles-through-refs invariant was
    /// violated by a caller bypassing the admission protocol.
    #[display("$ref cycle detected resolving sid {_0}")]
    RefCycle(Sid),

    /// `resolve` or `to_json` was asked about a SID this store never admitted.
    #[display("unknown sid {_0}")]
    UnknownSid(Sid),

    /// A Ref entry's `target_sid` is still unset (seed phase incomplete).
    #[display("$ref '{_0}' was pre-seeded but never seeded")]
    RefUnseeded(String),

    /// Defensive recursion-depth guard for [`SchemaIr::to_json`]; real OpenAPI
    /// documents cannot encode an Inline-only cycle (any cycle must pass
    /// through at least one `$ref` hop), so this indicates a store invariant
    /// violation rather than a normal document shape.
    #[display("schema body nesting exceeded {_0} levels materializing sid {_1}; suspect an inline-only cycle")]
    InlineTooDeep(usize, Sid),
}

const MAX_INLINE_DEPTH: usize = 256;

/// Canonical, de-duplicated schema store keyed by [`Sid`] (§3, §4.1).
#[derive(Debug, Default)]
pub struct SchemaIr {
    entries: Vec<IrEntry>,
    ref_index: IndexMap<String, Sid>,
    dedup_index: HashMap<u64, Vec<Sid>>,
}

impl SchemaIr {
    /// Creates an empty store with room pre-reserved for `capacity` schemas.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            ref_index: IndexMap::with_capacity(capacity),
            dedup_index: HashMap::with_capacity(capacity),
        }
    }

    fn allocate(&mut self, entry: IrEntry) -> Sid {
        self.entries.push(entry);
        Sid::new(self.entries.len() as u32)
    }

    fn entry(&self, sid: Sid) -> Result<&IrEntry, IrError> {
        self.entries
            .get(sid.index())
            .ok_or(IrError::UnknownSid(sid))
    }

    /// Reserves a SID for `abs_ref` and installs a placeholder `Ref` entry
    /// whose target is not yet known. Must be called for every schema name
    /// before any body referencing it (by name) is admitted.
    pub fn pre_seed(&mut self, abs_ref: impl Into<String>) -> Sid {
        let abs_ref = abs_ref.into();
        trace!(%abs_ref, "pre-seeding ref");
        let sid = self.allocate(IrEntry::Ref {
            abs_ref: abs_ref.clone(),
            target_sid: None,
        });
        self.ref_index.insert(abs_ref, sid);
        sid
    }

    /// Overwrites a pre-seeded ref's target with the concrete SID its body
    /// resolved to. Called once per schema name during the seed pass.
    pub fn resolve_pre_seeded(&mut self, abs_ref: &str, target_sid: Sid) -> Result<(), IrError> {
        let ref_sid = *self
            .ref_index
            .get(abs_ref)
            .ok_or_else(|| IrError::RefNotPreSeeded(abs_ref.to_string()))?;
        debug!(%abs_ref, %target_sid, "seeding ref");
        self.entries[ref_sid.index()] = IrEntry::Ref {
            abs_ref: abs_ref.to_string(),
            target_sid: Some(target_sid),
        };
        Ok(())
    }

    /// The admission entry point (`ensureMapped` in the design notes).
    ///
    /// If `r#ref` names an absolute ref, returns its pre-seeded SID — fatal
    /// if it was never pre-seeded. Otherwise de-duplicates `body`
    /// structurally, returning a shared SID on a structural-equality hit or
    /// allocating a fresh one on miss.
    pub fn ensure_mapped(
        &mut self,
        r#ref: Option<&str>,
        body: SchemaBody,
    ) -> Result<Sid, IrError> {
        if let Some(r#ref) = r#ref {
            return self
                .ref_index
                .get(r#ref)
                .copied()
                .ok_or_else(|| IrError::RefNotPreSeeded(r#ref.to_string()));
        }

        let fingerprint = fingerprint_of(&body);
        if let Some(candidates) = self.dedup_index.get(&fingerprint) {
            for &candidate in candidates {
                if let Ok(IrEntry::Inline(existing)) = self.entry(candidate) {
                    if existing == &body {
                        return Ok(candidate);
                    }
                }
            }
        }

        let sid = self.allocate(IrEntry::Inline(body));
        self.dedup_index.entry(fingerprint).or_default().push(sid);
        Ok(sid)
    }

    /// Resolves a SID through any number of Ref hops to its Inline body,
    /// returning the terminal SID (§3 invariant: this always terminates in
    /// finite steps and yields an Inline entry).
    pub fn resolve(&self, sid: Sid) -> Result<Sid, IrError> {
        let mut current = sid;
        for _ in 0..=self.entries.len() {
            match self.entry(current)? {
                IrEntry::Inline(_) => return Ok(current),
                IrEntry::Ref {
                    target_sid: Some(next),
                    ..
                } => current = *next,
                IrEntry::Ref {
                    abs_ref,
                    target_sid: None,
                } => return Err(IrError::RefUnseeded(abs_ref.clone())),
            }
        }
        Err(IrError::RefCycle(sid))
    }

    /// Resolves a SID and returns its concrete body.
    pub fn resolve_body(&self, sid: Sid) -> Result<&SchemaBody, IrError> {
        let terminal = self.resolve(sid)?;
        match self.entry(terminal)? {
            IrEntry::Inline(body) => Ok(body),
            IrEntry::Ref { .. } => Err(IrError::RefCycle(sid)),
        }
    }

    /// Looks up a SID by its absolute ref, if known.
    #[must_use]
    pub fn sid_for_ref(&self, abs_ref: &str) -> Option<Sid> {
        self.ref_index.get(abs_ref).copied()
    }

    /// Returns the raw entry for a SID, mainly for tests and diagnostics.
    pub fn raw_entry(&self, sid: Sid) -> Result<&IrEntry, IrError> {
        self.entry(sid)
    }

    /// Materializes a SID back into a generic JSON Schema map ("toGo" in the
    /// source). A `Ref` entry materializes as a one-key `{"$ref": ...}`
    /// object — the caller (the [`crate::validator::Validator`]) is expected
    /// to have separately registered every `abs_ref` with its schema
    /// compiler, so this never needs to recurse through a Ref.
    pub fn to_json(&self, sid: Sid) -> Result<serde_json::Value, IrError> {
        self.to_json_depth(sid, 0)
    }

    fn to_json_depth(&self, sid: Sid, depth: usize) -> Result<serde_json::Value, IrError> {
        if depth > MAX_INLINE_DEPTH {
            return Err(IrError::InlineTooDeep(MAX_INLINE_DEPTH, sid));
        }
        match self.entry(sid)? {
            IrEntry::Ref { abs_ref, .. } => {
                Ok(serde_json::json!({ "$ref": abs_ref }))
            }
            IrEntry::Inline(body) => self.body_to_json(body, depth),
        }
    }

    #[expect(clippy::too_many_lines, reason = "mirrors the flat keyword-by-keyword mapping in the original source")]
    fn body_to_json(&self, body: &SchemaBody, depth: usize) -> Result<serde_json::Value, IrError> {
        let mut map = serde_json::Map::new();

        if !body.r#enum.is_empty() {
            map.insert(
                "enum".to_string(),
                serde_json::Value::Array(body.r#enum.iter().map(Literal::to_json).collect()),
            );
        }
        if !body.types.is_empty() {
            map.insert(
                "type".to_string(),
                serde_json::Value::Array(
                    body.types.iter().cloned().map(serde_json::Value::String).collect(),
                ),
            );
        }
        match &body.format {
            Format::None => {}
            Format::DateTime => {
                map.insert("format".to_string(), serde_json::Value::String("date-time".to_string()));
            }
            Format::UriReference => {
                map.insert(
                    "format".to_string(),
                    serde_json::Value::String("uri-reference".to_string()),
                );
            }
            Format::Other(other) => {
                map.insert("format".to_string(), serde_json::Value::String(other.clone()));
            }
        }
        if let Some(min_length) = body.min_length {
            map.insert("minLength".to_string(), serde_json::json!(min_length));
        }
        if let Some(max_length) = body.max_length {
            map.insert("maxLength".to_string(), serde_json::json!(max_length));
        }
        if let Some(pattern) = &body.pattern {
            map.insert("pattern".to_string(), serde_json::Value::String(pattern.clone()));
        }
        if let Some(minimum) = body.minimum {
            map.insert("minimum".to_string(), serde_json::json!(minimum.value));
            if minimum.exclusive {
                map.insert("exclusiveMinimum".to_string(), serde_json::Value::Bool(true));
            }
        }
        if let Some(maximum) = body.maximum {
            map.insert("maximum".to_string(), serde_json::json!(maximum.value));
            if maximum.exclusive {
                map.insert("exclusiveMaximum".to_string(), serde_json::Value::Bool(true));
            }
        }
        if let Some(multiple_of) = body.multiple_of() {
            map.insert("multipleOf".to_string(), serde_json::json!(multiple_of));
        }
        if body.unique_items {
            map.insert("uniqueItems".to_string(), serde_json::Value::Bool(true));
        }
        if let Some(min_items) = body.min_items {
            map.insert("minItems".to_string(), serde_json::json!(min_items));
        }
        if let Some(max_items) = body.max_items {
            map.insert("maxItems".to_string(), serde_json::json!(max_items));
        }
        if !body.items.is_empty() {
            let items = body
                .items
                .iter()
                .map(|&sid| self.to_json_depth(sid, depth + 1))
                .collect::<Result<Vec<_>, _>>()?;
            map.insert("items".to_string(), serde_json::Value::Array(items));
        }
        if let Some(min_properties) = body.min_properties {
            map.insert("minProperties".to_string(), serde_json::json!(min_properties));
        }
        if let Some(max_properties) = body.max_properties {
            map.insert("maxProperties".to_string(), serde_json::json!(max_properties));
        }
        if !body.properties.is_empty() {
            let mut properties = serde_json::Map::new();
            for (name, &sid) in &body.properties {
                properties.insert(name.clone(), self.to_json_depth(sid, depth + 1)?);
            }
            map.insert("properties".to_string(), serde_json::Value::Object(properties));
        }
        if !body.required.is_empty() {
            map.insert(
                "required".to_string(),
                serde_json::Value::Array(
                    body.required.iter().cloned().map(serde_json::Value::String).collect(),
                ),
            );
        }
        match &body.additional_properties {
            None => {}
            Some(AdditionalProperties::Forbidden) => {
                map.insert("additionalProperties".to_string(), serde_json::Value::Bool(false));
            }
            Some(AdditionalProperties::Allowed(None)) => {
                map.insert("additionalProperties".to_string(), serde_json::Value::Bool(true));
            }
            Some(AdditionalProperties::Allowed(Some(sid))) => {
                map.insert("additionalProperties".to_string(), self.to_json_depth(*sid, depth + 1)?);
            }
        }
        for (key, sids) in [
            ("allOf", &body.all_of),
            ("anyOf", &body.any_of),
            ("oneOf", &body.one_of),
        ] {
            if !sids.is_empty() {
                let of = sids
                    .iter()
                    .map(|&sid| self.to_json_depth(sid, depth + 1))
                    .collect::<Result<Vec<_>, _>>()?;
                map.insert(key.to_string(), serde_json::Value::Array(of));
            }
        }
        if let Some(not) = body.not {
            map.insert("not".to_string(), self.to_json_depth(not, depth + 1)?);
        }

        Ok(serde_json::Value::Object(map))
    }
}

/// A canonical byte fingerprint for structural de-duplication: sorted map
/// keys and a stable `Debug` rendering hashed with a fast non-cryptographic
/// hasher. This is the O(1)-lookup replacement the design notes (§9) call
/// for, in place of the source's linear "for each SID: structural-compare"
/// fallback — equality is still re-checked on hit since hashing is not
/// injective.
fn fingerprint_of(body: &SchemaBody) -> u64 {
    use std::hash::{Hash, Hasher};

    struct CanonicalHasher(std::collections::hash_map::DefaultHasher);
    let mut hasher = CanonicalHasher(std::collections::hash_map::DefaultHasher::new());
    format!("{body:?}").hash(&mut hasher.0);
    hasher.0.finish()
}
