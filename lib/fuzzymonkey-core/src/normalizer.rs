//! OpenAPI v3 document → [`SchemaIr`] + [`EndpointTable`] (§4.3).
//!
//! Parsing the document itself is delegated to the `openapiv3` crate — the
//! "third-party library... assumed to deliver a syntactically valid
//! document" of §1. This module only normalizes what that crate hands back.

use std::collections::BTreeMap;

use openapiv3::{
    AdditionalProperties as OaAdditionalProperties, OpenAPI, Operation, Parameter, ParameterData,
    ParameterSchemaOrContent, PathItem, ReferenceOr, Schema, SchemaKind, StatusCode as OaStatusCode,
    Type as OaType,
};
use tracing::{debug, warn};

use crate::endpoint::{Bucket, Endpoint, EndpointTable, InvalidBucket, Param, ParamKind, PathPartial};
use crate::ir::{AdditionalProperties, Format, Literal, NumericBound, SchemaBody, SchemaIr};
use crate::validator::Validator;

const JSON_MIME: &str = "application/json";
const SCHEMA_REF_BASE: &str = "#/components/schemas/";

/// Errors normalizing an OpenAPI document into the schema IR.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum SpecError {
    /// A response map key was neither `default`, `NXX`, nor a concrete 3-digit code (§8).
    #[display("{_0}")]
    InvalidBucket(InvalidBucket),

    /// A `servers[0].url` entry did not start with `/` once its path component was extracted.
    #[display("server path must start with '/', got {_0:?}")]
    #[from(skip)]
    ServerPathNotAbsolute(String),

    /// A `$ref` used inline was not present in `components.schemas` at all —
    /// distinct from [`crate::ir::IrError::RefNotPreSeeded`], which fires
    /// only for refs under our own prefix that should have been pre-seeded.
    #[display("dangling $ref: {_0}")]
    #[from(skip)]
    DanglingRef(String),

    /// Schema IR admission failed.
    #[display("{_0}")]
    Ir(crate::ir::IrError),
}

/// Output of normalizing one OpenAPI document: the schema store, the
/// endpoint table, and a validator pre-loaded with every raw component
/// schema.
pub struct NormalizedSpec {
    /// The de-duplicated schema IR.
    pub ir: SchemaIr,
    /// Endpoints in deterministic (path, method) order.
    pub endpoints: EndpointTable,
    /// A validator whose loader already has every `components.schemas` entry.
    pub validator: Validator,
}

/// Extracts endpoints, parameters, request/response bodies, and schemas from
/// an OpenAPI v3 document into [`SchemaIr`] + [`EndpointTable`] (§4.3).
pub struct SpecNormalizer;

impl SpecNormalizer {
    /// Runs the full two-pass admission protocol (§4.1) over `doc`.
    pub fn normalize(doc: &OpenAPI) -> Result<NormalizedSpec, SpecError> {
        let schema_count = doc
            .components
            .as_ref()
            .map_or(0, |c| c.schemas.len());
        let mut ir = SchemaIr::with_capacity(schema_count.max(1));
        let mut validator = Validator::with_capacity(schema_count);

        let mut names: Vec<&String> = doc
            .components
            .as_ref()
            .map(|c| c.schemas.keys().collect())
            .unwrap_or_default();
        names.sort();

        debug!(count = names.len(), "pre-seeding component schemas");
        for name in &names {
            ir.pre_seed(format!("{SCHEMA_REF_BASE}{name}"));
        }

        debug!("seeding component schemas");
        for name in &names {
            let abs_ref = format!("{SCHEMA_REF_BASE}{name}");
            let schema_ref = &doc.components.as_ref().expect("checked above").schemas[*name];
            let ReferenceOr::Item(schema) = schema_ref else {
                return Err(SpecError::DanglingRef(abs_ref));
            };
            validator.register(abs_ref.clone(), schema_to_raw_json(schema));
            let sid = map_schema(&mut ir, schema)?;
            ir.resolve_pre_seeded(&abs_ref, sid)?;
        }

        let base_path = base_path_from_servers(&doc.servers)?;
        let endpoints = collect_endpoints(&mut ir, doc, &base_path)?;

        Ok(NormalizedSpec {
            ir,
            endpoints,
            validator,
        })
    }
}

/// The path component of `servers[0].url`; `"/"` if `servers` is empty; with
/// more than one server, the first is used with a diagnostic (§4.3).
fn base_path_from_servers(servers: &[openapiv3::Server]) -> Result<String, SpecError> {
    let Some(first) = servers.first() else {
        return Ok("/".to_string());
    };
    if servers.len() > 1 {
        warn!(count = servers.len(), "multiple servers declared, using the first");
    }
    let path = url::Url::parse(&first.url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| first.url.clone());
    if path.is_empty() {
        return Ok("/".to_string());
    }
    if !path.starts_with('/') {
        return Err(SpecError::ServerPathNotAbsolute(path));
    }
    Ok(path)
}

/// Tokenizes `path` on `{`/`}`: odd-indexed fragments (or the first if the
/// path starts with `{`) are `Param`, the rest are `Literal` (§4.3).
fn tokenize_path(path: &str) -> Vec<PathPartial> {
    let mut partials = Vec::new();
    let mut rest = path;
    let mut in_param = rest.starts_with('{');
    while !rest.is_empty() {
        let delim = if in_param { '}' } else { '{' };
        match rest.find(delim) {
            Some(idx) => {
                let (chunk, remainder) = rest.split_at(idx);
                let remainder = &remainder[1..];
                if in_param {
                    partials.push(PathPartial::Param(chunk.to_string()));
                } else if !chunk.is_empty() {
                    partials.push(PathPartial::Literal(chunk.to_string()));
                }
                rest = remainder;
                in_param = !in_param;
            }
            None => {
                if !rest.is_empty() {
                    partials.push(PathPartial::Literal(rest.to_string()));
                }
                break;
            }
        }
    }
    partials
}

/// Prefixes `partials` with the server base path, collapsing into the first
/// literal when both are literals (§3 "Endpoint").
fn with_base_path(base_path: &str, partials: Vec<PathPartial>) -> Vec<PathPartial> {
    if base_path == "/" {
        return partials;
    }
    let mut out = Vec::with_capacity(partials.len() + 1);
    let mut iter = partials.into_iter();
    match iter.next() {
        Some(PathPartial::Literal(lit)) => {
            out.push(PathPartial::Literal(format!("{base_path}{lit}")));
        }
        Some(other) => {
            out.push(PathPartial::Literal(base_path.to_string()));
            out.push(other);
        }
        None => out.push(PathPartial::Literal(base_path.to_string())),
    }
    out.extend(iter);
    out
}

fn collect_endpoints(
    ir: &mut SchemaIr,
    doc: &OpenAPI,
    base_path: &str,
) -> Result<EndpointTable, SpecError> {
    let mut paths: Vec<&String> = doc.paths.iter().map(|(p, _)| p).collect();
    paths.sort();

    let mut endpoints = Vec::new();
    for path in paths {
        let ReferenceOr::Item(item) = &doc.paths[path.as_str()] else {
            continue;
        };
        let partials = with_base_path(base_path, tokenize_path(path));
        for (method, operation) in ordered_operations(item) {
            debug!(%method, %path, "normalizing endpoint");
            let inputs = collect_inputs(ir, item, operation)?;
            let outputs = collect_outputs(ir, operation)?;
            endpoints.push(Endpoint {
                method: method.to_string(),
                path_partials: partials.clone(),
                inputs,
                outputs,
            });
        }
    }
    Ok(endpoints)
}

/// Methods within a path, sorted lexicographically (§4.1).
fn ordered_operations(item: &PathItem) -> Vec<(&'static str, &Operation)> {
    let mut out = Vec::new();
    macro_rules! push {
        ($name:literal, $field:ident) => {
            if let Some(op) = &item.$field {
                out.push(($name, op));
            }
        };
    }
    push!("DELETE", delete);
    push!("GET", get);
    push!("HEAD", head);
    push!("OPTIONS", options);
    push!("PATCH", patch);
    push!("POST", post);
    push!("PUT", put);
    push!("TRACE", trace);
    out.sort_by_key(|(name, _)| *name);
    out
}

fn collect_inputs(
    ir: &mut SchemaIr,
    item: &PathItem,
    operation: &Operation,
) -> Result<Vec<Param>, SpecError> {
    let mut inputs = Vec::new();

    let mut params: Vec<&ReferenceOr<Parameter>> = item.parameters.iter().collect();
    params.extend(operation.parameters.iter());
    for param_ref in params {
        let ReferenceOr::Item(parameter) = param_ref else {
            continue;
        };
        inputs.push(map_parameter(ir, parameter)?);
    }

    if let Some(ReferenceOr::Item(body)) = &operation.request_body {
        if let Some(media) = body.content.get(JSON_MIME) {
            let sid = match &media.schema {
                Some(schema_ref) => Some(map_schema_ref(ir, schema_ref)?),
                None => None,
            };
            inputs.push(Param {
                kind: ParamKind::Body,
                name: "body".to_string(),
                required: body.required,
                sid: sid.map_or(crate::ir::OptSid::NONE, Into::into),
            });
        }
        // Non-JSON media types deliberately produce no body input (§4.3).
    }

    Ok(inputs)
}

fn map_parameter(ir: &mut SchemaIr, parameter: &Parameter) -> Result<Param, SpecError> {
    let (kind, data) = match parameter {
        Parameter::Query { parameter_data, .. } => (ParamKind::Query, parameter_data),
        Parameter::Header { parameter_data, .. } => (ParamKind::Header, parameter_data),
        Parameter::Path { parameter_data, .. } => (ParamKind::Path, parameter_data),
        Parameter::Cookie { parameter_data, .. } => (ParamKind::Cookie, parameter_data),
    };
    let sid = parameter_schema_sid(ir, data)?;
    Ok(Param {
        kind,
        name: data.name.clone(),
        required: data.required,
        sid,
    })
}

fn parameter_schema_sid(
    ir: &mut SchemaIr,
    data: &ParameterData,
) -> Result<crate::ir::OptSid, SpecError> {
    match &data.format {
        ParameterSchemaOrContent::Schema(schema_ref) => {
            Ok(map_schema_ref(ir, schema_ref)?.into())
        }
        ParameterSchemaOrContent::Content(content) => {
            if let Some(media) = content.get(JSON_MIME) {
                if let Some(schema_ref) = &media.schema {
                    return Ok(map_schema_ref(ir, schema_ref)?.into());
                }
            }
            Ok(crate::ir::OptSid::NONE)
        }
    }
}

fn collect_outputs(
    ir: &mut SchemaIr,
    operation: &Operation,
) -> Result<BTreeMap<Bucket, crate::ir::OptSid>, SpecError> {
    let mut outputs = BTreeMap::new();

    if let Some(default) = &operation.responses.default {
        if let ReferenceOr::Item(response) = default {
            outputs.insert(Bucket::Default, response_body_sid(ir, response)?);
        }
    }

    let mut codes: Vec<&OaStatusCode> = operation.responses.responses.keys().collect();
    codes.sort_by_key(bucket_sort_key);
    for code in codes {
        let ReferenceOr::Item(response) = &operation.responses.responses[code] else {
            continue;
        };
        let bucket = match code {
            OaStatusCode::Code(c) => Bucket::Code(*c),
            OaStatusCode::Range(r) => Bucket::Class(*r as u8),
        };
        outputs.insert(bucket, response_body_sid(ir, response)?);
    }

    Ok(outputs)
}

fn bucket_sort_key(code: &&OaStatusCode) -> u32 {
    match code {
        OaStatusCode::Code(c) => u32::from(*c),
        OaStatusCode::Range(r) => u32::from(*r) * 100,
    }
}

fn response_body_sid(
    ir: &mut SchemaIr,
    response: &openapiv3::Response,
) -> Result<crate::ir::OptSid, SpecError> {
    match response.content.get(JSON_MIME).and_then(|m| m.schema.as_ref()) {
        Some(schema_ref) => Ok(map_schema_ref(ir, schema_ref)?.into()),
        None => Ok(crate::ir::OptSid::NONE),
    }
}

/// `ensureMapped` for a `ReferenceOr<Schema>`: resolves the `$ref` name via
/// the pre-seeded index, or recursively normalizes an inline schema.
fn map_schema_ref(
    ir: &mut SchemaIr,
    schema_ref: &ReferenceOr<Schema>,
) -> Result<crate::ir::Sid, SpecError> {
    match schema_ref {
        ReferenceOr::Reference { reference } => ir
            .ensure_mapped(Some(reference), SchemaBody::default())
            .map_err(SpecError::from),
        ReferenceOr::Item(schema) => map_schema(ir, schema).map_err(SpecError::from),
    }
}

fn map_schema_ref_boxed(
    ir: &mut SchemaIr,
    schema_ref: &ReferenceOr<Box<Schema>>,
) -> Result<crate::ir::Sid, SpecError> {
    match schema_ref {
        ReferenceOr::Reference { reference } => ir
            .ensure_mapped(Some(reference), SchemaBody::default())
            .map_err(SpecError::from),
        ReferenceOr::Item(schema) => map_schema(ir, schema).map_err(SpecError::from),
    }
}

fn map_schema(ir: &mut SchemaIr, schema: &Schema) -> Result<crate::ir::Sid, SpecError> {
    let mut body = SchemaBody::default();
    let nullable = schema.schema_data.nullable;

    match &schema.schema_kind {
        SchemaKind::Type(ty) => map_type(ir, ty, &mut body, nullable)?,
        SchemaKind::OneOf { one_of } => {
            body.one_of = map_schema_list(ir, one_of)?;
        }
        SchemaKind::AllOf { all_of } => {
            body.all_of = map_schema_list(ir, all_of)?;
        }
        SchemaKind::AnyOf { any_of } => {
            body.any_of = map_schema_list(ir, any_of)?;
        }
        SchemaKind::Not { not } => {
            body.not = Some(map_schema_ref_boxed(ir, not)?);
        }
        SchemaKind::Any(_) => {
            // An unconstrained schema ("{}"): no keywords to carry over.
        }
    }

    ir.ensure_mapped(None, body).map_err(SpecError::from)
}

fn map_schema_list(
    ir: &mut SchemaIr,
    list: &[ReferenceOr<Schema>],
) -> Result<Vec<crate::ir::Sid>, SpecError> {
    list.iter().map(|s| map_schema_ref(ir, s)).collect()
}

fn map_type(
    ir: &mut SchemaIr,
    ty: &OaType,
    body: &mut SchemaBody,
    nullable: bool,
) -> Result<(), SpecError> {
    let mut types = vec![];
    match ty {
        OaType::String(s) => {
            types.push("string".to_string());
            body.pattern = s.pattern.clone();
            body.min_length = s.min_length.map(|n| n as u64);
            body.max_length = s.max_length.map(|n| n as u64);
            if let openapiv3::VariantOrUnknownOrEmpty::Item(fmt) = &s.format {
                body.format = Format::from_str(&format!("{fmt:?}").to_lowercase());
            } else if let openapiv3::VariantOrUnknownOrEmpty::Unknown(fmt) = &s.format {
                body.format = Format::from_str(fmt);
            }
            body.r#enum = s
                .enumeration
                .iter()
                .filter_map(|e| e.clone())
                .map(Literal::Text)
                .collect();
        }
        OaType::Number(n) => {
            types.push("number".to_string());
            body.minimum = n.minimum.map(|v| NumericBound {
                value: v,
                exclusive: n.exclusive_minimum,
            });
            body.maximum = n.maximum.map(|v| NumericBound {
                value: v,
                exclusive: n.exclusive_maximum,
            });
            if let Some(m) = n.multiple_of {
                body.set_multiple_of(m);
            }
            body.r#enum = n
                .enumeration
                .iter()
                .filter_map(|e| *e)
                .map(Literal::Number)
                .collect();
        }
        OaType::Integer(n) => {
            types.push("integer".to_string());
            body.minimum = n.minimum.map(|v| NumericBound {
                value: v as f64,
                exclusive: n.exclusive_minimum,
            });
            body.maximum = n.maximum.map(|v| NumericBound {
                value: v as f64,
                exclusive: n.exclusive_maximum,
            });
            if let Some(m) = n.multiple_of {
                body.set_multiple_of(m as f64);
            }
            body.r#enum = n
                .enumeration
                .iter()
                .filter_map(|e| *e)
                .map(|v| Literal::Number(v as f64))
                .collect();
        }
        OaType::Boolean(b) => {
            types.push("boolean".to_string());
            body.r#enum = b
                .enumeration
                .iter()
                .filter_map(|e| *e)
                .map(Literal::Bool)
                .collect();
        }
        OaType::Object(o) => {
            types.push("object".to_string());
            body.required = o.required.iter().cloned().collect();
            body.min_properties = o.min_properties.map(|n| n as u64);
            body.max_properties = o.max_properties.map(|n| n as u64);
            let mut names: Vec<&String> = o.properties.keys().collect();
            names.sort();
            for name in names {
                let sid = map_schema_ref_boxed(ir, &o.properties[name])?;
                body.properties.insert(name.clone(), sid);
            }
            body.additional_properties = match &o.additional_properties {
                None | Some(OaAdditionalProperties::Any(true)) => None,
                Some(OaAdditionalProperties::Any(false)) => Some(AdditionalProperties::Forbidden),
                Some(OaAdditionalProperties::Schema(schema_ref)) => {
                    let sid = map_schema_ref_boxed(ir, schema_ref)?;
                    Some(AdditionalProperties::Allowed(Some(sid)))
                }
            };
        }
        OaType::Array(a) => {
            types.push("array".to_string());
            body.unique_items = a.unique_items;
            body.min_items = a.min_items.map(|n| n as u64);
            body.max_items = a.max_items.map(|n| n as u64);
            if let Some(items) = &a.items {
                // A singleton `items` is still a one-element SID list (§4.1).
                body.items = vec![map_schema_ref_boxed(ir, items)?];
            }
        }
    }
    if nullable {
        types.push("null".to_string());
    }
    body.types = types;
    Ok(())
}

/// Converts an `openapiv3::Schema` into a generic JSON value, for the
/// validator's raw (pre-IR) loader.
fn schema_to_raw_json(schema: &Schema) -> serde_json::Value {
    serde_json::to_value(schema).unwrap_or(serde_json::Value::Null)
}
