//! Loads the OpenAPI document a configuration script's modeler names.
//!
//! Parsing the document itself is explicitly a third-party library's job;
//! this module only resolves the `file` field into bytes and hands them to
//! `serde_yaml` (a superset parser, so plain JSON documents parse too).

use std::path::Path;

use anyhow::{Context, Result, bail};
use fuzzymonkey_core::config::{Modeler, Value};
use openapiv3::OpenAPI;

/// Reads the `file` keyword argument off the bound `OpenAPIv3` modeler and
/// parses the document it names, resolved relative to `config_dir`.
pub fn load_document(modeler: &Modeler, config_dir: &Path) -> Result<OpenAPI> {
    let Some(Value::Text(file)) = modeler.fields.get("file") else {
        bail!("OpenAPIv3 modeler requires a string `file` argument");
    };
    let path = config_dir.join(file);
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("reading OpenAPI document at {}", path.display()))?;
    serde_yaml::from_str(&raw)
        .with_context(|| format!("parsing OpenAPI document at {}", path.display()))
}
