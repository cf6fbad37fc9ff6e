//! Mapping schema validation and default-value injection.
//!
//! The schema is compiled once and shared. Besides plain validation it can
//! compute a *default patch*: a list of JSON Patch `add` operations that fill
//! in every schema `default` whose property is absent from the document.

use std::path::Path;

use serde::Serialize;
use serde_json::{json, Value};

use crate::mapping::error::{MappingError, MappingResult};

/// Schema compiled into the binary; used unless the service config names a
/// replacement file.
pub const BUILTIN_SCHEMA: &str = include_str!("mapping-schema.json");

/// Maximum number of `$ref` hops followed while looking up defaults.
const MAX_REF_HOPS: usize = 32;

/// Outcome of a non-throwing schema check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Schema-derived `add` operations for absent optional fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultPatch {
    ops: Vec<Value>,
}

impl DefaultPatch {
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// The patch as an RFC 6902 document.
    pub fn to_json(&self) -> Value {
        Value::Array(self.ops.clone())
    }

    /// Apply the patch to `document` in place.
    pub fn apply(&self, document: &mut Value) -> MappingResult<()> {
        apply_patch(document, self.to_json())
    }
}

/// Apply an RFC 6902 JSON Patch given as a raw JSON value.
///
/// A value that is not a well-formed patch is reported the same way as a patch
/// that cannot be applied: both are semantic failures of the request.
pub fn apply_patch(document: &mut Value, patch: Value) -> MappingResult<()> {
    let patch: json_patch::Patch = serde_json::from_value(patch)
        .map_err(|e| MappingError::PatchApplication(format!("malformed patch: {e}")))?;
    json_patch::patch(document, &patch).map_err(|e| MappingError::PatchApplication(e.to_string()))
}

/// Compiled mapping schema.
pub struct SchemaValidator {
    schema: Value,
    compiled: jsonschema::Validator,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("title", &self.schema.get("title"))
            .finish_non_exhaustive()
    }
}

impl SchemaValidator {
    /// Compile the built-in mapping schema.
    pub fn builtin() -> MappingResult<Self> {
        let schema = serde_json::from_str(BUILTIN_SCHEMA)
            .map_err(|e| MappingError::parse("built-in mapping schema", e))?;
        Self::from_value(schema)
    }

    /// Load and compile a schema from a JSON file.
    pub fn from_file(path: &Path) -> MappingResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| MappingError::io(path, e))?;
        let schema = serde_json::from_str(&content)
            .map_err(|e| MappingError::parse(path.display().to_string(), e))?;
        Self::from_value(schema)
    }

    /// Compile a schema document. String formats (`date-time`, ...) are enforced.
    pub fn from_value(schema: Value) -> MappingResult<Self> {
        let compiled = jsonschema::options()
            .should_validate_formats(true)
            .build(&schema)
            .map_err(|e| MappingError::SchemaCompile(e.to_string()))?;
        Ok(Self { schema, compiled })
    }

    /// The schema document.
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Validate `document` and return the patch that would fill in its defaults.
    pub fn validate(&self, document: &Value) -> MappingResult<DefaultPatch> {
        let report = self.check(document);
        if !report.valid {
            return Err(MappingError::SchemaViolation {
                errors: report.errors,
            });
        }

        let mut ops = Vec::new();
        self.collect_defaults(&self.schema, document, "", &mut ops);
        Ok(DefaultPatch { ops })
    }

    /// Validate without failing; collects every violation.
    pub fn check(&self, document: &Value) -> SchemaReport {
        let errors: Vec<String> = self
            .compiled
            .iter_errors(document)
            .map(|e| e.to_string())
            .collect();
        SchemaReport {
            valid: errors.is_empty(),
            errors,
        }
    }

    fn resolve<'a>(&'a self, mut schema: &'a Value) -> &'a Value {
        for _ in 0..MAX_REF_HOPS {
            let Some(reference) = schema.get("$ref").and_then(Value::as_str) else {
                break;
            };
            let Some(target) = reference
                .strip_prefix('#')
                .and_then(|pointer| self.schema.pointer(pointer))
            else {
                break;
            };
            schema = target;
        }
        schema
    }

    fn default_of<'a>(&'a self, schema: &'a Value) -> Option<&'a Value> {
        schema
            .get("default")
            .or_else(|| self.resolve(schema).get("default"))
    }

    fn collect_defaults(&self, schema: &Value, instance: &Value, pointer: &str, ops: &mut Vec<Value>) {
        let schema = self.resolve(schema);

        if let Some(all_of) = schema.get("allOf").and_then(Value::as_array) {
            for sub in all_of {
                self.collect_defaults(sub, instance, pointer, ops);
            }
        }

        match instance {
            Value::Object(map) => {
                let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
                    return;
                };
                for (name, property) in properties {
                    let child = format!("{pointer}/{}", escape_pointer_token(name));
                    match map.get(name) {
                        Some(value) => self.collect_defaults(property, value, &child, ops),
                        None => {
                            if let Some(default) = self.default_of(property) {
                                let mut value = default.clone();
                                self.materialize(property, &mut value);
                                ops.push(json!({ "op": "add", "path": child, "value": value }));
                            }
                        }
                    }
                }
            }
            Value::Array(items) => {
                let Some(item_schema) = schema.get("items").filter(|s| s.is_object()) else {
                    return;
                };
                for (index, item) in items.iter().enumerate() {
                    self.collect_defaults(item_schema, item, &format!("{pointer}/{index}"), ops);
                }
            }
            _ => {}
        }
    }

    /// Fill nested defaults into a default value that is about to be inserted.
    fn materialize(&self, schema: &Value, value: &mut Value) {
        let schema = self.resolve(schema);
        match value {
            Value::Object(map) => {
                let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
                    return;
                };
                for (name, property) in properties {
                    match map.get_mut(name) {
                        Some(child) => self.materialize(property, child),
                        None => {
                            if let Some(default) = self.default_of(property) {
                                let mut child = default.clone();
                                self.materialize(property, &mut child);
                                map.insert(name.clone(), child);
                            }
                        }
                    }
                }
            }
            Value::Array(items) => {
                if let Some(item_schema) = schema.get("items").filter(|s| s.is_object()) {
                    for item in items {
                        self.materialize(item_schema, item);
                    }
                }
            }
            _ => {}
        }
    }
}

fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}
