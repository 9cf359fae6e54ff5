//! crates/literary_oracle_core/src/schema.rs
//!
//! A small typed description of the JSON shape the recommendation model must produce.
//! Adapters render it into their vendor's schema dialect.

use serde_json::{json, Map, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schema {
    Object {
        /// Declaration order is kept so adapters can emit a property ordering hint.
        properties: Vec<(String, Schema)>,
        required: Vec<String>,
    },
    Array {
        items: Box<Schema>,
        min_items: Option<usize>,
        max_items: Option<usize>,
    },
    String {
        /// Empty means free text.
        enumeration: Vec<String>,
    },
}

impl Schema {
    pub fn string() -> Self {
        Schema::String {
            enumeration: Vec::new(),
        }
    }

    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Schema::String {
            enumeration: values.into_iter().map(Into::into).collect(),
        }
    }

    /// An object whose every listed property is required.
    pub fn strict_object<I, S>(properties: I) -> Self
    where
        I: IntoIterator<Item = (S, Schema)>,
        S: Into<String>,
    {
        let properties: Vec<(String, Schema)> = properties
            .into_iter()
            .map(|(name, schema)| (name.into(), schema))
            .collect();
        let required = properties.iter().map(|(name, _)| name.clone()).collect();
        Schema::Object {
            properties,
            required,
        }
    }

    pub fn exact_array(items: Schema, len: usize) -> Self {
        Schema::Array {
            items: Box::new(items),
            min_items: Some(len),
            max_items: Some(len),
        }
    }

    /// Looks up a direct property of an object schema.
    pub fn property(&self, name: &str) -> Option<&Schema> {
        match self {
            Schema::Object { properties, .. } => properties
                .iter()
                .find(|(prop, _)| prop == name)
                .map(|(_, schema)| schema),
            _ => None,
        }
    }

    /// Renders standard JSON Schema, closed to additional properties.
    pub fn to_json_schema(&self) -> Value {
        match self {
            Schema::Object {
                properties,
                required,
            } => {
                let props: Map<String, Value> = properties
                    .iter()
                    .map(|(name, schema)| (name.clone(), schema.to_json_schema()))
                    .collect();
                json!({
                    "type": "object",
                    "properties": props,
                    "required": required,
                    "additionalProperties": false,
                })
            }
            Schema::Array {
                items,
                min_items,
                max_items,
            } => {
                let mut out = json!({
                    "type": "array",
                    "items": items.to_json_schema(),
                });
                if let Some(min) = min_items {
                    out["minItems"] = json!(min);
                }
                if let Some(max) = max_items {
                    out["maxItems"] = json!(max);
                }
                out
            }
            Schema::String { enumeration } if enumeration.is_empty() => json!({ "type": "string" }),
            Schema::String { enumeration } => json!({ "type": "string", "enum": enumeration }),
        }
    }
}
