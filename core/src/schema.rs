use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{LabError, LabResult};
use crate::jsonc;

/// Node type of a response schema. Serialised the way the Gemini API
/// expects (upper case); either case is accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaType {
    #[serde(alias = "object")]
    Object,
    #[serde(alias = "array")]
    Array,
    #[serde(alias = "string")]
    String,
    #[serde(alias = "number")]
    Number,
    #[serde(alias = "integer")]
    Integer,
    #[serde(alias = "boolean")]
    Boolean,
}

/// Typed tree describing the expected shape of a structured response.
///
/// Keys this type does not model (`enum`, `format`, `nullable`,
/// `propertyOrdering`, ...) are kept in `extra` at every level and sent back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    #[serde(rename = "type")]
    pub schema_type: SchemaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, SchemaDescriptor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaDescriptor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SchemaDescriptor {
    pub fn new(schema_type: SchemaType) -> Self {
        Self {
            schema_type,
            description: None,
            properties: None,
            items: None,
            required: None,
            extra: Map::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_items(mut self, items: SchemaDescriptor) -> Self {
        self.items = Some(Box::new(items));
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, schema: SchemaDescriptor) -> Self {
        self.properties
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), schema);
        self
    }

    /// Adds a key this type does not model, e.g. `enum` or `format`.
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn with_required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Parses schema text (comments allowed) and validates the resulting tree.
    pub fn from_text(text: &str) -> LabResult<Self> {
        let value = jsonc::parse(text)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> LabResult<Self> {
        let schema: Self = serde_json::from_value(value)
            .map_err(|e| LabError::Validation(format!("Schema is not valid: {}", e)))?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn property(&self, name: &str) -> Option<&SchemaDescriptor> {
        self.properties.as_ref()?.get(name)
    }

    /// Structural checks the API would otherwise reject remotely.
    pub fn validate(&self) -> LabResult<()> {
        self.validate_at("$")
    }

    fn validate_at(&self, path: &str) -> LabResult<()> {
        match self.schema_type {
            SchemaType::Array => {
                let items = self.items.as_ref().ok_or_else(|| {
                    LabError::Validation(format!("{}: ARRAY schema requires `items`", path))
                })?;
                items.validate_at(&format!("{}[]", path))?;
            }
            SchemaType::Object => {
                if let Some(required) = &self.required {
                    for name in required {
                        let known = self
                            .properties
                            .as_ref()
                            .is_some_and(|props| props.contains_key(name));
                        if !known {
                            return Err(LabError::Validation(format!(
                                "{}: required field `{}` is not declared in `properties`",
                                path, name
                            )));
                        }
                    }
                }
                if let Some(props) = &self.properties {
                    for (name, child) in props {
                        child.validate_at(&format!("{}.{}", path, name))?;
                    }
                }
            }
            _ => {
                if self.properties.is_some() || self.required.is_some() {
                    return Err(LabError::Validation(format!(
                        "{}: only OBJECT schemas may declare `properties` or `required`",
                        path
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
