//! Declared input schemas for tools and the argument validator.
//!
//! A [`Schema`] describes the shape of a tool's argument object: its fields,
//! each field's primitive kind, which fields are required, and optional
//! defaults. The same value renders to the JSON Schema published through
//! `tools/list` and validates incoming arguments before a handler runs.

use rmcp::model::JsonObject;
use serde_json::{Value, json};

use crate::tools::envelope::HandlerFailure;

/// Primitive kind of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl FieldKind {
    /// JSON Schema type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }
}

/// Name of the JSON kind a value actually has.
fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Errors produced when arguments do not match a tool's schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required argument `{0}`")]
    MissingField(String),

    #[error("argument `{field}` must be of type {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },
}

/// A single field of an object schema.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    kind: FieldKind,
    description: Option<String>,
    default: Option<Value>,
    required: bool,
    /// Nested shape for `object` fields.
    properties: Option<Schema>,
    /// Item kind for `array` fields.
    items: Option<FieldKind>,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            default: None,
            required: false,
            properties: None,
            items: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn object(name: impl Into<String>, properties: Schema) -> Self {
        let mut field = Self::new(name, FieldKind::Object);
        field.properties = Some(properties);
        field
    }

    pub fn array(name: impl Into<String>, items: FieldKind) -> Self {
        let mut field = Self::new(name, FieldKind::Array);
        field.items = Some(items);
        field
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Value filled in when the field is absent and not required.
    pub fn default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn to_json(&self) -> Value {
        let mut out = match &self.properties {
            Some(nested) if self.kind == FieldKind::Object => Value::Object(nested.to_json_schema()),
            _ => json!({ "type": self.kind.as_str() }),
        };
        if let Some(obj) = out.as_object_mut() {
            if let Some(items) = self.items {
                obj.insert("items".to_string(), json!({ "type": items.as_str() }));
            }
            if let Some(description) = &self.description {
                obj.insert("description".to_string(), json!(description));
            }
            if let Some(default) = &self.default {
                obj.insert("default".to_string(), default.clone());
            }
        }
        out
    }
}

/// Shape of a tool's argument object.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// An object schema with no declared fields.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().filter(|f| f.required).map(|f| f.name.as_str())
    }

    /// Render as a JSON Schema object for tool discovery.
    pub fn to_json_schema(&self) -> JsonObject {
        let mut schema = JsonObject::new();
        schema.insert("type".to_string(), json!("object"));

        let mut properties = serde_json::Map::new();
        for field in &self.fields {
            properties.insert(field.name.clone(), field.to_json());
        }
        schema.insert("properties".to_string(), Value::Object(properties));

        let required: Vec<&str> = self.required_fields().collect();
        if !required.is_empty() {
            schema.insert("required".to_string(), json!(required));
        }
        schema
    }

    /// Check `arguments` against this schema.
    ///
    /// Required fields must be present, present fields must have the declared
    /// kind, and absent optional fields with a default receive it. Fields the
    /// schema does not mention are passed through untouched.
    pub fn validate(&self, arguments: &JsonObject) -> Result<ValidatedArguments, ValidationError> {
        let mut args = arguments.clone();
        self.validate_at(None, &mut args)?;
        Ok(ValidatedArguments(args))
    }

    fn validate_at(&self, prefix: Option<&str>, args: &mut JsonObject) -> Result<(), ValidationError> {
        for field in &self.fields {
            let path = match prefix {
                Some(p) => format!("{}.{}", p, field.name),
                None => field.name.clone(),
            };

            // An explicit null counts as "not provided".
            if matches!(args.get(&field.name), Some(Value::Null)) {
                args.remove(&field.name);
            }

            let Some(value) = args.get_mut(&field.name) else {
                if field.required {
                    return Err(ValidationError::MissingField(path));
                }
                if let Some(default) = &field.default {
                    args.insert(field.name.clone(), default.clone());
                }
                continue;
            };

            if !field.kind.matches(value) {
                return Err(ValidationError::TypeMismatch {
                    field: path,
                    expected: field.kind.as_str(),
                    actual: kind_of(value),
                });
            }

            match value {
                Value::Object(nested) => {
                    if let Some(properties) = &field.properties {
                        properties.validate_at(Some(&path), nested)?;
                    }
                }
                Value::Array(items) => {
                    if let Some(item_kind) = field.items {
                        for (index, item) in items.iter().enumerate() {
                            if !item_kind.matches(item) {
                                return Err(ValidationError::TypeMismatch {
                                    field: format!("{}[{}]", path, index),
                                    expected: item_kind.as_str(),
                                    actual: kind_of(item),
                                });
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Arguments that passed schema validation, with defaults applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedArguments(JsonObject);

impl ValidatedArguments {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Non-negative integral number, accepting `50` as well as `50.0`.
    pub fn u64(&self, name: &str) -> Option<u64> {
        let value = self.0.get(name)?;
        value.as_u64().or_else(|| {
            value
                .as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        })
    }

    /// A string argument the schema declares as required.
    pub fn require_str(&self, name: &str) -> Result<&str, HandlerFailure> {
        self.str(name).ok_or_else(|| {
            HandlerFailure::new("Invalid arguments", format!("`{}` must be a string", name))
        })
    }
}
