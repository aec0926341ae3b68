//! Explicit shape descriptors and the validation routine that interprets them.
//!
//! Every flow declares its input and output as a [`ShapeDescriptor`]: a plain
//! list of field names with type tags. One generic [`ShapeDescriptor::validate`]
//! interprets those tags against a `serde_json::Value`, so there is no
//! reflection and no schema compiler between a payload and its contract.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;

/// Type tag for a single declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Any JSON string.
    String,
    /// A JSON number constrained to `[0, 1]`, e.g. a confidence.
    UnitInterval,
    /// An array whose elements are all strings. Empty is valid.
    StringList,
    /// A `data:<mime>;base64,<data>` string carrying binary media.
    DataUri,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::String => "string",
            FieldType::UnitInterval => "number in [0,1]",
            FieldType::StringList => "sequence of strings",
            FieldType::DataUri => "base64 data URI",
        };
        f.write_str(name)
    }
}

/// One required field of a shape. The description is documentation only and
/// also rides along into the JSON-Schema hint sent to the model; it never
/// changes what validates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub ty: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            description: None,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A named set of required fields. Validation never partially accepts: either
/// every declared field is present and well typed, or the full list of
/// violations comes back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeDescriptor {
    pub name: String,
    pub fields: Vec<FieldSpec>,
}

/// A single offending field and why it was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub field: String,
    pub reason: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

pub fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ShapeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Check `payload` against every declared field. Pure: no side effects,
    /// same inputs always produce the same answer. Undeclared extra fields
    /// are ignored, matching how the original parsed model replies.
    pub fn validate(&self, payload: &Value) -> Result<(), Vec<Violation>> {
        let Some(object) = payload.as_object() else {
            return Err(vec![Violation {
                field: "$".to_string(),
                reason: format!("expected an object, got {}", type_name(payload)),
            }]);
        };

        let mut violations = Vec::new();
        for spec in &self.fields {
            match object.get(&spec.name) {
                None => violations.push(Violation {
                    field: spec.name.clone(),
                    reason: "required field is missing".to_string(),
                }),
                Some(value) => {
                    if let Err(reason) = check_type(spec.ty, value) {
                        violations.push(Violation {
                            field: spec.name.clone(),
                            reason,
                        });
                    }
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Render the shape as a JSON-Schema object. This is only ever handed to
    /// the model as a response-format hint; runtime validation stays in
    /// [`ShapeDescriptor::validate`].
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for spec in &self.fields {
            let mut property = match spec.ty {
                FieldType::String | FieldType::DataUri => json!({"type": "string"}),
                FieldType::UnitInterval => {
                    json!({"type": "number", "minimum": 0, "maximum": 1})
                }
                FieldType::StringList => {
                    json!({"type": "array", "items": {"type": "string"}})
                }
            };
            if let Some(description) = &spec.description {
                property["description"] = json!(description);
            }
            properties.insert(spec.name.clone(), property);
            required.push(Value::String(spec.name.clone()));
        }

        json!({
            "type": "object",
            "title": self.name,
            "properties": Value::Object(properties),
            "required": Value::Array(required),
        })
    }
}

fn check_type(ty: FieldType, value: &Value) -> Result<(), String> {
    match ty {
        FieldType::String => {
            if value.is_string() {
                Ok(())
            } else {
                Err(format!("expected a string, got {}", type_name(value)))
            }
        }
        FieldType::UnitInterval => match value.as_f64() {
            Some(n) if (0.0..=1.0).contains(&n) => Ok(()),
            Some(n) => Err(format!("number {n} is outside [0,1]")),
            None => Err(format!("expected a number, got {}", type_name(value))),
        },
        FieldType::StringList => match value.as_array() {
            Some(items) => {
                match items.iter().position(|item| !item.is_string()) {
                    Some(index) => Err(format!(
                        "element {index} is {}, expected a string",
                        type_name(&items[index])
                    )),
                    None => Ok(()),
                }
            }
            None => Err(format!("expected an array, got {}", type_name(value))),
        },
        FieldType::DataUri => match value.as_str() {
            Some(s) if crate::util::is_data_uri(s) => Ok(()),
            Some(_) => Err("expected a 'data:<mime>;base64,<data>' string".to_string()),
            None => Err(format!("expected a string, got {}", type_name(value))),
        },
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
