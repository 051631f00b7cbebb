//! Tool parameter declarations.
//!
//! Tools declare their parameters as typed specs; the set is converted to
//! a JSON Schema object both for the model-facing tool definition and for
//! validating arguments before execution.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A single parameter's type and description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParamSpec {
    /// A string value.
    String { description: String },
    /// A floating-point number.
    Number { description: String },
    /// An integer.
    Integer { description: String },
    /// A boolean.
    Boolean { description: String },
    /// A free-form JSON object.
    Object { description: String },
}

impl ParamSpec {
    /// Creates a string parameter.
    pub fn string(description: impl Into<String>) -> Self {
        Self::String {
            description: description.into(),
        }
    }

    /// Creates a number parameter.
    pub fn number(description: impl Into<String>) -> Self {
        Self::Number {
            description: description.into(),
        }
    }

    /// Creates an integer parameter.
    pub fn integer(description: impl Into<String>) -> Self {
        Self::Integer {
            description: description.into(),
        }
    }

    /// Creates a boolean parameter.
    pub fn boolean(description: impl Into<String>) -> Self {
        Self::Boolean {
            description: description.into(),
        }
    }

    /// Creates an object parameter.
    pub fn object(description: impl Into<String>) -> Self {
        Self::Object {
            description: description.into(),
        }
    }

    /// Returns the JSON Schema fragment for this parameter.
    pub fn json_schema(&self) -> Value {
        let (kind, description) = match self {
            Self::String { description } => ("string", description),
            Self::Number { description } => ("number", description),
            Self::Integer { description } => ("integer", description),
            Self::Boolean { description } => ("boolean", description),
            Self::Object { description } => ("object", description),
        };
        json!({ "type": kind, "description": description })
    }
}

/// An ordered set of named parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    entries: Vec<ParamEntry>,
}

#[derive(Debug, Clone, PartialEq)]
struct ParamEntry {
    name: String,
    spec: ParamSpec,
    required: bool,
}

impl Parameters {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a required parameter.
    pub fn required(mut self, name: impl Into<String>, spec: ParamSpec) -> Self {
        self.entries.push(ParamEntry {
            name: name.into(),
            spec,
            required: true,
        });
        self
    }

    /// Adds an optional parameter.
    pub fn optional(mut self, name: impl Into<String>, spec: ParamSpec) -> Self {
        self.entries.push(ParamEntry {
            name: name.into(),
            spec,
            required: false,
        });
        self
    }

    /// Returns the first parameter name declared more than once.
    ///
    /// Duplicate names would silently collapse into one schema property,
    /// so registration rejects them.
    pub fn duplicate_name(&self) -> Option<&str> {
        self.entries.iter().enumerate().find_map(|(i, entry)| {
            self.entries[..i]
                .iter()
                .any(|earlier| earlier.name == entry.name)
                .then_some(entry.name.as_str())
        })
    }

    /// Converts the set into a JSON Schema object.
    pub fn to_json_schema(&self) -> Value {
        let properties: serde_json::Map<String, Value> = self
            .entries
            .iter()
            .map(|e| (e.name.clone(), e.spec.json_schema()))
            .collect();
        let required: Vec<&str> = self
            .entries
            .iter()
            .filter(|e| e.required)
            .map(|e| e.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_has_properties_and_required() {
        let params = Parameters::new()
            .required("a", ParamSpec::number("first addend"))
            .required("b", ParamSpec::number("second addend"))
            .optional("note", ParamSpec::string("optional note"));

        let schema = params.to_json_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["a"]["type"], "number");
        assert_eq!(schema["properties"]["note"]["type"], "string");
        assert_eq!(schema["required"], json!(["a", "b"]));
    }

    #[test]
    fn duplicate_names_are_detected() {
        let params = Parameters::new()
            .required("a", ParamSpec::number("first"))
            .optional("a", ParamSpec::string("shadows the first"));
        assert_eq!(params.duplicate_name(), Some("a"));

        let distinct = Parameters::new()
            .required("a", ParamSpec::number("first"))
            .required("b", ParamSpec::number("second"));
        assert_eq!(distinct.duplicate_name(), None);
    }

    #[test]
    fn spec_serializes_tagged() {
        let json = serde_json::to_value(ParamSpec::integer("count")).unwrap();
        assert_eq!(json["type"], "integer");
        assert_eq!(json["description"], "count");
    }
}
