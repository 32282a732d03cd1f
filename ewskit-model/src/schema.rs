use crate::value::ValueType;
use serde::{Deserialize, Serialize};

/// Declares how an entity kind's attributes are read from a document.
///
/// Field order is significant: it is the order change sets are produced in,
/// which keeps generated update payloads deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSchema {
    pub kind: String,
    pub fields: Vec<FieldDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repeated: Vec<RepeatedDef>,
}

impl ExtractionSchema {
    pub fn new(kind: &str, fields: Vec<FieldDef>) -> Self {
        Self {
            kind: kind.to_string(),
            fields,
            repeated: Vec::new(),
        }
    }

    /// Adds a repeated sub-collection extracted with its own schema.
    #[must_use]
    pub fn with_repeated(mut self, name: &str, locator: &str, schema: ExtractionSchema) -> Self {
        self.repeated.push(RepeatedDef {
            name: name.to_string(),
            locator: locator.to_string(),
            schema,
        });
        self
    }

    /// Position of `name` in declaration order.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A single-valued attribute: its name, locator and declared type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    /// Locator relative to the entity element (e.g., `t:Subject`).
    pub locator: String,
    pub value_type: ValueType,
}

impl FieldDef {
    fn simple(name: &str, locator: &str, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            locator: locator.into(),
            value_type,
        }
    }

    /// Shorthand for a string field.
    pub fn string(name: &str, locator: &str) -> Self {
        Self::simple(name, locator, ValueType::String)
    }

    /// Shorthand for an integer field.
    pub fn integer(name: &str, locator: &str) -> Self {
        Self::simple(name, locator, ValueType::Integer)
    }

    /// Shorthand for a boolean field.
    pub fn boolean(name: &str, locator: &str) -> Self {
        Self::simple(name, locator, ValueType::Boolean)
    }

    /// Shorthand for a date field.
    pub fn date(name: &str, locator: &str) -> Self {
        Self::simple(name, locator, ValueType::Date)
    }

    /// Shorthand for a date-time field.
    pub fn datetime(name: &str, locator: &str) -> Self {
        Self::simple(name, locator, ValueType::DateTime)
    }

    /// Shorthand for a raw subtree field.
    pub fn raw(name: &str, locator: &str) -> Self {
        Self::simple(name, locator, ValueType::Raw)
    }
}

/// A repeated sub-collection such as an attendee list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatedDef {
    pub name: String,
    /// Locator selecting each sub-context, relative to the entity element.
    pub locator: String,
    pub schema: ExtractionSchema,
}
