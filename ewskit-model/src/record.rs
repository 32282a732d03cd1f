use crate::value::Value;
use ewskit_types::{ChangeKey, ItemId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute values read from one scope, in schema order.
///
/// Produced fresh for every extraction and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    values: Vec<(String, Option<Value>)>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    collections: BTreeMap<String, Vec<ExtractedRecord>>,
}

impl ExtractedRecord {
    pub(crate) fn new(
        values: Vec<(String, Option<Value>)>,
        collections: BTreeMap<String, Vec<ExtractedRecord>>,
    ) -> Self {
        Self {
            values,
            collections,
        }
    }

    /// The value of `name`, `None` when absent or undeclared.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_ref())
    }

    /// Shorthand for a string attribute.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// True when `name` is declared and was found in the document.
    pub fn is_present(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates `(name, value)` pairs in schema order, including absent ones.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v.as_ref()))
    }

    /// Sub-records of a repeated collection; empty when none matched.
    pub fn collection(&self, name: &str) -> &[ExtractedRecord] {
        self.collections.get(name).map_or(&[], Vec::as_slice)
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        Vec<Option<Value>>,
        BTreeMap<String, Vec<ExtractedRecord>>,
    ) {
        let values = self.values.into_iter().map(|(_, v)| v).collect();
        (values, self.collections)
    }
}

/// Server identity of an entity: id and change key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Option<ItemId>,
    pub change_key: Option<ChangeKey>,
}

impl Identity {
    pub fn new(id: ItemId, change_key: Option<ChangeKey>) -> Self {
        Self {
            id: Some(id),
            change_key,
        }
    }
}
