use crate::document::{Document, Node};
use crate::error::{ModelError, ModelResult};
use crate::extractor::Extractor;
use crate::kind::EntityKind;
use crate::locator::Locator;
use crate::namespace::Namespaces;
use crate::record::{ExtractedRecord, Identity};
use crate::value::Value;
use ewskit_types::{ChangeKey, ItemId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::marker::PhantomData;

/// A locally cached remote entity with field-level change tracking.
///
/// Values are stored by schema position. The entity remembers the values it
/// was last hydrated (or saved) with, and an attribute is dirty exactly when
/// its current value differs from that snapshot, so writing a value back
/// clears the mark again.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity<K: EntityKind> {
    id: Option<ItemId>,
    change_key: Option<ChangeKey>,
    element_name: Option<String>,
    values: Vec<Option<Value>>,
    synced: Vec<Option<Value>>,
    dirty: BTreeSet<usize>,
    collections: BTreeMap<String, Vec<ExtractedRecord>>,
    kind: PhantomData<K>,
}

/// One dirty attribute in a change set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub name: String,
    /// Locator of the attribute, for request builders mapping it to a field URI.
    pub locator: String,
    /// `None` clears the attribute remotely.
    pub value: Option<Value>,
}

/// Dirty attributes in schema declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet(Vec<Change>);

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.0.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|c| c.name.as_str()).collect()
    }
}

impl IntoIterator for ChangeSet {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<K: EntityKind> Default for Entity<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: EntityKind> Entity<K> {
    /// A locally constructed entity pending creation (no id, no token).
    pub fn new() -> Self {
        let len = K::schema().len();
        Self {
            id: None,
            change_key: None,
            element_name: None,
            values: vec![None; len],
            synced: vec![None; len],
            dirty: BTreeSet::new(),
            collections: BTreeMap::new(),
            kind: PhantomData,
        }
    }

    /// Builds a clean entity from an extracted record and identity.
    pub fn from_record(record: ExtractedRecord, identity: Identity) -> Self {
        let mut entity = Self::new();
        entity.rehydrate(record, identity);
        entity
    }

    /// Hydrates from the entity element itself.
    pub fn hydrate_from_node(node: &Node, namespaces: &Namespaces) -> ModelResult<Self> {
        let extractor = Extractor::new(namespaces);
        let record = extractor.extract(node, K::schema())?;
        let identity = extractor.extract_identity(node, K::ID_ELEMENT)?;
        let mut entity = Self::from_record(record, identity);
        entity.element_name = Some(node.local_name().to_string());
        Ok(entity)
    }

    /// Hydrates from the first entity of this kind found in `document`.
    pub fn hydrate_from_document(document: &Document, namespaces: &Namespaces) -> ModelResult<Self> {
        let node = Self::find_in(document.root(), namespaces)?
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::MissingElement(K::ELEMENT.to_string()))?;
        Self::hydrate_from_node(node, namespaces)
    }

    /// Hydrates every entity of this kind in `document`, in document order.
    pub fn hydrate_all(document: &Document, namespaces: &Namespaces) -> ModelResult<Vec<Self>> {
        Self::find_in(document.root(), namespaces)?
            .into_iter()
            .map(|node| Self::hydrate_from_node(node, namespaces))
            .collect()
    }

    fn find_in<'d>(root: &'d Node, namespaces: &Namespaces) -> ModelResult<Vec<&'d Node>> {
        Locator::parse(&K::items_locator())?.resolve_nodes(root, namespaces)
    }

    /// Replaces values, id and token atomically and clears the dirty set.
    ///
    /// No diffing against prior state takes place.
    pub fn rehydrate(&mut self, record: ExtractedRecord, identity: Identity) {
        let (values, collections) = record.into_parts();
        let mut values = values;
        values.resize(K::schema().len(), None);

        self.synced = values.clone();
        self.values = values;
        self.collections = collections;
        self.dirty.clear();
        self.id = identity.id;
        self.change_key = identity.change_key;
    }

    pub fn id(&self) -> Option<&ItemId> {
        self.id.as_ref()
    }

    pub fn change_key(&self) -> Option<&ChangeKey> {
        self.change_key.as_ref()
    }

    /// True once the entity exists remotely.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Local name of the element the entity was hydrated from.
    pub fn element_name(&self) -> Option<&str> {
        self.element_name.as_deref()
    }

    pub(crate) fn set_element_name(&mut self, name: &str) {
        self.element_name = Some(name.to_string());
    }

    /// Overwrites id and token, leaving values and dirty set untouched.
    pub fn set_identity(&mut self, identity: Identity) {
        self.id = identity.id;
        self.change_key = identity.change_key;
    }

    /// Drops id and token after a remote delete.
    pub fn clear_identity(&mut self) {
        self.id = None;
        self.change_key = None;
    }

    /// Current value of `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        K::schema()
            .index_of(name)
            .and_then(|i| self.values.get(i))
            .and_then(Option::as_ref)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Assigns `name`, marking it dirty when it differs from the synced value.
    ///
    /// Returns whether the stored value changed.
    pub fn set(&mut self, name: &str, value: Option<Value>) -> ModelResult<bool> {
        let schema = K::schema();
        let index = schema
            .index_of(name)
            .ok_or_else(|| ModelError::UnknownAttribute(name.to_string()))?;

        let expected = schema.fields[index].value_type;
        if let Some(v) = &value {
            if v.value_type() != expected {
                return Err(ModelError::TypeMismatch {
                    attribute: name.to_string(),
                    expected: expected.name(),
                    actual: v.value_type().name(),
                });
            }
        }

        if self.values[index] == value {
            return Ok(false);
        }

        if self.synced[index] == value {
            self.dirty.remove(&index);
        } else {
            self.dirty.insert(index);
        }
        self.values[index] = value;
        Ok(true)
    }

    pub fn is_dirty(&self, name: &str) -> bool {
        K::schema()
            .index_of(name)
            .is_some_and(|i| self.dirty.contains(&i))
    }

    /// True when any attribute awaits a write.
    pub fn has_pending_changes(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Names of dirty attributes in schema order.
    pub fn dirty_attributes(&self) -> Vec<&str> {
        let schema = K::schema();
        self.dirty
            .iter()
            .map(|&i| schema.fields[i].name.as_str())
            .collect()
    }

    /// Dirty attributes with their current values, in schema order.
    pub fn produce_changeset(&self) -> ChangeSet {
        let schema = K::schema();
        ChangeSet(
            self.dirty
                .iter()
                .map(|&i| Change {
                    name: schema.fields[i].name.clone(),
                    locator: schema.fields[i].locator.clone(),
                    value: self.values[i].clone(),
                })
                .collect(),
        )
    }

    /// Runs the kind's validation hook.
    pub fn validate(&self) -> ModelResult<()> {
        K::validate(self).map_err(ModelError::Validation)
    }

    /// Records a successful write: current values become the synced snapshot.
    pub fn mark_synced(&mut self) {
        self.synced = self.values.clone();
        self.dirty.clear();
    }

    /// Sub-records of a repeated collection from the last hydration.
    pub fn collection(&self, name: &str) -> &[ExtractedRecord] {
        self.collections.get(name).map_or(&[], Vec::as_slice)
    }

    /// Iterates `(name, value)` in schema order.
    pub fn values(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        K::schema()
            .fields
            .iter()
            .zip(&self.values)
            .map(|(f, v)| (f.name.as_str(), v.as_ref()))
    }
}
