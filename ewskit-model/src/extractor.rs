//! Document Extractor: schema-driven reads from a scoped node.

use crate::document::Node;
use crate::error::{ModelError, ModelResult};
use crate::locator::{Locator, Match};
use crate::namespace::Namespaces;
use crate::record::{ExtractedRecord, Identity};
use crate::schema::{ExtractionSchema, FieldDef};
use crate::value::{Value, ValueType};
use ewskit_types::{ChangeKey, ItemId};
use std::collections::BTreeMap;
use tracing::trace;

/// Maps a scoped node plus an [`ExtractionSchema`] into an [`ExtractedRecord`].
///
/// Extraction is read-only; the same document can be extracted any number
/// of times with the same result.
#[derive(Debug, Clone, Copy)]
pub struct Extractor<'ns> {
    namespaces: &'ns Namespaces,
}

impl<'ns> Extractor<'ns> {
    pub fn new(namespaces: &'ns Namespaces) -> Self {
        Self { namespaces }
    }

    pub fn namespaces(&self) -> &'ns Namespaces {
        self.namespaces
    }

    /// Extracts every single-valued field and repeated collection of `schema`.
    pub fn extract(&self, scope: &Node, schema: &ExtractionSchema) -> ModelResult<ExtractedRecord> {
        let values = schema
            .fields
            .iter()
            .map(|field| Ok((field.name.clone(), self.extract_value(scope, field)?)))
            .collect::<ModelResult<Vec<_>>>()?;

        let mut collections = BTreeMap::new();
        for repeated in &schema.repeated {
            let records = self.extract_repeated(scope, &repeated.locator, &repeated.schema)?;
            collections.insert(repeated.name.clone(), records);
        }

        Ok(ExtractedRecord::new(values, collections))
    }

    /// Extracts one field: absent on zero matches, coerced on exactly one.
    pub fn extract_value(&self, scope: &Node, field: &FieldDef) -> ModelResult<Option<Value>> {
        let locator = Locator::parse(&field.locator)?;
        let matches = locator.resolve(scope, self.namespaces)?;

        match matches.as_slice() {
            [] => Ok(None),
            [single] => coerce_match(&field.name, *single, field.value_type).map(Some),
            many => Err(ModelError::AmbiguousMatch {
                attribute: field.name.clone(),
                matches: many.len(),
            }),
        }
    }

    /// Selects every sub-context matched by `locator`, in document order.
    pub fn scopes<'d>(&self, scope: &'d Node, locator: &str) -> ModelResult<Vec<&'d Node>> {
        Locator::parse(locator)?.resolve_nodes(scope, self.namespaces)
    }

    /// Extracts `schema` independently from each sub-context matched by `locator`.
    pub fn extract_repeated(
        &self,
        scope: &Node,
        locator: &str,
        schema: &ExtractionSchema,
    ) -> ModelResult<Vec<ExtractedRecord>> {
        let scopes = self.scopes(scope, locator)?;
        trace!(locator, count = scopes.len(), "extracting repeated collection");
        scopes
            .into_iter()
            .map(|sub| self.extract(sub, schema))
            .collect()
    }

    /// Reads the `Id` / `ChangeKey` attributes of the id element at `locator`.
    ///
    /// A missing id element yields an empty identity, not an error.
    pub fn extract_identity(&self, scope: &Node, locator: &str) -> ModelResult<Identity> {
        let nodes = Locator::parse(locator)?.resolve_nodes(scope, self.namespaces)?;
        let Some(node) = nodes.first() else {
            return Ok(Identity::default());
        };

        let id = node.attribute("Id").and_then(|id| ItemId::new(id).ok());
        let change_key = node.attribute("ChangeKey").map(ChangeKey::new);
        Ok(Identity { id, change_key })
    }
}

fn coerce_match(attribute: &str, found: Match<'_>, value_type: ValueType) -> ModelResult<Value> {
    let malformed = |reason: String| ModelError::MalformedValue {
        attribute: attribute.to_string(),
        reason,
    };

    match (value_type, found) {
        (ValueType::Raw, Match::Element(node)) => Ok(Value::Raw(node.clone())),
        (ValueType::Raw, Match::Attribute(_)) => Err(malformed(
            "an attribute cannot be read as a raw subtree".to_string(),
        )),
        (ty, found) => Value::coerce(found.text(), ty).map_err(malformed),
    }
}
