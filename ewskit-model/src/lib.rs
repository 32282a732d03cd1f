//! Document extraction and entity model for ewskit.
//!
//! Everything the remote store returns is a namespaced XML document. This
//! crate turns those documents into typed, change-tracked entities:
//! - [`Document`] / [`Node`]: owned, namespace-resolved element tree
//! - [`Locator`]: small path language resolved against a [`Namespaces`] table
//! - [`ExtractionSchema`] / [`Extractor`]: declarative mapping to [`ExtractedRecord`]s
//! - [`Entity`]: a cached remote entity with field-level mutation tracking
//! - [`EntityKind`]: per-kind capability (element, id element, schema, validation)
//!
//! The sync crate drives these types over the wire; nothing here performs I/O.

mod document;
mod entity;
mod error;
mod extractor;
mod kind;
pub mod kinds;
mod locator;
mod namespace;
mod record;
mod schema;
mod value;

pub use document::{Attribute, Document, Node, QName};
pub use entity::{Change, ChangeSet, Entity};
pub use error::{ModelError, ModelResult};
pub use extractor::Extractor;
pub use kind::{EntityClass, EntityKind};
pub use locator::{Locator, Match};
pub use namespace::{MESSAGES_NS, Namespaces, SOAP_NS, TYPES_NS};
pub use record::{ExtractedRecord, Identity};
pub use schema::{ExtractionSchema, FieldDef, RepeatedDef};
pub use value::{Value, ValueType};
