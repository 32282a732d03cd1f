use crate::entity::Entity;
use crate::schema::ExtractionSchema;
use std::fmt;

/// Whether a kind lives in the item store or the folder hierarchy.
///
/// Decides which operations address it (item vs folder lookups) and which
/// container element holds it in listing responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityClass {
    Item,
    Folder,
}

impl EntityClass {
    /// Container element wrapping entities of this class in responses.
    ///
    /// Unprefixed: lookups wrap entities in `m:Items` while listings use
    /// `t:Items`, and both must match.
    pub const fn container(&self) -> &'static str {
        match self {
            Self::Item => "Items",
            Self::Folder => "Folders",
        }
    }
}

/// Per-kind capability composed with the shared extractor and tracker.
///
/// A kind declares where its entities live in a document and how their
/// attributes are laid out; hydration, change tracking and the write path
/// are generic over it.
pub trait EntityKind: fmt::Debug + Clone + Send + Sync + 'static {
    /// Element step matching entities of this kind (e.g., `t:CalendarItem`).
    const ELEMENT: &'static str;

    /// Id element, relative to the entity element.
    const ID_ELEMENT: &'static str = "t:ItemId";

    const CLASS: EntityClass = EntityClass::Item;

    /// The kind's extraction schema. Built once and shared.
    fn schema() -> &'static ExtractionSchema;

    /// Validate an entity before it is written.
    /// Return `Err(message)` to reject the write.
    fn validate(entity: &Entity<Self>) -> Result<(), String> {
        let _ = entity;
        Ok(())
    }

    /// Locator selecting every entity of this kind in a response.
    fn items_locator() -> String {
        format!("//{}/{}", Self::CLASS.container(), Self::ELEMENT)
    }
}
