//! Folders of the mailbox hierarchy.

use crate::entity::Entity;
use crate::error::ModelResult;
use crate::kind::{EntityClass, EntityKind};
use crate::schema::{ExtractionSchema, FieldDef};
use crate::value::Value;
use ewskit_types::ItemId;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FolderItem;

static SCHEMA: LazyLock<ExtractionSchema> = LazyLock::new(|| {
    ExtractionSchema::new(
        "folder",
        vec![
            FieldDef::string("folder_class", "t:FolderClass"),
            FieldDef::string("display_name", "t:DisplayName"),
            FieldDef::integer("total_count", "t:TotalCount"),
            FieldDef::integer("child_folder_count", "t:ChildFolderCount"),
            FieldDef::integer("unread_count", "t:UnreadCount"),
            FieldDef::string("parent_id", "t:ParentFolderId/@Id"),
            FieldDef::boolean("can_delete", "t:EffectiveRights/t:Delete"),
            FieldDef::boolean("can_modify", "t:EffectiveRights/t:Modify"),
            FieldDef::boolean("can_read", "t:EffectiveRights/t:Read"),
            FieldDef::boolean("can_create_contents", "t:EffectiveRights/t:CreateContents"),
            FieldDef::boolean("can_create_hierarchy", "t:EffectiveRights/t:CreateHierarchy"),
            FieldDef::boolean("can_create_associated", "t:EffectiveRights/t:CreateAssociated"),
        ],
    )
});

impl EntityKind for FolderItem {
    // Any folder element: t:Folder, t:CalendarFolder, t:ContactsFolder, ...
    const ELEMENT: &'static str = "t:*";
    const ID_ELEMENT: &'static str = "t:FolderId";
    const CLASS: EntityClass = EntityClass::Folder;

    fn schema() -> &'static ExtractionSchema {
        &SCHEMA
    }

    fn validate(entity: &Entity<Self>) -> Result<(), String> {
        match entity.display_name() {
            Some(name) if !name.trim().is_empty() => Ok(()),
            _ => Err("display_name is required".to_string()),
        }
    }
}

/// Concrete folder element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FolderType {
    Folder,
    CalendarFolder,
    ContactsFolder,
    SearchFolder,
    TasksFolder,
}

impl FolderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Folder => "Folder",
            Self::CalendarFolder => "CalendarFolder",
            Self::ContactsFolder => "ContactsFolder",
            Self::SearchFolder => "SearchFolder",
            Self::TasksFolder => "TasksFolder",
        }
    }

    pub fn from_element(local: &str) -> Option<Self> {
        match local {
            "Folder" => Some(Self::Folder),
            "CalendarFolder" => Some(Self::CalendarFolder),
            "ContactsFolder" => Some(Self::ContactsFolder),
            "SearchFolder" => Some(Self::SearchFolder),
            "TasksFolder" => Some(Self::TasksFolder),
            _ => None,
        }
    }
}

/// What the current user may do with a folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveRights {
    pub delete: bool,
    pub modify: bool,
    pub read: bool,
    pub create_contents: bool,
    pub create_hierarchy: bool,
    pub create_associated: bool,
}

impl Entity<FolderItem> {
    /// A folder pending creation.
    pub fn new_folder(folder_type: FolderType, display_name: &str) -> ModelResult<Self> {
        let mut folder = Self::new();
        folder.set_element_name(folder_type.as_str());
        folder.set("display_name", Some(display_name.into()))?;
        Ok(folder)
    }

    pub fn display_name(&self) -> Option<&str> {
        self.get_str("display_name")
    }

    pub fn folder_class(&self) -> Option<&str> {
        self.get_str("folder_class")
    }

    pub fn parent_id(&self) -> Option<ItemId> {
        self.get_str("parent_id").and_then(|id| ItemId::new(id).ok())
    }

    /// Folder type from the element the folder was read from or created as.
    pub fn folder_type(&self) -> Option<FolderType> {
        self.element_name().and_then(FolderType::from_element)
    }

    pub fn effective_rights(&self) -> EffectiveRights {
        let flag = |name: &str| self.get(name).and_then(Value::as_bool).unwrap_or(false);
        EffectiveRights {
            delete: flag("can_delete"),
            modify: flag("can_modify"),
            read: flag("can_read"),
            create_contents: flag("can_create_contents"),
            create_hierarchy: flag("can_create_hierarchy"),
            create_associated: flag("can_create_associated"),
        }
    }
}
