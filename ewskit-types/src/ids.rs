//! Identifier types used throughout ewskit.
//!
//! All of them are opaque strings issued by the remote store.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of an item or folder in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Wraps a server-issued id. Empty ids are rejected.
    pub fn new(id: impl Into<String>) -> crate::Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::Empty);
        }
        Ok(Self(id))
    }

    /// Returns the raw id string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ItemId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Identifier of a file attached to an item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentId(String);

impl AttachmentId {
    /// Wraps a server-issued attachment id. Empty ids are rejected.
    pub fn new(id: impl Into<String>) -> crate::Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::Empty);
        }
        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque version token of one entity.
///
/// A change key is invalidated the moment any writer mutates the entity,
/// so it must be refreshed before every racing write.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeKey(String);

impl ChangeKey {
    /// Wraps a server-issued change key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the raw token string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChangeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque incremental sync state: "all changes synced up to here".
///
/// The empty watermark is the initial state and asks the server for a
/// full resync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watermark(String);

impl Watermark {
    /// Wraps a server-issued watermark.
    #[must_use]
    pub fn new(state: impl Into<String>) -> Self {
        Self(state.into())
    }

    /// Returns true for the empty (full resync) watermark.
    #[must_use]
    pub fn is_initial(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the raw watermark string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Well-known folders addressable by name instead of id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistinguishedFolder {
    Calendar,
    Contacts,
    Inbox,
    Tasks,
    Drafts,
    SentItems,
    DeletedItems,
    MsgFolderRoot,
    Root,
}

impl DistinguishedFolder {
    /// Wire name of the folder.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Calendar => "calendar",
            Self::Contacts => "contacts",
            Self::Inbox => "inbox",
            Self::Tasks => "tasks",
            Self::Drafts => "drafts",
            Self::SentItems => "sentitems",
            Self::DeletedItems => "deleteditems",
            Self::MsgFolderRoot => "msgfolderroot",
            Self::Root => "root",
        }
    }
}

impl FromStr for DistinguishedFolder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "calendar" => Self::Calendar,
            "contacts" => Self::Contacts,
            "inbox" => Self::Inbox,
            "tasks" => Self::Tasks,
            "drafts" => Self::Drafts,
            "sentitems" => Self::SentItems,
            "deleteditems" => Self::DeletedItems,
            "msgfolderroot" => Self::MsgFolderRoot,
            "root" => Self::Root,
            other => return Err(Error::UnknownFolder(other.to_string())),
        })
    }
}

/// A folder reference: either a server-issued id or a distinguished name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderRef {
    Id(ItemId),
    Distinguished(DistinguishedFolder),
}

impl FolderRef {
    /// Parses a folder reference, preferring distinguished names.
    ///
    /// `"calendar"` becomes [`FolderRef::Distinguished`]; anything else is
    /// taken as a folder id.
    pub fn parse(s: &str) -> crate::Result<Self> {
        match s.parse::<DistinguishedFolder>() {
            Ok(folder) => Ok(Self::Distinguished(folder)),
            Err(_) => Ok(Self::Id(ItemId::new(s)?)),
        }
    }

    /// Returns the wire string of this reference.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Id(id) => id.as_str(),
            Self::Distinguished(folder) => folder.as_str(),
        }
    }
}

impl From<DistinguishedFolder> for FolderRef {
    fn from(folder: DistinguishedFolder) -> Self {
        Self::Distinguished(folder)
    }
}

impl From<ItemId> for FolderRef {
    fn from(id: ItemId) -> Self {
        Self::Id(id)
    }
}

impl fmt::Display for FolderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
