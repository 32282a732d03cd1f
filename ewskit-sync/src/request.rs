//! Requests the engine issues against the remote store.
//!
//! A [`Request`] names an operation and its arguments. Turning it into a
//! wire envelope is the job of an [`EnvelopeBuilder`](crate::EnvelopeBuilder),
//! so the engine never deals with request markup.

use crate::notification::EventType;
use chrono::{DateTime, Utc};
use ewskit_model::ChangeSet;
use ewskit_types::{AttachmentId, ChangeKey, FolderRef, ItemId, Watermark};
use serde::{Deserialize, Serialize};

/// Property projection for lookups and listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    IdOnly,
    AllProperties,
}

/// Who receives meeting updates when a meeting-carrying entity is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SendMode {
    SendToNone,
    SendOnlyToAll,
    SendOnlyToChanged,
    #[default]
    SendToAllAndSaveCopy,
    SendToChangedAndSaveCopy,
}

impl SendMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SendToNone => "SendToNone",
            Self::SendOnlyToAll => "SendOnlyToAll",
            Self::SendOnlyToChanged => "SendOnlyToChanged",
            Self::SendToAllAndSaveCopy => "SendToAllAndSaveCopy",
            Self::SendToChangedAndSaveCopy => "SendToChangedAndSaveCopy",
        }
    }
}

/// Folder listing depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Traversal {
    #[default]
    Shallow,
    Deep,
}

/// Server-side filter for item listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListFilter {
    /// Calendar items (and expanded occurrences) overlapping a window.
    CalendarView {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// Free-text query string.
    QueryString(String),
    /// Contacts whose name sorts between the bounds, both inclusive.
    NameRange {
        initial_name: Option<String>,
        final_name: Option<String>,
    },
}

/// Formats an item id can be converted between.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdFormat {
    EwsLegacyId,
    #[default]
    EwsId,
    EntryId,
    HexEntryId,
    StoreId,
    OwaId,
}

impl IdFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EwsLegacyId => "EwsLegacyId",
            Self::EwsId => "EwsId",
            Self::EntryId => "EntryId",
            Self::HexEntryId => "HexEntryId",
            Self::StoreId => "StoreId",
            Self::OwaId => "OwaId",
        }
    }
}

/// An entity reference carrying the token a write must present.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRef {
    pub id: ItemId,
    pub change_key: Option<ChangeKey>,
}

impl ItemRef {
    pub fn new(id: ItemId, change_key: Option<ChangeKey>) -> Self {
        Self { id, change_key }
    }
}

/// One request/response exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation")]
pub enum Request {
    GetItem {
        ids: Vec<ItemId>,
        shape: Shape,
    },
    GetFolder {
        folders: Vec<FolderRef>,
        shape: Shape,
    },
    FindItem {
        folder: FolderRef,
        shape: Shape,
        traversal: Traversal,
        offset: u32,
        max_entries: u32,
        filter: Option<ListFilter>,
    },
    FindFolder {
        parent: FolderRef,
        shape: Shape,
        traversal: Traversal,
        offset: u32,
        max_entries: u32,
    },
    SyncFolderItems {
        folder: FolderRef,
        shape: Shape,
        /// Empty for a full resync.
        sync_state: Watermark,
        max_changes: u32,
    },
    CreateItem {
        /// Local element name of the entity, e.g. `CalendarItem`.
        element: String,
        folder: FolderRef,
        fields: ChangeSet,
        send_mode: SendMode,
    },
    UpdateItem {
        item: ItemRef,
        element: String,
        changes: ChangeSet,
        send_mode: SendMode,
    },
    DeleteItem {
        item: ItemRef,
        send_mode: SendMode,
    },
    MoveItem {
        item: ItemRef,
        to: FolderRef,
    },
    CreateFolder {
        parent: FolderRef,
        element: String,
        fields: ChangeSet,
    },
    UpdateFolder {
        folder: ItemRef,
        element: String,
        changes: ChangeSet,
    },
    DeleteFolder {
        folder: ItemRef,
    },
    MoveFolder {
        folder: ItemRef,
        to: FolderRef,
    },
    GetRecurringMaster {
        occurrence: ItemRef,
    },
    /// Occurrences of a recurring master by one-based index.
    GetOccurrences {
        master: ItemId,
        indices: Vec<u32>,
    },
    SubscribePush {
        folders: Vec<FolderRef>,
        event_types: Vec<EventType>,
        url: String,
        status_frequency_minutes: Option<u32>,
    },
    /// Free/busy for each mailbox over a window, answered in request order.
    GetUserAvailability {
        mailboxes: Vec<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    GetRoomLists,
    GetRooms {
        room_list: String,
    },
    ConvertId {
        id: String,
        from: IdFormat,
        to: IdFormat,
        mailbox: String,
    },
    GetAttachment {
        ids: Vec<AttachmentId>,
    },
}

impl Request {
    /// Wire operation name, used in logs.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::GetItem { .. } => "GetItem",
            Self::GetFolder { .. } => "GetFolder",
            Self::FindItem { .. } => "FindItem",
            Self::FindFolder { .. } => "FindFolder",
            Self::SyncFolderItems { .. } => "SyncFolderItems",
            Self::CreateItem { .. } => "CreateItem",
            Self::UpdateItem { .. } => "UpdateItem",
            Self::DeleteItem { .. } => "DeleteItem",
            Self::MoveItem { .. } => "MoveItem",
            Self::CreateFolder { .. } => "CreateFolder",
            Self::UpdateFolder { .. } => "UpdateFolder",
            Self::DeleteFolder { .. } => "DeleteFolder",
            Self::MoveFolder { .. } => "MoveFolder",
            // Occurrence lookups travel as GetItem with occurrence ids.
            Self::GetRecurringMaster { .. } | Self::GetOccurrences { .. } => "GetItem",
            Self::SubscribePush { .. } => "Subscribe",
            Self::GetUserAvailability { .. } => "GetUserAvailability",
            Self::GetRoomLists => "GetRoomLists",
            Self::GetRooms { .. } => "GetRooms",
            Self::ConvertId { .. } => "ConvertId",
            Self::GetAttachment { .. } => "GetAttachment",
        }
    }
}
