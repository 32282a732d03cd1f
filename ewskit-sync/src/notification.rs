//! Push notifications.
//!
//! The server posts notification documents to a subscriber URL. Parsing
//! them needs no client; subscribing does.

use crate::client::Client;
use crate::error::{EwsError, EwsResult};
use crate::request::Request;
use crate::transport::Transport;
use ewskit_model::{
    Document, ExtractedRecord, ExtractionSchema, Extractor, FieldDef, Locator, Namespaces,
};
use ewskit_types::{FolderRef, ItemId, Watermark};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{debug, info};

static MOVED_EVENT: LazyLock<ExtractionSchema> = LazyLock::new(|| {
    ExtractionSchema::new(
        "moved_event",
        vec![
            FieldDef::string("item_id", "t:ItemId/@Id"),
            FieldDef::string("old_item_id", "t:OldItemId/@Id"),
            FieldDef::string("parent_folder", "t:ParentFolderId/@Id"),
            FieldDef::string("old_parent_folder", "t:OldParentFolderId/@Id"),
        ],
    )
});

/// Kinds of mailbox events a subscription can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Copied,
    Created,
    Deleted,
    Modified,
    Moved,
    NewMail,
    FreeBusyChanged,
}

impl EventType {
    pub const ALL: [EventType; 7] = [
        Self::Copied,
        Self::Created,
        Self::Deleted,
        Self::Modified,
        Self::Moved,
        Self::NewMail,
        Self::FreeBusyChanged,
    ];

    /// Element name of the event, also used when subscribing.
    pub fn element(&self) -> &'static str {
        match self {
            Self::Copied => "CopiedEvent",
            Self::Created => "CreatedEvent",
            Self::Deleted => "DeletedEvent",
            Self::Modified => "ModifiedEvent",
            Self::Moved => "MovedEvent",
            Self::NewMail => "NewMailEvent",
            Self::FreeBusyChanged => "FreeBusyChangedEvent",
        }
    }
}

/// An item that moved, with its ids before and after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovedItem {
    pub item_id: ItemId,
    pub old_item_id: Option<ItemId>,
    pub parent_folder: Option<ItemId>,
    pub old_parent_folder: Option<ItemId>,
}

/// Item ids per event type from one push notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushNotification {
    pub subscription_id: Option<String>,
    pub copied: Vec<ItemId>,
    pub created: Vec<ItemId>,
    pub deleted: Vec<ItemId>,
    pub modified: Vec<ItemId>,
    pub moved: Vec<MovedItem>,
    pub new_mail: Vec<ItemId>,
    pub free_busy_changed: Vec<ItemId>,
    /// Watermark of the most recent event; present it to resume the subscription.
    pub watermark: Option<Watermark>,
}

impl PushNotification {
    pub fn is_empty(&self) -> bool {
        self.copied.is_empty()
            && self.created.is_empty()
            && self.deleted.is_empty()
            && self.modified.is_empty()
            && self.moved.is_empty()
            && self.new_mail.is_empty()
            && self.free_busy_changed.is_empty()
    }
}

/// Parses a push notification document.
pub fn parse_push_notification(
    document: &Document,
    namespaces: &Namespaces,
) -> EwsResult<PushNotification> {
    let root = document.root();
    let extractor = Extractor::new(namespaces);
    let ids = |event: EventType| -> EwsResult<Vec<ItemId>> {
        let locator = Locator::parse(&format!("//t:{}/t:ItemId/@Id", event.element()))?;
        Ok(locator
            .resolve(root, namespaces)?
            .iter()
            .filter_map(|m| ItemId::new(m.text()).ok())
            .collect())
    };

    let moved = extractor
        .scopes(root, "//t:MovedEvent")?
        .into_iter()
        .map(|node| extractor.extract(node, &MOVED_EVENT))
        .collect::<Result<Vec<_>, _>>()?
        .iter()
        .filter_map(moved_item)
        .collect();

    let watermark = extractor
        .scopes(root, "//Watermark")?
        .last()
        .map(|node| Watermark::new(node.text().trim()));
    let subscription_id = extractor
        .scopes(root, "//SubscriptionId")?
        .first()
        .map(|node| node.text().trim().to_string());

    let notification = PushNotification {
        subscription_id,
        copied: ids(EventType::Copied)?,
        created: ids(EventType::Created)?,
        deleted: ids(EventType::Deleted)?,
        modified: ids(EventType::Modified)?,
        moved,
        new_mail: ids(EventType::NewMail)?,
        free_busy_changed: ids(EventType::FreeBusyChanged)?,
        watermark,
    };
    debug!("parsed push notification: {:?}", notification);
    Ok(notification)
}

fn moved_item(record: &ExtractedRecord) -> Option<MovedItem> {
    let id = |name: &str| record.get_str(name).and_then(|s| ItemId::new(s).ok());
    Some(MovedItem {
        item_id: id("item_id")?,
        old_item_id: id("old_item_id"),
        parent_folder: id("parent_folder"),
        old_parent_folder: id("old_parent_folder"),
    })
}

/// An active push subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub watermark: Watermark,
}

impl<T: Transport> Client<T> {
    /// Subscribes `url` to push notifications for `folders`.
    pub async fn subscribe_push(
        &self,
        folders: Vec<FolderRef>,
        event_types: Vec<EventType>,
        url: &str,
        status_frequency_minutes: Option<u32>,
    ) -> EwsResult<Subscription> {
        let request = Request::SubscribePush {
            folders,
            event_types,
            url: url.to_string(),
            status_frequency_minutes,
        };
        let document = self.send(&request).await?;
        let root = document.root();
        let extractor = Extractor::new(self.namespaces());

        let text = |locator: &str| -> EwsResult<String> {
            extractor
                .scopes(root, locator)?
                .first()
                .map(|node| node.text().trim().to_string())
                .filter(|s| !s.is_empty())
                .ok_or_else(|| EwsError::Fatal {
                    code: None,
                    message: format!("subscribe response is missing {locator}"),
                })
        };
        let subscription = Subscription {
            id: text("//m:SubscriptionId")?,
            watermark: Watermark::new(text("//m:Watermark")?),
        };
        info!("subscribed {} for push notifications", url);
        Ok(subscription)
    }
}
