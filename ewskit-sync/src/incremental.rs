//! Incremental folder synchronization.
//!
//! The server remembers nothing about a client. Each call presents the
//! watermark of the previous batch and receives the changes made since,
//! plus a new watermark. The caller persists the watermark and drives the
//! loop until the cursor reports completion.

use crate::client::Client;
use crate::error::{EwsError, EwsResult};
use crate::request::{Request, Shape};
use crate::transport::Transport;
use ewskit_model::{
    Entity, EntityClass, EntityKind, ExtractionSchema, Extractor, FieldDef, Value,
};
use ewskit_types::{FolderRef, ItemId, Watermark};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{debug, info};

static SYNC_STATE: LazyLock<ExtractionSchema> = LazyLock::new(|| {
    ExtractionSchema::new(
        "sync_state",
        vec![
            FieldDef::string("watermark", "//SyncFolderItemsResponseMessage/SyncState"),
            FieldDef::boolean(
                "includes_last",
                "//SyncFolderItemsResponseMessage/IncludesLastItemInRange",
            ),
        ],
    )
});

/// Where an incremental sync stands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCursor {
    pub watermark: Watermark,
    /// The last batch reported no further changes.
    pub complete: bool,
}

impl SyncCursor {
    /// Starts a full resync.
    pub fn initial() -> Self {
        Self::default()
    }

    /// Resumes from a persisted watermark.
    pub fn resume(watermark: Watermark) -> Self {
        Self {
            watermark,
            complete: false,
        }
    }
}

/// Changes returned by one sync call.
#[derive(Debug, Clone)]
pub struct SyncBatch<K: EntityKind> {
    pub created: Vec<Entity<K>>,
    pub updated: Vec<Entity<K>>,
    pub deleted: Vec<ItemId>,
    /// Cursor to present on the next call.
    pub cursor: SyncCursor,
}

impl<K: EntityKind> SyncBatch<K> {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}

/// Net changes across several batches.
///
/// Later batches win: an update replaces the entity recorded earlier, and a
/// deletion drops any earlier record of the entity.
#[derive(Debug, Clone)]
pub struct SyncChanges<K: EntityKind> {
    pub created: Vec<Entity<K>>,
    pub updated: Vec<Entity<K>>,
    pub deleted: Vec<ItemId>,
    pub cursor: SyncCursor,
}

impl<K: EntityKind> SyncChanges<K> {
    pub fn new(cursor: SyncCursor) -> Self {
        Self {
            created: Vec::new(),
            updated: Vec::new(),
            deleted: Vec::new(),
            cursor,
        }
    }

    pub fn absorb(&mut self, batch: SyncBatch<K>) {
        self.created.extend(batch.created);

        for entity in batch.updated {
            let id = entity.id().cloned();
            if let Some(slot) = find_mut(&mut self.created, id.as_ref()) {
                *slot = entity;
            } else if let Some(slot) = find_mut(&mut self.updated, id.as_ref()) {
                *slot = entity;
            } else {
                self.updated.push(entity);
            }
        }

        for id in batch.deleted {
            let created_here = self.created.iter().any(|e| e.id() == Some(&id));
            self.created.retain(|e| e.id() != Some(&id));
            self.updated.retain(|e| e.id() != Some(&id));
            // Never seen by the caller, so there is nothing to delete.
            if !created_here && !self.deleted.contains(&id) {
                self.deleted.push(id);
            }
        }

        self.cursor = batch.cursor;
    }

    pub fn is_complete(&self) -> bool {
        self.cursor.complete
    }
}

fn find_mut<'a, K: EntityKind>(
    entities: &'a mut [Entity<K>],
    id: Option<&ItemId>,
) -> Option<&'a mut Entity<K>> {
    let id = id?;
    entities.iter_mut().find(|e| e.id() == Some(id))
}

impl<T: Transport> Client<T> {
    /// Fetches one batch of changes to `folder` since `cursor`.
    ///
    /// Issues exactly one request. An initial cursor asks for a full resync.
    pub async fn sync_folder<K: EntityKind>(
        &self,
        folder: &FolderRef,
        cursor: &SyncCursor,
    ) -> EwsResult<SyncBatch<K>> {
        if K::CLASS != EntityClass::Item {
            return Err(EwsError::InvalidState(
                "folder items sync only tracks items".to_string(),
            ));
        }

        let request = Request::SyncFolderItems {
            folder: folder.clone(),
            shape: Shape::AllProperties,
            sync_state: cursor.watermark.clone(),
            max_changes: self.config().batch_size,
        };
        debug!(
            "syncing {} from {}",
            folder,
            if cursor.watermark.is_initial() {
                "scratch"
            } else {
                "watermark"
            }
        );

        let document = self.send(&request).await?;
        let namespaces = self.namespaces();
        let extractor = Extractor::new(namespaces);
        let root = document.root();

        let hydrate = |change: &str| -> EwsResult<Vec<Entity<K>>> {
            let locator = format!("//Changes/t:{change}/{}", K::ELEMENT);
            extractor
                .scopes(root, &locator)?
                .into_iter()
                .map(|node| Entity::hydrate_from_node(node, namespaces).map_err(EwsError::from))
                .collect()
        };
        let created = hydrate("Create")?;
        let updated = hydrate("Update")?;

        let deleted = extractor
            .scopes(root, &format!("//Changes/t:Delete/{}", K::ID_ELEMENT))?
            .into_iter()
            .filter_map(|node| node.attribute("Id"))
            .filter_map(|id| ItemId::new(id).ok())
            .collect::<Vec<_>>();

        let state = extractor.extract(root, &SYNC_STATE)?;
        let watermark = state
            .get_str("watermark")
            .map(Watermark::new)
            .ok_or_else(|| EwsError::Fatal {
                code: None,
                message: "sync response carried no sync state".to_string(),
            })?;
        let complete = state
            .get("includes_last")
            .and_then(Value::as_bool)
            .unwrap_or(true);

        info!(
            "synced {}: {} created, {} updated, {} deleted",
            folder,
            created.len(),
            updated.len(),
            deleted.len()
        );
        Ok(SyncBatch {
            created,
            updated,
            deleted,
            cursor: SyncCursor {
                watermark,
                complete,
            },
        })
    }
}
