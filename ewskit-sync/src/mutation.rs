//! Write path: create, update, delete, move and resend.
//!
//! Writes on an existing entity always refresh its change key first. A
//! successful write makes the written values the new synced baseline.

use crate::client::Client;
use crate::error::{EwsError, EwsResult};
use crate::request::{Request, SendMode};
use crate::transport::Transport;
use ewskit_model::{ChangeSet, Entity, EntityClass, EntityKind};
use ewskit_types::FolderRef;
use tracing::{debug, info};

impl<T: Transport> Client<T> {
    /// Creates a locally constructed entity inside `container`.
    ///
    /// For items the container is the target folder, for folders it is the
    /// parent. The returned id and change key are stored on the entity.
    pub async fn create<K: EntityKind>(
        &self,
        entity: &mut Entity<K>,
        container: &FolderRef,
        send_mode: SendMode,
    ) -> EwsResult<()> {
        if entity.is_persisted() {
            return Err(EwsError::InvalidState(
                "entity already exists remotely".to_string(),
            ));
        }
        entity.validate()?;

        let element = element_name(entity);
        let fields = entity.produce_changeset();
        let request = match K::CLASS {
            EntityClass::Item => Request::CreateItem {
                element,
                folder: container.clone(),
                fields,
                send_mode,
            },
            EntityClass::Folder => Request::CreateFolder {
                parent: container.clone(),
                element,
                fields,
            },
        };

        let document = self.send(&request).await?;
        let identity = self.returned_identity::<K>(&document)?.ok_or_else(|| {
            EwsError::Fatal {
                code: None,
                message: "create succeeded without returning an id".to_string(),
            }
        })?;

        entity.set_identity(identity);
        entity.mark_synced();
        if let Some(id) = entity.id() {
            info!("created {} {}", K::schema().kind, id);
        }
        Ok(())
    }

    /// Writes the entity's dirty attributes.
    ///
    /// Returns `false` without any network call when nothing is dirty.
    pub async fn update<K: EntityKind>(
        &self,
        entity: &mut Entity<K>,
        send_mode: SendMode,
    ) -> EwsResult<bool> {
        require_persisted(entity, "update")?;
        entity.validate()?;

        let changes = entity.produce_changeset();
        if changes.is_empty() {
            debug!("update skipped: no pending changes");
            return Ok(false);
        }

        self.write_changes(entity, changes, send_mode).await?;
        entity.mark_synced();
        info!("updated {} {}", K::schema().kind, display_id(entity));
        Ok(true)
    }

    /// Deletes the entity remotely and drops its identity.
    pub async fn delete<K: EntityKind>(
        &self,
        entity: &mut Entity<K>,
        send_mode: SendMode,
    ) -> EwsResult<()> {
        require_persisted(entity, "delete")?;
        let item = self.refreshed_ref(entity).await?;
        let request = match K::CLASS {
            EntityClass::Item => Request::DeleteItem { item, send_mode },
            EntityClass::Folder => Request::DeleteFolder { folder: item },
        };
        self.send(&request).await?;

        info!("deleted {} {}", K::schema().kind, display_id(entity));
        entity.clear_identity();
        Ok(())
    }

    /// Moves the entity to another folder.
    ///
    /// Moving issues a new id; it is stored on the entity.
    pub async fn move_to<K: EntityKind>(
        &self,
        entity: &mut Entity<K>,
        to: &FolderRef,
    ) -> EwsResult<()> {
        require_persisted(entity, "move")?;
        let item = self.refreshed_ref(entity).await?;
        let request = match K::CLASS {
            EntityClass::Item => Request::MoveItem {
                item,
                to: to.clone(),
            },
            EntityClass::Folder => Request::MoveFolder {
                folder: item,
                to: to.clone(),
            },
        };

        let document = self.send(&request).await?;
        let identity = self.returned_identity::<K>(&document)?.ok_or_else(|| {
            EwsError::Fatal {
                code: None,
                message: "move succeeded without returning an id".to_string(),
            }
        })?;
        entity.set_identity(identity);
        info!("moved {} to {}", display_id(entity), to);
        Ok(())
    }

    /// Re-sends meeting updates for an unchanged entity.
    ///
    /// Fails without any network call if local edits are pending; those
    /// must be written with [`Client::update`] first.
    pub async fn resend<K: EntityKind>(&self, entity: &mut Entity<K>) -> EwsResult<()> {
        require_persisted(entity, "resend")?;
        if entity.has_pending_changes() {
            return Err(EwsError::InvalidState(format!(
                "cannot resend with unsaved changes: {}",
                entity.dirty_attributes().join(", ")
            )));
        }

        self.write_changes(entity, ChangeSet::default(), SendMode::SendOnlyToAll)
            .await?;
        info!("resent {}", display_id(entity));
        Ok(())
    }

    async fn write_changes<K: EntityKind>(
        &self,
        entity: &mut Entity<K>,
        changes: ChangeSet,
        send_mode: SendMode,
    ) -> EwsResult<()> {
        let item = self.refreshed_ref(entity).await?;
        let element = element_name(entity);
        let request = match K::CLASS {
            EntityClass::Item => Request::UpdateItem {
                item,
                element,
                changes,
                send_mode,
            },
            EntityClass::Folder => Request::UpdateFolder {
                folder: item,
                element,
                changes,
            },
        };

        let document = self.send(&request).await?;
        if let Some(identity) = self.returned_identity::<K>(&document)? {
            entity.set_identity(identity);
        }
        Ok(())
    }
}

fn require_persisted<K: EntityKind>(entity: &Entity<K>, operation: &str) -> EwsResult<()> {
    if entity.id().is_none() {
        return Err(EwsError::InvalidState(format!(
            "cannot {operation} an entity without an id"
        )));
    }
    Ok(())
}

/// Local element name for request builders.
fn element_name<K: EntityKind>(entity: &Entity<K>) -> String {
    entity
        .element_name()
        .map(str::to_string)
        .unwrap_or_else(|| match K::CLASS {
            EntityClass::Item => local_part(K::ELEMENT).to_string(),
            EntityClass::Folder => "Folder".to_string(),
        })
}

fn local_part(step: &str) -> &str {
    step.rsplit_once(':').map_or(step, |(_, local)| local)
}

fn display_id<K: EntityKind>(entity: &Entity<K>) -> String {
    entity
        .id()
        .map(ToString::to_string)
        .unwrap_or_else(|| "<new>".to_string())
}
