//! Change key refresh.
//!
//! A change key goes stale the moment anyone else writes the entity. Every
//! write on an existing entity refreshes the key right before it is sent,
//! which narrows the race window to one round trip. A write that still
//! loses the race surfaces as a conflict; it is never retried here.

use crate::client::{Client, lookup_request};
use crate::error::{EwsError, EwsResult};
use crate::request::{ItemRef, Shape};
use crate::transport::Transport;
use ewskit_model::{Entity, EntityKind};
use tracing::debug;

impl<T: Transport> Client<T> {
    /// Re-reads the entity's id and change key with an id-only lookup.
    ///
    /// Only the identity is overwritten; local values and the dirty set are
    /// left alone.
    pub async fn refresh<K: EntityKind>(&self, entity: &mut Entity<K>) -> EwsResult<()> {
        let Some(id) = entity.id().cloned() else {
            return Err(EwsError::InvalidState(
                "cannot refresh an entity without an id".to_string(),
            ));
        };

        let document = self
            .send(&lookup_request::<K>(vec![id.clone()], Shape::IdOnly))
            .await?;
        let identity = self.returned_identity::<K>(&document)?.ok_or_else(|| {
            EwsError::Fatal {
                code: None,
                message: format!("lookup of {id} returned no identity"),
            }
        })?;

        debug!(
            "refreshed {} (change key {})",
            id,
            identity
                .change_key
                .as_ref()
                .map(|k| k.as_str())
                .unwrap_or("none")
        );
        entity.set_identity(identity);
        Ok(())
    }

    /// Refreshes the entity and returns the reference a write must carry.
    pub(crate) async fn refreshed_ref<K: EntityKind>(
        &self,
        entity: &mut Entity<K>,
    ) -> EwsResult<ItemRef> {
        self.refresh(entity).await?;
        current_ref(entity)
    }
}

pub(crate) fn current_ref<K: EntityKind>(entity: &Entity<K>) -> EwsResult<ItemRef> {
    let id = entity
        .id()
        .cloned()
        .ok_or_else(|| EwsError::InvalidState("entity has no id".to_string()))?;
    Ok(ItemRef::new(id, entity.change_key().cloned()))
}
