//! Calendar lookups that follow links between items.

use crate::client::Client;
use crate::concurrency::current_ref;
use crate::error::{EwsError, EwsResult};
use crate::request::Request;
use crate::transport::Transport;
use ewskit_model::Entity;
use ewskit_model::kinds::{CalendarItem, CalendarItemType};

impl<T: Transport> Client<T> {
    /// Fetches the recurring master of an occurrence or exception.
    pub async fn get_master(
        &self,
        occurrence: &Entity<CalendarItem>,
    ) -> EwsResult<Entity<CalendarItem>> {
        match occurrence.item_type() {
            Some(t) if t.has_master() => {}
            other => return Err(wrong_type("get_master", other)),
        }
        let request = Request::GetRecurringMaster {
            occurrence: current_ref(occurrence)?,
        };
        let document = self.send(&request).await?;
        Ok(Entity::hydrate_from_document(&document, self.namespaces())?)
    }

    /// Fetches occurrences of a recurring master by one-based index.
    ///
    /// Indices past the end of the recurrence are skipped by the server,
    /// so fewer entities than indices may come back.
    pub async fn get_occurrences(
        &self,
        master: &Entity<CalendarItem>,
        indices: &[u32],
    ) -> EwsResult<Vec<Entity<CalendarItem>>> {
        match master.item_type() {
            Some(CalendarItemType::RecurringMaster) => {}
            other => return Err(wrong_type("get_occurrences", other)),
        }
        if indices.is_empty() {
            return Ok(Vec::new());
        }
        let request = Request::GetOccurrences {
            master: current_ref(master)?.id,
            indices: indices.to_vec(),
        };
        let document = self.send(&request).await?;
        Ok(Entity::hydrate_all(&document, self.namespaces())?)
    }

    /// Loads the meetings the server reports as conflicting with `event`.
    pub async fn conflicting_events(
        &self,
        event: &Entity<CalendarItem>,
    ) -> EwsResult<Vec<Entity<CalendarItem>>> {
        self.get_many(&event.conflicting_meeting_ids()).await
    }
}

fn wrong_type(operation: &str, item_type: Option<CalendarItemType>) -> EwsError {
    EwsError::InvalidState(format!(
        "{operation} is not valid for calendar item type {}",
        item_type.map_or("unknown", |t| t.as_str())
    ))
}
