//! Representative entity kinds.
//!
//! Each kind is a zero-sized marker implementing [`EntityKind`](crate::EntityKind)
//! with its extraction schema, plus typed accessors on `Entity<Kind>`.

mod calendar;
mod contact;
mod folder;
mod message;
mod task;

pub use calendar::{Attendee, CalendarItem, CalendarItemType, RecurrencePattern};
pub use contact::Contact;
pub use folder::{EffectiveRights, FolderItem, FolderType};
pub use message::Message;
pub use task::Task;
