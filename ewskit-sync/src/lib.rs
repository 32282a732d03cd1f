//! Request/response sync engine for ewskit.
//!
//! Drives the entity model over a [`Transport`]:
//! - [`Client::send`]: one exchange, classified by [`FaultOutcome`] and
//!   retried only on transient server errors
//! - change key refresh before every write on an existing entity
//! - [`Pager`]: lazy paginated listings with a resumable [`PageCursor`]
//! - [`Client::sync_folder`]: incremental sync against a caller-held [`SyncCursor`]
//! - [`parse_push_notification`]: push notification documents
//! - directory lookups: free/busy, rooms, id conversion and attachments
//!
//! All state that must survive a restart (page and sync cursors, change
//! keys) lives in caller-owned values; the client itself is stateless.

mod attachment;
mod calendar;
mod client;
mod concurrency;
mod config;
mod directory;
mod error;
mod fault;
mod incremental;
mod mutation;
mod notification;
mod pager;
mod request;
mod transport;

pub use attachment::FileAttachment;
pub use client::Client;
pub use config::ClientConfig;
pub use directory::{Availability, BusySlot, BusyType, Mailbox, parse_availability};
pub use error::{EwsError, EwsResult, Recovery};
pub use fault::{FaultOutcome, check_response};
pub use incremental::{SyncBatch, SyncChanges, SyncCursor};
pub use notification::{EventType, MovedItem, PushNotification, Subscription, parse_push_notification};
pub use pager::{Detail, ListQuery, Page, PageCursor, Pager};
pub use request::{IdFormat, ItemRef, ListFilter, Request, SendMode, Shape, Traversal};
pub use transport::{EnvelopeBuilder, HttpTransport, Transport};
