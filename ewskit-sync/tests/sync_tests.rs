mod common;

use common::{calendar_item, client, response, sync_response};
use ewskit_model::kinds::{CalendarItem, FolderItem};
use ewskit_model::{Document, Entity, Namespaces};
use ewskit_sync::{EwsError, Request, Shape, SyncBatch, SyncChanges, SyncCursor};
use ewskit_types::{DistinguishedFolder, FolderRef, ItemId, Watermark};
use pretty_assertions::assert_eq;

fn calendar() -> FolderRef {
    DistinguishedFolder::Calendar.into()
}

fn id(s: &str) -> ItemId {
    ItemId::new(s).unwrap()
}

fn event(id: &str, subject: &str) -> Entity<CalendarItem> {
    let doc = Document::parse(&common::items_response("GetItem", &calendar_item(id, "ck", subject)))
        .unwrap();
    Entity::hydrate_from_document(&doc, &Namespaces::ews()).unwrap()
}

fn ids(entities: &[Entity<CalendarItem>]) -> Vec<&str> {
    entities
        .iter()
        .filter_map(|e| e.id())
        .map(ItemId::as_str)
        .collect()
}

// ── Single batch ─────────────────────────────────────────────────

#[tokio::test]
async fn initial_sync_sends_empty_state() {
    let (client, transport) = client();
    transport.push(&sync_response(&[], &[], &[], "S1", true));

    client
        .sync_folder::<CalendarItem>(&calendar(), &SyncCursor::initial())
        .await
        .unwrap();

    assert_eq!(
        transport.requests(),
        vec![Request::SyncFolderItems {
            folder: calendar(),
            shape: Shape::AllProperties,
            sync_state: Watermark::default(),
            max_changes: 1000,
        }]
    );
}

#[tokio::test]
async fn batch_splits_changes_by_type() {
    let (client, transport) = client();
    transport.push(&sync_response(
        &[calendar_item("a", "1", "Created A"), calendar_item("b", "1", "Created B")],
        &[calendar_item("c", "2", "Updated C")],
        &["d"],
        "S1",
        true,
    ));

    let batch = client
        .sync_folder::<CalendarItem>(&calendar(), &SyncCursor::initial())
        .await
        .unwrap();

    assert_eq!(ids(&batch.created), vec!["a", "b"]);
    assert_eq!(batch.created[1].subject(), Some("Created B"));
    assert_eq!(ids(&batch.updated), vec!["c"]);
    assert_eq!(batch.deleted, vec![id("d")]);
    assert_eq!(
        batch.cursor,
        SyncCursor {
            watermark: Watermark::new("S1"),
            complete: true,
        }
    );
    assert!(!batch.is_empty());
}

#[tokio::test]
async fn two_call_sync_accumulates_each_change_type() {
    let (client, transport) = client();
    transport.push(&sync_response(&[calendar_item("e1", "1", "E1")], &[], &[], "W1", false));
    transport.push(&sync_response(
        &[],
        &[calendar_item("e2", "2", "E2 edited")],
        &["e3"],
        "W2",
        true,
    ));

    let first = client
        .sync_folder::<CalendarItem>(&calendar(), &SyncCursor::initial())
        .await
        .unwrap();
    assert_eq!(ids(&first.created), vec!["e1"]);
    assert!(!first.cursor.complete);
    assert_eq!(first.cursor.watermark, Watermark::new("W1"));

    let mut changes = SyncChanges::new(SyncCursor::initial());
    let resume = first.cursor.clone();
    changes.absorb(first);

    let second = client
        .sync_folder::<CalendarItem>(&calendar(), &resume)
        .await
        .unwrap();
    assert_eq!(ids(&second.updated), vec!["e2"]);
    assert_eq!(second.deleted, vec![id("e3")]);
    changes.absorb(second);

    match &transport.requests()[1] {
        Request::SyncFolderItems { sync_state, .. } => assert_eq!(sync_state.as_str(), "W1"),
        other => panic!("expected SyncFolderItems, got {other:?}"),
    }
    assert_eq!(ids(&changes.created), vec!["e1"]);
    assert_eq!(ids(&changes.updated), vec!["e2"]);
    assert_eq!(changes.deleted, vec![id("e3")]);
    assert_eq!(
        changes.cursor,
        SyncCursor {
            watermark: Watermark::new("W2"),
            complete: true,
        }
    );
    assert!(changes.is_complete());
}

#[tokio::test]
async fn two_call_sync_resumes_from_watermark() {
    let (client, transport) = client();
    transport.push(&sync_response(
        &[calendar_item("a", "1", "A"), calendar_item("b", "1", "B")],
        &[],
        &[],
        "S1",
        false,
    ));
    transport.push(&sync_response(
        &[calendar_item("c", "1", "C")],
        &[calendar_item("a", "2", "A edited")],
        &["b"],
        "S2",
        true,
    ));

    let mut changes = SyncChanges::new(SyncCursor::initial());
    while !changes.is_complete() {
        let cursor = changes.cursor.clone();
        let batch = client
            .sync_folder::<CalendarItem>(&calendar(), &cursor)
            .await
            .unwrap();
        changes.absorb(batch);
    }

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    match &requests[1] {
        Request::SyncFolderItems { sync_state, .. } => assert_eq!(sync_state.as_str(), "S1"),
        other => panic!("expected SyncFolderItems, got {other:?}"),
    }

    assert_eq!(ids(&changes.created), vec!["a", "c"]);
    assert_eq!(changes.created[0].subject(), Some("A edited"));
    assert!(changes.updated.is_empty());
    // b was created and deleted within the same run.
    assert!(changes.deleted.is_empty());
    assert_eq!(changes.cursor.watermark, Watermark::new("S2"));
}

#[tokio::test]
async fn empty_batch_keeps_the_new_watermark() {
    let (client, transport) = client();
    transport.push(&sync_response(&[], &[], &[], "S9", true));

    let batch = client
        .sync_folder::<CalendarItem>(&calendar(), &SyncCursor::resume(Watermark::new("S8")))
        .await
        .unwrap();
    assert!(batch.is_empty());
    assert_eq!(batch.cursor.watermark.as_str(), "S9");
}

#[tokio::test]
async fn missing_sync_state_is_fatal() {
    let (client, transport) = client();
    transport.push(&response(
        "SyncFolderItems",
        "NoError",
        "<m:IncludesLastItemInRange>true</m:IncludesLastItemInRange><m:Changes/>",
    ));

    let err = client
        .sync_folder::<CalendarItem>(&calendar(), &SyncCursor::initial())
        .await
        .unwrap_err();
    assert!(matches!(err, EwsError::Fatal { .. }));
}

#[tokio::test]
async fn invalid_sync_state_is_fatal_server_error() {
    let (client, transport) = client();
    transport.push(&common::error_response("SyncFolderItems", "ErrorInvalidSyncStateData"));

    let err = client
        .sync_folder::<CalendarItem>(&calendar(), &SyncCursor::resume(Watermark::new("bogus")))
        .await
        .unwrap_err();
    match err {
        EwsError::Fatal { code, .. } => assert_eq!(code.as_deref(), Some("ErrorInvalidSyncStateData")),
        other => panic!("expected Fatal, got {other:?}"),
    }
}

#[tokio::test]
async fn folder_kinds_cannot_be_item_synced() {
    let (client, transport) = client();
    let err = client
        .sync_folder::<FolderItem>(&calendar(), &SyncCursor::initial())
        .await
        .unwrap_err();
    assert!(matches!(err, EwsError::InvalidState(_)));
    assert_eq!(transport.request_count(), 0);
}

// ── Accumulation ─────────────────────────────────────────────────

fn batch(
    created: Vec<Entity<CalendarItem>>,
    updated: Vec<Entity<CalendarItem>>,
    deleted: Vec<ItemId>,
    state: &str,
) -> SyncBatch<CalendarItem> {
    SyncBatch {
        created,
        updated,
        deleted,
        cursor: SyncCursor::resume(Watermark::new(state)),
    }
}

#[test]
fn later_update_replaces_earlier_update() {
    let mut changes = SyncChanges::new(SyncCursor::initial());
    changes.absorb(batch(vec![], vec![event("x", "v1")], vec![], "S1"));
    changes.absorb(batch(vec![], vec![event("x", "v2")], vec![], "S2"));

    assert_eq!(changes.updated.len(), 1);
    assert_eq!(changes.updated[0].subject(), Some("v2"));
    assert!(!changes.is_complete());
}

#[test]
fn deletion_of_known_entity_is_recorded_once() {
    let mut changes = SyncChanges::new(SyncCursor::initial());
    changes.absorb(batch(vec![], vec![event("x", "v1")], vec![], "S1"));
    changes.absorb(batch(vec![], vec![], vec![id("x")], "S2"));
    changes.absorb(batch(vec![], vec![], vec![id("x")], "S3"));

    assert!(changes.updated.is_empty());
    assert_eq!(changes.deleted, vec![id("x")]);
    assert_eq!(changes.cursor.watermark.as_str(), "S3");
}

#[test]
fn sync_cursor_serde_roundtrip() {
    let cursor = SyncCursor {
        watermark: Watermark::new("H4sIAAAA"),
        complete: false,
    };
    let json = serde_json::to_string(&cursor).unwrap();
    assert_eq!(json, r#"{"watermark":"H4sIAAAA","complete":false}"#);
    let back: SyncCursor = serde_json::from_str(&json).unwrap();
    assert_eq!(back, cursor);
}
