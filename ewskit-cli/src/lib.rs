//! Offline tooling over recorded responses.
//!
//! Every command works on response documents saved to disk. Listing and
//! sync commands replay them through the real client via
//! [`ReplayTransport`], so paging and watermark handling behave exactly as
//! they would against a live server.

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::ValueEnum;
use ewskit_model::kinds::{CalendarItem, Contact, FolderItem, Message, Task};
use ewskit_model::{Document, Entity, EntityKind, Namespaces, Value};
use ewskit_sync::{
    Client, ClientConfig, Detail, EwsError, EwsResult, FaultOutcome, ListQuery, PageCursor,
    PushNotification, Request, SyncChanges, SyncCursor, Transport, parse_push_notification,
};
use ewskit_types::{FolderRef, Watermark};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

/// Entity kinds the tool can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    Calendar,
    Contact,
    Task,
    Message,
    Folder,
}

/// Serializable view of one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityView {
    pub id: Option<String>,
    pub change_key: Option<String>,
    pub element: Option<String>,
    /// Present attributes only.
    pub values: BTreeMap<String, Value>,
}

impl<K: EntityKind> From<&Entity<K>> for EntityView {
    fn from(entity: &Entity<K>) -> Self {
        Self {
            id: entity.id().map(ToString::to_string),
            change_key: entity.change_key().map(ToString::to_string),
            element: entity.element_name().map(str::to_string),
            values: entity
                .values()
                .filter_map(|(name, value)| value.map(|v| (name.to_string(), v.clone())))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingSummary {
    pub entities: Vec<EntityView>,
    pub requests: usize,
    pub cursor: PageCursor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncSummary {
    pub created: Vec<EntityView>,
    pub updated: Vec<EntityView>,
    pub deleted: Vec<String>,
    pub cursor: SyncCursor,
    pub requests: usize,
}

/// Transport answering requests with recorded documents, in order.
pub struct ReplayTransport {
    documents: Mutex<VecDeque<Document>>,
    served: AtomicUsize,
}

impl ReplayTransport {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents: Mutex::new(documents.into()),
            served: AtomicUsize::new(0),
        }
    }

    pub fn from_files(paths: &[PathBuf]) -> Result<Self> {
        let documents = paths
            .iter()
            .map(|path| load_document(path))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(documents))
    }

    pub fn remaining(&self) -> usize {
        self.documents.lock().map(|d| d.len()).unwrap_or(0)
    }

    pub fn served(&self) -> usize {
        self.served.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Transport for ReplayTransport {
    async fn send(&self, request: &Request) -> EwsResult<Document> {
        let next = self
            .documents
            .lock()
            .map_err(|_| EwsError::Network("replay queue poisoned".to_string()))?
            .pop_front();
        let Some(document) = next else {
            return Err(EwsError::Network(format!(
                "no recorded response left for {}",
                request.operation()
            )));
        };
        self.served.fetch_add(1, Ordering::Relaxed);
        debug!("replaying response for {}", request.operation());
        Ok(document)
    }
}

pub fn load_document(path: &Path) -> Result<Document> {
    let xml = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Document::parse(&xml).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn load_config(path: Option<&Path>) -> Result<ClientConfig> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(ClientConfig::from_json(&json)?)
        }
        None => Ok(ClientConfig::new("replay")),
    }
}

/// Classifies the status of a saved response.
pub fn classify(document: &Document, namespaces: &Namespaces) -> Result<FaultOutcome> {
    Ok(FaultOutcome::classify_response(document, namespaces)?)
}

/// Hydrates every entity of `kind` found in a saved response.
pub fn extract(kind: Kind, document: &Document, namespaces: &Namespaces) -> Result<Vec<EntityView>> {
    fn views<K: EntityKind>(document: &Document, namespaces: &Namespaces) -> Result<Vec<EntityView>> {
        let entities = Entity::<K>::hydrate_all(document, namespaces)?;
        Ok(entities.iter().map(EntityView::from).collect())
    }

    match kind {
        Kind::Calendar => views::<CalendarItem>(document, namespaces),
        Kind::Contact => views::<Contact>(document, namespaces),
        Kind::Task => views::<Task>(document, namespaces),
        Kind::Message => views::<Message>(document, namespaces),
        Kind::Folder => views::<FolderItem>(document, namespaces),
    }
}

pub fn notification(document: &Document, namespaces: &Namespaces) -> Result<PushNotification> {
    Ok(parse_push_notification(document, namespaces)?)
}

/// Replays recorded listing pages through a pager.
pub async fn replay_listing(
    kind: Kind,
    folder: FolderRef,
    detail: Detail,
    transport: ReplayTransport,
    config: ClientConfig,
) -> Result<ListingSummary> {
    async fn walk<K: EntityKind>(
        client: &Client<ReplayTransport>,
        query: ListQuery,
    ) -> Result<(Vec<EntityView>, PageCursor)> {
        let mut pager = client.pager::<K>(query);
        let mut entities = Vec::new();
        while let Some(page) = pager.next_page().await? {
            debug!("page with {} entities", page.entities.len());
            entities.extend(page.entities.iter().map(EntityView::from));
        }
        Ok((entities, pager.cursor()))
    }

    let client = Client::new(transport, config)?;
    let query = ListQuery::new(folder).detail(detail);
    let (entities, cursor) = match kind {
        Kind::Calendar => walk::<CalendarItem>(&client, query).await?,
        Kind::Contact => walk::<Contact>(&client, query).await?,
        Kind::Task => walk::<Task>(&client, query).await?,
        Kind::Message => walk::<Message>(&client, query).await?,
        Kind::Folder => walk::<FolderItem>(&client, query).await?,
    };

    info!("listed {} entities", entities.len());
    Ok(ListingSummary {
        entities,
        requests: client.transport().served(),
        cursor,
    })
}

/// Replays recorded sync responses until the folder reports completion.
pub async fn replay_sync(
    kind: Kind,
    folder: FolderRef,
    watermark: Option<String>,
    transport: ReplayTransport,
    config: ClientConfig,
) -> Result<SyncSummary> {
    async fn run<K: EntityKind>(
        client: &Client<ReplayTransport>,
        folder: &FolderRef,
        cursor: SyncCursor,
    ) -> Result<SyncSummary> {
        let mut changes = SyncChanges::<K>::new(cursor);
        while !changes.is_complete() && client.transport().remaining() > 0 {
            let cursor = changes.cursor.clone();
            let batch = client.sync_folder::<K>(folder, &cursor).await?;
            changes.absorb(batch);
        }
        Ok(SyncSummary {
            created: changes.created.iter().map(EntityView::from).collect(),
            updated: changes.updated.iter().map(EntityView::from).collect(),
            deleted: changes.deleted.iter().map(ToString::to_string).collect(),
            cursor: changes.cursor,
            requests: client.transport().served(),
        })
    }

    let cursor = match watermark {
        Some(w) => SyncCursor::resume(Watermark::new(w)),
        None => SyncCursor::initial(),
    };
    let client = Client::new(transport, config)?;
    let summary = match kind {
        Kind::Calendar => run::<CalendarItem>(&client, &folder, cursor).await?,
        Kind::Contact => run::<Contact>(&client, &folder, cursor).await?,
        Kind::Task => run::<Task>(&client, &folder, cursor).await?,
        Kind::Message => run::<Message>(&client, &folder, cursor).await?,
        Kind::Folder => anyhow::bail!("folders are not item-synced"),
    };

    info!(
        "sync finished at watermark {} (complete: {})",
        summary.cursor.watermark, summary.cursor.complete
    );
    Ok(summary)
}
