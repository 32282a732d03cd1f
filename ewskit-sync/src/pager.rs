//! Paginated listings.
//!
//! A [`Pager`] walks a folder listing lazily, one request per page. It is
//! forward-only and single-pass: each page is an independent snapshot, so
//! entities created or deleted while paging may be skipped or seen twice.
//! [`Client::list_all`] is the eager counterpart.

use crate::client::Client;
use crate::error::{EwsError, EwsResult};
use crate::request::{ListFilter, Request, Shape, Traversal};
use crate::transport::Transport;
use ewskit_model::kinds::{Contact, FolderItem};
use ewskit_model::{
    Document, Entity, EntityClass, EntityKind, ExtractionSchema, Extractor, FieldDef, Locator,
    Value,
};
use ewskit_types::{FolderRef, ItemId};
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::LazyLock;
use tracing::{debug, warn};

static PAGING: LazyLock<ExtractionSchema> = LazyLock::new(|| {
    ExtractionSchema::new(
        "paging",
        vec![
            FieldDef::integer("offset", "//RootFolder/@IndexedPagingOffset"),
            FieldDef::boolean("includes_last", "//RootFolder/@IncludesLastItemInRange"),
            FieldDef::integer("total", "//RootFolder/@TotalItemsInView"),
        ],
    )
});

/// Every entry the server put in the page, whatever its element.
const SERVED_ENTRIES: &str = "//RootFolder/*/*";

/// How much of each listed entity to load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Detail {
    /// Ids and change keys only.
    #[default]
    IdOnly,
    /// Whatever the listing itself returns.
    Summary,
    /// Every attribute, via one bulk lookup per page.
    Full,
}

/// What to list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub folder: FolderRef,
    /// Entries per request; the client's batch size when unset.
    pub page_size: Option<u32>,
    pub filter: Option<ListFilter>,
    pub detail: Detail,
    pub traversal: Traversal,
}

impl ListQuery {
    pub fn new(folder: impl Into<FolderRef>) -> Self {
        Self {
            folder: folder.into(),
            page_size: None,
            filter: None,
            detail: Detail::default(),
            traversal: Traversal::default(),
        }
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn filter(mut self, filter: ListFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn detail(mut self, detail: Detail) -> Self {
        self.detail = detail;
        self
    }

    pub fn traversal(mut self, traversal: Traversal) -> Self {
        self.traversal = traversal;
        self
    }
}

/// Position of a pager. Serializable so a listing can be resumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    /// Offset the next request starts from.
    pub offset: u32,
    /// The last page has been fetched.
    pub complete: bool,
    /// Total entries in the view, as last reported by the server.
    pub total: Option<u32>,
}

/// One fetched page.
#[derive(Debug, Clone)]
pub struct Page<K: EntityKind> {
    pub entities: Vec<Entity<K>>,
    /// Cursor after this page.
    pub cursor: PageCursor,
}

/// Lazy, forward-only listing of entities of kind `K`.
pub struct Pager<'c, T, K: EntityKind> {
    client: &'c Client<T>,
    query: ListQuery,
    cursor: PageCursor,
    buffer: VecDeque<Entity<K>>,
}

impl<'c, T: Transport, K: EntityKind> Pager<'c, T, K> {
    fn new(client: &'c Client<T>, query: ListQuery, cursor: PageCursor) -> Self {
        Self {
            client,
            query,
            cursor,
            buffer: VecDeque::new(),
        }
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }

    /// True once every fetched entity has been handed out and no page is left.
    pub fn is_exhausted(&self) -> bool {
        self.cursor.complete && self.buffer.is_empty()
    }

    /// Returns the next page, or `None` when the listing is done.
    ///
    /// Entities already fetched but not yet returned by
    /// [`next_entity`](Self::next_entity) come back first as a page of their own.
    pub async fn next_page(&mut self) -> EwsResult<Option<Page<K>>> {
        if !self.buffer.is_empty() {
            return Ok(Some(Page {
                entities: self.buffer.drain(..).collect(),
                cursor: self.cursor,
            }));
        }
        if self.cursor.complete {
            return Ok(None);
        }

        // Pages holding only other element types yield nothing but still advance.
        loop {
            let entities = self.fetch().await?;
            if !entities.is_empty() {
                return Ok(Some(Page {
                    entities,
                    cursor: self.cursor,
                }));
            }
            if self.cursor.complete {
                return Ok(None);
            }
        }
    }

    /// Returns the next entity, fetching a page when the buffer runs dry.
    pub async fn next_entity(&mut self) -> EwsResult<Option<Entity<K>>> {
        loop {
            if let Some(entity) = self.buffer.pop_front() {
                return Ok(Some(entity));
            }
            if self.cursor.complete {
                return Ok(None);
            }
            let entities = self.fetch().await?;
            self.buffer.extend(entities);
        }
    }

    /// Adapts the pager into a stream of entities.
    pub fn into_stream(self) -> impl Stream<Item = EwsResult<Entity<K>>> + 'c
    where
        T: 'c,
    {
        futures::stream::try_unfold(self, |mut pager| async move {
            let next = pager.next_entity().await?;
            Ok::<_, EwsError>(next.map(|entity| (entity, pager)))
        })
    }

    async fn fetch(&mut self) -> EwsResult<Vec<Entity<K>>> {
        let offset = self.cursor.offset;
        let request = self.request(offset);
        debug!(
            "listing {} from offset {} ({})",
            self.query.folder,
            offset,
            request.operation()
        );

        let document = self.client.send(&request).await?;
        let namespaces = self.client.namespaces();
        let entities = Entity::<K>::hydrate_all(&document, namespaces)?;
        let served = Locator::parse(SERVED_ENTRIES)?
            .resolve_nodes(document.root(), namespaces)?
            .len();
        let cursor = self.next_cursor(&document, served)?;

        let entities = match self.query.detail {
            Detail::Full if !entities.is_empty() => self.load_detail(entities).await?,
            _ => entities,
        };

        debug!(
            "page of {} entities ({} served), next offset {}, complete: {}",
            entities.len(),
            served,
            cursor.offset,
            cursor.complete
        );
        self.cursor = cursor;
        Ok(entities)
    }

    fn request(&self, offset: u32) -> Request {
        let shape = match self.query.detail {
            Detail::Summary => Shape::AllProperties,
            Detail::IdOnly | Detail::Full => Shape::IdOnly,
        };
        let max_entries = self
            .query
            .page_size
            .unwrap_or(self.client.config().batch_size);

        match K::CLASS {
            EntityClass::Item => Request::FindItem {
                folder: self.query.folder.clone(),
                shape,
                traversal: self.query.traversal,
                offset,
                max_entries,
                filter: self.query.filter.clone(),
            },
            EntityClass::Folder => Request::FindFolder {
                parent: self.query.folder.clone(),
                shape,
                traversal: self.query.traversal,
                offset,
                max_entries,
            },
        }
    }

    fn next_cursor(&self, document: &Document, served: usize) -> EwsResult<PageCursor> {
        let paging = Extractor::new(self.client.namespaces()).extract(document.root(), &PAGING)?;
        let served = u32::try_from(served).unwrap_or(u32::MAX);

        let offset = paging
            .get("offset")
            .and_then(Value::as_i64)
            .and_then(|o| u32::try_from(o).ok())
            .unwrap_or_else(|| self.cursor.offset.saturating_add(served));
        let includes_last = paging.get("includes_last").and_then(Value::as_bool);
        if includes_last.is_none() {
            warn!("listing response has no IncludesLastItemInRange; treating page as last");
        }
        let total = paging
            .get("total")
            .and_then(Value::as_i64)
            .and_then(|t| u32::try_from(t).ok());

        Ok(PageCursor {
            offset,
            // An empty page cannot make progress.
            complete: includes_last.unwrap_or(true) || served == 0,
            total: total.or(self.cursor.total),
        })
    }

    /// Replaces id-only entities with fully loaded ones, keeping listing order.
    async fn load_detail(&self, listed: Vec<Entity<K>>) -> EwsResult<Vec<Entity<K>>> {
        let ids: Vec<ItemId> = listed.iter().filter_map(|e| e.id().cloned()).collect();
        let mut detailed: HashMap<ItemId, Entity<K>> = self
            .client
            .get_many::<K>(&ids)
            .await?
            .into_iter()
            .filter_map(|e| e.id().cloned().map(|id| (id, e)))
            .collect();

        Ok(listed
            .into_iter()
            .map(|entity| {
                entity
                    .id()
                    .and_then(|id| detailed.remove(id))
                    .unwrap_or(entity)
            })
            .collect())
    }
}

impl<T: Transport> Client<T> {
    /// Starts a lazy listing.
    pub fn pager<K: EntityKind>(&self, query: ListQuery) -> Pager<'_, T, K> {
        Pager::new(self, query, PageCursor::default())
    }

    /// Resumes a listing from a saved cursor.
    pub fn resume_pager<K: EntityKind>(
        &self,
        query: ListQuery,
        cursor: PageCursor,
    ) -> Pager<'_, T, K> {
        Pager::new(self, query, cursor)
    }

    /// Lists every entity eagerly.
    pub async fn list_all<K: EntityKind>(&self, query: ListQuery) -> EwsResult<Vec<Entity<K>>> {
        let mut pager = self.pager::<K>(query);
        let mut entities = Vec::new();
        while let Some(page) = pager.next_page().await? {
            entities.extend(page.entities);
        }
        Ok(entities)
    }

    /// One page of contacts matching `filter`, with all listed properties.
    ///
    /// Typically a [`ListFilter::NameRange`] or [`ListFilter::QueryString`].
    pub async fn find_contacts(
        &self,
        folder: impl Into<FolderRef>,
        filter: ListFilter,
        max_entries: u32,
    ) -> EwsResult<Vec<Entity<Contact>>> {
        let query = ListQuery::new(folder)
            .filter(filter)
            .page_size(max_entries)
            .detail(Detail::Summary);
        let page = self.pager::<Contact>(query).next_page().await?;
        Ok(page.map(|page| page.entities).unwrap_or_default())
    }

    /// Lists the folder hierarchy below `parent`, at any depth.
    pub fn find_folders(&self, parent: impl Into<FolderRef>) -> Pager<'_, T, FolderItem> {
        self.pager(
            ListQuery::new(parent)
                .detail(Detail::Summary)
                .traversal(Traversal::Deep),
        )
    }
}
