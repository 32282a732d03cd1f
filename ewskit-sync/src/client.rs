//! The request/response client.
//!
//! Every exchange goes through [`Client::send`]: transport call, response
//! classification, bounded retry of transient server errors. Higher level
//! operations (lookups, writes, paging, incremental sync) are built on it
//! in their own modules.

use crate::config::ClientConfig;
use crate::error::{EwsError, EwsResult};
use crate::fault::check_response;
use crate::request::{Request, Shape};
use crate::transport::Transport;
use backoff::ExponentialBackoffBuilder;
use backoff::future::retry_notify;
use ewskit_model::kinds::FolderItem;
use ewskit_model::{Document, Entity, EntityClass, EntityKind, Extractor, Identity, Namespaces};
use ewskit_types::{FolderRef, ItemId};
use std::time::Duration;
use tracing::{debug, warn};

/// Client for one remote store endpoint.
pub struct Client<T> {
    transport: T,
    config: ClientConfig,
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T, config: ClientConfig) -> EwsResult<Self> {
        config.validate()?;
        Ok(Self { transport, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn namespaces(&self) -> &Namespaces {
        &self.config.namespaces
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends a request and classifies the response.
    ///
    /// Transient server errors are retried with exponential backoff, up to
    /// `max_retries` times. Every other failure is returned immediately.
    pub async fn send(&self, request: &Request) -> EwsResult<Document> {
        self.send_checked(request, |document, namespaces| {
            check_response(document, namespaces).map(|_| ())
        })
        .await
    }

    /// Like [`send`](Self::send), with `check` deciding whether a response failed.
    pub(crate) async fn send_checked<F>(&self, request: &Request, check: F) -> EwsResult<Document>
    where
        F: Fn(&Document, &Namespaces) -> EwsResult<()>,
    {
        let max_retries = self.config.max_retries;
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(
                self.config.retry_initial_interval_ms,
            ))
            .with_multiplier(2.0)
            .with_max_elapsed_time(None)
            .build();

        let check = &check;
        let mut attempt = 0u32;
        retry_notify(
            policy,
            || {
                attempt += 1;
                let current = attempt;
                async move {
                    debug!("{} attempt {}", request.operation(), current);
                    match self.send_once(request, check).await {
                        Ok(document) => Ok(document),
                        Err(e) if e.is_retryable() && current <= max_retries => {
                            Err(backoff::Error::transient(e))
                        }
                        Err(e) => Err(backoff::Error::permanent(e)),
                    }
                }
            },
            |e: EwsError, wait: Duration| {
                warn!(
                    "{} failed ({}), retrying in {:?}",
                    request.operation(),
                    e,
                    wait
                );
            },
        )
        .await
    }

    async fn send_once<F>(&self, request: &Request, check: &F) -> EwsResult<Document>
    where
        F: Fn(&Document, &Namespaces) -> EwsResult<()>,
    {
        let document = self.transport.send(request).await?;
        check(&document, self.namespaces())?;
        Ok(document)
    }

    /// Looks up one entity by id with all properties.
    pub async fn get<K: EntityKind>(&self, id: &ItemId) -> EwsResult<Entity<K>> {
        let request = lookup_request::<K>(vec![id.clone()], Shape::AllProperties);
        let document = self.send(&request).await?;
        Ok(Entity::hydrate_from_document(&document, self.namespaces())?)
    }

    /// Looks up several entities in one request, preserving input order.
    ///
    /// An empty id list makes no request.
    pub async fn get_many<K: EntityKind>(&self, ids: &[ItemId]) -> EwsResult<Vec<Entity<K>>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let request = lookup_request::<K>(ids.to_vec(), Shape::AllProperties);
        let document = self.send(&request).await?;
        Ok(Entity::hydrate_all(&document, self.namespaces())?)
    }

    /// Looks up a folder by id or distinguished name.
    pub async fn get_folder(&self, folder: &FolderRef) -> EwsResult<Entity<FolderItem>> {
        let request = Request::GetFolder {
            folders: vec![folder.clone()],
            shape: Shape::AllProperties,
        };
        let document = self.send(&request).await?;
        Ok(Entity::hydrate_from_document(&document, self.namespaces())?)
    }

    /// Identity of the first entity of kind `K` in a response, if any.
    pub(crate) fn returned_identity<K: EntityKind>(
        &self,
        document: &Document,
    ) -> EwsResult<Option<Identity>> {
        let extractor = Extractor::new(self.namespaces());
        let Some(node) = extractor
            .scopes(document.root(), &K::items_locator())?
            .into_iter()
            .next()
        else {
            return Ok(None);
        };
        let identity = extractor.extract_identity(node, K::ID_ELEMENT)?;
        Ok(identity.id.is_some().then_some(identity))
    }
}

pub(crate) fn lookup_request<K: EntityKind>(ids: Vec<ItemId>, shape: Shape) -> Request {
    match K::CLASS {
        EntityClass::Item => Request::GetItem { ids, shape },
        EntityClass::Folder => Request::GetFolder {
            folders: ids.into_iter().map(FolderRef::Id).collect(),
            shape,
        },
    }
}
