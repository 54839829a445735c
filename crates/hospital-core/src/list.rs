//! Paged list view.

use std::sync::Arc;
use tracing::debug;

use crate::entity::Entity;
use crate::envelope::PageRequest;
use crate::transport::EntityTransport;
use crate::Result;

/// One page of entities plus the paging state used to fetch it.
pub struct ListView<E: Entity> {
    transport: Arc<dyn EntityTransport<E>>,
    request: PageRequest,
    query: Option<String>,
    items: Vec<E>,
    total: u64,
}

impl<E: Entity> ListView<E> {
    /// Creates an empty list; nothing is fetched until [`load`](Self::load).
    pub fn new(transport: Arc<dyn EntityTransport<E>>) -> Self {
        Self {
            transport,
            request: PageRequest::default(),
            query: None,
            items: Vec::new(),
            total: 0,
        }
    }

    /// Fetch a page of all entities.
    pub async fn load(&mut self, request: PageRequest) -> Result<()> {
        debug!("loading {} page {}", E::RESOURCE, request.page);
        let envelope = self.transport.query(&request).await?;
        self.query = None;
        self.accept(request, envelope.total_count, envelope.body.unwrap_or_default());
        Ok(())
    }

    /// Fetch a page of entities matching `query`.
    ///
    /// An empty query falls back to [`load`](Self::load).
    pub async fn search(&mut self, query: &str, request: PageRequest) -> Result<()> {
        let query = query.trim();
        if query.is_empty() {
            return self.load(request).await;
        }
        debug!("searching {} for '{query}'", E::RESOURCE);
        let envelope = self.transport.search(query, &request).await?;
        self.query = Some(query.to_string());
        self.accept(request, envelope.total_count, envelope.body.unwrap_or_default());
        Ok(())
    }

    /// Re-fetch the current page with the current query.
    pub async fn reload(&mut self) -> Result<()> {
        let request = self.request.clone();
        match self.query.clone() {
            Some(query) => self.search(&query, request).await,
            None => self.load(request).await,
        }
    }

    fn accept(&mut self, request: PageRequest, total: Option<u64>, items: Vec<E>) {
        self.total = total.unwrap_or(items.len() as u64);
        self.items = items;
        self.request = request;
    }

    /// Entities on the current page.
    pub fn items(&self) -> &[E] {
        &self.items
    }

    /// Total entities across all pages.
    pub fn total_items(&self) -> u64 {
        self.total
    }

    /// The page request that produced the current items.
    pub fn request(&self) -> &PageRequest {
        &self.request
    }

    /// Active search query, if the page came from a search.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Number of pages at the current page size.
    pub fn page_count(&self) -> u64 {
        let size = u64::from(self.request.size.max(1));
        self.total.div_ceil(size)
    }
}

impl<E: Entity> std::fmt::Debug for ListView<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListView")
            .field("request", &self.request)
            .field("query", &self.query)
            .field("items", &self.items.len())
            .field("total", &self.total)
            .finish()
    }
}
