//! Entity transport abstraction.

use async_trait::async_trait;

use crate::Result;
use crate::entity::Entity;
use crate::envelope::{Envelope, PageRequest};

/// Abstraction over the backend REST resource for one entity type.
///
/// Screens only ever talk to this trait, so the HTTP client, the retry
/// wrapper and the test mock are interchangeable.
///
/// Implementations return `Err` for responses that never arrived and for
/// non-success statuses; an `Ok` envelope may still carry a non-2xx status
/// when the implementation chooses to surface it that way, so callers check
/// [`Envelope::is_ok`].
#[async_trait]
pub trait EntityTransport<E: Entity>: Send + Sync {
    /// Fetch one entity by identifier.
    async fn find(&self, id: &E::Id) -> Result<Envelope<E>>;

    /// Create a new entity. The entity must not carry an identifier.
    async fn create(&self, entity: &E) -> Result<Envelope<E>>;

    /// Update an existing entity. The entity must carry an identifier.
    async fn update(&self, entity: &E) -> Result<Envelope<E>>;

    /// Fetch one page of entities.
    async fn query(&self, page: &PageRequest) -> Result<Envelope<Vec<E>>>;

    /// Fetch one page of entities matching a search query.
    async fn search(&self, query: &str, page: &PageRequest) -> Result<Envelope<Vec<E>>>;

    /// Delete one entity by identifier.
    async fn delete(&self, id: &E::Id) -> Result<Envelope<()>>;
}
