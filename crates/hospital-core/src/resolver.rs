//! Entity resolution before a route activates.
//!
//! A detail, edit or delete route needs its entity before the screen is
//! built. [`EntityResolver::resolve`] turns an optional route identifier into
//! a [`Resolution`]: the fetched entity, a blank one for the "new" route, or
//! an explicit failure the router can redirect on.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::entity::Entity;
use crate::transport::EntityTransport;
use crate::Error;

/// Outcome of resolving one route activation.
#[derive(Debug)]
pub enum Resolution<E: Entity> {
    /// The backend returned the entity.
    Found(E),

    /// No identifier was given; a blank entity was constructed locally.
    Blank(E),

    /// The backend has no entity with this identifier.
    NotFound(String),

    /// The fetch failed for any other reason.
    Failed(Error),
}

impl<E: Entity> Resolution<E> {
    /// The resolved entity, if resolution produced one.
    pub fn entity(&self) -> Option<&E> {
        match self {
            Self::Found(e) | Self::Blank(e) => Some(e),
            Self::NotFound(_) | Self::Failed(_) => None,
        }
    }

    /// Consume the resolution, returning the entity if there is one.
    pub fn into_entity(self) -> Option<E> {
        match self {
            Self::Found(e) | Self::Blank(e) => Some(e),
            Self::NotFound(_) | Self::Failed(_) => None,
        }
    }

    /// Whether resolution produced an entity.
    pub fn is_resolved(&self) -> bool {
        self.entity().is_some()
    }
}

/// Produces the entity a route needs before it activates.
pub struct EntityResolver<E: Entity> {
    transport: Arc<dyn EntityTransport<E>>,
}

impl<E: Entity> Clone for EntityResolver<E> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<E: Entity> EntityResolver<E> {
    /// Creates a resolver backed by the given transport.
    pub fn new(transport: Arc<dyn EntityTransport<E>>) -> Self {
        Self { transport }
    }

    /// Resolve an optional route identifier.
    ///
    /// An absent or empty identifier yields [`Resolution::Blank`] without
    /// touching the transport. Any other identifier, whitespace included, is
    /// fetched with exactly one `find`; only a 2xx envelope with a payload
    /// counts as found.
    pub async fn resolve(&self, id: Option<&str>) -> Resolution<E> {
        let raw = match id {
            Some(raw) if !raw.is_empty() => raw,
            _ => {
                debug!("resolving blank {}", E::NAME);
                return Resolution::Blank(E::default());
            }
        };

        let Ok(parsed) = raw.parse::<E::Id>() else {
            warn!("{} identifier '{raw}' is not valid", E::NAME);
            return Resolution::NotFound(raw.to_string());
        };

        debug!("resolving {} {raw}", E::NAME);
        match self.transport.find(&parsed).await {
            Ok(envelope) if envelope.is_ok() => match envelope.into_body() {
                Some(entity) => Resolution::Found(entity),
                None => Resolution::Failed(Error::invalid_data(format!(
                    "{} {raw} response had no body",
                    E::NAME
                ))),
            },
            Ok(envelope) if envelope.status == 404 => Resolution::NotFound(raw.to_string()),
            Ok(envelope) => Resolution::Failed(Error::status(
                envelope.status,
                format!("unexpected status fetching {} {raw}", E::NAME),
            )),
            Err(e) if e.is_not_found() => Resolution::NotFound(raw.to_string()),
            Err(e) => {
                warn!("failed to resolve {} {raw}: {e}", E::NAME);
                Resolution::Failed(e)
            }
        }
    }
}
