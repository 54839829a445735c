//! Route activation.
//!
//! [`Router::activate`] runs the whole entry sequence for one path: match it
//! against the route table, ask the access gate, resolve the entity when the
//! route needs one, and hand back the controller for the screen.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::delete::DeleteDialog;
use crate::detail::DetailView;
use crate::entity::Entity;
use crate::list::ListView;
use crate::navigation::Navigator;
use crate::resolver::{EntityResolver, Resolution};
use crate::routes::{AccessGate, RouteKind, RouteTable};
use crate::session::EditSession;
use crate::transport::EntityTransport;
use crate::{Error, Result};

/// Where to send the user when a route's entity cannot be resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionFallback {
    /// Show a dedicated not-found page.
    #[default]
    NotFound,
    /// Go to the entity list.
    List,
}

/// Why activation did not produce a screen.
#[derive(Debug)]
pub enum Redirect {
    /// The access gate refused the route.
    AccessDenied {
        /// Path that was refused.
        path: String,
    },
    /// The entity does not exist; show the not-found page.
    NotFound {
        /// Identifier that was requested.
        id: String,
    },
    /// Resolution failed; show the entity list.
    List {
        /// What went wrong, if it was more than a missing entity.
        cause: Option<Error>,
    },
    /// Resolution failed for a reason other than a missing entity.
    Error(Error),
}

/// The screen a path activated.
pub enum Activation<E: Entity> {
    /// Paged list (not loaded yet).
    List(ListView<E>),
    /// Read-only detail.
    View(DetailView<E>),
    /// Edit form on a blank or existing entity.
    Edit(EditSession<E>),
    /// Delete confirmation.
    Delete(DeleteDialog<E>),
    /// No screen; go elsewhere.
    Redirect(Redirect),
}

impl<E: Entity> std::fmt::Debug for Activation<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::List(list) => f.debug_tuple("List").field(list).finish(),
            Self::View(view) => f.debug_tuple("View").field(view).finish(),
            Self::Edit(session) => f.debug_tuple("Edit").field(session).finish(),
            Self::Delete(dialog) => f.debug_tuple("Delete").field(dialog).finish(),
            Self::Redirect(redirect) => f.debug_tuple("Redirect").field(redirect).finish(),
        }
    }
}

/// Activates entity routes.
pub struct Router<E: Entity> {
    routes: RouteTable,
    gate: Arc<dyn AccessGate>,
    transport: Arc<dyn EntityTransport<E>>,
    resolver: EntityResolver<E>,
    navigator: Arc<dyn Navigator>,
    fallback: ResolutionFallback,
}

impl<E: Entity> Router<E> {
    /// Creates a router with the default [`ResolutionFallback`].
    pub fn new(
        routes: RouteTable,
        gate: Arc<dyn AccessGate>,
        transport: Arc<dyn EntityTransport<E>>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            routes,
            gate,
            resolver: EntityResolver::new(Arc::clone(&transport)),
            transport,
            navigator,
            fallback: ResolutionFallback::default(),
        }
    }

    /// Sets where unresolvable entities redirect to.
    pub fn with_fallback(mut self, fallback: ResolutionFallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// The route table in use.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Activate `path`.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownRoute`] if no route matches. Every other outcome,
    /// including refused access and failed resolution, is an [`Activation`].
    pub async fn activate(&self, path: &str) -> Result<Activation<E>> {
        let matched = self
            .routes
            .find(path)
            .ok_or_else(|| Error::UnknownRoute(path.to_string()))?;
        let route = matched.route;

        if !self.gate.can_activate(route) {
            info!("access to {path} denied");
            return Ok(Activation::Redirect(Redirect::AccessDenied {
                path: path.to_string(),
            }));
        }

        if !route.resolves_entity() {
            debug!("activating {path}");
            return Ok(Activation::List(ListView::new(Arc::clone(&self.transport))));
        }

        let entity = match self.resolver.resolve(matched.id.as_deref()).await {
            Resolution::Found(entity) => entity,
            Resolution::Blank(entity) if route.kind == RouteKind::Create => entity,
            Resolution::Blank(_) => {
                let id = matched.id.unwrap_or_default();
                return Ok(Activation::Redirect(self.not_found(id)));
            }
            Resolution::NotFound(id) => return Ok(Activation::Redirect(self.not_found(id))),
            Resolution::Failed(e) => return Ok(Activation::Redirect(self.failed(e))),
        };

        debug!("activating {path}");
        let transport = Arc::clone(&self.transport);
        let navigator = Arc::clone(&self.navigator);
        Ok(match route.kind {
            RouteKind::View => Activation::View(DetailView::new(entity, navigator)),
            RouteKind::Create | RouteKind::Edit => {
                Activation::Edit(EditSession::new(entity, transport, navigator))
            }
            RouteKind::Delete => Activation::Delete(DeleteDialog::new(entity, transport, navigator)),
            RouteKind::List => Activation::List(ListView::new(transport)),
        })
    }

    fn not_found(&self, id: String) -> Redirect {
        warn!("{} {id} not found", E::NAME);
        match self.fallback {
            ResolutionFallback::NotFound => Redirect::NotFound { id },
            ResolutionFallback::List => Redirect::List { cause: None },
        }
    }

    fn failed(&self, error: Error) -> Redirect {
        warn!("{} could not be resolved: {error}", E::NAME);
        match self.fallback {
            ResolutionFallback::NotFound => Redirect::Error(error),
            ResolutionFallback::List => Redirect::List { cause: Some(error) },
        }
    }
}
