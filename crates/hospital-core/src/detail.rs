//! Read-only detail view.

use std::sync::Arc;

use crate::entity::Entity;
use crate::navigation::Navigator;

/// Displays one resolved entity. Holds no mutation capability.
pub struct DetailView<E: Entity> {
    entity: E,
    navigator: Arc<dyn Navigator>,
}

impl<E: Entity> DetailView<E> {
    /// Wrap a resolved entity.
    pub fn new(entity: E, navigator: Arc<dyn Navigator>) -> Self {
        Self { entity, navigator }
    }

    /// The entity being shown.
    pub fn entity(&self) -> &E {
        &self.entity
    }

    /// Return to the previous context.
    pub fn previous_state(&self) {
        self.navigator.previous_state();
    }
}

impl<E: Entity> std::fmt::Debug for DetailView<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetailView")
            .field("entity", &self.entity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Hospital;
    use crate::navigation::History;

    #[test]
    fn test_detail_exposes_entity_as_is() {
        let history = Arc::new(History::new());
        let view = DetailView::new(Hospital::with_id("42", "St. Mary"), history.clone());

        assert_eq!(view.entity(), &Hospital::with_id("42", "St. Mary"));

        view.previous_state();
        assert_eq!(history.back_count(), 1);
    }
}
