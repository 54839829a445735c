//! Delete confirmation dialog.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::entity::Entity;
use crate::envelope::Alert;
use crate::navigation::Navigator;
use crate::transport::EntityTransport;
use crate::{Error, Result};

/// Confirms and performs deletion of one resolved entity.
pub struct DeleteDialog<E: Entity> {
    entity: E,
    transport: Arc<dyn EntityTransport<E>>,
    navigator: Arc<dyn Navigator>,
}

impl<E: Entity> DeleteDialog<E> {
    /// Open the dialog on a resolved entity.
    pub fn new(
        entity: E,
        transport: Arc<dyn EntityTransport<E>>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            entity,
            transport,
            navigator,
        }
    }

    /// The entity about to be deleted.
    pub fn entity(&self) -> &E {
        &self.entity
    }

    /// Delete the entity and close the dialog.
    ///
    /// On failure the dialog stays open.
    pub async fn confirm_delete(&self) -> Result<Option<Alert>> {
        let id = self.entity.id().ok_or_else(|| {
            Error::invalid_data(format!("cannot delete a {} that was never saved", E::NAME))
        })?;

        debug!("deleting {} {id}", E::NAME);
        let failure = match self.transport.delete(id).await {
            Ok(envelope) if envelope.is_ok() => {
                self.navigator.previous_state();
                return Ok(envelope.alert);
            }
            Ok(envelope) => Error::status(envelope.status, "delete was not accepted"),
            Err(e) => e,
        };

        warn!("failed to delete {} {id}: {failure}", E::NAME);
        Err(failure)
    }

    /// Close the dialog without deleting.
    pub fn cancel(&self) {
        self.navigator.previous_state();
    }
}

impl<E: Entity> std::fmt::Debug for DeleteDialog<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeleteDialog")
            .field("entity", &self.entity)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entity::Hospital;
    use crate::envelope::Envelope;
    use crate::navigation::History;
    use crate::transport::{Call, MockTransport};

    #[tokio::test]
    async fn test_confirm_deletes_and_navigates_back() {
        let alert = Alert {
            message: "amachouApp.hospital.deleted".into(),
            param: Some("8".into()),
        };
        let mock = MockTransport::<Hospital>::new()
            .with_delete(Ok(Envelope::with_status(200, None).with_alert(alert.clone())));
        let history = Arc::new(History::new());
        let dialog = DeleteDialog::new(
            Hospital::with_id("8", "Old Wing"),
            Arc::new(mock.clone()),
            history.clone(),
        );

        let returned = dialog.confirm_delete().await.unwrap();

        assert_eq!(returned, Some(alert));
        assert_eq!(mock.calls(), vec![Call::Delete("8".into())]);
        assert_eq!(history.back_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_delete_stays_open() {
        let mock = MockTransport::<Hospital>::new().with_delete(Err(Error::status(500, "boom")));
        let history = Arc::new(History::new());
        let dialog = DeleteDialog::new(
            Hospital::with_id("8", "Old Wing"),
            Arc::new(mock),
            history.clone(),
        );

        assert!(dialog.confirm_delete().await.is_err());
        assert_eq!(history.back_count(), 0);
    }

    #[tokio::test]
    async fn test_rejected_delete_stays_open() {
        let mock =
            MockTransport::<Hospital>::new().with_delete(Ok(Envelope::with_status(409, None)));
        let history = Arc::new(History::new());
        let dialog = DeleteDialog::new(
            Hospital::with_id("8", "Old Wing"),
            Arc::new(mock),
            history.clone(),
        );

        let err = dialog.confirm_delete().await.unwrap_err();

        assert_eq!(err.status_code(), Some(409));
        assert_eq!(history.back_count(), 0);
    }

    #[tokio::test]
    async fn test_unsaved_entity_cannot_be_deleted() {
        let mock = MockTransport::<Hospital>::new();
        let dialog = DeleteDialog::new(
            Hospital::named("Draft"),
            Arc::new(mock.clone()),
            Arc::new(History::new()),
        );

        let err = dialog.confirm_delete().await.unwrap_err();

        assert!(matches!(err, Error::InvalidData(_)));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_cancel_navigates_back() {
        let history = Arc::new(History::new());
        let dialog = DeleteDialog::new(
            Hospital::with_id("1", "A"),
            Arc::new(MockTransport::<Hospital>::new()),
            history.clone(),
        );
        dialog.cancel();
        assert_eq!(history.back_count(), 1);
    }
}
