//! Edit sessions.
//!
//! An [`EditSession`] owns the working copy of one entity for the lifetime
//! of an edit or create route, and runs the save protocol:
//!
//! ```text
//! Idle(entity) --save()--> Saving(entity) --ok----> Idle + navigate back
//!                                         \-error-> Idle (entity unchanged)
//!                                         \-dropped-> Idle (entity unchanged)
//! ```
//!
//! The phase lives in a `tokio::sync::watch` channel so a UI can observe
//! "saving" without polling. Clones of a session share the same state.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::entity::Entity;
use crate::envelope::Alert;
use crate::error::SaveError;
use crate::navigation::Navigator;
use crate::transport::EntityTransport;
use crate::Error;

/// Where the session is in the save protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Editable; no save outstanding.
    Idle,
    /// A save has been issued and has not completed.
    Saving,
}

/// Snapshot of a session, as seen by watchers.
#[derive(Debug, Clone)]
pub struct SessionState<E> {
    /// Working copy.
    pub entity: E,
    /// Save protocol phase.
    pub phase: Phase,
}

/// Which transport operation a save used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveKind {
    /// The entity had no identifier.
    Create,
    /// The entity had an identifier.
    Update,
}

/// A completed save.
#[derive(Debug, Clone)]
pub struct SaveOutcome<E> {
    /// Operation used.
    pub kind: SaveKind,
    /// Entity as returned by the backend. Not written back into the session.
    pub saved: Option<E>,
    /// Alert raised by the backend.
    pub alert: Option<Alert>,
}

/// Editing state for one entity during one route activation.
pub struct EditSession<E: Entity> {
    inner: Arc<Inner<E>>,
}

struct Inner<E: Entity> {
    transport: Arc<dyn EntityTransport<E>>,
    navigator: Arc<dyn Navigator>,
    state: watch::Sender<SessionState<E>>,
}

impl<E: Entity> Clone for EditSession<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Entity> std::fmt::Debug for EditSession<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("EditSession")
            .field("entity", &state.entity)
            .field("phase", &state.phase)
            .finish()
    }
}

impl<E: Entity> EditSession<E> {
    /// Start a session on a resolved entity. The session starts `Idle`.
    pub fn new(
        entity: E,
        transport: Arc<dyn EntityTransport<E>>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState {
            entity,
            phase: Phase::Idle,
        });
        Self {
            inner: Arc::new(Inner {
                transport,
                navigator,
                state,
            }),
        }
    }

    /// A copy of the working entity.
    pub fn entity(&self) -> E {
        self.inner.state.borrow().entity.clone()
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.inner.state.borrow().phase
    }

    /// Whether a save is outstanding.
    pub fn is_saving(&self) -> bool {
        self.phase() == Phase::Saving
    }

    /// Watch the session's state.
    pub fn subscribe(&self) -> watch::Receiver<SessionState<E>> {
        self.inner.state.subscribe()
    }

    /// Apply user input to the working copy.
    ///
    /// Rejected with [`SaveError::InProgress`] while a save is outstanding,
    /// so the entity a save sent is the entity the session still holds if
    /// that save fails.
    pub fn edit(&self, change: impl FnOnce(&mut E)) -> Result<(), SaveError> {
        let applied = self.inner.state.send_if_modified(|state| match state.phase {
            Phase::Saving => false,
            Phase::Idle => {
                change(&mut state.entity);
                true
            }
        });
        if applied {
            Ok(())
        } else {
            Err(SaveError::InProgress)
        }
    }

    /// Save the working copy.
    ///
    /// Uses `update` when the entity has an identifier and `create`
    /// otherwise. The phase is `Saving` from before the transport call is
    /// issued until after it completes. On success the navigator is sent back
    /// exactly once; on failure the session stays open and unchanged.
    ///
    /// # Errors
    ///
    /// [`SaveError::InProgress`] if another save on this session has not
    /// completed (no transport call is made), otherwise the classified
    /// transport failure.
    pub async fn save(&self) -> Result<SaveOutcome<E>, SaveError> {
        let mut claimed = None;
        self.inner.state.send_if_modified(|state| match state.phase {
            Phase::Saving => false,
            Phase::Idle => {
                state.phase = Phase::Saving;
                claimed = Some(state.entity.clone());
                true
            }
        });
        let Some(entity) = claimed else {
            debug!("{} save ignored: already saving", E::NAME);
            return Err(SaveError::InProgress);
        };
        let saving = SavingGuard(&self.inner.state);

        let (kind, result) = match entity.id() {
            Some(id) => {
                debug!("updating {} {id}", E::NAME);
                (SaveKind::Update, self.inner.transport.update(&entity).await)
            }
            None => {
                debug!("creating {}", E::NAME);
                (SaveKind::Create, self.inner.transport.create(&entity).await)
            }
        };

        drop(saving);

        let failure = match result {
            Ok(envelope) if envelope.is_ok() => {
                self.inner.navigator.previous_state();
                return Ok(SaveOutcome {
                    kind,
                    alert: envelope.alert,
                    saved: envelope.body,
                });
            }
            Ok(envelope) => Error::status(envelope.status, "save was not accepted"),
            Err(e) => e,
        };

        warn!("{} save failed: {failure}", E::NAME);
        Err(SaveError::from(failure))
    }

    /// Abandon the session and return to the previous context.
    pub fn previous_state(&self) {
        self.inner.navigator.previous_state();
    }
}

/// Returns a claimed session to `Idle` when dropped, including when the
/// `save()` future is cancelled mid-call.
struct SavingGuard<'a, E>(&'a watch::Sender<SessionState<E>>);

impl<E> Drop for SavingGuard<'_, E> {
    fn drop(&mut self) {
        self.0.send_modify(|state| state.phase = Phase::Idle);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::entity::{Hospital, HospitalId};
    use crate::envelope::Envelope;
    use crate::navigation::History;
    use crate::transport::{Call, MockTransport};

    fn session(
        entity: Hospital,
        mock: &MockTransport<Hospital>,
    ) -> (EditSession<Hospital>, Arc<History>) {
        let history = Arc::new(History::new());
        let session = EditSession::new(entity, Arc::new(mock.clone()), history.clone());
        (session, history)
    }

    #[tokio::test]
    async fn test_save_new_entity_creates() {
        let mock = MockTransport::new()
            .with_save(Ok(Envelope::with_status(201, Some(Hospital::with_id("100", "Fresh")))));
        let (session, history) = session(Hospital::named("Fresh"), &mock);

        let outcome = session.save().await.unwrap();

        assert_eq!(outcome.kind, SaveKind::Create);
        assert_eq!(outcome.saved.unwrap().id, Some(HospitalId::new("100")));
        assert_eq!(mock.calls(), vec![Call::Create]);
        assert_eq!(history.back_count(), 1);
        assert!(!session.is_saving());
        // The response is not read back into the working copy.
        assert!(session.entity().id.is_none());
    }

    #[tokio::test]
    async fn test_save_persisted_entity_updates() {
        let mock = MockTransport::new();
        let (session, history) = session(Hospital::with_id("H-1", "General"), &mock);

        let outcome = session.save().await.unwrap();

        assert_eq!(outcome.kind, SaveKind::Update);
        assert_eq!(mock.calls(), vec![Call::Update("H-1".into())]);
        assert_eq!(mock.count(|c| *c == Call::Create), 0);
        assert_eq!(history.back_count(), 1);
    }

    #[tokio::test]
    async fn test_save_failure_keeps_session_open() {
        let mock = MockTransport::new().with_save(Err(Error::Status {
            status: 400,
            message: "Invalid id".into(),
            error_key: Some("idnull".into()),
        }));
        let (session, history) = session(Hospital::with_id("H-1", "General"), &mock);
        session.edit(|h| h.phone = Some("555-0100".into())).unwrap();
        let before = session.entity();

        let err = session.save().await.unwrap_err();

        assert_eq!(
            err,
            SaveError::Validation {
                message: "Invalid id".into(),
                error_key: Some("idnull".into()),
            }
        );
        assert!(!session.is_saving());
        assert_eq!(history.back_count(), 0);
        assert_eq!(session.entity(), before);
    }

    #[tokio::test]
    async fn test_save_failure_kinds() {
        let mock = MockTransport::new()
            .with_save(Err(Error::status(409, "stale")))
            .with_save(Err(Error::transport("connection refused")))
            .with_save(Ok(Envelope::with_status(302, None)));
        let (session, history) = session(Hospital::with_id("3", "North"), &mock);

        assert!(matches!(session.save().await, Err(SaveError::Conflict { .. })));
        assert!(matches!(session.save().await, Err(SaveError::Network { .. })));
        assert!(matches!(
            session.save().await,
            Err(SaveError::Rejected { status: 302, .. })
        ));
        assert_eq!(history.back_count(), 0);
    }

    #[tokio::test]
    async fn test_manual_retry_after_failure() {
        let mock = MockTransport::new().with_save(Err(Error::transport("reset")));
        let (session, history) = session(Hospital::named("Retry"), &mock);

        assert!(session.save().await.is_err());
        assert!(session.save().await.is_ok());

        assert_eq!(mock.calls(), vec![Call::Create, Call::Create]);
        assert_eq!(history.back_count(), 1);
    }

    #[tokio::test]
    async fn test_saving_flag_spans_transport_call() {
        let (mock, gate) = MockTransport::new().gated();
        let (session, history) = session(Hospital::named("Slow"), &mock);
        let mut watcher = session.subscribe();
        assert_eq!(watcher.borrow().phase, Phase::Idle);

        let in_flight = tokio::spawn({
            let session = session.clone();
            async move { session.save().await }
        });

        watcher
            .wait_for(|s| s.phase == Phase::Saving)
            .await
            .unwrap();
        assert!(session.is_saving());
        assert_eq!(mock.calls(), vec![Call::Create]);

        // Double submit and edits are refused while saving.
        assert_eq!(session.save().await.unwrap_err(), SaveError::InProgress);
        assert_eq!(
            session.edit(|h| h.name = "Changed".into()).unwrap_err(),
            SaveError::InProgress
        );
        assert_eq!(mock.calls().len(), 1);

        gate.notify_one();
        let outcome = in_flight.await.unwrap().unwrap();

        assert_eq!(outcome.kind, SaveKind::Create);
        assert!(!session.is_saving());
        assert_eq!(session.entity().name, "Slow");
        assert_eq!(history.back_count(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_save_returns_to_idle() {
        let (mock, gate) = MockTransport::new().gated();
        let (session, history) = session(Hospital::named("Slow"), &mock);

        let cancelled =
            tokio::time::timeout(std::time::Duration::from_millis(20), session.save()).await;

        assert!(cancelled.is_err());
        assert_eq!(session.phase(), Phase::Idle);
        session.edit(|h| h.phone = Some("555-0199".into())).unwrap();

        gate.notify_one();
        let outcome = session.save().await.unwrap();

        assert_eq!(outcome.kind, SaveKind::Create);
        assert_eq!(mock.calls(), vec![Call::Create, Call::Create]);
        assert_eq!(history.back_count(), 1);
        assert!(!session.is_saving());
    }

    #[tokio::test]
    async fn test_previous_state_abandons() {
        let mock = MockTransport::new();
        let (session, history) = session(Hospital::named("Draft"), &mock);
        session.previous_state();
        assert_eq!(history.back_count(), 1);
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_edit_updates_working_copy() {
        let mock = MockTransport::new();
        let (session, _) = session(Hospital::default(), &mock);
        let watcher = session.subscribe();

        session.edit(|h| h.name = "Renamed".into()).unwrap();

        assert_eq!(session.entity().name, "Renamed");
        assert!(watcher.has_changed().unwrap());
    }
}
