//! Mock transport for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

use super::provider::EntityTransport;
use crate::entity::Entity;
use crate::envelope::{Envelope, PageRequest};
use crate::{Error, Result};

/// A call the mock received, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `find(id)`
    Find(String),
    /// `create(entity)`
    Create,
    /// `update(entity)` with the entity's identifier
    Update(String),
    /// `query(page)`
    Query(PageRequest),
    /// `search(query, page)`
    Search(String),
    /// `delete(id)`
    Delete(String),
}

/// Mock transport that returns queued responses and records every call.
///
/// Each operation pops from its own queue. When a queue is empty the mock
/// falls back to a plausible default: `find` answers 404, `create` and
/// `update` echo the entity back, `query`/`search` return an empty page and
/// `delete` succeeds.
///
/// Clones share queues and the call log.
pub struct MockTransport<E: Entity> {
    state: Arc<Mutex<MockState<E>>>,
    gate: Option<Arc<Notify>>,
}

struct MockState<E> {
    finds: VecDeque<Result<Envelope<E>>>,
    saves: VecDeque<Result<Envelope<E>>>,
    pages: VecDeque<Result<Envelope<Vec<E>>>>,
    deletes: VecDeque<Result<Envelope<()>>>,
    calls: Vec<Call>,
}

impl<E: Entity> Clone for MockTransport<E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            gate: self.gate.clone(),
        }
    }
}

impl<E: Entity> Default for MockTransport<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> MockTransport<E> {
    /// Creates a mock with empty queues.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                finds: VecDeque::new(),
                saves: VecDeque::new(),
                pages: VecDeque::new(),
                deletes: VecDeque::new(),
                calls: Vec::new(),
            })),
            gate: None,
        }
    }

    /// Queue a `find` response.
    pub fn with_find(self, response: Result<Envelope<E>>) -> Self {
        self.lock().finds.push_back(response);
        self
    }

    /// Queue a `create`/`update` response.
    pub fn with_save(self, response: Result<Envelope<E>>) -> Self {
        self.lock().saves.push_back(response);
        self
    }

    /// Queue a `query`/`search` response.
    pub fn with_page(self, response: Result<Envelope<Vec<E>>>) -> Self {
        self.lock().pages.push_back(response);
        self
    }

    /// Queue a `delete` response.
    pub fn with_delete(self, response: Result<Envelope<()>>) -> Self {
        self.lock().deletes.push_back(response);
        self
    }

    /// Hold every write (`create`, `update`, `delete`) until the returned
    /// gate is notified once per held call.
    ///
    /// The call is recorded before the mock waits, so tests can observe
    /// in-flight state.
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    /// All calls received so far.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Number of calls matching a predicate.
    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| predicate(c)).count()
    }

    fn lock(&self) -> MutexGuard<'_, MockState<E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: Call) {
        self.lock().calls.push(call);
    }

    async fn wait_for_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
    }

    fn next_save(&self, entity: &E, status: u16) -> Result<Envelope<E>> {
        self.lock()
            .saves
            .pop_front()
            .unwrap_or_else(|| Ok(Envelope::with_status(status, Some(entity.clone()))))
    }
}

#[async_trait]
impl<E: Entity> EntityTransport<E> for MockTransport<E> {
    async fn find(&self, id: &E::Id) -> Result<Envelope<E>> {
        self.record(Call::Find(id.to_string()));
        let queued = self.lock().finds.pop_front();
        queued.unwrap_or_else(|| Err(Error::status(404, "Not Found")))
    }

    async fn create(&self, entity: &E) -> Result<Envelope<E>> {
        self.record(Call::Create);
        self.wait_for_gate().await;
        self.next_save(entity, 201)
    }

    async fn update(&self, entity: &E) -> Result<Envelope<E>> {
        let id = entity.id().map(ToString::to_string).unwrap_or_default();
        self.record(Call::Update(id));
        self.wait_for_gate().await;
        self.next_save(entity, 200)
    }

    async fn query(&self, page: &PageRequest) -> Result<Envelope<Vec<E>>> {
        self.record(Call::Query(page.clone()));
        let queued = self.lock().pages.pop_front();
        queued.unwrap_or_else(|| Ok(Envelope::ok(Vec::new()).with_total_count(0)))
    }

    async fn search(&self, query: &str, _page: &PageRequest) -> Result<Envelope<Vec<E>>> {
        self.record(Call::Search(query.to_string()));
        let queued = self.lock().pages.pop_front();
        queued.unwrap_or_else(|| Ok(Envelope::ok(Vec::new()).with_total_count(0)))
    }

    async fn delete(&self, id: &E::Id) -> Result<Envelope<()>> {
        self.record(Call::Delete(id.to_string()));
        self.wait_for_gate().await;
        let queued = self.lock().deletes.pop_front();
        queued.unwrap_or_else(|| Ok(Envelope::with_status(200, None)))
    }
}
