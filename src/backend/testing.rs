use super::{
    AuthBackend, Credentials, Document, DocumentBackend, DocumentSummary, DocumentWrite,
    Registration,
};
use crate::editor::Snapshot;
use crate::error::{DocSyncError, NetworkError, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Semaphore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Op {
    List,
    Create,
    Get,
    Update,
    Delete,
    Login,
    Register,
}

#[derive(Default)]
struct FakeState {
    documents: Vec<Document>,
    next_id: usize,
    failing: HashSet<Op>,
    calls: Vec<(Op, String)>,
    updates: Vec<(String, DocumentWrite)>,
}

/// In-memory backing store that records every call it receives.
///
/// Updates can be held in flight with [`FakeBackend::hold_updates`] and let
/// through one at a time with [`FakeBackend::release_update`].
pub(crate) struct FakeBackend {
    state: Mutex<FakeState>,
    holding: AtomicBool,
    update_gate: Semaphore,
    updates_in_flight: AtomicUsize,
    max_updates_in_flight: AtomicUsize,
}

impl FakeBackend {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeState::default()),
            holding: AtomicBool::new(false),
            update_gate: Semaphore::new(0),
            updates_in_flight: AtomicUsize::new(0),
            max_updates_in_flight: AtomicUsize::new(0),
        })
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn seed(&self, title: &str, content: Snapshot) -> String {
        let mut state = self.lock();
        state.next_id += 1;
        let id = format!("doc-{}", state.next_id);
        state.documents.push(Document {
            id: id.clone(),
            title: title.to_string(),
            content,
            updated_at: None,
            created_at: None,
        });
        id
    }

    pub(crate) fn fail(&self, op: Op) {
        self.lock().failing.insert(op);
    }

    pub(crate) fn recover(&self, op: Op) {
        self.lock().failing.remove(&op);
    }

    pub(crate) fn calls(&self, op: Op) -> usize {
        self.lock().calls.iter().filter(|(o, _)| *o == op).count()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.lock().calls.len()
    }

    pub(crate) fn tokens_seen(&self) -> Vec<String> {
        self.lock().calls.iter().map(|(_, t)| t.clone()).collect()
    }

    pub(crate) fn updates(&self) -> Vec<(String, DocumentWrite)> {
        self.lock().updates.clone()
    }

    pub(crate) fn stored(&self, id: &str) -> Option<Document> {
        self.lock().documents.iter().find(|d| d.id == id).cloned()
    }

    pub(crate) fn hold_updates(&self) {
        self.holding.store(true, Ordering::SeqCst);
    }

    pub(crate) fn release_update(&self) {
        self.update_gate.add_permits(1);
    }

    pub(crate) fn max_concurrent_updates(&self) -> usize {
        self.max_updates_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, op: Op, token: &str) -> Result<()> {
        let mut state = self.lock();
        state.calls.push((op, token.to_string()));
        if state.failing.contains(&op) {
            return Err(NetworkError::new(Some(500), format!("{op:?} failed")).into());
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentBackend for FakeBackend {
    async fn list_documents(&self, token: &str) -> Result<Vec<DocumentSummary>> {
        self.record(Op::List, token)?;
        Ok(self.lock().documents.iter().map(Document::summary).collect())
    }

    async fn create_document(
        &self,
        token: &str,
        write: &DocumentWrite,
    ) -> Result<DocumentSummary> {
        self.record(Op::Create, token)?;
        let mut state = self.lock();
        state.next_id += 1;
        let document = Document {
            id: format!("doc-{}", state.next_id),
            title: write.title.clone(),
            content: write.content.clone(),
            updated_at: None,
            created_at: None,
        };
        let summary = document.summary();
        state.documents.push(document);
        Ok(summary)
    }

    async fn get_document(&self, token: &str, id: &str) -> Result<Document> {
        self.record(Op::Get, token)?;
        self.stored(id).ok_or_else(|| {
            DocSyncError::Network(NetworkError::new(Some(404), "Document not found"))
        })
    }

    async fn update_document(
        &self,
        token: &str,
        id: &str,
        write: &DocumentWrite,
    ) -> Result<Option<Document>> {
        {
            let mut state = self.lock();
            state.calls.push((Op::Update, token.to_string()));
            state.updates.push((id.to_string(), write.clone()));
        }

        let now = self.updates_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_updates_in_flight.fetch_max(now, Ordering::SeqCst);
        if self.holding.load(Ordering::SeqCst)
            && let Ok(permit) = self.update_gate.acquire().await
        {
            permit.forget();
        }
        self.updates_in_flight.fetch_sub(1, Ordering::SeqCst);

        let mut state = self.lock();
        if state.failing.contains(&Op::Update) {
            return Err(NetworkError::new(Some(500), "Update failed").into());
        }
        let Some(document) = state.documents.iter_mut().find(|d| d.id == id) else {
            return Err(NetworkError::new(Some(404), "Document not found").into());
        };
        document.title.clone_from(&write.title);
        document.content = write.content.clone();
        Ok(Some(document.clone()))
    }

    async fn delete_document(&self, token: &str, id: &str) -> Result<()> {
        self.record(Op::Delete, token)?;
        self.lock().documents.retain(|d| d.id != id);
        Ok(())
    }
}

#[async_trait]
impl AuthBackend for FakeBackend {
    async fn login(&self, credentials: &Credentials) -> Result<String> {
        self.record(Op::Login, "")?;
        Ok(format!("token-for-{}", credentials.email))
    }

    async fn register(&self, registration: &Registration) -> Result<String> {
        self.record(Op::Register, "")?;
        Ok(format!("token-for-{}", registration.email))
    }
}
