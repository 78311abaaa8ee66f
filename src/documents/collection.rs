use crate::backend::{DocumentBackend, DocumentSummary, DocumentWrite};
use crate::editor::Snapshot;
use crate::error::{DocSyncError, Result};
use crate::session::SessionHandle;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// In-memory view of the signed-in user's documents.
///
/// Creates are applied locally (prepended) as soon as the store returns the
/// new summary; deletes are applied only after the store confirms them.
/// A failed operation never changes the list.
pub struct DocumentCollectionModel {
    backend: Arc<dyn DocumentBackend>,
    session: SessionHandle,
    documents: Vec<DocumentSummary>,
    draft_title: String,
    last_error: Option<String>,
}

impl DocumentCollectionModel {
    pub fn new(backend: Arc<dyn DocumentBackend>, session: SessionHandle) -> Self {
        Self {
            backend,
            session,
            documents: Vec::new(),
            draft_title: String::new(),
            last_error: None,
        }
    }

    pub fn documents(&self) -> &[DocumentSummary] {
        &self.documents
    }

    /// Most recent reported failure, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn draft_title(&self) -> &str {
        &self.draft_title
    }

    pub fn set_draft_title(&mut self, title: impl Into<String>) {
        self.draft_title = title.into();
    }

    /// Replace the whole list with the store's. Left untouched on failure.
    pub async fn refresh(&mut self) -> Result<()> {
        let token = self.require_token()?;
        match self.backend.list_documents(&token).await {
            Ok(documents) => {
                debug!(count = documents.len(), "document list refreshed");
                self.documents = documents;
                self.last_error = None;
                Ok(())
            }
            Err(error) => Err(self.report("failed to fetch documents", error)),
        }
    }

    /// Create an empty document titled `title` and put it at the front.
    pub async fn create(&mut self, title: &str) -> Result<DocumentSummary> {
        let title = title.trim();
        if title.is_empty() {
            return Err(self.report(
                "document not created",
                DocSyncError::validation("title must not be empty"),
            ));
        }
        let token = self.require_token()?;

        let write = DocumentWrite {
            title: title.to_string(),
            content: Snapshot::empty(),
        };
        match self.backend.create_document(&token, &write).await {
            Ok(created) => {
                info!(document = %created.id, "document created");
                self.documents.insert(0, created.clone());
                self.last_error = None;
                Ok(created)
            }
            Err(error) => Err(self.report("failed to create document", error)),
        }
    }

    /// Create from the draft title; the draft is cleared only on success.
    pub async fn submit_draft(&mut self) -> Result<DocumentSummary> {
        let title = self.draft_title.clone();
        let created = self.create(&title).await?;
        self.draft_title.clear();
        Ok(created)
    }

    /// Delete `id` from the store, then from the list.
    pub async fn delete(&mut self, id: &str) -> Result<()> {
        let token = self.require_token()?;
        match self.backend.delete_document(&token, id).await {
            Ok(()) => {
                self.documents.retain(|document| document.id != id);
                self.last_error = None;
                info!(document = id, "document deleted");
                Ok(())
            }
            Err(error) => Err(self.report("failed to delete document", error)),
        }
    }

    /// Documents whose title contains `query`, ignoring case. An empty
    /// query matches everything.
    pub fn filter(&self, query: &str) -> Vec<&DocumentSummary> {
        let query = query.to_lowercase();
        self.documents
            .iter()
            .filter(|document| document.title.to_lowercase().contains(&query))
            .collect()
    }

    fn require_token(&mut self) -> Result<String> {
        self.session
            .require_token()
            .map_err(|error| self.report("no session", error))
    }

    fn report(&mut self, context: &str, error: DocSyncError) -> DocSyncError {
        warn!("{context}: {error}");
        self.last_error = Some(error.to_string());
        error
    }
}
