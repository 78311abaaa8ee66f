//! Backing-store collaborators.
//!
//! Every call takes the bearer token explicitly; callers are expected to
//! short-circuit with `DocSyncError::AuthRequired` before reaching a backend
//! when no session exists.

pub mod http;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;

pub use http::HttpBackend;
pub use types::{Credentials, Document, DocumentSummary, DocumentWrite, Registration};

use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// `GET /documents`
    async fn list_documents(&self, token: &str) -> Result<Vec<DocumentSummary>>;

    /// `POST /documents`
    async fn create_document(&self, token: &str, write: &DocumentWrite)
    -> Result<DocumentSummary>;

    /// `GET /documents/{id}`
    async fn get_document(&self, token: &str, id: &str) -> Result<Document>;

    /// `PUT /documents/{id}`. The store may or may not echo the document back.
    async fn update_document(
        &self,
        token: &str,
        id: &str,
        write: &DocumentWrite,
    ) -> Result<Option<Document>>;

    /// `DELETE /documents/{id}`
    async fn delete_document(&self, token: &str, id: &str) -> Result<()>;
}

#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// `POST /auth/login`, yielding a bearer token.
    async fn login(&self, credentials: &Credentials) -> Result<String>;

    /// `POST /auth/register`, yielding a bearer token.
    async fn register(&self, registration: &Registration) -> Result<String>;
}
