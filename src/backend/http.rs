use super::types::TokenResponse;
use super::{
    AuthBackend, Credentials, Document, DocumentBackend, DocumentSummary, DocumentWrite,
    Registration,
};
use crate::config::ApiConfig;
use crate::error::{ConfigError, DocSyncError, NetworkError, Result};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = concat!("docsync/", env!("CARGO_PKG_VERSION"));

/// reqwest-backed implementation of both backing-store traits.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let base_url = Url::parse(trimmed).map_err(|error| {
            ConfigError::Validation(format!("invalid api base url '{trimmed}': {error}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::Validation(format!(
                "api base url '{trimmed}' cannot carry a path"
            ))
            .into());
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|error| anyhow::anyhow!("failed to build HTTP client: {error}"))?;

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::new(&config.base_url, config.timeout())
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`: the base always accepts path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str], token: Option<&str>) -> RequestBuilder {
        let builder = self.client.request(method, self.endpoint(segments));
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = server_message(&body).unwrap_or_else(|| {
            format!(
                "server returned {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("error")
            )
        });
        Err(NetworkError::new(Some(status.as_u16()), message).into())
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T> {
        let response = Self::send(builder).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Pull a `message` (or `error`) string out of a JSON error body.
fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(serde_json::Value::as_str))
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(ToOwned::to_owned)
}

#[async_trait]
impl DocumentBackend for HttpBackend {
    async fn list_documents(&self, token: &str) -> Result<Vec<DocumentSummary>> {
        Self::send_json(self.request(Method::GET, &["documents"], Some(token))).await
    }

    async fn create_document(
        &self,
        token: &str,
        write: &DocumentWrite,
    ) -> Result<DocumentSummary> {
        Self::send_json(
            self.request(Method::POST, &["documents"], Some(token))
                .json(write),
        )
        .await
    }

    async fn get_document(&self, token: &str, id: &str) -> Result<Document> {
        Self::send_json(self.request(Method::GET, &["documents", id], Some(token))).await
    }

    async fn update_document(
        &self,
        token: &str,
        id: &str,
        write: &DocumentWrite,
    ) -> Result<Option<Document>> {
        let response = Self::send(
            self.request(Method::PUT, &["documents", id], Some(token))
                .json(write),
        )
        .await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice::<Document>(&body).ok())
    }

    async fn delete_document(&self, token: &str, id: &str) -> Result<()> {
        Self::send(self.request(Method::DELETE, &["documents", id], Some(token))).await?;
        Ok(())
    }
}

#[async_trait]
impl AuthBackend for HttpBackend {
    async fn login(&self, credentials: &Credentials) -> Result<String> {
        let response: TokenResponse =
            Self::send_json(self.request(Method::POST, &["auth", "login"], None).json(credentials))
                .await?;
        non_empty_token(response.token)
    }

    async fn register(&self, registration: &Registration) -> Result<String> {
        let response: TokenResponse = Self::send_json(
            self.request(Method::POST, &["auth", "register"], None)
                .json(registration),
        )
        .await?;
        non_empty_token(response.token)
    }
}

fn non_empty_token(token: String) -> Result<String> {
    if token.trim().is_empty() {
        return Err(DocSyncError::Network(NetworkError::new(
            None,
            "server issued an empty token",
        )));
    }
    Ok(token)
}
