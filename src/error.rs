use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `DocSync`.
///
/// Nothing here is fatal: every variant leaves the prior good state intact
/// and can be retried by a later user action. Library callers match on the
/// variant to decide what to show; the binary and config loader keep using
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum DocSyncError {
    // ── Session ─────────────────────────────────────────────────────────
    #[error("authentication required: sign in first")]
    AuthRequired,

    // ── Backing store ───────────────────────────────────────────────────
    #[error("network: {0}")]
    Network(#[from] NetworkError),

    // ── Local input ─────────────────────────────────────────────────────
    #[error("validation failed: {0}")]
    Validation(String),

    // ── Config ──────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Durable session state ───────────────────────────────────────────
    #[error("persistence: {0}")]
    Persistence(String),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DocSyncError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Only failed requests are worth retrying as-is; the other kinds need
    /// the caller to change something first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

// ─── Network errors ─────────────────────────────────────────────────────────

/// A request that reached the transport and failed.
///
/// Timeouts, connection errors, non-2xx responses and undecodable bodies
/// all collapse into this one reportable kind.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct NetworkError {
    pub status: Option<u16>,
    pub message: String,
}

impl NetworkError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(error: reqwest::Error) -> Self {
        let status = error.status().map(|status| status.as_u16());
        let message = if error.is_timeout() {
            "request timed out".to_string()
        } else if error.is_connect() {
            "could not reach the server".to_string()
        } else if error.is_decode() {
            format!("unexpected response body: {error}")
        } else {
            error.to_string()
        };
        Self { status, message }
    }
}

impl From<reqwest::Error> for DocSyncError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.into())
    }
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, DocSyncError>;
