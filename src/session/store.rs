use super::persistence::TokenPersistence;
use super::types::Session;
use crate::backend::{AuthBackend, Credentials, Registration};
use crate::error::{DocSyncError, Result};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Owner of the session token. The only component allowed to mutate it.
///
/// Transitions are published on a `watch` channel; consumers hold a
/// [`SessionHandle`] and react to changes instead of polling.
pub struct SessionStore {
    persistence: Box<dyn TokenPersistence>,
    state: watch::Sender<Session>,
}

impl SessionStore {
    pub fn new(persistence: impl TokenPersistence + 'static) -> Self {
        let (state, _) = watch::channel(Session::starting());
        Self {
            persistence: Box::new(persistence),
            state,
        }
    }

    /// Read the persisted token (if any) and leave the initializing phase.
    ///
    /// Runs once; later calls are no-ops. An unreadable token file is
    /// treated the same as no token.
    pub fn initialize(&self) {
        if !self.state.borrow().initializing {
            debug!("session already initialized");
            return;
        }

        let token = match self.persistence.load() {
            Ok(token) => token,
            Err(error) => {
                warn!("ignoring unreadable session state: {error}");
                None
            }
        };
        debug!(restored = token.is_some(), "session initialized");
        self.state.send_modify(|session| {
            session.token = token;
            session.initializing = false;
        });
    }

    /// Persist `token` and make it current. Calling again replaces it.
    pub fn login(&self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(DocSyncError::validation("session token must not be empty"));
        }

        self.persistence.store(&token)?;
        self.state.send_modify(|session| {
            session.token = Some(token);
            session.initializing = false;
        });
        info!("signed in");
        Ok(())
    }

    /// Erase the persisted token and clear the current one. Safe to call
    /// when already signed out.
    pub fn logout(&self) -> Result<()> {
        self.persistence.clear()?;
        let changed = self.state.send_if_modified(|session| {
            let had_token = session.token.take().is_some();
            let was_initializing = std::mem::replace(&mut session.initializing, false);
            had_token || was_initializing
        });
        if changed {
            info!("signed out");
        }
        Ok(())
    }

    /// Exchange credentials for a token and sign in with it.
    pub async fn sign_in(&self, auth: &dyn AuthBackend, credentials: &Credentials) -> Result<()> {
        require_field("email", &credentials.email)?;
        require_field("password", &credentials.password)?;
        let token = auth.login(credentials).await.inspect_err(|error| {
            warn!("login failed: {error}");
        })?;
        self.login(token)
    }

    /// Create an account and sign in with the token it yields.
    pub async fn sign_up(&self, auth: &dyn AuthBackend, registration: &Registration) -> Result<()> {
        require_field("name", &registration.name)?;
        require_field("email", &registration.email)?;
        require_field("password", &registration.password)?;
        let token = auth.register(registration).await.inspect_err(|error| {
            warn!("registration failed: {error}");
        })?;
        self.login(token)
    }

    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            state: self.state.subscribe(),
        }
    }
}

fn require_field(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DocSyncError::validation(format!("{name} is required")));
    }
    Ok(())
}

/// Read-only view of the session shared by every consumer.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    state: watch::Receiver<Session>,
}

impl SessionHandle {
    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    /// The current token, or `AuthRequired` before anything goes out.
    pub fn require_token(&self) -> Result<String> {
        self.token().ok_or(DocSyncError::AuthRequired)
    }

    /// Wait for the next transition. Returns `false` once the store is gone.
    pub async fn changed(&mut self) -> bool {
        self.state.changed().await.is_ok()
    }

    /// Mark the current value as seen and return it.
    pub fn observe(&mut self) -> Session {
        self.state.borrow_and_update().clone()
    }
}
