use super::store::SessionHandle;
use super::types::Session;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// The persisted token has not been read yet. Render nothing, go nowhere.
    Pending,
    Render,
    Redirect,
}

impl GuardDecision {
    pub fn for_session(session: &Session) -> Self {
        if session.initializing {
            Self::Pending
        } else if session.token.is_some() {
            Self::Render
        } else {
            Self::Redirect
        }
    }
}

/// Routing collaborator the guard hands redirects to.
pub trait Navigator: Send + Sync {
    /// Leave the protected view for the unauthenticated entry point.
    fn redirect_to_login(&self);

    /// Leave a sign-in view because a session already exists.
    fn redirect_to_dashboard(&self) {}
}

/// Gate in front of every protected view.
///
/// Re-evaluated on every session transition: a logout while a protected
/// view is open redirects immediately, and nothing redirects while the
/// persisted token is still being read.
pub struct SessionGuard {
    session: SessionHandle,
    navigator: Arc<dyn Navigator>,
    last: Option<GuardDecision>,
}

impl SessionGuard {
    pub fn new(session: SessionHandle, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            session,
            navigator,
            last: None,
        }
    }

    pub fn decision(&self) -> GuardDecision {
        GuardDecision::for_session(&self.session.session())
    }

    /// React to the current session, issuing a redirect when the decision
    /// has just become `Redirect`.
    pub fn evaluate(&mut self) -> GuardDecision {
        let decision = GuardDecision::for_session(&self.session.observe());
        if self.last != Some(decision) {
            debug!(?decision, "session guard transition");
            if decision == GuardDecision::Redirect {
                self.navigator.redirect_to_login();
            }
            self.last = Some(decision);
        }
        decision
    }

    /// Produce the protected content only when a session is present.
    pub fn render<T>(&self, view: impl FnOnce() -> T) -> Option<T> {
        (self.decision() == GuardDecision::Render).then(view)
    }

    /// Wait out the initializing phase and return the settled decision.
    pub async fn settle(&mut self) -> GuardDecision {
        loop {
            let decision = self.evaluate();
            if decision != GuardDecision::Pending || !self.session.changed().await {
                return decision;
            }
        }
    }

    /// Keep the gate live until the session store goes away.
    pub async fn run(mut self) {
        self.evaluate();
        while self.session.changed().await {
            self.evaluate();
        }
    }

    /// Inverse gate for the sign-in views: bounce an existing session to
    /// the dashboard. Returns whether a redirect was issued.
    pub fn entry_redirect(&self) -> bool {
        if self.session.session().is_authenticated() {
            self.navigator.redirect_to_dashboard();
            return true;
        }
        false
    }
}
