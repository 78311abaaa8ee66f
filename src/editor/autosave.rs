use super::content::{EditableContent, Snapshot, UserEditSink};
use super::status::SaveStatus;
use crate::backend::{DocumentBackend, DocumentWrite};
use crate::error::{DocSyncError, Result};
use crate::session::SessionHandle;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Working state of the one open document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentBuffer {
    pub id: String,
    pub title: String,
    pub content: Snapshot,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub save_status: SaveStatus,
    /// Server-side modification time as of the last load or save.
    pub updated_at: Option<DateTime<Utc>>,
}

/// What a persist attempt ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// Title and content already match the store; no request was sent.
    Unchanged,
    /// The buffer was closed or replaced while the request was in flight.
    Discarded,
}

struct ArmedTimer {
    id: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct EditorState {
    buffer: Option<DocumentBuffer>,
    /// Title as last confirmed by the store.
    saved_title: String,
    /// Set by a user edit, cleared when a persist pulls the snapshot.
    content_pending: bool,
    timer: Option<ArmedTimer>,
    next_timer_id: u64,
    /// Bumped whenever the buffer is replaced or discarded so late
    /// responses can tell they belong to a previous one.
    epoch: u64,
    closed: bool,
    session_watch: Option<JoinHandle<()>>,
}

impl EditorState {
    fn cancel_timer(&mut self) -> bool {
        match self.timer.take() {
            Some(timer) => {
                timer.handle.abort();
                true
            }
            None => false,
        }
    }
}

struct Shared {
    this: Weak<Shared>,
    backend: Arc<dyn DocumentBackend>,
    session: SessionHandle,
    content: Arc<dyn EditableContent>,
    debounce: Duration,
    /// Runtime the timers run on; edits may arrive from any thread.
    runtime: Handle,
    state: Mutex<EditorState>,
    /// Held for the whole of a write request: one persist in flight per
    /// buffer, later ones queue behind it.
    write_lane: tokio::sync::Mutex<()>,
    status: watch::Sender<SaveStatus>,
}

/// Autosave for a single open document.
///
/// User edits mark the buffer dirty at once and (re)arm one debounce timer.
/// When the timer fires, the current snapshot is pulled from the editing
/// surface and written back. Dropping the controller cancels an armed timer;
/// a request already sent may finish, but its result is ignored.
///
/// Must be created inside a tokio runtime. Edit notifications may then
/// come from any thread; timers are always scheduled on that runtime.
pub struct AutosaveController {
    shared: Arc<Shared>,
}

impl AutosaveController {
    pub fn new(
        backend: Arc<dyn DocumentBackend>,
        session: SessionHandle,
        content: Arc<dyn EditableContent>,
        debounce: Duration,
    ) -> Self {
        let (status, _) = watch::channel(SaveStatus::Idle);
        let runtime = Handle::current();
        let shared = Arc::new_cyclic(|this| Shared {
            this: this.clone(),
            backend,
            session: session.clone(),
            content,
            debounce,
            runtime,
            state: Mutex::new(EditorState::default()),
            write_lane: tokio::sync::Mutex::new(()),
            status,
        });

        let watcher = shared
            .runtime
            .spawn(watch_session(Arc::downgrade(&shared), session));
        shared.lock().session_watch = Some(watcher);

        Self { shared }
    }

    /// Fetch `id` and make it the open buffer, replacing any previous one.
    ///
    /// On failure no buffer exists afterwards; the previous document is
    /// never left showing.
    pub async fn load(&self, id: &str) -> Result<()> {
        let epoch = {
            let mut state = self.shared.lock();
            if state.closed {
                return Err(DocSyncError::validation("editor has been closed"));
            }
            state.cancel_timer();
            state.buffer = None;
            state.content_pending = false;
            state.saved_title.clear();
            state.epoch += 1;
            self.shared.status.send_replace(SaveStatus::Idle);
            state.epoch
        };

        let token = self
            .shared
            .session
            .require_token()
            .inspect_err(|_| warn!(document = id, "cannot load document without a session"))?;
        let document = self
            .shared
            .backend
            .get_document(&token, id)
            .await
            .inspect_err(|error| warn!(document = id, "failed to load document: {error}"))?;

        let mut state = self.shared.lock();
        if state.closed || state.epoch != epoch {
            debug!(document = id, "load superseded");
            return Ok(());
        }

        let content = document.content.or_blank();
        self.shared.content.replace(content.clone());
        state.saved_title.clone_from(&document.title);
        state.buffer = Some(DocumentBuffer {
            id: document.id,
            title: document.title,
            content,
            last_saved_at: None,
            save_status: SaveStatus::Idle,
            updated_at: document.updated_at,
        });
        debug!(document = id, "document loaded");
        Ok(())
    }

    /// A user-originated edit happened on the editing surface.
    pub fn on_local_change(&self) {
        self.shared.on_local_change();
    }

    /// Sink to connect to the editing surface's user-edit channel.
    pub fn edit_sink(&self) -> Arc<dyn UserEditSink> {
        self.shared.clone()
    }

    /// Write the buffer now unless nothing changed since the last save.
    pub async fn persist(&self) -> Result<SaveOutcome> {
        self.shared.persist().await
    }

    /// Manual save: skips the debounce window and disarms a pending timer.
    pub async fn save(&self) -> Result<SaveOutcome> {
        {
            let mut state = self.shared.lock();
            if state.cancel_timer() {
                debug!("pending autosave folded into manual save");
            }
        }
        self.shared.persist().await
    }

    /// Rename the open document and save immediately. Re-submitting the
    /// current title sends nothing.
    pub async fn set_title(&self, title: &str) -> Result<SaveOutcome> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DocSyncError::validation("title must not be empty"));
        }
        {
            let mut guard = self.shared.lock();
            let state = &mut *guard;
            let Some(buffer) = state.buffer.as_mut() else {
                return Err(DocSyncError::validation("no document is open"));
            };
            if buffer.title != title {
                buffer.title = title.to_string();
                if title != state.saved_title {
                    self.shared.publish(buffer, SaveStatus::Dirty);
                }
            }
        }
        self.save().await
    }

    pub fn status(&self) -> SaveStatus {
        *self.shared.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SaveStatus> {
        self.shared.status.subscribe()
    }

    pub fn buffer(&self) -> Option<DocumentBuffer> {
        self.shared.lock().buffer.clone()
    }

    pub fn is_save_scheduled(&self) -> bool {
        self.shared.lock().timer.is_some()
    }

    /// Tear the buffer down: cancel the armed timer and stop watching the
    /// session. Idempotent.
    pub fn close(&self) {
        let mut state = self.shared.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        if state.cancel_timer() {
            debug!("pending autosave cancelled on close");
        }
        if let Some(watcher) = state.session_watch.take() {
            watcher.abort();
        }
        state.buffer = None;
        state.epoch += 1;
    }
}

impl Drop for AutosaveController {
    fn drop(&mut self) {
        self.close();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, EditorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, buffer: &mut DocumentBuffer, status: SaveStatus) {
        if buffer.save_status != status {
            debug!(document = %buffer.id, from = %buffer.save_status, to = %status, "save status");
        }
        buffer.save_status = status;
        self.status.send_replace(status);
    }

    fn on_local_change(&self) {
        let mut guard = self.lock();
        let state = &mut *guard;
        if state.closed {
            return;
        }
        let Some(buffer) = state.buffer.as_mut() else {
            debug!("edit without an open document ignored");
            return;
        };

        buffer.content = self.content.snapshot();
        state.content_pending = true;
        self.publish(buffer, SaveStatus::Dirty);

        if self.session.token().is_none() {
            state.cancel_timer();
            warn!("no session; edit kept locally, autosave paused");
            return;
        }
        self.arm_timer(state);
    }

    /// Cancel-then-schedule: at most one timer is ever armed.
    fn arm_timer(&self, state: &mut EditorState) {
        state.cancel_timer();
        state.next_timer_id += 1;
        let id = state.next_timer_id;
        let delay = self.debounce;
        let shared = self.this.clone();
        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(shared) = shared.upgrade() {
                shared.fire_timer(id).await;
            }
        });
        state.timer = Some(ArmedTimer { id, handle });
    }

    async fn fire_timer(self: Arc<Self>, id: u64) {
        {
            let mut state = self.lock();
            // A re-arm or cancel may have raced the wake-up.
            if state.timer.as_ref().is_none_or(|timer| timer.id != id) {
                return;
            }
            // Taking the slot means later re-arms leave this task running.
            state.timer = None;
        }
        if let Err(error) = self.persist().await {
            warn!("autosave failed: {error}");
        }
    }

    async fn persist(&self) -> Result<SaveOutcome> {
        let _lane = self.write_lane.lock().await;

        let (epoch, id, write, token) = {
            let mut guard = self.lock();
            let state = &mut *guard;
            if state.closed {
                return Ok(SaveOutcome::Discarded);
            }
            let Some(buffer) = state.buffer.as_mut() else {
                return Ok(SaveOutcome::Discarded);
            };
            if !state.content_pending && buffer.title == state.saved_title {
                debug!(document = %buffer.id, "nothing to save");
                return Ok(SaveOutcome::Unchanged);
            }
            let Some(token) = self.session.token() else {
                self.publish(buffer, SaveStatus::Dirty);
                warn!(document = %buffer.id, "save skipped: no session");
                return Err(DocSyncError::AuthRequired);
            };

            // Pulled now, not when the timer was armed.
            let snapshot = self.content.snapshot();
            buffer.content = snapshot.clone();
            state.content_pending = false;
            self.publish(buffer, SaveStatus::Saving);
            let write = DocumentWrite {
                title: buffer.title.clone(),
                content: snapshot,
            };
            (state.epoch, buffer.id.clone(), write, token)
        };

        let result = self.backend.update_document(&token, &id, &write).await;

        let mut guard = self.lock();
        let state = &mut *guard;
        let buffer = match state.buffer.as_mut() {
            Some(buffer) if !state.closed && state.epoch == epoch => buffer,
            _ => {
                debug!(document = %id, "save finished after the buffer was discarded");
                return result.map(|_| SaveOutcome::Discarded);
            }
        };

        match result {
            Ok(updated) => {
                state.saved_title.clone_from(&write.title);
                buffer.last_saved_at = Some(Utc::now());
                if let Some(updated_at) = updated.and_then(|document| document.updated_at) {
                    buffer.updated_at = Some(updated_at);
                }
                let next = if state.content_pending || buffer.title != state.saved_title {
                    SaveStatus::Dirty
                } else {
                    SaveStatus::Saved
                };
                self.publish(buffer, next);
                info!(document = %id, "document saved");
                Ok(SaveOutcome::Saved)
            }
            Err(error) => {
                state.content_pending = true;
                self.publish(buffer, SaveStatus::Error);
                warn!(document = %id, "save failed: {error}");
                Err(error)
            }
        }
    }
}

impl UserEditSink for Shared {
    fn on_user_edit(&self) {
        self.on_local_change();
    }
}

/// Stop scheduling writes the moment the session goes away.
async fn watch_session(shared: Weak<Shared>, mut session: SessionHandle) {
    while session.changed().await {
        if session.observe().token.is_some() {
            continue;
        }
        let Some(shared) = shared.upgrade() else {
            return;
        };
        if shared.lock().cancel_timer() {
            debug!("session ended; pending autosave cancelled");
        }
    }
}
