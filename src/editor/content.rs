use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Immutable capture of the editing surface's full content.
///
/// Opaque to the core: it is only ever replaced wholesale and passed through
/// to the backing store untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(Value);

impl Snapshot {
    /// Content sent with a freshly created document.
    pub fn empty() -> Self {
        Self(Value::Array(Vec::new()))
    }

    /// What an editor shows for a document that never had content.
    pub fn blank() -> Self {
        Self(json!({ "ops": [{ "insert": "\n" }] }))
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    #[must_use]
    pub fn or_blank(self) -> Self {
        if self.is_null() { Self::blank() } else { self }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for Snapshot {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// The editable-content capability, programmatic side.
///
/// `replace` is the only way the core writes content, and it never produces
/// a user-edit notification. User edits arrive on the separate
/// [`UserEditSink`] channel, so a load can never trigger an autosave.
pub trait EditableContent: Send + Sync {
    fn snapshot(&self) -> Snapshot;

    fn replace(&self, snapshot: Snapshot);
}

/// Receiver of user-originated edit notifications.
pub trait UserEditSink: Send + Sync {
    fn on_user_edit(&self);
}

/// Plain-text editing surface backed by a single-insert delta.
///
/// Used by the command-line editor; anything richer plugs in through
/// [`EditableContent`] instead.
pub struct TextSurface {
    content: Mutex<Snapshot>,
    sink: Mutex<Option<Weak<dyn UserEditSink>>>,
}

impl TextSurface {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            content: Mutex::new(Snapshot::blank()),
            sink: Mutex::new(None),
        })
    }

    /// Route user edits to `sink`. Held weakly so the surface never keeps
    /// a discarded controller alive.
    pub fn connect(&self, sink: &Arc<dyn UserEditSink>) {
        *lock(&self.sink) = Some(Arc::downgrade(sink));
    }

    pub fn text(&self) -> String {
        delta_text(&lock(&self.content))
    }

    /// User typed `text` at the end of the document.
    pub fn type_text(&self, text: &str) {
        {
            let mut content = lock(&self.content);
            let mut current = delta_text(&content);
            current.push_str(text);
            *content = delta_from_text(&current);
        }
        self.notify();
    }

    /// User replaced the whole document, e.g. select-all and paste.
    pub fn set_text(&self, text: &str) {
        *lock(&self.content) = delta_from_text(text);
        self.notify();
    }

    fn notify(&self) {
        let sink = lock(&self.sink).as_ref().and_then(Weak::upgrade);
        if let Some(sink) = sink {
            sink.on_user_edit();
        }
    }
}

impl EditableContent for TextSurface {
    fn snapshot(&self) -> Snapshot {
        lock(&self.content).clone()
    }

    fn replace(&self, snapshot: Snapshot) {
        *lock(&self.content) = snapshot;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Render `text` as a delta. Deltas always end with a newline.
pub fn delta_from_text(text: &str) -> Snapshot {
    let mut insert = text.to_string();
    if !insert.ends_with('\n') {
        insert.push('\n');
    }
    Snapshot(json!({ "ops": [{ "insert": insert }] }))
}

/// Best-effort plain text of a delta: string inserts concatenated, embeds
/// skipped, final newline dropped. Bare op arrays are accepted too.
pub fn delta_text(snapshot: &Snapshot) -> String {
    let ops = match snapshot.as_value() {
        Value::Object(map) => map.get("ops").and_then(Value::as_array),
        Value::Array(ops) => Some(ops),
        _ => None,
    };
    let mut text: String = ops
        .into_iter()
        .flatten()
        .filter_map(|op| op.get("insert").and_then(Value::as_str))
        .collect();
    if text.ends_with('\n') {
        text.pop();
    }
    text
}
