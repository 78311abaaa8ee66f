pub mod guard;
pub mod persistence;
pub mod store;
pub mod types;

pub use guard::{GuardDecision, Navigator, SessionGuard};
pub use persistence::{FileTokenStore, MemoryTokenStore, TokenPersistence};
pub use store::{SessionHandle, SessionStore};
pub use types::Session;
