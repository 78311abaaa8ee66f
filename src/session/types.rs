/// Process-wide authentication state.
///
/// `initializing` is true only until the persisted token has been read once;
/// after that it never becomes true again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub initializing: bool,
}

impl Session {
    /// State at process start, before the durable token has been read.
    pub fn starting() -> Self {
        Self {
            token: None,
            initializing: true,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !self.initializing && self.token.is_some()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::starting()
    }
}
