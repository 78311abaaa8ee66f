mod env_overrides;
mod loader;
pub mod schema;
#[cfg(test)]
mod test_env;

pub use schema::{
    ApiConfig, AutosaveConfig, Config, DEFAULT_API_BASE_URL, DEFAULT_AUTOSAVE_DEBOUNCE_MS,
    LoggingConfig, SessionConfig,
};
