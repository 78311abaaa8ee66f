use super::Config;

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DOCSYNC_API_URL")
            && !url.trim().is_empty()
        {
            self.api.base_url = url.trim().to_string();
        }

        if let Ok(path) = std::env::var("DOCSYNC_TOKEN_PATH")
            && !path.trim().is_empty()
        {
            self.session.token_path = path;
        }

        if let Ok(level) = std::env::var("DOCSYNC_LOG")
            && !level.trim().is_empty()
        {
            self.logging.level = level;
        }

        if let Ok(ms) = std::env::var("DOCSYNC_AUTOSAVE_MS")
            && let Ok(ms) = ms.trim().parse::<u64>()
            && ms > 0
        {
            self.autosave.debounce_ms = ms;
        }
    }
}
