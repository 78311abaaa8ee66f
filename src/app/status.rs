use docsync::config::Config;
use docsync::session::Session;

pub fn render_status(config: &Config, session: &Session) -> String {
    let signed_in = if session.is_authenticated() {
        "signed in"
    } else {
        "signed out"
    };
    [
        "◆ DocSync status".to_string(),
        String::new(),
        format!("Version     {}", env!("CARGO_PKG_VERSION")),
        format!("Config      {}", config.config_path.display()),
        format!("API         {}", config.api.base_url),
        format!("Timeout     {}s", config.api.timeout_secs),
        format!("Autosave    {}ms after the last edit", config.autosave.debounce_ms),
        format!(
            "Session     {} ({})",
            signed_in,
            config.session.resolved_token_path().display()
        ),
        format!("Log level   {}", config.logging.level),
    ]
    .join("\n")
}
