use crate::app::edit::run_editor;
use crate::app::status::render_status;
use crate::cli::commands::{Cli, Commands};
use anyhow::{Context, Result, bail};
use dialoguer::{Input, Password};
use docsync::backend::{Credentials, DocumentBackend, DocumentSummary, HttpBackend, Registration};
use docsync::config::Config;
use docsync::documents::DocumentCollectionModel;
use docsync::editor::delta_text;
use docsync::session::{FileTokenStore, GuardDecision, Navigator, SessionGuard, SessionStore};
use docsync::ui::style as ui;
use std::io::{BufRead, IsTerminal};
use std::sync::Arc;

/// Redirects become instructions on a terminal.
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn redirect_to_login(&self) {
        eprintln!(
            "  {} Not signed in. Run {} first.",
            ui::yellow("!"),
            ui::yellow("`docsync login`")
        );
    }

    fn redirect_to_dashboard(&self) {
        println!(
            "  {} Already signed in. Run {} to switch accounts.",
            ui::success("✓"),
            ui::yellow("`docsync logout`")
        );
    }
}

struct App {
    config: Config,
    backend: Arc<HttpBackend>,
    store: SessionStore,
}

impl App {
    fn new(config: Config) -> Result<Self> {
        let backend = Arc::new(
            HttpBackend::from_config(&config.api).context("Failed to build HTTP client")?,
        );
        let store = SessionStore::new(FileTokenStore::new(
            config.session.resolved_token_path(),
        ));
        store.initialize();
        Ok(Self {
            config,
            backend,
            store,
        })
    }

    fn guard(&self) -> SessionGuard {
        SessionGuard::new(self.store.handle(), Arc::new(TerminalNavigator))
    }

    fn require_session(&self) -> Result<()> {
        if self.guard().evaluate() != GuardDecision::Render {
            bail!("a session is required for this command");
        }
        Ok(())
    }

    fn collection(&self) -> DocumentCollectionModel {
        DocumentCollectionModel::new(self.backend.clone(), self.store.handle())
    }
}

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    let app = App::new(config)?;

    match cli.command {
        Commands::Login { email } => {
            if app.guard().entry_redirect() {
                return Ok(());
            }
            let email = match email {
                Some(email) => email,
                None => Input::<String>::new()
                    .with_prompt("Email")
                    .interact_text()
                    .context("Failed to read email from terminal")?,
            };
            let password = read_password(false)?;
            app.store
                .sign_in(app.backend.as_ref(), &Credentials::new(email.as_str(), password))
                .await
                .context("Login failed")?;
            println!("  {} Signed in as {}", ui::success("✓"), ui::value(&email));
            Ok(())
        }

        Commands::Register { name, email } => {
            if app.guard().entry_redirect() {
                return Ok(());
            }
            let registration = Registration {
                name,
                email,
                password: read_password(true)?,
            };
            app.store
                .sign_up(app.backend.as_ref(), &registration)
                .await
                .context("Registration failed")?;
            println!(
                "  {} Account created for {}",
                ui::success("✓"),
                ui::value(&registration.email)
            );
            Ok(())
        }

        Commands::Logout => {
            app.store.logout().context("Failed to clear session")?;
            println!("  {} Signed out", ui::success("✓"));
            Ok(())
        }

        Commands::Status => {
            println!("{}", render_status(&app.config, &app.store.session()));
            Ok(())
        }

        Commands::List { filter } => {
            app.require_session()?;
            let mut documents = app.collection();
            documents
                .refresh()
                .await
                .context("Failed to fetch documents")?;
            let shown = match filter.as_deref() {
                Some(query) => documents.filter(query),
                None => documents.documents().iter().collect(),
            };
            if shown.is_empty() {
                println!("  {}", ui::dim("No documents."));
            }
            for summary in shown {
                println!("{}", render_summary(summary));
            }
            Ok(())
        }

        Commands::Create { title } => {
            app.require_session()?;
            let created = app
                .collection()
                .create(&title)
                .await
                .context("Failed to create document")?;
            println!(
                "  {} Created {} {}",
                ui::success("✓"),
                ui::header(&created.title),
                ui::dim(&created.id)
            );
            Ok(())
        }

        Commands::Delete { id } => {
            app.require_session()?;
            app.collection()
                .delete(&id)
                .await
                .with_context(|| format!("Failed to delete document {id}"))?;
            println!("  {} Deleted {}", ui::success("✓"), ui::dim(&id));
            Ok(())
        }

        Commands::Show { id } => {
            app.require_session()?;
            let token = app.store.handle().require_token()?;
            let document = app
                .backend
                .get_document(&token, &id)
                .await
                .with_context(|| format!("Failed to load document {id}"))?;
            println!("{}", render_summary(&document.summary()));
            println!();
            println!("{}", delta_text(&document.content.or_blank()));
            Ok(())
        }

        Commands::Edit { id, title } => {
            app.require_session()?;
            run_editor(
                app.backend.clone(),
                app.store.handle(),
                app.config.autosave.debounce(),
                &id,
                title.as_deref(),
            )
            .await
        }
    }
}

fn render_summary(summary: &DocumentSummary) -> String {
    let edited = summary
        .updated_at
        .map(|at| format!("  edited {}", at.format("%Y-%m-%d %H:%M")))
        .unwrap_or_default();
    format!(
        "  {} {}  {}{}",
        ui::accent("◆"),
        ui::header(&summary.title),
        ui::dim(&summary.id),
        ui::dim(edited)
    )
}

/// Hidden prompt on a terminal, first stdin line otherwise.
fn read_password(confirm: bool) -> Result<String> {
    if std::io::stdin().is_terminal() {
        let prompt = Password::new()
            .with_prompt("Password (input hidden)")
            .allow_empty_password(false);
        let prompt = if confirm {
            prompt.with_confirmation("Confirm password", "Passwords do not match")
        } else {
            prompt
        };
        return prompt
            .interact()
            .context("Failed to read password from terminal");
    }

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("a password is required");
    }
    Ok(password)
}
