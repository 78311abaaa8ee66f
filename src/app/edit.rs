use anyhow::{Context, Result, bail};
use docsync::backend::DocumentBackend;
use docsync::editor::{AutosaveController, SaveOutcome, SaveStatus, TextSurface};
use docsync::session::SessionHandle;
use docsync::ui::style as ui;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, PartialEq, Eq)]
enum EditorCommand {
    Save,
    Title(String),
    Status,
    Quit,
    Unknown(String),
}

/// `None` for plain text lines.
fn parse_command(line: &str) -> Option<EditorCommand> {
    let command = line.strip_prefix(':')?.trim();
    let (name, rest) = command.split_once(' ').unwrap_or((command, ""));
    Some(match name {
        "save" | "w" => EditorCommand::Save,
        "title" => EditorCommand::Title(rest.trim().to_string()),
        "status" => EditorCommand::Status,
        "quit" | "q" => EditorCommand::Quit,
        _ => EditorCommand::Unknown(command.to_string()),
    })
}

fn append_line(surface: &TextSurface, line: &str) {
    let text = surface.text();
    if text.is_empty() {
        surface.set_text(line);
    } else {
        surface.set_text(&format!("{text}\n{line}"));
    }
}

fn report_save(result: docsync::Result<SaveOutcome>) {
    match result {
        Ok(SaveOutcome::Unchanged) => eprintln!("  {}", ui::dim("Nothing to save")),
        Ok(_) => {}
        Err(error) => eprintln!("  {} {error}", ui::error("✗")),
    }
}

/// Open `id`, apply stdin lines as edits under autosave, save on EOF.
pub async fn run_editor(
    backend: Arc<dyn DocumentBackend>,
    session: SessionHandle,
    debounce: Duration,
    id: &str,
    title: Option<&str>,
) -> Result<()> {
    let surface = TextSurface::new();
    let editor = AutosaveController::new(backend, session, surface.clone(), debounce);
    surface.connect(&editor.edit_sink());

    editor
        .load(id)
        .await
        .with_context(|| format!("Failed to open document {id}"))?;
    let buffer = editor.buffer().context("Document closed while opening")?;
    println!("  {} {}", ui::accent("◆"), ui::header(&buffer.title));
    let text = surface.text();
    if !text.is_empty() {
        println!("{}", ui::dim(&text));
    }

    let mut status = editor.subscribe_status();
    let reporter = tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let current = *status.borrow_and_update();
            eprintln!("  {}", ui::save_status(current));
        }
    });

    if let Some(title) = title {
        report_save(editor.set_title(title).await);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        match parse_command(&line) {
            None => append_line(&surface, &line),
            Some(EditorCommand::Save) => report_save(editor.save().await),
            Some(EditorCommand::Title(title)) => report_save(editor.set_title(&title).await),
            Some(EditorCommand::Status) => eprintln!("  {}", ui::save_status(editor.status())),
            Some(EditorCommand::Quit) => break,
            Some(EditorCommand::Unknown(command)) => {
                eprintln!("  {} unknown command :{command}", ui::yellow("!"));
            }
        }
    }

    let result = editor.save().await;
    let status = editor.status();
    editor.close();
    reporter.abort();
    finish(result, status)
}

/// Exit status of an editing session after its final save.
fn finish(result: docsync::Result<SaveOutcome>, status: SaveStatus) -> Result<()> {
    result.context("Final save failed; recent edits were not stored")?;
    if status.has_unsaved_changes() {
        bail!("Document closed with unsaved changes");
    }
    Ok(())
}
