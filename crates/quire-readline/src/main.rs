//! `quire` - a line-oriented front end for a refinement session.
//!
//! Plain lines are instructions for the model; slash commands drive the
//! editor side (load a hand-edited body, toggle auto-compile, regenerate)
//! and the document store.

mod command;
mod helper;

use anyhow::{Context, Result};
use colored::Colorize;
use command::Command;
use helper::CliHelper;
use quire_application::{
    ChannelNotificationSink, RefinementSession, SessionOptions, SessionServices, SessionSnapshot,
};
use quire_core::QuireError;
use quire_core::compile::CompilationOutcome;
use quire_core::document::ArtifactStore;
use quire_core::notification::{Notification, NotificationKind};
use quire_infrastructure::{ConfigService, QuirePaths, TomlDirArtifactStore};
use quire_interaction::{GeminiGenerationService, LatexOnlineCompiler};
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Logs go to a daily file so they never interleave with the prompt.
fn init_logging(paths: &QuirePaths) -> Result<WorkerGuard> {
    let logs_dir = paths.logs_dir().map_err(QuireError::from)?;
    std::fs::create_dir_all(&logs_dir)
        .with_context(|| format!("Failed to create log directory {}", logs_dir.display()))?;

    let appender = tracing_appender::rolling::daily(&logs_dir, "quire.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let layer = fmt::layer().with_writer(writer).with_ansi(false);
    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .init();

    Ok(guard)
}

/// Prints notifications as they arrive, independent of the prompt.
fn spawn_notification_printer(mut receiver: mpsc::UnboundedReceiver<Notification>) {
    tokio::spawn(async move {
        while let Some(Notification { kind, message }) = receiver.recv().await {
            match kind {
                NotificationKind::Error => eprintln!("{}", format!("! {message}").red()),
                NotificationKind::Success => println!("{}", format!("✓ {message}").green()),
                NotificationKind::Info => println!("{}", message.bright_black()),
            }
        }
    });
}

fn print_help() {
    println!("{}", "Type an instruction to generate or refine the document.".bright_black());
    for (usage, about) in [
        ("/edit <file>", "load the LaTeX body from a file (auto-compiles after a pause)"),
        ("/regenerate", "compile the current body now"),
        ("/auto on|off", "toggle auto-compile after edits"),
        ("/show", "show the document and the last compile result"),
        ("/source [file]", "print the LaTeX body, or write it to a file"),
        ("/history", "show the conversation"),
        ("/list", "list saved documents"),
        ("/open <id>", "switch to a saved document"),
        ("/delete <id>", "delete a saved document"),
        ("/export <file>", "write the last rendered PDF to a file"),
        ("quit", "exit"),
    ] {
        println!("  {:<16} {}", usage.bright_cyan(), about.bright_black());
    }
}

fn print_outcome(snapshot: &SessionSnapshot) {
    match &snapshot.outcome {
        Some(CompilationOutcome::Rendered(artifact)) => {
            let size = artifact.pdf_bytes().map(|bytes| bytes.len()).unwrap_or_default();
            println!("{}", format!("Rendered PDF ({size} bytes)").green());
        }
        Some(CompilationOutcome::Failed(failure)) => {
            println!("{}", failure.to_string().red());
            if snapshot.artifact.is_some() {
                println!("{}", "Keeping the last rendered PDF.".bright_black());
            }
        }
        None => println!("{}", "Not compiled yet.".bright_black()),
    }
}

fn print_snapshot(snapshot: &SessionSnapshot) {
    let document = &snapshot.document;
    let title = if document.title.is_empty() {
        "(untitled)"
    } else {
        document.title.as_str()
    };
    println!("{} {}", "Title:".bright_yellow(), title);
    match &document.id {
        Some(id) => println!("{} {}", "Saved as:".bright_yellow(), id),
        None => println!("{} {}", "Saved as:".bright_yellow(), "not saved".bright_black()),
    }
    println!(
        "{} {:?}, {} turns, auto-compile {}",
        "Session:".bright_yellow(),
        snapshot.phase,
        snapshot.turns.len(),
        if snapshot.auto_compile { "on" } else { "off" }
    );
    print_outcome(snapshot);
}

struct Repl {
    session: RefinementSession,
    services: SessionServices,
    options: SessionOptions,
}

impl Repl {
    /// Runs one command; `Ok(false)` ends the loop.
    async fn dispatch(&mut self, command: Command) -> Result<bool> {
        match command {
            Command::Submit(instruction) => {
                println!("{}", "Working...".bright_black());
                let snapshot = self.session.submit(&instruction).await?;
                if let Some(reply) = snapshot.turns.last() {
                    for line in reply.message.lines() {
                        println!("{}", line.bright_blue());
                    }
                }
                print_outcome(&snapshot);
            }
            Command::Edit(path) => {
                let source = tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let snapshot = self.session.on_edit(source).await;
                if snapshot.auto_compile {
                    println!("{}", "Body updated, compiling after a pause.".bright_black());
                } else {
                    println!("{}", "Body updated. Use /regenerate to compile.".bright_black());
                }
            }
            Command::Regenerate => {
                println!("{}", "Compiling...".bright_black());
                let snapshot = self.session.regenerate().await;
                print_outcome(&snapshot);
            }
            Command::AutoCompile(enabled) => {
                self.session.set_auto_compile(enabled).await;
            }
            Command::Show => print_snapshot(&self.session.snapshot().await),
            Command::Source(None) => {
                let snapshot = self.session.snapshot().await;
                if snapshot.document.is_blank() {
                    println!("{}", "No document yet.".bright_black());
                } else {
                    println!("{}", snapshot.document.source);
                }
            }
            Command::Source(Some(path)) => {
                let snapshot = self.session.snapshot().await;
                tokio::fs::write(&path, snapshot.document.source.as_bytes())
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("{}", format!("Wrote {}", path.display()).green());
            }
            Command::History => {
                let snapshot = self.session.snapshot().await;
                for turn in &snapshot.turns {
                    println!("{}", format!("[{}]", turn.role.label()).bright_magenta());
                    for line in turn.message.lines() {
                        println!("{}", line.bright_blue());
                    }
                }
            }
            Command::List => {
                let documents = self.services.store.list(&self.options.owner).await?;
                if documents.is_empty() {
                    println!("{}", "No saved documents.".bright_black());
                }
                for summary in documents {
                    println!(
                        "  {}  {}  {}",
                        summary.id.bright_cyan(),
                        summary.created_at.format("%Y-%m-%d %H:%M"),
                        summary.title
                    );
                }
            }
            Command::Open(id) => {
                let session =
                    RefinementSession::open(self.services.clone(), self.options.clone(), &id)
                        .await?;
                self.session.shutdown();
                self.session = session;
                println!("{}", format!("Opened {id}, compiling...").bright_black());
                let snapshot = self.session.regenerate().await;
                print_snapshot(&snapshot);
            }
            Command::Delete(id) => {
                self.services.store.delete(&self.options.owner, &id).await?;
                println!("{}", format!("Deleted {id}").green());
            }
            Command::Export(path) => {
                let snapshot = self.session.snapshot().await;
                let bytes = snapshot
                    .artifact
                    .as_ref()
                    .and_then(|artifact| artifact.pdf_bytes())
                    .context("Nothing rendered yet")?;
                tokio::fs::write(&path, bytes)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("{}", format!("Exported {}", path.display()).green());
            }
            Command::Help => print_help(),
            Command::Invalid(message) => println!("{}", message.yellow()),
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_service = ConfigService::default();
    let _log_guard = init_logging(config_service.paths())?;

    let config = config_service.get_config().await;
    let documents_dir = config_service.documents_dir().await?;
    let store = TomlDirArtifactStore::new(documents_dir).await?;
    let compiler = LatexOnlineCompiler::from_config(&config.compile)?;
    let generator = GeminiGenerationService::from_config(&config.generation)
        .context("The generation service is not configured")?;

    let (notifier, receiver) = ChannelNotificationSink::new();
    spawn_notification_printer(receiver);

    let services = SessionServices {
        generator: Arc::new(generator),
        compiler: Arc::new(compiler),
        store: Arc::new(store),
        notifier: Arc::new(notifier),
    };
    let options = SessionOptions::from_config(&config);
    tracing::info!(owner = %options.owner, auto_compile = options.auto_compile, "Starting session");

    let mut repl = Repl {
        session: RefinementSession::new(services.clone(), options.clone()),
        services,
        options,
    };

    let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(CliHelper));

    println!("{}", "=== Quire REPL ===".bright_magenta().bold());
    println!(
        "{}",
        "Describe the book you want, '/help' for commands, or 'quit' to exit.".bright_black()
    );
    println!();

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let Some(command) = Command::parse(&line) else {
                    continue;
                };
                let _ = rl.add_history_entry(line.as_str());

                match repl.dispatch(command).await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(err) => eprintln!("{}", format!("Error: {err:#}").red()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C".bright_black());
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        }
    }

    repl.session.shutdown();
    println!("{}", "Goodbye!".bright_green());
    Ok(())
}
