use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use rustyline::Editor;
use tokio::time::timeout;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use notekeeper_application::NotesApp;
use notekeeper_core::config::BackendKind;
use notekeeper_core::note::NoteId;
use notekeeper_infrastructure::{Backend, ConfigService};

mod command;
mod helper;
mod render;

use command::{COMMANDS, Command};
use helper::NotekeeperHelper;

/// How long to wait for a session change or note reload before redrawing.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Parser)]
#[command(name = "notekeeper", version, about = "Personal notes in your terminal")]
struct Args {
    /// Config file (defaults to ~/.config/notekeeper/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides `[backend] kind` from the config file
    #[arg(long, value_enum)]
    backend: Option<BackendArg>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg {
    Memory,
    Firebase,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Memory => BackendKind::Memory,
            BackendArg::Firebase => BackendKind::Firebase,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("notekeeper=info")),
        )
        .init();

    let args = Args::parse();

    // ===== Backend Initialization =====
    let config = ConfigService::with_path(args.config.clone())
        .with_backend(args.backend.map(Into::into))
        .get_config()
        .context("Failed to load configuration")?;
    let backend = Backend::from_config(&config).context("Failed to set up backend")?;
    info!(backend = ?backend.kind, "Starting notekeeper");
    let app = NotesApp::from_backend(&backend, &config);

    // ===== REPL Setup =====
    let mut rl = Editor::new()?;
    rl.set_helper(Some(NotekeeperHelper));

    println!("{}", "=== Notekeeper ===".bright_magenta().bold());
    println!("{}", "Type /help for commands, or 'quit' to exit.".bright_black());
    println!();

    settle(&app).await;
    print_view(&app);

    // ===== Main REPL Loop =====
    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }

                let command = match command::parse(&line) {
                    Ok(command) => command,
                    Err(message) => {
                        println!("{}", message.yellow());
                        continue;
                    }
                };

                if !command.is_sensitive() {
                    let _ = rl.add_history_entry(&line);
                }
                if command == Command::Quit {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }

                execute(&app, command).await;
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    app.shutdown().await;
    Ok(())
}

/// Runs one command and redraws. Failures land in the pending-error slot,
/// which the redraw shows.
async fn execute(app: &NotesApp, command: Command) {
    let mut sessions = app.controller().watch();
    sessions.borrow_and_update();
    let moves_session = matches!(
        command,
        Command::Submit
            | Command::SignIn { .. }
            | Command::SignUp { .. }
            | Command::SignOut
            | Command::DeleteAccount
    );

    let result = match command {
        Command::Email(email) => {
            app.set_email(email);
            Ok(())
        }
        Command::Password(password) => {
            app.set_password(password);
            Ok(())
        }
        Command::Toggle => {
            app.toggle_mode();
            Ok(())
        }
        Command::Submit => app.submit_auth().await,
        Command::SignIn { email, password } => app.sign_in(&email, &password).await,
        Command::SignUp { email, password } => app.sign_up(&email, &password).await,
        Command::SignOut => app.sign_out().await,
        Command::Add(text) => app.add_note(&text).await,
        Command::Remove(target) => {
            let note_id = resolve_note(app, &target);
            app.delete_note(&note_id).await
        }
        Command::Refresh => app.refresh().await,
        Command::DeleteAccount => app.delete_account().await,
        Command::Dismiss => {
            app.dismiss_error();
            Ok(())
        }
        Command::Show => Ok(()),
        Command::Help => {
            print_help();
            return;
        }
        Command::Quit => return,
    };

    if moves_session && result.is_ok() {
        let _ = timeout(SETTLE_TIMEOUT, sessions.changed()).await;
    }
    settle(app).await;
    print_view(app);
}

/// `/rm 2` deletes the second listed note; anything else is taken as an id.
fn resolve_note(app: &NotesApp, target: &str) -> NoteId {
    let notes = app.view().notes;
    target
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| notes.get(i))
        .map(|note| note.id.clone())
        .unwrap_or_else(|| NoteId::new(target))
}

/// Waits until the note list belongs to whoever the session says is signed in.
async fn settle(app: &NotesApp) {
    let expected = app.controller().current_session().map(|s| s.user_id);
    let mut notes = app.notes().watch();
    let _ = timeout(SETTLE_TIMEOUT, notes.wait_for(|list| list.owner == expected)).await;
}

fn print_view(app: &NotesApp) {
    println!();
    for line in render::render_view(&app.view()) {
        println!("{line}");
    }
    println!();
}

fn print_help() {
    for spec in COMMANDS {
        let usage = format!("{:<34}", format!("{} {}", spec.name, spec.usage));
        println!("  {} {}", usage.bright_cyan(), spec.about.bright_black());
    }
    println!("  {} {}", format!("{:<34}", "quit").bright_cyan(), "exit".bright_black());
}
