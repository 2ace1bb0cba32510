//! `PassOP` CLI: your own password manager, from the terminal.
//!
//! Talks to the `PassOP` server over its REST API. The signed-in user comes
//! from the identity provider session, exposed here as `PASSOP_USER_ID`.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::io::{BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use passop_client::clipboard::SystemClipboard;
use passop_client::notify::{Level, Notification};
use passop_client::view;
use passop_client::{HttpApi, IdentityConfig, Manager, Session};
use passop_core::record::Field;

// ── ANSI color helpers ───────────────────────────────────────────────

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

const BANNER_SMALL: &str = "<Pass/OP>";

/// Default time `copy` keeps the clipboard contents alive before exiting.
const DEFAULT_HOLD_SECS: u64 = 15;

// ── CLI structure ────────────────────────────────────────────────────

/// `PassOP`: your own password manager.
#[derive(Parser)]
#[command(
    name = "passop",
    version,
    about = "PassOP CLI: save, edit, copy, and delete your passwords",
    long_about = None,
    after_help = format!(
        "{DIM}Environment variables:{RESET}\n  \
         PASSOP_API_URL           Server address (default: http://localhost:3000)\n  \
         PASSOP_USER_ID           Signed-in user id\n  \
         PASSOP_PUBLISHABLE_KEY   Identity provider key\n\n\
         {DIM}Examples:{RESET}\n  \
         passop add example.com alice hunter2\n  \
         passop list --show\n  \
         passop copy <id> password --hold 30\n  \
         passop delete <id> --yes"
    ),
)]
struct Cli {
    /// `PassOP` server address.
    #[arg(long, env = "PASSOP_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    /// Signed-in user id.
    #[arg(long, env = "PASSOP_USER_ID")]
    user: Option<String>,

    /// Identity provider publishable key.
    #[arg(long, env = "PASSOP_PUBLISHABLE_KEY", hide_env_values = true)]
    publishable_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show saved passwords.
    List {
        /// Show passwords in clear text.
        #[arg(long)]
        show: bool,
    },
    /// Save a new password.
    Add {
        site: String,
        username: String,
        password: String,
    },
    /// Change a saved password. Omitted fields keep their value.
    Edit {
        id: String,
        #[arg(long)]
        site: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Delete a saved password.
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },
    /// Copy a field of a saved password to the clipboard.
    Copy {
        id: String,
        /// `site`, `username`, or `password`.
        field: Field,
        /// Seconds to keep the copied text available before exiting.
        /// Some desktops drop it as soon as the copying process ends.
        #[arg(long, default_value_t = DEFAULT_HOLD_SECS)]
        hold: u64,
    },
}

// ── Pretty output helpers ────────────────────────────────────────────

fn header(title: &str) {
    println!("{BOLD}{CYAN}{BANNER_SMALL} {title}{RESET}");
    println!("{DIM}─────────────────────────────────────────{RESET}");
}

fn print_toast(toast: &Notification) {
    match toast.level {
        Level::Success => println!("{GREEN}{BOLD}✓{RESET} {}", toast.message),
        Level::Info => println!("{CYAN}{BOLD}ℹ{RESET} {}", toast.message),
        Level::Error => println!("{RED}{BOLD}✗{RESET} {RED}{}{RESET}", toast.message),
    }
}

/// Print and clear queued toasts. Returns whether any was an error.
fn flush_toasts(manager: &mut Manager) -> bool {
    let mut any_error = false;
    for toast in manager.notifications_mut().drain() {
        any_error |= toast.level == Level::Error;
        print_toast(&toast);
    }
    any_error
}

/// A failure already shown to the user as an error toast.
#[derive(Debug)]
struct Reported;

impl std::fmt::Display for Reported {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("already reported")
    }
}

impl std::error::Error for Reported {}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{YELLOW}{BOLD}⚠{RESET} {prompt} {DIM}[y/N]{RESET} ");
    std::io::stdout().flush().context("failed to flush stdout")?;
    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("failed to read confirmation")?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

// ── Command dispatch ─────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is::<Reported>() => ExitCode::FAILURE,
        Err(e) => {
            eprintln!();
            eprintln!("  {RED}{BOLD}✗ Error:{RESET} {e:#}");
            eprintln!();
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    IdentityConfig::new(cli.publishable_key).context("identity provider is not configured")?;

    let session = Session::from_user_id(cli.user);
    let api = Arc::new(HttpApi::new(&cli.api_url));
    let mut manager = Manager::new(api, Box::new(SystemClipboard::new()), session);

    if !manager.session().is_signed_in() {
        println!();
        println!("  {YELLOW}{}{RESET}", view::SIGNED_OUT);
        println!();
        return Ok(());
    }

    let result = dispatch(&mut manager, cli.command).await;
    let toasted_error = flush_toasts(&mut manager);
    match result {
        Err(e) if toasted_error => {
            tracing::debug!(error = %format!("{e:#}"), "command failed");
            Err(Reported.into())
        }
        other => other,
    }
}

async fn dispatch(manager: &mut Manager, cmd: Commands) -> Result<()> {
    manager.load().await.context("failed to load passwords")?;

    match cmd {
        Commands::List { show } => {
            if show {
                manager.toggle_password_visibility();
            }
            println!();
            header("Your Passwords");
            println!(
                "{}",
                view::render_table(manager.records(), None, manager.show_password())
            );
            println!();
        }
        Commands::Add {
            site,
            username,
            password,
        } => {
            manager.set_field(Field::Site, site);
            manager.set_field(Field::Username, username);
            manager.set_field(Field::Password, password);
            manager.save().await.context("failed to save password")?;
        }
        Commands::Edit {
            id,
            site,
            username,
            password,
        } => {
            manager.edit(&id).context("failed to edit password")?;
            for (field, value) in [
                (Field::Site, site),
                (Field::Username, username),
                (Field::Password, password),
            ] {
                if let Some(value) = value {
                    manager.set_field(field, value);
                }
            }
            manager.save().await.context("failed to update password")?;
        }
        Commands::Delete { id, yes } => {
            let Some(record) = manager.record(&id) else {
                anyhow::bail!("no saved password with id '{id}'");
            };
            let site = record.site.clone();

            manager.request_delete(&id);
            if !yes {
                println!();
                println!("{}", view::render_delete_modal());
                if !confirm(&format!("Delete the password for {BOLD}{site}{RESET}?"))? {
                    manager.cancel_delete();
                    println!("{DIM}Cancelled.{RESET}");
                    return Ok(());
                }
            }
            manager
                .confirm_delete()
                .await
                .context("failed to delete password")?;
        }
        Commands::Copy { id, field, hold } => {
            manager.copy(&id, field).context("failed to copy")?;
            println!(
                "{}",
                view::render_table(manager.records(), manager.copied().as_ref(), false)
            );
            flush_toasts(manager);
            hold_clipboard(Duration::from_secs(hold)).await;
        }
    }
    Ok(())
}

/// Keep the process, and with it the clipboard owner, alive for `hold` or
/// until Ctrl-C.
async fn hold_clipboard(hold: Duration) {
    if hold.is_zero() {
        return;
    }
    println!(
        "{DIM}Keeping the clipboard for {}s. Press Ctrl-C to finish early.{RESET}",
        hold.as_secs()
    );
    tokio::select! {
        () = tokio::time::sleep(hold) => {}
        _ = tokio::signal::ctrl_c() => {}
    }
}
