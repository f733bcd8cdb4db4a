//! flashnotes - command-line client for the flashnotes study service.
//!
//! Signs in, registers, signs out and reports the stored session. The
//! session survives between runs and is revalidated with the server each
//! time the program starts.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Result};
use flashnotes_core::auth::{FileStore, KeyringStore, SessionStore};
use flashnotes_core::{AuthClient, Config, SessionManager, SessionStatus, StoreBackend};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

type Manager = SessionManager<AuthClient, Box<dyn SessionStore>>;

const USAGE: &str = "\
Usage: flashnotes <command> [args]

Commands:
  status                 Show the current session
  register [username]    Create an account and sign in
  login [username]       Sign in
  logout                 Sign out and forget the stored session
  whois <user-id>...     Look up usernames for user ids

Environment:
  FLASHNOTES_API_URL     Override the API base URL
  FLASHNOTES_USERNAME    Default username
  FLASHNOTES_PASSWORD    Password (skips the prompt)
  RUST_LOG               Log filter (default: warn)";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(name) = args.first().map(String::as_str) else {
        eprintln!("{}", USAGE);
        return Ok(());
    };
    let rest = &args[1..];

    // Resolve the command before touching the network
    let command = match Command::parse(name) {
        Some(Command::Help) => {
            eprintln!("{}", USAGE);
            return Ok(());
        }
        Some(command) => command,
        None => {
            eprintln!("{}", USAGE);
            bail!("Unknown command: {}", name);
        }
    };

    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };

    let mut manager = build_manager(&config)?;
    manager.init().await;
    debug!(status = ?manager.status(), "Session initialized");

    match command {
        Command::Status => print_status(&manager),
        Command::Register | Command::Login => {
            let username = resolve_username(rest.first(), &config)?;
            let password = resolve_password()?;

            let ok = if command == Command::Register {
                manager.register(&username, &password).await
            } else {
                manager.login(&username, &password).await
            };
            if !ok {
                bail!(manager.error().unwrap_or("Authentication failed").to_string());
            }

            config.last_username = Some(username);
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }
            print_status(&manager);
        }
        Command::Logout => {
            manager.logout().await;
            println!("Signed out.");
        }
        Command::Whois => {
            if rest.is_empty() {
                bail!("whois needs at least one user id");
            }
            let Some(names) = manager.lookup_usernames(rest).await else {
                bail!(manager.error().unwrap_or("Lookup failed").to_string());
            };
            for (id, name) in pair_usernames(rest, names) {
                println!("{}\t{}", id, name);
            }
        }
        Command::Help => eprintln!("{}", USAGE),
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Status,
    Register,
    Login,
    Logout,
    Whois,
    Help,
}

impl Command {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "status" => Some(Command::Status),
            "register" => Some(Command::Register),
            "login" => Some(Command::Login),
            "logout" => Some(Command::Logout),
            "whois" => Some(Command::Whois),
            "help" | "--help" | "-h" => Some(Command::Help),
            _ => None,
        }
    }
}

/// Match looked-up names to the ids asked for. The server answers in
/// request order; a short answer leaves the trailing ids unresolved.
fn pair_usernames(ids: &[String], names: Vec<String>) -> Vec<(String, String)> {
    if names.len() != ids.len() {
        warn!(
            requested = ids.len(),
            returned = names.len(),
            "Username lookup returned a different number of rows"
        );
    }
    let mut names = names.into_iter();
    ids.iter()
        .map(|id| {
            let name = names.next().unwrap_or_else(|| "<unknown>".to_string());
            (id.clone(), name)
        })
        .collect()
}

fn build_manager(config: &Config) -> Result<Manager> {
    let base_url = std::env::var("FLASHNOTES_API_URL")
        .unwrap_or_else(|_| config.api_base_url().to_string());
    info!(base_url = %base_url, store = ?config.store, "Connecting");

    let client = AuthClient::new(base_url, config.request_timeout())?;

    let store: Box<dyn SessionStore> = match config.store {
        StoreBackend::File => {
            let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
            Box::new(FileStore::new(cache_dir))
        }
        StoreBackend::Keyring => Box::new(KeyringStore::new()),
    };

    Ok(SessionManager::new(client, store))
}

fn print_status(manager: &Manager) {
    match manager.status() {
        SessionStatus::LoggedIn => println!(
            "Signed in as {} (user {})",
            manager.username().unwrap_or("<unknown>"),
            manager.user_id().unwrap_or_default()
        ),
        SessionStatus::Pending => println!("Session not yet verified"),
        SessionStatus::LoggedOut => {
            println!("Not signed in");
            if let Some(error) = manager.error() {
                println!("Last error: {}", error);
            }
        }
    }
}

fn resolve_username(arg: Option<&String>, config: &Config) -> Result<String> {
    if let Some(username) = arg
        .cloned()
        .or_else(|| std::env::var("FLASHNOTES_USERNAME").ok())
    {
        return Ok(username);
    }

    match config.last_username {
        Some(ref last) => print!("Username [{}]: ", last),
        None => print!("Username: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    match (input.is_empty(), &config.last_username) {
        (true, Some(last)) => Ok(last.clone()),
        _ => Ok(input.to_string()),
    }
}

fn resolve_password() -> Result<String> {
    if let Ok(password) = std::env::var("FLASHNOTES_PASSWORD") {
        return Ok(password);
    }
    Ok(rpassword::prompt_password("Password: ")?)
}

// ============================================================================
// Tests
// ============================================================================
