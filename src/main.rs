mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use std::process::{Command, Stdio};
use std::sync::Arc;

use cli::{Cli, Commands};
use git_linear::config::Config;
use git_linear::credentials::CredentialStore;
use git_linear::git::Git;
use git_linear::linear::LinearClient;
use git_linear::tui::command::Services;
use git_linear::tui::run_tui;

const API_KEY_SETTINGS_URL: &str = "https://linear.app/settings/account/security";

fn main() -> Result<()> {
    // Setup better panic handling
    better_panic::install();

    let config = Config::load()?;

    // Rotate log file before setting up logging (keeps it under 1000 lines)
    logging::rotate_log(&config);
    logging::setup_logging(&config)?;

    let cli = Cli::parse();

    tracing::debug!(command = ?cli.command, "dispatching command");

    match cli.command {
        Some(Commands::Auth) => cmd_auth(&config),
        Some(Commands::Logout) => cmd_logout(&config),
        None => cmd_branch(&config),
    }
}

fn cmd_branch(config: &Config) -> Result<()> {
    let git = Git::current_dir()?;

    if !git.is_inside_work_tree() {
        anyhow::bail!("not a git repository. Run this from inside a git project");
    }
    if git.has_uncommitted_changes() {
        anyhow::bail!(
            "you have uncommitted changes. Please commit or stash them before creating a new branch"
        );
    }

    let store = CredentialStore::new(config.credentials_path());
    let api_key = store.resolve()?.ok_or_else(|| {
        anyhow::anyhow!("no API key found. Run 'git linear auth' to set up your Linear API key")
    })?;

    let client =
        LinearClient::with_url(api_key, config.api_url.as_str()).with_issue_limit(config.issue_limit);
    let services = Services::new(Arc::new(client), Arc::new(git));

    if let Some(message) = run_tui(services).context("error running TUI")? {
        println!("✓ {}", message);
    }

    Ok(())
}

fn cmd_auth(config: &Config) -> Result<()> {
    println!("To create a Linear API key:");
    println!("  1. Go to Linear Settings → Account → Security");
    println!("  2. Under 'Personal API keys', click 'Create key'");
    println!("  3. Copy the generated key");
    println!();
    println!("Opening Linear settings in your browser...");
    println!();

    if !open_browser(API_KEY_SETTINGS_URL) {
        println!("Could not open browser automatically.");
        println!("Please visit: {}", API_KEY_SETTINGS_URL);
        println!();
    }

    let api_key = dialoguer::Password::new()
        .with_prompt("Enter your Linear API key")
        .allow_empty_password(true)
        .interact()
        .context("failed to read API key")?;

    let api_key = api_key.trim();
    if api_key.is_empty() {
        anyhow::bail!("API key cannot be empty");
    }

    let client = LinearClient::with_url(api_key, config.api_url.as_str());
    client
        .validate_api_key()
        .map_err(|e| anyhow::anyhow!("invalid API key: {}", e))?;

    CredentialStore::new(config.credentials_path())
        .store(api_key)
        .context("failed to store API key")?;

    println!("✓ API key validated and stored successfully");
    Ok(())
}

fn cmd_logout(config: &Config) -> Result<()> {
    let store = CredentialStore::new(config.credentials_path());
    if !store.has() {
        println!("No API key stored.");
        return Ok(());
    }
    store.delete()?;
    println!("API key removed.");
    Ok(())
}

/// Best effort: a missing opener or a failed spawn just means the user gets
/// the URL printed instead.
fn open_browser(url: &str) -> bool {
    let mut command = if cfg!(target_os = "macos") {
        let mut c = Command::new("open");
        c.arg(url);
        c
    } else if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", "", url]);
        c
    } else {
        let mut c = Command::new("xdg-open");
        c.arg(url);
        c
    };

    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .is_ok()
}
