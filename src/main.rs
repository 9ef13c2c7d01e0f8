mod ai;
mod config;
mod error;
mod inbox;
mod prompts;
mod repl;
mod session;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::ai::GeminiClient;
use crate::config::Config;
use crate::inbox::Inbox;
use crate::prompts::PromptStore;
use crate::session::Session;

fn setup_logging() {
    use std::fs::OpenOptions;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mailsift=debug"));

    // Try to create a log file in the config directory
    let log_file = Config::config_dir()
        .ok()
        .map(|dir| dir.join("mailsift.log"))
        .and_then(|path| {
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&path)
                .ok()
        });

    if let Some(file) = log_file {
        // Log to file so the interactive loop stays clean
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false),
            )
            .init();
    } else {
        // Fallback to stderr if file logging fails
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_usage() {
    eprintln!(
        r#"mailsift - AI-assisted inbox triage demo

Usage: mailsift

Reads the mock inbox and prompt templates named in the config file and
starts an interactive session.

Configuration file: ~/.config/mailsift/config.toml
Required credential: [ai].api_key or the GEMINI_API_KEY environment variable
"#
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();

    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "help" | "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            other => {
                eprintln!("Unknown argument: {other}\n");
                print_usage();
                std::process::exit(1);
            }
        }
    }

    let config = Config::load().context("Failed to load configuration")?;

    let api_key = config.ai.resolve_api_key().context(
        "No Gemini API key configured. Set [ai].api_key in config.toml \
         or the GEMINI_API_KEY environment variable",
    )?;

    let store = PromptStore::new(config.prompts_path.clone());
    let prompts = store
        .load()
        .context("Failed to load prompt templates")?;

    let mailbox = Inbox::load_or_empty(&config.inbox_path);
    if mailbox.is_empty() {
        eprintln!(
            "Warning: no emails loaded from {}",
            config.inbox_path.display()
        );
    }

    let client = GeminiClient::new(api_key, config.ai.model.clone());
    let session = Session::new(mailbox, prompts, client);

    repl::run(session, store).await
}
