mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod review;
mod server;
mod services;
mod workflow;

#[cfg(test)]
mod test_support;

use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::review::{self as review_cmd, ReviewArgs};
use crate::cmd::serve::{self as serve_cmd, ServeArgs};
use crate::config::config_directory;
use crate::error::AppResult;

const REVIEW_LOG_FILE: &str = "swipe.log";

#[derive(Parser)]
#[command(
    name = "swipe",
    author,
    version,
    about = "Swipe through Jira tickets and label them run or change"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP proxy between the review client and Jira.
    Serve(ServeArgs),
    /// Review tickets one card at a time in the terminal.
    Review(ReviewArgs),
    /// Manage the stored Jira settings.
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => {
            init_tracing(LogTarget::Stderr)?;
            serve_cmd::run(args).await
        }
        Commands::Review(args) => {
            init_tracing(LogTarget::File)?;
            review_cmd::run(args).await
        }
        Commands::Config(args) => {
            init_tracing(LogTarget::Stderr)?;
            config_cmd::run(args.command).await
        }
    }
}

enum LogTarget {
    Stderr,
    /// The review screen owns the terminal, so its logs go to a file.
    File,
}

fn init_tracing(target: LogTarget) -> AppResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match target {
        LogTarget::Stderr => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
        LogTarget::File => {
            let dir = config_directory()?;
            fs::create_dir_all(&dir)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(REVIEW_LOG_FILE))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
    }
    Ok(())
}
