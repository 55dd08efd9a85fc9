//! `quire` command line.
//!
//! Usage:
//!   quire serve --config quire.toml
//!   quire hash-password 's3cret'

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use quire::Config;
use quire::blog::session::hash_password;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "quire")]
#[command(about = "A small blog: posts, tags, search and a login gate")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the blog until SIGTERM or Ctrl-C
    Serve {
        /// Path to the TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print an argon2 hash for a `[[users]]` entry
    HashPassword {
        password: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match Cli::parse().command {
        Command::Serve { config } => serve(config).await,
        Command::HashPassword { password } => match hash_password(&password) {
            Ok(hash) => {
                println!("{hash}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("quire: {e}");
                ExitCode::FAILURE
            }
        },
    }
}

async fn serve(path: Option<PathBuf>) -> ExitCode {
    let config = match Config::load(path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("quire: {e}");
            return ExitCode::FAILURE;
        }
    };

    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    info!(bind = %config.bind, "quire starting");
    match quire::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "quire failed");
            ExitCode::FAILURE
        }
    }
}
