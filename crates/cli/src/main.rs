//! DataGate CLI — the main entry point.
//!
//! Commands:
//! - `init`   — Write a default config file
//! - `serve`  — Start the HTTP gateway
//! - `token`  — Mint a signed bearer token
//! - `doctor` — Diagnose configuration and collaborator health

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "datagate",
    about = "DataGate — secure natural-language query gateway",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true, default_value = "datagate.toml")]
    config: std::path::PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init,

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Mint a signed bearer token for an identity
    Token {
        /// The subject (identity) the token is issued to
        #[arg(short, long)]
        subject: String,

        /// Token lifetime in minutes (defaults to the configured TTL)
        #[arg(short, long)]
        ttl_minutes: Option<i64>,
    },

    /// Diagnose configuration and collaborator health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Init => commands::init::run(&cli.config)?,
        Commands::Serve { port } => commands::serve::run(&cli.config, port).await?,
        Commands::Token {
            subject,
            ttl_minutes,
        } => commands::token::run(&cli.config, &subject, ttl_minutes)?,
        Commands::Doctor => commands::doctor::run(&cli.config).await?,
    }

    Ok(())
}
