//! Mini-Jira CLI — the main entry point.
//!
//! Commands:
//! - `onboard`  — Write the default config
//! - `init`     — Create the database schema
//! - `chat`     — Interactive or single-message chat mode
//! - `serve`    — Start the HTTP API server
//! - `status`   — Show configuration and store status

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "minijira",
    about = "Mini-Jira — natural-language admin agent for users and tickets",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create ~/.minijira and a default config.toml
    Onboard,

    /// Create the database schema at the configured path
    Init,

    /// Chat with the admin agent
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show configuration and store status
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if cli.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Init => commands::init::run().await?,
        Commands::Chat { message } => commands::chat::run(message).await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}
