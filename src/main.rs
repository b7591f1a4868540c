use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use profile_chat::service::{ChatService, ConfigSource};
use profile_chat::{constants, prompt, web_server, Profile};

mod chat;

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

// Define the available subcommands
#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start the chat web server.
    Serve {
        #[arg(long, env = "PORT", default_value_t = constants::DEFAULT_PORT, help = "Port for the web server.")]
        port: u16,
        #[arg(long, help = "Path to the profile JSON (defaults to $PROFILE_PATH or data/profile.json).")]
        profile: Option<String>,
    },
    /// Chat with a running server from the terminal.
    Chat {
        #[arg(long, default_value = "http://127.0.0.1:3000", help = "Base URL of the chat server.")]
        server: String,
    },
    /// Print the prompt that would be sent for a question.
    Prompt {
        #[arg(long, help = "Path to the profile JSON (defaults to $PROFILE_PATH or data/profile.json).")]
        profile: Option<String>,
        /// The question to ground.
        question: String,
    },
}

fn load_profile(path: Option<String>) -> Result<Profile> {
    let path = path.unwrap_or_else(|| constants::PROFILE_PATH.clone());
    Profile::load(&path).context("Failed to load profile")
}

// The main entry point of the application, using tokio's async runtime
#[tokio::main]
async fn main() -> Result<()> {
    // Load .env.local / .env if present (API key, model name)
    dotenvy::from_filename(".env.local").ok();
    dotenvy::dotenv().ok();

    // Reads log level from RUST_LOG environment variable (e.g., RUST_LOG=info,profile_chat=debug)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, profile } => {
            let profile = Arc::new(load_profile(profile)?);
            let service = ChatService::new(
                profile,
                ConfigSource::Environment {
                    base_url: constants::PROVIDER_BASE_URL.clone(),
                },
            );

            let shutdown = async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Ctrl-C received, initiating shutdown...");
                }
            };
            web_server::start_web_server(port, service, shutdown).await?;
            info!("Shutdown complete.");
        }
        Commands::Chat { server } => {
            chat::run_terminal_chat(&server)
                .await
                .context("Chat session failed")?;
        }
        Commands::Prompt { profile, question } => {
            let profile = load_profile(profile)?;
            println!("{}", prompt::compose(&profile, prompt::truncate_question(&question)));
        }
    }

    Ok(())
}
