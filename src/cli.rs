use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "csvchat")]
#[command(about = "Chat with a CSV file through a hosted assistant service")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the interactive chat interface
    Chat {
        /// Upload this CSV/text file on startup
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Override the configured model for this session
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Manage the service API key
    ApiKey {
        /// Store an API key (prompts when no value is given)
        #[arg(short, long)]
        set: Option<Option<String>>,

        /// Remove the stored API key
        #[arg(short, long)]
        remove: bool,

        /// Probe the service with the stored key
        #[arg(long)]
        status: bool,
    },

    /// List model identifiers visible to the stored key
    Models,
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            command: Some(Commands::Chat {
                file: None,
                model: None,
            }),
            config: None,
            debug: false,
        }
    }
}
