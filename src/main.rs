mod cli;
mod tui;

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use csvchat::app::{AppConfig, AppState};
use csvchat::chat::ChatSession;
use csvchat::error::Result;
use csvchat::platform::{AppPaths, SecureStorageManager};

use cli::{Cli, Commands};

/// Logs go to rotated files in the data dir; stdout belongs to the TUI.
fn init_logging(paths: &AppPaths, debug: bool) -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(paths.logs_dir(), "csvchat.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let default_directive = if debug { "csvchat=debug" } else { "csvchat=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    guard
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let paths = AppPaths::new()?;
    paths.ensure_dirs_exist()?;

    let _log_guard = init_logging(&paths, cli.debug);
    info!("Starting csvchat {}", env!("CARGO_PKG_VERSION"));

    let secure_storage = SecureStorageManager::new()?;

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| paths.config_file());
    let config = AppConfig::load_from(&config_path).await?;

    let state = AppState::new(config, config_path, paths, secure_storage);

    match cli.command.unwrap_or(Commands::Chat {
        file: None,
        model: None,
    }) {
        Commands::Chat { file, model } => run_chat(state, file, model).await,
        Commands::ApiKey {
            set,
            remove,
            status,
        } => run_api_key(state, set, remove, status).await,
        Commands::Models => run_models(state).await,
    }
}

async fn run_chat(state: AppState, file: Option<PathBuf>, model: Option<String>) -> Result<()> {
    let client = match state.build_client().await? {
        Some(client) => client,
        None => {
            eprintln!("No API key configured. Run `csvchat apikey --set` first.");
            return Ok(());
        }
    };

    // An invalid credential blocks the chat from opening.
    if let Err(e) = client.validate_key().await {
        eprintln!("The service rejected the stored API key: {}", e);
        eprintln!("Update it with `csvchat apikey --set`.");
        return Ok(());
    }

    let mut config = state.get_config();
    if let Some(model) = model {
        config.service.model = model;
    }

    let session = Arc::new(ChatSession::new(Arc::new(client), &config));

    tui::run(session, &config, file).await
}

async fn run_api_key(
    state: AppState,
    set: Option<Option<String>>,
    remove: bool,
    status: bool,
) -> Result<()> {
    if let Some(value) = set {
        let api_key = match value {
            Some(key) => key,
            None => rpassword::prompt_password("API key: ")?,
        };
        state.set_api_key(api_key.trim()).await?;
        println!("API key stored.");

        if state.validate_credentials().await? {
            println!("The service accepted the key.");
        } else {
            println!("Warning: the service rejected the key; the chat will not start with it.");
        }
        return Ok(());
    }

    if remove {
        state.remove_api_key().await?;
        println!("API key removed.");
        return Ok(());
    }

    if status {
        use csvchat::app::state::CredentialStatus;
        match state.credential_status().await? {
            CredentialStatus::Ready => println!("API key present and accepted by the service."),
            CredentialStatus::Missing => println!("No API key stored."),
            CredentialStatus::Rejected => println!("API key present but rejected by the service."),
        }
        return Ok(());
    }

    println!("Nothing to do. Use --set, --remove or --status.");
    Ok(())
}

async fn run_models(state: AppState) -> Result<()> {
    let client = match state.build_client().await? {
        Some(client) => client,
        None => {
            eprintln!("No API key configured. Run `csvchat apikey --set` first.");
            return Ok(());
        }
    };

    let mut models = client.list_models().await?;
    models.sort();
    for model in models {
        println!("{}", model);
    }
    Ok(())
}
