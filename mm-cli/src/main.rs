//! mm - money management backend service
//!
//! Loads configuration, installs logging, opens the Postgres pool and wires
//! the repositories. Runs until Ctrl-C/SIGTERM, then closes the pool within
//! the configured grace period. `mm check-db` counts users and exits.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mm_core::{logging, Config};
use mm_store::{with_deadline, ErrorKind, PgStore, Store, UserRepo, UserRepository};
use tokio::signal;
use tracing::{debug, error, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "mm",
    author,
    version,
    about = "Money management backend service"
)]
struct Cli {
    /// Path to the YAML config file
    #[arg(long, short = 'c', env = "MM_CONFIG", default_value = "config/dev.yaml")]
    config: PathBuf,

    /// Force debug-level logging (RUST_LOG still takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect to the database, count users and exit
    CheckDb,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Optional .env next to the binary's working directory
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = Config::load(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;

    logging::init(&config.logger, cli.debug).context("failed to initialize logging")?;

    info!(app = %config.app.name, env = %config.app.env, "starting");
    debug!(?config, "loaded configuration");

    let pg = PgStore::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    let store: Arc<dyn Store> = Arc::new(pg);
    let users = UserRepo::new(store.clone());

    match cli.command {
        Some(Commands::CheckDb) => {
            let outcome = check_db(&users, &config).await;
            shutdown(store.as_ref(), &config).await;
            outcome
        }
        None => {
            info!("repositories ready, waiting for shutdown signal");
            shutdown_signal().await;
            info!("shutdown signal received");
            shutdown(store.as_ref(), &config).await;
            Ok(())
        }
    }
}

async fn check_db(users: &UserRepo, config: &Config) -> Result<()> {
    match with_deadline(config.timeouts.request_timeout, users.count()).await {
        Ok(count) => {
            println!("users: {}", count);
            Ok(())
        }
        Err(err) if err.kind() == ErrorKind::EmptyAggregate => {
            println!("no users");
            Ok(())
        }
        Err(err) => Err(err).context("failed to count users"),
    }
}

/// Close the pool, giving up after `shutdownGracePeriod`.
async fn shutdown(store: &dyn Store, config: &Config) {
    let grace = config.timeouts.shutdown_grace_period;
    match tokio::time::timeout(grace, store.close()).await {
        Ok(()) => info!("database pool closed"),
        Err(_) => warn!(
            grace_ms = grace.as_millis() as u64,
            "database pool did not close within grace period"
        ),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
