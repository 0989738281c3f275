use std::{path::Path, time::Duration};

use clap::Parser;
use steward::{
    AppState,
    auth::Session,
    build_app,
    config::StewardConfig,
    jobs,
    models::PerformedVia,
    observability::{self, metrics},
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

/// Config file used when `--config` is not given and it exists
const DEFAULT_CONFIG_PATH: &str = "steward.toml";

/// CLI arguments for the steward service
#[derive(Parser, Debug)]
#[command(version, about = "Support data lifecycle and governance", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to config file (defaults to ./steward.toml if it exists,
    /// otherwise built-in defaults)
    #[arg(short, long, global = true)]
    config: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Start the admin server and background jobs (default)
    Serve,
    /// Run database migrations and exit
    Migrate,
    /// Apply the retention policy once and exit
    EnforceRetention,
    /// Run a backup check, or force a backup as an administrator
    Backup {
        /// Run even if not due (requires --user)
        #[arg(long, requires = "user")]
        force: bool,
        /// Acting administrator's user id
        #[arg(long)]
        user: Option<String>,
    },
    /// Validate the configuration file and exit
    CheckConfig,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let config_path = args.config.as_deref();

    match args.command {
        Some(Command::Migrate) => run_migrate(config_path).await,
        Some(Command::EnforceRetention) => run_enforce_retention(config_path).await,
        Some(Command::Backup { force, user }) => run_backup(config_path, force, user).await,
        Some(Command::CheckConfig) => run_check_config(config_path),
        Some(Command::Serve) | None => run_server(config_path).await,
    }
}

/// Load the config, exiting with a message on failure.
fn load_config(explicit_path: Option<&str>) -> StewardConfig {
    let path = match explicit_path {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => DEFAULT_CONFIG_PATH,
        None => {
            eprintln!("No config file found, using built-in defaults");
            return StewardConfig::default();
        }
    };

    match StewardConfig::from_file(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", path, e);
            std::process::exit(1);
        }
    }
}

fn init_observability(config: &StewardConfig) {
    if let Err(e) = observability::init_tracing(&config.observability) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    if let Err(e) = metrics::init_metrics(&config.observability.metrics) {
        tracing::error!(error = %e, "Failed to initialize metrics");
    }
}

/// Connect to the database and build the services, exiting on failure.
async fn build_state(config: StewardConfig) -> AppState {
    if config.database.is_none() {
        eprintln!("Error: Database is not configured.");
        std::process::exit(1);
    }
    match AppState::new(config).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize database");
            eprintln!("Error: Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: Failed to render result: {}", e),
    }
}

async fn run_migrate(config_path: Option<&str>) {
    let config = load_config(config_path);
    init_observability(&config);

    if config.database.is_none() {
        eprintln!("Error: Database is not configured. Nothing to migrate.");
        std::process::exit(1);
    }

    match steward::db::DbPool::from_config(&config.database).await {
        Ok(pool) => match pool.run_migrations().await {
            Ok(()) => tracing::info!("Database migrations completed successfully"),
            Err(e) => {
                tracing::error!(error = %e, "Database migrations failed");
                eprintln!("Error: Database migrations failed: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("Error: Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run_enforce_retention(config_path: Option<&str>) {
    let config = load_config(config_path);
    init_observability(&config);
    let state = build_state(config).await;
    let Some(services) = state.services else {
        std::process::exit(1);
    };

    match services.retention.enforce_policy(PerformedVia::Cli).await {
        Ok(report) => print_json(&report),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run_backup(config_path: Option<&str>, force: bool, user: Option<String>) {
    let config = load_config(config_path);
    init_observability(&config);
    let state = build_state(config).await;
    let Some(services) = state.services else {
        std::process::exit(1);
    };

    let result = match user {
        Some(user) => {
            let session = Session::for_user(user, PerformedVia::Cli);
            services.backup.run_manual(&session, force).await
        }
        None => services.backup.run_scheduled().await,
    };

    match result {
        Ok(outcome) => print_json(&outcome),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_check_config(config_path: Option<&str>) {
    let config = load_config(config_path);
    println!(
        "Configuration OK (database: {}, retention job: {}, backup job: {})",
        if config.database.is_none() {
            "none"
        } else {
            "sqlite"
        },
        config.jobs.retention.enabled,
        config.jobs.backup.enabled,
    );
}

async fn run_server(config_path: Option<&str>) {
    let config = load_config(config_path);
    init_observability(&config);

    let state = build_state(config.clone()).await;
    let task_tracker = TaskTracker::new();
    let shutdown = CancellationToken::new();

    if let Some(services) = &state.services {
        let retention = services.retention.clone();
        let retention_config = config.jobs.retention.clone();
        let token = shutdown.clone();
        task_tracker.spawn(async move {
            tokio::select! {
                _ = jobs::start_retention_worker(retention, retention_config) => {}
                _ = token.cancelled() => {}
            }
        });

        let backup = services.backup.clone();
        let backup_config = config.jobs.backup.clone();
        let token = shutdown.clone();
        task_tracker.spawn(async move {
            tokio::select! {
                _ = jobs::start_backup_worker(backup, backup_config) => {}
                _ = token.cancelled() => {}
            }
        });
    }

    let app = build_app(&config, state);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Error: Failed to bind to {}: {}", bind_addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on http://{}", bind_addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(task_tracker, shutdown))
        .await
    {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

async fn shutdown_signal(task_tracker: TaskTracker, shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

    tracing::info!("Shutdown signal received, waiting for background tasks to complete...");

    // Workers stop at their next await point; an in-flight pass is dropped
    // and its remaining candidates are picked up by the next run.
    shutdown.cancel();
    task_tracker.close();

    if tokio::time::timeout(Duration::from_secs(10), task_tracker.wait())
        .await
        .is_err()
    {
        tracing::warn!("Timeout waiting for background tasks to finish");
    } else {
        tracing::info!("Background tasks finished");
    }
}
