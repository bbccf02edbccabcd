//! Weather Service - HTTP API and real-time feed for weather observations.
//!
//! Run with: `cargo run -p weather-service`

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use weather_service::middleware::{WriteLimiter, limit_writes};
use weather_service::{AppState, Config, app, seed};
use weather_store::Store;

/// Weather Service - HTTP REST API and WebSocket feed for weather observations.
#[derive(Parser, Debug)]
#[command(name = "weather-service")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Bind address (overrides config).
    #[arg(short, long, global = true)]
    bind: Option<String>,

    /// Database path (overrides config).
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the service in the foreground (default behavior).
    Run,

    /// Insert sample observations into the database and exit.
    Seed {
        /// Number of observations to insert.
        #[arg(short = 'n', long, default_value_t = seed::DEFAULT_SEED_COUNT)]
        count: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("weather_service=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    let config = load_config(&args)?;

    match args.command {
        Some(Command::Seed { count }) => seed_database(&config, count),
        Some(Command::Run) | None => run_server(config).await,
    }
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default().unwrap_or_else(|e| {
            warn!("Ignoring unreadable default config: {}", e);
            Config::default()
        }),
    };

    if let Some(bind) = &args.bind {
        config.server.bind = bind.clone();
    }
    if let Some(db_path) = &args.database {
        config.storage.path = db_path.clone();
    }

    config.validate()?;
    Ok(config)
}

fn seed_database(config: &Config, count: u32) -> anyhow::Result<()> {
    let mut store = Store::open(&config.storage.path)?;
    let inserted = seed::seed_store(&mut store, count)?;
    println!(
        "Inserted {} observations into {}",
        inserted.len(),
        config.storage.path.display()
    );
    Ok(())
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    let store = Store::open(&config.storage.path)?;
    let security = Arc::new(config.security.clone());
    let addr: SocketAddr = config.server.bind.parse()?;

    let state = AppState::new(store, config);
    let mut router = app(state);

    if security.rate_limit_enabled {
        let limiter = Arc::new(WriteLimiter::from_config(&security));
        spawn_idle_client_sweep(Arc::clone(&limiter));
        router = router.layer(axum::middleware::from_fn_with_state(limiter, limit_writes));
        info!(
            "Write limit enabled: {} writes per {}s per client",
            security.rate_limit_requests, security.rate_limit_window_secs
        );
    }

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

fn spawn_idle_client_sweep(limiter: Arc<WriteLimiter>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(limiter.window().max(Duration::from_secs(1)));
        loop {
            interval.tick().await;
            limiter.forget_idle(std::time::Instant::now()).await;
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
