use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use wishbox_book::WishManager;
use wishbox_core::config::WishboxConfig;
use wishbox_core::{Clock, SystemClock};
use wishbox_gateway::seed::{seed_demo, SeedOutcome};
use wishbox_gateway::{app, delivery, startup};
use wishbox_scheduler::DueWishSweeper;

#[derive(Parser)]
#[command(name = "wishbox-gateway", version, about = "Birthday wishes, time capsules and group cards")]
struct Cli {
    /// Config file (default: $WISHBOX_CONFIG, then ~/.wishbox/wishbox.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API and the background sweeper (default)
    Serve,
    /// Run one due-wish sweep now and exit
    Sweep,
    /// Create the demo account and sample data if absent
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wishbox_gateway=info,wishbox_scheduler=info,tower_http=debug".into()),
        )
        .init();

    let cli = Cli::parse();

    // load config: --config > WISHBOX_CONFIG env > ~/.wishbox/wishbox.toml
    let config_path = cli.config.or_else(|| std::env::var("WISHBOX_CONFIG").ok());
    let config = WishboxConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        WishboxConfig::default()
    });

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Sweep => sweep_once(config),
        Command::Seed => seed(config),
    }
}

async fn serve(config: WishboxConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let conn = startup::open_database(&config)?;
    let state = startup::build_state(config, clock, conn);

    // Sweeper → delivery stub
    let (delivery_tx, delivery_rx) = delivery::channel();
    let delivery_task = delivery::spawn(delivery_rx);

    if state.config.scheduler.enabled {
        let sweep_conn = wishbox_book::db::open(&state.config.database.path)?;
        startup::start_sweeper(&state, sweep_conn, delivery_tx)?;
    } else {
        info!("scheduler disabled; scheduled wishes will not be marked sent");
        drop(delivery_tx);
    }

    let router = app::build_router(state.clone());
    info!("Wishbox gateway listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // stop the sweeper, then let the delivery task drain
    state.scheduler.shutdown().await;
    drop(state);
    let _ = delivery_task.await;
    Ok(())
}

fn sweep_once(config: WishboxConfig) -> anyhow::Result<()> {
    let conn = startup::open_database(&config)?;
    let store = WishManager::new(
        Arc::new(std::sync::Mutex::new(conn)),
        config.calendar.leap_day,
    );
    let report = DueWishSweeper::new(store, None).sweep(SystemClock.now())?;
    println!("{} wish(es) marked sent ({} due)", report.marked_count(), report.due);
    Ok(())
}

fn seed(config: WishboxConfig) -> anyhow::Result<()> {
    let conn = startup::open_database(&config)?;
    let state = startup::build_state(config, Arc::new(SystemClock), conn);
    match seed_demo(&state)? {
        SeedOutcome::Created(user) => println!("Seed complete. Demo user id: {}", user.id),
        SeedOutcome::AlreadySeeded(user) => println!("Demo data already exists (user id {}).", user.id),
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
