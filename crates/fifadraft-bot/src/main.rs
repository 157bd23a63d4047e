// Draft bot entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file)
// 2. Load config, copying defaults on first run
// 3. Load the player pool
// 4. Create the hub channels
// 5. Spawn the WebSocket hub
// 6. Run the command loop until the hub closes or Ctrl+C

use fifadraft_bot::app;
use fifadraft_bot::hub;
use fifadraft_bot::hub_chat::HubChat;
use fifadraft_core::config;
use fifadraft_core::pool::PlayerPool;

use anyhow::Context;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("fifadraft starting up");

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "config loaded: {} position rounds, {} free picks, save file {}",
        config.rounds.positions.len(),
        config.rounds.free_picks,
        config.save_file
    );

    let pool = PlayerPool::load(&config.pool).context("failed to load player pool")?;
    if pool.is_empty() {
        error!(
            "no players rated {}-{} in {}",
            config.pool.min_ovr, config.pool.max_ovr, config.pool.csv_path
        );
    }

    let (inbound_tx, inbound_rx) = mpsc::channel(256);
    let (outbound_tx, _) = broadcast::channel(hub::OUTBOUND_CAPACITY);

    let port = config.server_port;
    let hub_outbound = outbound_tx.clone();
    let hub_handle = tokio::spawn(async move {
        if let Err(e) = hub::run(port, inbound_tx, hub_outbound).await {
            error!("chat hub error on port {}: {}", port, e);
        }
    });

    let chat = HubChat::new(
        inbound_rx,
        outbound_tx,
        config.timeouts.clone(),
        config.command_prefix.clone(),
    );
    let state = app::AppState::new(config, pool);
    info!("ready, chat hub on 127.0.0.1:{port}");

    tokio::select! {
        result = app::run(chat, state) => {
            if let Err(e) = result {
                error!("command loop error: {e:#}");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C received");
        }
    }

    hub_handle.abort();
    info!("fifadraft shut down cleanly");
    Ok(())
}

/// Log to `logs/fifadraft.log` under the working directory.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("fifadraft.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fifadraft_core=info,fifadraft_bot=info,fifadraft=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
