use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use axum::routing::get;
use axum::Router;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{broadcast, mpsc};
use tracing::{info, Level};

mod config;
mod engine;
mod ingress;
mod ledger;
mod store;
mod templates;
mod ws;

use config::{load_tables, ServiceConfig};
use engine::Engine;
use ingress::Mailbox;
use store::SessionStore;
use ws::{healthz, ws_handler, AppState, OutboundEvent};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Service configuration (YAML). Missing file means defaults.
    #[arg(long, default_value = "config.yml")]
    config: PathBuf,

    /// Persisted table settings (YAML), rewritten on admin changes.
    #[arg(long, default_value = "tables.yml")]
    tables: PathBuf,

    /// Override the configured listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Seed for the wheel (random when omitted).
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = ServiceConfig::load(&args.config)?;
    if let Some(port) = args.port {
        config.port = port;
    }

    let log_level = Level::from_str(&config.log_level).context("Invalid log level")?;
    tracing_subscriber::fmt().with_max_level(log_level).init();

    let tables = load_tables(&args.tables)?;
    let sessions = SessionStore::open(&config.session_db, config.store_buffer)
        .context("open session store")?;
    info!(path = %config.session_db.display(), "session store ready");

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let (events, _) = broadcast::channel::<OutboundEvent>(config.event_buffer.max(1));
    let engine = Engine::new(
        &config,
        tables,
        args.tables.clone(),
        sessions,
        events.clone(),
        rng,
    )?;

    let (sender, receiver) = mpsc::channel(config.mailbox_size.max(1));
    let mailbox = Mailbox::new(sender);
    let engine = tokio::spawn(engine.run(receiver, Duration::from_millis(config.tick_ms.max(1))));

    let state = AppState {
        mailbox: mailbox.clone(),
        events,
    };
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/healthz", get(healthz))
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid listen addr")?;
    info!(%addr, tick_ms = config.tick_ms, "live table service listening");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(?err, "failed to listen for shutdown signal");
            }
            info!("shutting down tables");
            mailbox.shutdown().await;
        })
        .await?;
    engine.await.context("engine task failed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["croupier-live-table"]);
        assert_eq!(args.config, PathBuf::from("config.yml"));
        assert_eq!(args.tables, PathBuf::from("tables.yml"));
        assert!(args.port.is_none());

        let args = Args::parse_from(["croupier-live-table", "-p", "7000", "--seed", "3"]);
        assert_eq!(args.port, Some(7000));
        assert_eq!(args.seed, Some(3));
    }
}
