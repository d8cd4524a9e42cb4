//! Bulls and Cows - Unified CLI
//!
//! Runs the match server or scores codes offline.

#![warn(missing_docs)]

mod cli;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use bulls_cows::{
    Alphabet, CodeRules, InMemoryMatchStore, MatchService, ServerConfig, evaluate, router,
    with_http_policy,
};
use clap::Parser;
use cli::{Cli, Command};
use tokio::sync::oneshot;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { config, addr } => run_server(config, addr).await,
        Command::Score {
            guess,
            target,
            alphabet,
        } => run_score(&guess, &target, alphabet),
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,bulls_cows=debug")),
        )
        .init();
}

/// Run the HTTP match server until Ctrl-C
#[instrument(skip_all)]
async fn run_server(config_path: Option<PathBuf>, addr: Option<SocketAddr>) -> Result<()> {
    init_tracing();

    let mut config = ServerConfig::load(config_path.as_deref())?;
    if let Some(addr) = addr {
        config = config.with_addr(addr);
    }
    debug!(?config, "Server configuration");

    let store = InMemoryMatchStore::new(config.room_ttl());
    let service = Arc::new(MatchService::new(store.clone(), config.code_rules()));
    let app = with_http_policy(router(service), &config);

    let purge = tokio::spawn(purge_loop(store, config.purge_interval()));

    let listener = tokio::net::TcpListener::bind(config.addr()).await?;
    info!(addr = %listener.local_addr()?, "Server ready");

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                stop_rx.await.ok();
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            purge.abort();
            result??;
            return Ok(());
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutdown requested");
        }
    }

    stop_tx.send(()).ok();
    purge.abort();

    match tokio::time::timeout(config.graceful_timeout(), server).await {
        Ok(result) => {
            result??;
            info!("Server stopped");
        }
        Err(_) => warn!(
            timeout_secs = config.graceful_timeout().as_secs(),
            "In-flight requests did not finish in time"
        ),
    }
    Ok(())
}

/// Periodically drops expired rooms
async fn purge_loop(store: InMemoryMatchStore, every: std::time::Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        match store.purge_expired() {
            Ok(purged) => debug!(purged, "Expiry sweep finished"),
            Err(e) => error!(error = %e, "Expiry sweep failed"),
        }
    }
}

/// Score a guess against a target and print the classification
fn run_score(guess: &str, target: &str, alphabet: Alphabet) -> Result<()> {
    let rules = CodeRules::new(alphabet);
    let guess = rules.validate(guess)?;
    let target = rules.validate(target)?;

    let result = evaluate(&guess, &target);
    for mark in result.marks() {
        println!("{}  {}", mark.value, mark.kind);
    }
    println!(
        "bulls: {}  cows: {}  winning: {}",
        result.bulls(),
        result.cows(),
        result.is_winning()
    );
    Ok(())
}
