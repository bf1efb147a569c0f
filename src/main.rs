use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use kopipe_scan::fetch::{FetchSettings, ReqwestFetcher};
use kopipe_scan::hub::BroadcastHub;
use kopipe_scan::scanner::{self, ScanSettings, Scanner};
use kopipe_scan::server;

/// kopipe-scan — probes kopipe.net short codes and serves live results to a browser.
#[derive(Debug, Clone, Parser)]
#[command(name = "kopipe-scan", version, long_about = None)]
struct Cli {
    /// Address the HTTP server listens on.
    #[arg(long, default_value = "0.0.0.0:3000")]
    bind: String,

    /// Upload URL prefix each code is appended to.
    #[arg(long = "base-url", default_value = scanner::DEFAULT_BASE_URL)]
    base_url: String,

    /// Seconds between scan triggers.
    #[arg(long = "interval-secs", default_value_t = scanner::DEFAULT_INTERVAL.as_secs())]
    interval_secs: u64,

    /// Delay after each probed code, in milliseconds.
    #[arg(long = "pace-ms", default_value_t = scanner::DEFAULT_PACE.as_millis() as u64)]
    pace_ms: u64,

    /// Directory served for every path outside `/api`. Not shipped with the crate.
    #[arg(long = "static-dir", default_value = "public")]
    static_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    info!(
        "base_url={} interval={}s pace={}ms static_dir={}",
        cli.base_url,
        cli.interval_secs,
        cli.pace_ms,
        cli.static_dir.display()
    );

    let fetcher = ReqwestFetcher::new(FetchSettings::default()).context("failed to build HTTP client")?;
    let scanner = Scanner::new(
        Arc::new(fetcher),
        BroadcastHub::new(),
        ScanSettings {
            base_url: cli.base_url.clone(),
            pace: Duration::from_millis(cli.pace_ms),
        },
    );

    let app = server::router(scanner.clone(), &cli.static_dir);
    let bind = cli.bind.clone();
    let server_task = tokio::spawn(async move { server::serve(&bind, app).await });

    let cancel = CancellationToken::new();
    let scheduler = scanner::spawn_scheduler(
        scanner,
        Duration::from_secs(cli.interval_secs),
        cancel.clone(),
    );

    tokio::select! {
        res = server_task => {
            cancel.cancel();
            res.context("server task panicked")??;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C received, shutting down");
            cancel.cancel();
        }
    }

    if let Err(e) = scheduler.await {
        warn!("scheduler task ended abnormally: {e}");
    }
    Ok(())
}
