//! alertcast: polls the NWS active-alerts feed and delivers geo-targeted
//! push notifications through a web dashboard.
//!
//! Configuration via .env file or environment variables:
//!   DASHBOARD_BASE       - Dashboard origin (required)
//!   DASHBOARD_LOGIN      - Dashboard account email
//!   DASHBOARD_PASSWORD   - Dashboard account password
//!   SEEN_ALERTS_DB       - Ledger URL (default: sqlite:alerts_seen.db?mode=rwc)
//!   POLL_INTERVAL        - Seconds between polls (default: 60)
//!   MAX_POINTS           - Zone payload point ceiling (default: 300)

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dashboard_push::DashboardClient;
use ledger::Ledger;
use nws_feed::{NwsClient, NwsConfig};

mod config;
mod logs;
mod notify;
mod service;

use config::Config;
use service::PollService;

#[derive(Debug, Parser)]
#[command(name = "alertcast")]
#[command(about = "Poll NWS active alerts and deliver geo-targeted dashboard pushes")]
struct Args {
    /// Run a single poll iteration and exit
    #[arg(long)]
    once: bool,

    /// Override the ledger database URL
    #[arg(long)]
    db: Option<String>,

    /// Override the poll interval in seconds
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Override the log directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let mut config = Config::from_env()?;
    if let Some(db) = args.db {
        config.ledger_db = db;
    }
    if let Some(secs) = args.interval_secs {
        config.poll_interval = Duration::from_secs(secs);
    }
    if let Some(dir) = args.log_dir {
        config.log_dir = dir;
    }

    let _log_guard = init_logging(&config.log_dir);

    let ledger = Ledger::connect(&config.ledger_db).await?;
    ledger.init().await?;

    let nws = NwsClient::new(NwsConfig::new(
        config.feed_url.clone(),
        config.user_agent.clone(),
    ))?;

    let push = DashboardClient::new(config.dashboard.clone())?;
    push.load_cookies();

    info!(
        ledger = %config.ledger_db,
        dashboard = %config.dashboard.base_url,
        "alertcast starting"
    );

    let mut service = PollService::new(config, nws, ledger, push);
    if args.once {
        service.poll_once().await;
    } else {
        service.run().await;
    }

    Ok(())
}

/// Console logging plus a daily-rolling file in the log directory.
///
/// The returned guard must stay alive for the file writer to flush.
fn init_logging(log_dir: &Path) -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(log_dir, "alertcast.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    guard
}
