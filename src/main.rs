//! Ecuador News Monitor — Binary Entrypoint
//! Polls the configured feeds on a fixed schedule and alerts one Telegram
//! chat about entries matching the watchlist.

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ecuador_news_monitor::ingest::providers::FeedProvider;
use ecuador_news_monitor::ingest::types::SourceProvider;
use ecuador_news_monitor::{scheduler, watchlist, Monitor, MonitorConfig, SeenSet, TelegramNotifier};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ecuador_news_monitor=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = MonitorConfig::from_env()?;

    if let Some(addr) = cfg.metrics_addr {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("installing prometheus exporter")?;
        info!(%addr, "metrics exporter listening");
    }

    let watchlist = watchlist::load_default()?;
    info!(
        keywords = watchlist.keywords.len(),
        sources = watchlist.sources.len(),
        "watchlist loaded"
    );

    let client = reqwest::Client::builder()
        .timeout(cfg.http_timeout)
        .build()
        .context("building http client")?;
    let providers: Vec<Box<dyn SourceProvider>> = watchlist
        .sources
        .iter()
        .map(|url| Box::new(FeedProvider::from_url(url.clone(), client.clone())) as Box<dyn SourceProvider>)
        .collect();

    let notifier =
        TelegramNotifier::new(cfg.bot_token.clone(), cfg.chat_id.clone()).with_timeout(cfg.http_timeout);

    let seen = SeenSet::load(&cfg.seen_path);
    info!(known = seen.len(), path = %cfg.seen_path.display(), "seen set loaded");

    let mut monitor = Monitor::new(watchlist.keywords.clone(), providers, notifier, seen)
        .with_seen_path(cfg.seen_path.clone())
        .with_send_delay(cfg.send_delay)
        .with_max_entries_per_feed(cfg.max_entries_per_feed);

    // The self-test doubles as a credentials check; refuse to schedule
    // without a working bot.
    monitor
        .startup_probe()
        .await
        .context("telegram startup probe failed")?;
    info!("connected to telegram");

    tokio::select! {
        _ = scheduler::run(&mut monitor, cfg.poll_interval, cfg.tick_interval) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
        }
    }
    Ok(())
}
