// src/monitor.rs
//! Cycle orchestration: scan the feeds, alert on new matches, persist the
//! seen set. All monitor state lives on this struct and is threaded through
//! explicitly — there is no module-level state.

use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::ingest;
use crate::ingest::types::{CycleStats, SourceProvider};
use crate::notify::{render, Notifier};
use crate::seen::SeenSet;

/// Cycles with more matches than this also get a summary message.
const SUMMARY_THRESHOLD: usize = 3;

const DEFAULT_MAX_ENTRIES_PER_FEED: usize = 10;

pub struct Monitor<N> {
    keywords: Vec<String>,
    providers: Vec<Box<dyn SourceProvider>>,
    notifier: N,
    seen: SeenSet,
    /// `None` keeps the seen set in memory only (tests).
    seen_path: Option<PathBuf>,
    send_delay: Duration,
    max_entries_per_feed: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CycleSummary {
    pub new_matches: usize,
    pub sent: usize,
    pub stats: CycleStats,
}

impl<N: Notifier> Monitor<N> {
    pub fn new(
        keywords: Vec<String>,
        providers: Vec<Box<dyn SourceProvider>>,
        notifier: N,
        seen: SeenSet,
    ) -> Self {
        Self {
            keywords,
            providers,
            notifier,
            seen,
            seen_path: None,
            send_delay: Duration::ZERO,
            max_entries_per_feed: DEFAULT_MAX_ENTRIES_PER_FEED,
        }
    }

    pub fn with_seen_path(mut self, path: PathBuf) -> Self {
        self.seen_path = Some(path);
        self
    }

    pub fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = delay;
        self
    }

    pub fn with_max_entries_per_feed(mut self, max: usize) -> Self {
        self.max_entries_per_feed = max;
        self
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    /// Self-test message; doubles as a credentials check at startup.
    pub async fn startup_probe(&self) -> Result<()> {
        self.notifier.send_text(render::STARTUP_MESSAGE).await
    }

    /// One full cycle: scan every source, alert each new match with the
    /// configured pause in between, then persist the seen set. A failed
    /// delivery is logged and does NOT unmark the article — better to drop
    /// one alert than to repeat it every cycle forever.
    pub async fn run_cycle(&mut self) -> Result<CycleSummary> {
        let started = chrono::Utc::now();
        info!(at = %started.format("%Y-%m-%d %H:%M:%S"), "starting search cycle");

        let (matches, stats) = ingest::scan_feeds(
            &self.providers,
            &self.keywords,
            &mut self.seen,
            self.max_entries_per_feed,
        )
        .await;

        info!(
            new = matches.len(),
            sources_ok = stats.sources_ok,
            sources_failed = stats.sources_failed,
            duplicates = stats.duplicates,
            skipped = stats.entries_skipped,
            "search completed"
        );

        let mut sent = 0usize;
        if !matches.is_empty() {
            for (i, m) in matches.iter().enumerate() {
                if i > 0 && !self.send_delay.is_zero() {
                    tokio::time::sleep(self.send_delay).await;
                }
                match self.notifier.send_alert(m).await {
                    Ok(()) => sent += 1,
                    Err(e) => warn!(error = ?e, title = %m.title, "alert delivery failed"),
                }
            }

            if let Some(path) = &self.seen_path {
                if let Err(e) = self.seen.save(path) {
                    warn!(error = ?e, "failed to persist seen set");
                }
            }

            info!(sent, total = matches.len(), "alerts dispatched");

            if matches.len() > SUMMARY_THRESHOLD {
                // best-effort; a lost summary is not worth a retry
                if let Err(e) = self
                    .notifier
                    .send_text(&render::summary_message(matches.len()))
                    .await
                {
                    warn!(error = ?e, "summary message failed");
                }
            }
        } else {
            info!("no new matches this cycle");
        }

        Ok(CycleSummary {
            new_matches: matches.len(),
            sent,
            stats,
        })
    }
}
