// src/ingest/mod.rs
pub mod providers;
pub mod types;

use crate::ingest::types::{CycleStats, NewsMatch, SourceProvider, NO_DATE};
use crate::seen::SeenSet;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_entries_total", "Entries parsed from feed documents.");
        describe_counter!("scan_source_errors_total", "Feed fetch/parse errors.");
        describe_counter!(
            "scan_matches_total",
            "New keyword matches emitted by the scan cycle."
        );
        describe_counter!(
            "scan_duplicates_total",
            "Matches suppressed by the seen set."
        );
        describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!("scan_last_run_ts", "Unix ts when the scan cycle last ran.");
    });
}

/// Fold text for matching: lowercase plus unaccented vowels
/// (á→a, é→e, í→i, ó→o, ú→u). Idempotent.
pub fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        for lc in ch.to_lowercase() {
            out.push(match lc {
                'á' => 'a',
                'é' => 'e',
                'í' => 'i',
                'ó' => 'o',
                'ú' => 'u',
                other => other,
            });
        }
    }
    out
}

/// Keywords whose normalized form is a substring of the normalized text,
/// in watchlist order. Both sides are folded through [`normalize`].
pub fn match_keywords(text: &str, keywords: &[String]) -> Vec<String> {
    let haystack = normalize(text);
    keywords
        .iter()
        .filter(|k| {
            let needle = normalize(k);
            !needle.is_empty() && haystack.contains(needle.as_str())
        })
        .cloned()
        .collect()
}

/// Dedup identifier for an article: hex SHA-256 over title + link.
/// Deterministic, not a security primitive.
pub fn content_id(title: &str, link: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(link.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for b in digest.iter() {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Run one match-and-dedup pass over all providers.
///
/// Sources are polled strictly in order; a failing source is logged, counted
/// and skipped. Per feed, only the first `max_entries_per_feed` entries are
/// examined. Ids of emitted matches go into `seen` immediately, so the same
/// article surfacing from two feeds within one cycle is reported once.
pub async fn scan_feeds(
    providers: &[Box<dyn SourceProvider>],
    keywords: &[String],
    seen: &mut SeenSet,
    max_entries_per_feed: usize,
) -> (Vec<NewsMatch>, CycleStats) {
    ensure_metrics_described();

    let mut matches = Vec::new();
    let mut stats = CycleStats::default();

    for provider in providers {
        let entries = match provider.fetch_latest().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = ?e, source = provider.url(), "source failed, skipping");
                counter!("scan_source_errors_total").increment(1);
                stats.sources_failed += 1;
                continue;
            }
        };
        stats.sources_ok += 1;
        if entries.is_empty() {
            tracing::debug!(source = provider.url(), "source returned no entries");
            continue;
        }

        for entry in entries.iter().take(max_entries_per_feed) {
            stats.entries_scanned += 1;

            let text = format!("{} {}", entry.title, entry.summary);
            let found = match_keywords(&text, keywords);
            if found.is_empty() {
                continue;
            }

            // No link means no identifier and no alert target.
            let Some(link) = entry.link.as_deref().filter(|l| !l.is_empty()) else {
                tracing::debug!(
                    source = provider.label(),
                    title = %entry.title,
                    "matching entry without link skipped"
                );
                stats.entries_skipped += 1;
                continue;
            };

            let id = content_id(&entry.title, link);
            if !seen.insert(id.clone()) {
                stats.duplicates += 1;
                continue;
            }

            tracing::info!(
                source = provider.label(),
                title = %entry.title,
                keywords = ?found,
                "new match"
            );
            matches.push(NewsMatch {
                title: entry.title.clone(),
                url: link.to_string(),
                keywords: found,
                published: entry.published.clone().unwrap_or_else(|| NO_DATE.to_string()),
                source: provider.label().to_string(),
                id,
            });
        }
    }

    counter!("scan_matches_total").increment(matches.len() as u64);
    counter!("scan_duplicates_total").increment(stats.duplicates as u64);
    gauge!("scan_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);

    (matches, stats)
}
