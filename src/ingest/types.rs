// src/ingest/types.rs
use anyhow::Result;

/// Rendered date line for entries whose feed carried no date.
pub const NO_DATE: &str = "Sin fecha";

/// One entry read from a feed fetch. Feeds routinely omit fields; missing
/// title/summary collapse to the empty string, a missing link makes the
/// entry unusable (no identifier, no alert target).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub summary: String,
    pub link: Option<String>,
    pub published: Option<String>,
}

/// An entry that matched at least one watchlist keyword.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct NewsMatch {
    pub title: String,
    pub url: String,
    /// Matched keywords, in watchlist order.
    pub keywords: Vec<String>,
    /// Raw feed date, or [`NO_DATE`].
    pub published: String,
    /// Human label of the source feed.
    pub source: String,
    /// Dedup identifier, see [`crate::ingest::content_id`].
    pub id: String,
}

/// Per-cycle counters. Failures are tallied here instead of aborting the
/// cycle; the caller decides what to log or report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub sources_ok: usize,
    pub sources_failed: usize,
    /// Entries examined (after the per-feed cap).
    pub entries_scanned: usize,
    /// Matching entries dropped for lacking a link.
    pub entries_skipped: usize,
    /// Matching entries suppressed by the seen set.
    pub duplicates: usize,
}

/// A feed to poll: fetches entries, or fails as a unit (one bad source never
/// aborts the cycle).
#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<FeedEntry>>;
    /// Human-readable label used in alerts.
    fn label(&self) -> &str;
    /// The polled URL, for logs.
    fn url(&self) -> &str;
}

// --- Test helper ---

/// Provider over a fixed entry list, optionally failing, for cycle tests.
pub struct StaticProvider {
    pub label: String,
    pub url: String,
    pub entries: Vec<FeedEntry>,
    pub fail: bool,
}

impl StaticProvider {
    pub fn new(label: &str, entries: Vec<FeedEntry>) -> Self {
        Self {
            label: label.to_string(),
            url: format!("https://{}.test/rss", label.to_ascii_lowercase()),
            entries,
            fail: false,
        }
    }

    pub fn failing(label: &str) -> Self {
        Self {
            label: label.to_string(),
            url: format!("https://{}.test/rss", label.to_ascii_lowercase()),
            entries: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait::async_trait]
impl SourceProvider for StaticProvider {
    async fn fetch_latest(&self) -> Result<Vec<FeedEntry>> {
        if self.fail {
            anyhow::bail!("synthetic fetch failure for {}", self.url);
        }
        Ok(self.entries.clone())
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn url(&self) -> &str {
        &self.url
    }
}
