// src/ingest/providers/feed.rs
//! HTTP provider for one configured feed URL. Understands RSS 2.0 and Atom.

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::ingest::types::{FeedEntry, SourceProvider};
use crate::watchlist::source_label;

// --- RSS 2.0 ---

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

// --- Atom ---

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}
#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<String>,
    summary: Option<String>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
}
#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

pub struct FeedProvider {
    url: String,
    label: &'static str,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { client: reqwest::Client },
}

impl FeedProvider {
    /// Live provider; the client (with its timeout) is shared across feeds.
    pub fn from_url(url: impl Into<String>, client: reqwest::Client) -> Self {
        let url = url.into();
        let label = source_label(&url);
        Self {
            url,
            label,
            mode: Mode::Http { client },
        }
    }

    /// Provider over an in-memory document, for tests and offline runs.
    pub fn from_fixture(url: &str, body: &str) -> Self {
        Self {
            url: url.to_string(),
            label: source_label(url),
            mode: Mode::Fixture(body.to_string()),
        }
    }

    fn parse_feed_str(s: &str) -> Result<Vec<FeedEntry>> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(s);

        // Dispatch strictly on the root element; anything that is neither an
        // <rss> nor an Atom <feed> document is a parse error, not an empty feed.
        let entries = match root_element(&xml_clean).as_deref() {
            Some(name) if name == "feed" || name.ends_with(":feed") => parse_atom(&xml_clean),
            Some(name) if name == "rss" || name.ends_with(":rss") => parse_rss(&xml_clean),
            Some(other) => Err(anyhow::anyhow!("unrecognized feed root element <{other}>")),
            None => Err(anyhow::anyhow!("not an xml document")),
        }
        .context("parsing feed xml")?;

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("feed_parse_ms").record(ms);
        counter!("feed_entries_total").increment(entries.len() as u64);
        Ok(entries)
    }
}

#[async_trait]
impl SourceProvider for FeedProvider {
    async fn fetch_latest(&self) -> Result<Vec<FeedEntry>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_feed_str(s),
            Mode::Http { client } => {
                let body = client
                    .get(&self.url)
                    .send()
                    .await
                    .with_context(|| format!("fetching {}", self.url))?
                    .error_for_status()
                    .with_context(|| format!("fetching {}", self.url))?
                    .text()
                    .await
                    .with_context(|| format!("reading body of {}", self.url))?;
                Self::parse_feed_str(&body)
            }
        }
    }

    fn label(&self) -> &str {
        self.label
    }

    fn url(&self) -> &str {
        &self.url
    }
}

fn parse_rss(xml: &str) -> Result<Vec<FeedEntry>> {
    let rss: Rss = from_str(xml).context("rss deserialize")?;
    Ok(rss
        .channel
        .items
        .into_iter()
        .map(|it| FeedEntry {
            title: clean_fragment(it.title.as_deref().unwrap_or_default()),
            summary: clean_fragment(it.description.as_deref().unwrap_or_default()),
            link: some_nonempty(it.link),
            published: some_nonempty(it.pub_date),
        })
        .collect())
}

fn parse_atom(xml: &str) -> Result<Vec<FeedEntry>> {
    let feed: AtomFeed = from_str(xml).context("atom deserialize")?;
    Ok(feed
        .entries
        .into_iter()
        .map(|e| {
            // Prefer the alternate link; Atom entries may carry several.
            let link = e
                .links
                .iter()
                .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
                .or_else(|| e.links.first())
                .and_then(|l| l.href.clone());
            FeedEntry {
                title: clean_fragment(e.title.as_deref().unwrap_or_default()),
                summary: clean_fragment(e.summary.as_deref().unwrap_or_default()),
                link: some_nonempty(link),
                published: some_nonempty(e.published.or(e.updated)),
            }
        })
        .collect())
}

fn some_nonempty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Normalize an extracted text fragment: decode HTML entities, strip tags,
/// straighten typographic quotes, collapse whitespace.
fn clean_fragment(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out.trim().to_string()
}

// Named entities common in news feeds that strict XML parsers reject.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

/// Name of the document's root element, skipping declarations, doctypes
/// and comments.
fn root_element(xml: &str) -> Option<String> {
    let mut rest = xml;
    while let Some(idx) = rest.find('<') {
        let tail = &rest[idx + 1..];
        if tail.starts_with('?') || tail.starts_with('!') {
            rest = &tail[tail.find('>')? + 1..];
            continue;
        }
        let name: String = tail
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == ':')
            .collect();
        return (!name.is_empty()).then_some(name);
    }
    None
}
