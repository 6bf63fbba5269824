// src/watchlist.rs
//! Watchlist: the keyword phrases to scan for and the feed sources to poll.
//!
//! Loaded from an explicit path (`$WATCHLIST_PATH`), then
//! `config/watchlist.toml`, then `config/watchlist.json`, falling back to the
//! built-in seed. Supports TOML and JSON formats.

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_PATH: &str = "WATCHLIST_PATH";

const TOML_PATH: &str = "config/watchlist.toml";
const JSON_PATH: &str = "config/watchlist.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watchlist {
    /// Trigger phrases, in reporting order.
    pub keywords: Vec<String>,
    /// Feed URLs, polled in order.
    pub sources: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WatchlistFile {
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    sources: Vec<String>,
}

/// Load the watchlist using env var + fallbacks:
/// 1) $WATCHLIST_PATH
/// 2) config/watchlist.toml
/// 3) config/watchlist.json
/// 4) built-in seed
pub fn load_default() -> Result<Watchlist> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_from(&pb);
        } else {
            return Err(anyhow!("{ENV_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from(TOML_PATH);
    if toml_p.exists() {
        return load_from(&toml_p);
    }
    let json_p = PathBuf::from(JSON_PATH);
    if json_p.exists() {
        return load_from(&json_p);
    }
    Ok(default_seed())
}

/// Load the watchlist from an explicit path. Supports TOML or JSON formats.
pub fn load_from(path: &Path) -> Result<Watchlist> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading watchlist from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_watchlist(&content, ext.as_str())
        .with_context(|| format!("parsing watchlist {}", path.display()))
}

fn parse_watchlist(s: &str, hint_ext: &str) -> Result<Watchlist> {
    let parsed: WatchlistFile = if hint_ext == "json" || s.trim_start().starts_with('{') {
        serde_json::from_str(s)?
    } else {
        toml::from_str(s)?
    };

    let watchlist = Watchlist {
        keywords: clean_list(parsed.keywords),
        sources: clean_list(parsed.sources),
    };
    if watchlist.keywords.is_empty() {
        bail!("watchlist has no keywords");
    }
    if watchlist.sources.is_empty() {
        bail!("watchlist has no sources");
    }
    Ok(watchlist)
}

// Trim, drop empties, dedup. Order is preserved (keyword order is the
// reporting order), so dedup keeps the first occurrence.
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && seen.insert(t.to_string()) {
            out.push(t.to_string());
        }
    }
    out
}

/// Built-in seed: Ecuadorian mining / indigenous-rights coverage.
/// Used as fallback if no config file is found.
pub(crate) fn default_seed() -> Watchlist {
    let keywords = [
        "CONAIE",
        "PLUSPETROL",
        "SOLGOLD",
        "DUNDEE PRECIOUS METALS ECUADOR",
        "DUNDEE PRECIOUS METALS",
        "minería Ecuador",
        "pueblos indígenas Ecuador",
        "concesión minera Ecuador",
        "territorio ancestral",
    ];
    let sources = [
        "https://www.elcomercio.com/rss/",
        "https://www.eluniverso.com/rss/",
        "https://www.primicias.ec/rss/",
        "https://news.google.com/rss/search?q=Ecuador+miner%C3%ADa&hl=es&gl=EC&ceid=EC:es",
        "https://news.google.com/rss/search?q=CONAIE&hl=es&gl=EC&ceid=EC:es",
        "https://news.google.com/rss/search?q=PLUSPETROL+Ecuador&hl=es&gl=EC&ceid=EC:es",
        "https://news.google.com/rss/search?q=SOLGOLD&hl=es&gl=EC&ceid=EC:es",
        "https://news.google.com/rss/search?q=%22DUNDEE+PRECIOUS+METALS%22&hl=es&gl=EC&ceid=EC:es",
    ];
    Watchlist {
        keywords: keywords.iter().map(|s| s.to_string()).collect(),
        sources: sources.iter().map(|s| s.to_string()).collect(),
    }
}

// --- source labels ---

// Well-known outlets, checked by substring on the feed URL.
const SOURCE_LABELS: &[(&str, &str)] = &[
    ("elcomercio", "📰 El Comercio"),
    ("eluniverso", "📰 El Universo"),
    ("primicias", "📰 Primicias"),
    ("news.google", "🔍 Google News"),
];

pub const GENERIC_SOURCE_LABEL: &str = "📰 Otra fuente";

/// Human-readable label for a feed URL, with a generic fallback.
pub fn source_label(url: &str) -> &'static str {
    SOURCE_LABELS
        .iter()
        .find(|(needle, _)| url.contains(needle))
        .map(|(_, label)| *label)
        .unwrap_or(GENERIC_SOURCE_LABEL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn toml_and_json_formats_parse() {
        let toml = r#"
keywords = [" CONAIE ", "", "SOLGOLD", "SOLGOLD"]
sources = ["https://example.ec/rss"]
"#;
        let json = r#"{"keywords": ["CONAIE"], "sources": [" https://example.ec/rss ", ""]}"#;

        let from_toml = parse_watchlist(toml, "toml").unwrap();
        assert_eq!(from_toml.keywords, vec!["CONAIE", "SOLGOLD"]);

        let from_json = parse_watchlist(json, "json").unwrap();
        assert_eq!(from_json.sources, vec!["https://example.ec/rss"]);
    }

    #[test]
    fn keyword_order_is_preserved() {
        let toml = r#"
keywords = ["zebra", "alfa", "medio"]
sources = ["https://example.ec/rss"]
"#;
        let wl = parse_watchlist(toml, "toml").unwrap();
        assert_eq!(wl.keywords, vec!["zebra", "alfa", "medio"]);
    }

    #[test]
    fn empty_lists_are_rejected() {
        assert!(parse_watchlist(r#"keywords = []
sources = ["x"]"#, "toml").is_err());
        assert!(parse_watchlist(r#"{"keywords": ["x"], "sources": []}"#, "json").is_err());
    }

    #[test]
    fn seed_is_usable() {
        let wl = default_seed();
        assert!(!wl.keywords.is_empty());
        assert!(!wl.sources.is_empty());
        assert!(wl.keywords.iter().any(|k| k == "CONAIE"));
    }

    #[test]
    fn source_labels_match_known_outlets() {
        assert_eq!(source_label("https://www.elcomercio.com/rss/"), "📰 El Comercio");
        assert_eq!(source_label("https://www.eluniverso.com/rss/"), "📰 El Universo");
        assert_eq!(
            source_label("https://news.google.com/rss/search?q=CONAIE"),
            "🔍 Google News"
        );
        assert_eq!(source_label("https://desconocido.ec/rss"), GENERIC_SOURCE_LABEL);
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        // Isolate CWD in a temp dir so a real config/ in the repo can't interfere.
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();

        env::remove_var(ENV_PATH);

        // No files in temp CWD → built-in seed.
        let wl = load_default().unwrap();
        assert_eq!(wl, default_seed());

        // Env path wins.
        let p_json = tmp.path().join("watchlist.json");
        fs::write(
            &p_json,
            r#"{"keywords": ["X"], "sources": ["https://example.ec/rss"]}"#,
        )
        .unwrap();
        env::set_var(ENV_PATH, p_json.display().to_string());
        let wl2 = load_default().unwrap();
        assert_eq!(wl2.keywords, vec!["X".to_string()]);
        env::remove_var(ENV_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
