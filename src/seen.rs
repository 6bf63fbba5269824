// src/seen.rs
//! Persisted set of already-reported article identifiers.
//!
//! On disk this is a flat JSON array of id strings, rewritten wholesale after
//! each cycle that produced matches. The set only grows; an id in here
//! suppresses that article forever.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct SeenSet {
    ids: HashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path`. A missing or unreadable file is a normal first run;
    /// a corrupt file is dropped with a warning. Neither is fatal.
    pub fn load(path: &Path) -> Self {
        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(_) => {
                debug!(path = %path.display(), "no seen file, starting empty");
                return Self::default();
            }
        };
        match serde_json::from_slice::<Vec<String>>(&bytes) {
            Ok(list) => Self {
                ids: list.into_iter().collect(),
            },
            Err(err) => {
                warn!(path = %path.display(), %err, "seen file is corrupt, starting empty");
                Self::default()
            }
        }
    }

    /// Record an id. Returns `true` when it was not present before —
    /// i.e. the article is new and should be reported.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Rewrite the whole set to `path`. Ids are sorted so the file is stable
    /// across runs with the same contents.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut ids: Vec<&str> = self.ids.iter().map(String::as_str).collect();
        ids.sort_unstable();
        let bytes = serde_json::to_vec_pretty(&ids).context("serializing seen set")?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_reports_novelty_once() {
        let mut seen = SeenSet::new();
        assert!(seen.insert("a"));
        assert!(!seen.insert("a"));
        assert!(seen.contains("a"));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn missing_file_loads_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let seen = SeenSet::load(&tmp.path().join("nope.json"));
        assert!(seen.is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("seen.json");
        std::fs::write(&path, b"{ not json ]").unwrap();
        let seen = SeenSet::load(&path);
        assert!(seen.is_empty());
    }

    #[test]
    fn save_then_load_preserves_ids() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("state/seen.json");

        let mut seen = SeenSet::new();
        seen.insert("beta");
        seen.insert("alfa");
        seen.save(&path).unwrap();

        let reloaded = SeenSet::load(&path);
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains("alfa") && reloaded.contains("beta"));

        // On-disk form is a sorted flat array.
        let raw = std::fs::read_to_string(&path).unwrap();
        let list: Vec<String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(list, vec!["alfa", "beta"]);
    }
}
