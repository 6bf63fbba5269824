// src/notify/mod.rs
pub mod render;
pub mod telegram;

use crate::ingest::types::NewsMatch;
use anyhow::Result;

/// Delivery seam for alerts; the monitor only depends on this.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one formatted match alert.
    async fn send_alert(&self, m: &NewsMatch) -> Result<()>;
    /// Deliver a short service message (startup probe, cycle summary, errors).
    async fn send_text(&self, text: &str) -> Result<()>;
}

// --- Test helper ---

/// Notifier that records everything it is asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    pub alerts: std::sync::Mutex<Vec<NewsMatch>>,
    pub texts: std::sync::Mutex<Vec<String>>,
    pub fail_alerts: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_alerts: true,
            ..Self::default()
        }
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send_alert(&self, m: &NewsMatch) -> Result<()> {
        if self.fail_alerts {
            anyhow::bail!("synthetic delivery failure");
        }
        self.alerts.lock().unwrap().push(m.clone());
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<()> {
        self.texts.lock().unwrap().push(text.to_string());
        Ok(())
    }
}
