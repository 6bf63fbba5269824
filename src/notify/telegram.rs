// src/notify/telegram.rs
//! Telegram Bot API delivery: `sendMessage` with Markdown, falling back to a
//! plain-text retry when the formatted send is rejected.

use anyhow::{anyhow, Result};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::{render, Notifier};
use crate::ingest::types::NewsMatch;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("alerts_sent_total", "Alerts delivered to Telegram.");
        describe_counter!(
            "alerts_fallback_total",
            "Alerts that needed the plain-text retry."
        );
        describe_counter!(
            "alerts_failed_total",
            "Alerts dropped after both send attempts failed."
        );
    });
}

#[derive(Clone)]
pub struct TelegramNotifier {
    token: String,
    chat_id: String,
    api_base: String,
    client: Client,
    timeout: Duration,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
    disable_web_page_preview: bool,
}

impl TelegramNotifier {
    pub fn new(token: String, chat_id: String) -> Self {
        Self {
            token,
            chat_id,
            api_base: DEFAULT_API_BASE.to_string(),
            client: Client::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Point the notifier at a different API host (tests/tools).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }

    async fn post(&self, text: &str, markdown: bool) -> Result<()> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: markdown.then_some("Markdown"),
            disable_web_page_preview: true,
        };

        // reqwest errors carry the URL, and ours embeds the bot token; strip
        // it before the error can reach a log line.
        let rsp = self
            .client
            .post(self.endpoint())
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| anyhow!("telegram send failed: {}", e.without_url()))?;
        rsp.error_for_status()
            .map_err(|e| anyhow!("telegram rejected message: {}", e.without_url()))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn send_alert(&self, m: &NewsMatch) -> Result<()> {
        ensure_metrics_described();

        match self.post(&render::render_markdown(m), true).await {
            Ok(()) => {
                counter!("alerts_sent_total").increment(1);
                Ok(())
            }
            Err(first) => {
                tracing::warn!(error = ?first, title = %m.title, "markdown send failed, retrying plain");
                counter!("alerts_fallback_total").increment(1);
                match self.post(&render::render_plain(m), false).await {
                    Ok(()) => {
                        counter!("alerts_sent_total").increment(1);
                        Ok(())
                    }
                    Err(second) => {
                        counter!("alerts_failed_total").increment(1);
                        Err(anyhow!(
                            "alert delivery failed (markdown: {first:#}; plain: {second:#})"
                        ))
                    }
                }
            }
        }
    }

    async fn send_text(&self, text: &str) -> Result<()> {
        self.post(text, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_shape_matches_bot_api() {
        let payload = SendMessage {
            chat_id: "42",
            text: "hola",
            parse_mode: Some("Markdown"),
            disable_web_page_preview: true,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["chat_id"], "42");
        assert_eq!(json["parse_mode"], "Markdown");
        assert_eq!(json["disable_web_page_preview"], true);
    }

    #[test]
    fn plain_payload_omits_parse_mode() {
        let payload = SendMessage {
            chat_id: "42",
            text: "hola",
            parse_mode: None,
            disable_web_page_preview: true,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("parse_mode").is_none());
    }

    #[test]
    fn endpoint_embeds_token_and_base() {
        let n = TelegramNotifier::new("123:abc".into(), "42".into())
            .with_api_base("http://localhost:8081");
        assert_eq!(n.endpoint(), "http://localhost:8081/bot123:abc/sendMessage");
    }
}
