// src/config.rs
//! Runtime configuration sourced from the process environment.
//!
//! The bot token and chat id have NO fallback values: a deployment must set
//! them explicitly, and startup fails before any scheduling if they are
//! missing. Everything else is a tuning knob with a default.

use anyhow::{bail, Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

// --- env names ---
pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
pub const ENV_POLL_INTERVAL_SECS: &str = "MONITOR_POLL_INTERVAL_SECS";
pub const ENV_TICK_SECS: &str = "MONITOR_TICK_SECS";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "MONITOR_HTTP_TIMEOUT_SECS";
pub const ENV_SEND_DELAY_SECS: &str = "MONITOR_SEND_DELAY_SECS";
pub const ENV_MAX_ENTRIES_PER_FEED: &str = "MONITOR_MAX_ENTRIES_PER_FEED";
pub const ENV_SEEN_PATH: &str = "MONITOR_SEEN_PATH";
pub const ENV_METRICS_ADDR: &str = "METRICS_ADDR";

const DEFAULT_POLL_INTERVAL_SECS: u64 = 2 * 3600;
const DEFAULT_TICK_SECS: u64 = 60;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SEND_DELAY_SECS: u64 = 3;
const DEFAULT_MAX_ENTRIES_PER_FEED: usize = 10;
const DEFAULT_SEEN_PATH: &str = "seen_articles.json";

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub bot_token: String,
    pub chat_id: String,
    /// Time between full search cycles.
    pub poll_interval: Duration,
    /// Liveness tick on which the scheduler checks whether a cycle is due.
    pub tick_interval: Duration,
    pub http_timeout: Duration,
    /// Pause between consecutive Telegram messages (bot API rate limits).
    pub send_delay: Duration,
    pub max_entries_per_feed: usize,
    pub seen_path: PathBuf,
    /// When set, a Prometheus exporter is served on this address.
    pub metrics_addr: Option<SocketAddr>,
}

impl MonitorConfig {
    pub fn from_env() -> Result<Self> {
        let bot_token = required(ENV_BOT_TOKEN)?;
        let chat_id = required(ENV_CHAT_ID)?;

        let metrics_addr = match std::env::var(ENV_METRICS_ADDR) {
            Ok(raw) => Some(
                raw.trim()
                    .parse()
                    .with_context(|| format!("parsing {ENV_METRICS_ADDR} as host:port"))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            bot_token,
            chat_id,
            poll_interval: secs_or(ENV_POLL_INTERVAL_SECS, DEFAULT_POLL_INTERVAL_SECS),
            tick_interval: secs_or(ENV_TICK_SECS, DEFAULT_TICK_SECS),
            http_timeout: secs_or(ENV_HTTP_TIMEOUT_SECS, DEFAULT_HTTP_TIMEOUT_SECS),
            send_delay: secs_or(ENV_SEND_DELAY_SECS, DEFAULT_SEND_DELAY_SECS),
            max_entries_per_feed: count_or(ENV_MAX_ENTRIES_PER_FEED, DEFAULT_MAX_ENTRIES_PER_FEED),
            seen_path: PathBuf::from(
                std::env::var(ENV_SEEN_PATH).unwrap_or_else(|_| DEFAULT_SEEN_PATH.to_string()),
            ),
            metrics_addr,
        })
    }
}

fn required(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => bail!("{name} is not set; refusing to start without it"),
    }
}

// parse optional integer env, falling back to the default on absence or junk
fn secs_or(name: &str, default: u64) -> Duration {
    let secs = std::env::var(name)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(default);
    Duration::from_secs(secs)
}

fn count_or(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|s| s.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn clear_monitor_env() {
        for name in [
            ENV_BOT_TOKEN,
            ENV_CHAT_ID,
            ENV_POLL_INTERVAL_SECS,
            ENV_TICK_SECS,
            ENV_HTTP_TIMEOUT_SECS,
            ENV_SEND_DELAY_SECS,
            ENV_MAX_ENTRIES_PER_FEED,
            ENV_SEEN_PATH,
            ENV_METRICS_ADDR,
        ] {
            env::remove_var(name);
        }
    }

    #[serial_test::serial]
    #[test]
    fn missing_credentials_are_fatal() {
        clear_monitor_env();
        assert!(MonitorConfig::from_env().is_err());

        env::set_var(ENV_BOT_TOKEN, "123:abc");
        assert!(MonitorConfig::from_env().is_err(), "chat id still missing");

        env::set_var(ENV_CHAT_ID, "   ");
        assert!(MonitorConfig::from_env().is_err(), "blank chat id rejected");
        clear_monitor_env();
    }

    #[serial_test::serial]
    #[test]
    fn defaults_apply_when_only_credentials_are_set() {
        clear_monitor_env();
        env::set_var(ENV_BOT_TOKEN, "123:abc");
        env::set_var(ENV_CHAT_ID, "42");

        let cfg = MonitorConfig::from_env().unwrap();
        assert_eq!(cfg.poll_interval, Duration::from_secs(2 * 3600));
        assert_eq!(cfg.tick_interval, Duration::from_secs(60));
        assert_eq!(cfg.send_delay, Duration::from_secs(3));
        assert_eq!(cfg.max_entries_per_feed, 10);
        assert!(cfg.metrics_addr.is_none());
        clear_monitor_env();
    }

    #[serial_test::serial]
    #[test]
    fn overrides_and_junk_values() {
        clear_monitor_env();
        env::set_var(ENV_BOT_TOKEN, "123:abc");
        env::set_var(ENV_CHAT_ID, "42");
        env::set_var(ENV_POLL_INTERVAL_SECS, "900");
        env::set_var(ENV_MAX_ENTRIES_PER_FEED, "not-a-number");

        let cfg = MonitorConfig::from_env().unwrap();
        assert_eq!(cfg.poll_interval, Duration::from_secs(900));
        assert_eq!(cfg.max_entries_per_feed, 10, "junk falls back to default");
        clear_monitor_env();
    }
}
