// src/scheduler.rs
//! Fixed-interval drive loop: a coarse liveness tick checks whether the poll
//! interval has elapsed and runs a full cycle when it has. A failed cycle is
//! logged and reported best-effort; the loop itself never stops.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::error;

use crate::monitor::Monitor;
use crate::notify::{render, Notifier};

/// True when `interval` has elapsed since `last_run`.
/// A backwards clock step reads as "not due" rather than panicking.
pub fn is_due(now: DateTime<Utc>, last_run: DateTime<Utc>, interval: Duration) -> bool {
    now.signed_duration_since(last_run)
        .to_std()
        .map(|elapsed| elapsed >= interval)
        .unwrap_or(false)
}

/// Run the first cycle immediately, then keep ticking. Never returns.
pub async fn run<N: Notifier>(monitor: &mut Monitor<N>, poll_interval: Duration, tick: Duration) {
    run_cycle_logged(monitor).await;
    let mut last_run = Utc::now();

    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    ticker.tick().await; // the first tick completes immediately

    loop {
        ticker.tick().await;
        if is_due(Utc::now(), last_run, poll_interval) {
            run_cycle_logged(monitor).await;
            last_run = Utc::now();
        }
    }
}

async fn run_cycle_logged<N: Notifier>(monitor: &mut Monitor<N>) {
    if let Err(e) = monitor.run_cycle().await {
        error!(error = ?e, "search cycle failed");
        let notice = render::error_message(&format!("{e:#}"));
        if let Err(send_err) = monitor.notifier().send_text(&notice).await {
            error!(error = ?send_err, "error notification failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn due_exactly_at_and_after_the_interval() {
        let interval = Duration::from_secs(7200);
        let t0 = Utc::now();

        assert!(!is_due(t0, t0, interval));
        assert!(!is_due(t0 + TimeDelta::seconds(7199), t0, interval));
        assert!(is_due(t0 + TimeDelta::seconds(7200), t0, interval));
        assert!(is_due(t0 + TimeDelta::seconds(20_000), t0, interval));
    }

    #[test]
    fn clock_going_backwards_is_not_due() {
        let interval = Duration::from_secs(60);
        let t0 = Utc::now();
        assert!(!is_due(t0 - TimeDelta::seconds(30), t0, interval));
    }
}
