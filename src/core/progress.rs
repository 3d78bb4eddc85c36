//! Cosmetic "audit in progress" indicator.
//!
//! The ticker only observes time. It never sees the audit's value and stops
//! the moment the audit future settles, successfully or not.

use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

pub const LOADING_STEPS: [&str; 4] = [
    "Connecting to Data Centers...",
    "Crawling Site Structure...",
    "Performing SEO Checks...",
    "Finalizing Report...",
];

pub const TICK_INTERVAL: Duration = Duration::from_millis(800);

/// Drives `work` to completion, calling `on_step` with a step index that
/// cycles through [`LOADING_STEPS`] every `interval`.
pub async fn with_progress<F, T>(work: F, interval: Duration, mut on_step: impl FnMut(usize)) -> T
where
    F: Future<Output = T>,
{
    tokio::pin!(work);

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // first tick fires immediately
    ticker.tick().await;

    let mut step = 0;
    on_step(step);

    loop {
        tokio::select! {
            biased;
            output = &mut work => return output,
            _ = ticker.tick() => {
                step = (step + 1) % LOADING_STEPS.len();
                on_step(step);
            }
        }
    }
}

pub fn step_label(step: usize) -> &'static str {
    LOADING_STEPS[step % LOADING_STEPS.len()]
}
