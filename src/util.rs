use std::time;

use slog;
use tokio;

/// A named periodic timer. The first tick completes immediately; ticks
/// missed while the owner was busy are skipped rather than bunched up.
pub struct Every {
    log: slog::Logger,
    name: String,
    interval: tokio::time::Interval,
}

impl Every {
    pub async fn tick(&mut self) {
        self.interval.tick().await;
        trace!(self.log, "timer tick"; "timer" => &self.name);
    }
}

/// Must be called from within a tokio runtime.
pub fn every(log: &slog::Logger, name: &str, duration: time::Duration) -> Every {
    debug!(log, "starting timer"; "timer" => name, "period_ms" => duration.as_millis() as u64);

    let mut interval = tokio::time::interval(duration);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    Every {
        log: log.clone(),
        name: name.to_owned(),
        interval,
    }
}
