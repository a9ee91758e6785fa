use std::future::Future;
use std::time;

use chrono;
use failure;
use futures;
use slog;
use tokio;

use crate::model::{Classification, Factor};
use crate::schema;
use crate::source::{Record, RecordSource};
use crate::status;
use crate::util;

pub struct Poller<S> {
    log: slog::Logger,
    source: S,
    interval: time::Duration,
}

impl<S> Poller<S>
where
    S: RecordSource,
{
    pub fn new(log: slog::Logger, source: S, interval: time::Duration) -> Self {
        Poller {
            log,
            source,
            interval,
        }
    }

    /// Fetches every factor and classifies whatever came back.
    ///
    /// If any fetch fails the dashboard is left untouched.
    pub async fn poll_once(&self, dashboard: &mut schema::Dashboard) -> Result<(), failure::Error> {
        let fetches = Factor::ALL.iter().map(|&factor| self.fetch(factor));
        let records = futures::future::try_join_all(fetches).await?;

        let readings = records
            .into_iter()
            .filter_map(|(factor, record)| record.map(|record| self.classify(factor, &record)))
            .collect::<Vec<_>>();

        let was_needed = dashboard.water_needed;
        dashboard.update(readings, chrono::Utc::now());

        if dashboard.water_needed != was_needed {
            info!(self.log, "watering recommendation changed"; "water_needed" => dashboard.water_needed);
        }

        Ok(())
    }

    /// Polls right away and then once per interval until `shutdown`
    /// resolves, handing the dashboard to `on_update` after every successful
    /// poll. Failed polls are logged and retried on the next tick.
    pub async fn run<F, D>(
        &self,
        dashboard: &mut schema::Dashboard,
        mut on_update: F,
        shutdown: D,
    ) -> Result<(), failure::Error>
    where
        F: FnMut(&schema::Dashboard) -> Result<(), failure::Error>,
        D: Future<Output = ()>,
    {
        let mut ticks = util::every(&self.log, "poll", self.interval);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(self.log, "stopping poller");
                    break;
                }
                _ = ticks.tick() => {
                    match self.poll_once(dashboard).await {
                        Ok(()) => on_update(dashboard)?,
                        Err(e) => {
                            warn!(self.log, "poll failed, waiting for next tick"; "error" => %e);
                        }
                    }
                }
            }
        }

        Ok(())
    }

    async fn fetch(&self, factor: Factor) -> Result<(Factor, Option<Record>), failure::Error> {
        let record = self.source.fetch(factor).await?;
        Ok((factor, record))
    }

    fn classify(&self, factor: Factor, record: &Record) -> Classification {
        let classification = status::evaluate(record.reading(factor), record.min, record.max);
        debug!(
            self.log,
            "classified reading";
            "factor" => %factor,
            "value" => classification.value,
            "status" => %classification.status
        );
        classification
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections;
    use std::sync;

    use serde_json::json;

    use crate::model::Status;

    /// Serves canned records; factors without an entry have no record.
    #[derive(Default)]
    struct StaticSource {
        records: collections::HashMap<Factor, Result<serde_json::Value, String>>,
        fetches: sync::atomic::AtomicUsize,
    }

    impl StaticSource {
        fn with(mut self, factor: Factor, body: serde_json::Value) -> Self {
            self.records.insert(factor, Ok(body));
            self
        }

        fn failing(mut self, factor: Factor, message: &str) -> Self {
            self.records.insert(factor, Err(message.to_owned()));
            self
        }
    }

    impl RecordSource for StaticSource {
        async fn fetch(&self, factor: Factor) -> Result<Option<Record>, failure::Error> {
            self.fetches.fetch_add(1, sync::atomic::Ordering::SeqCst);
            match self.records.get(&factor) {
                Some(Ok(body)) => Ok(Record::from_json(&log(), factor, body.clone())),
                Some(Err(message)) => Err(format_err!("{}", message)),
                None => Ok(None),
            }
        }
    }

    fn log() -> slog::Logger {
        slog::Logger::root(slog::Discard, o!())
    }

    fn poller(source: StaticSource) -> Poller<StaticSource> {
        Poller::new(log(), source, time::Duration::from_secs(5))
    }

    fn status_of(dashboard: &schema::Dashboard, factor: Factor) -> Option<Status> {
        dashboard
            .readings
            .iter()
            .find(|c| c.factor == factor)
            .map(|c| c.status)
    }

    #[tokio::test]
    async fn classifies_all_factors() {
        let poller = poller(
            StaticSource::default()
                .with(Factor::Temperature, json!({ "value": 36, "min": 0, "max": 50 }))
                .with(Factor::WaterLevel, json!({ "value": 55, "min": 0, "max": 100 }))
                .with(Factor::SoilMoisture, json!({ "value": "30", "min": 0, "max": 200 })),
        );
        let mut dashboard = schema::Dashboard::new(chrono::Utc::now());

        poller.poll_once(&mut dashboard).await.unwrap();

        assert!(!dashboard.loading);
        assert_eq!(dashboard.readings.len(), 3);
        assert_eq!(status_of(&dashboard, Factor::Temperature), Some(Status::High));
        assert_eq!(status_of(&dashboard, Factor::WaterLevel), Some(Status::Normal));
        assert_eq!(status_of(&dashboard, Factor::SoilMoisture), Some(Status::Normal));
        assert!(dashboard.water_needed);
    }

    #[tokio::test]
    async fn missing_records_are_left_out() {
        let poller = poller(
            StaticSource::default()
                .with(Factor::WaterLevel, json!({ "value": 12 }))
                .with(Factor::SoilMoisture, json!(null)),
        );
        let mut dashboard = schema::Dashboard::new(chrono::Utc::now());

        poller.poll_once(&mut dashboard).await.unwrap();

        assert_eq!(dashboard.readings.len(), 1);
        assert_eq!(status_of(&dashboard, Factor::WaterLevel), Some(Status::Low));
        assert!(dashboard.water_needed);
    }

    #[tokio::test]
    async fn non_numeric_value_is_normal() {
        let poller = poller(StaticSource::default().with(Factor::Temperature, json!({ "value": "hot" })));
        let mut dashboard = schema::Dashboard::new(chrono::Utc::now());

        poller.poll_once(&mut dashboard).await.unwrap();

        assert_eq!(status_of(&dashboard, Factor::Temperature), Some(Status::Normal));
        assert!(dashboard.readings[0].value.is_nan());
        assert!(!dashboard.water_needed);
    }

    #[tokio::test]
    async fn scalar_body_reads_as_normal() {
        let poller = poller(StaticSource::default().with(Factor::SoilMoisture, json!(21)));
        let mut dashboard = schema::Dashboard::new(chrono::Utc::now());

        poller.poll_once(&mut dashboard).await.unwrap();

        assert!(!dashboard.loading);
        assert_eq!(status_of(&dashboard, Factor::SoilMoisture), Some(Status::Normal));
        assert!(dashboard.readings[0].value.is_nan());
        assert!(!dashboard.water_needed);
    }

    #[tokio::test]
    async fn failed_fetch_leaves_dashboard_alone() {
        let good = poller(StaticSource::default().with(Factor::WaterLevel, json!({ "value": 10 })));
        let mut dashboard = schema::Dashboard::new(chrono::Utc::now());
        good.poll_once(&mut dashboard).await.unwrap();
        let last_update = dashboard.last_update;

        let bad = poller(
            StaticSource::default()
                .with(Factor::WaterLevel, json!({ "value": 50 }))
                .failing(Factor::Temperature, "connection reset"),
        );
        let err = bad.poll_once(&mut dashboard).await.err().unwrap();

        assert_eq!(err.to_string(), "connection reset");
        assert_eq!(dashboard.last_update, last_update);
        assert_eq!(status_of(&dashboard, Factor::WaterLevel), Some(Status::Low));
        assert!(dashboard.water_needed);
    }

    #[tokio::test]
    async fn nothing_stored_keeps_loading() {
        let poller = poller(StaticSource::default());
        let mut dashboard = schema::Dashboard::new(chrono::Utc::now());

        poller.poll_once(&mut dashboard).await.unwrap();

        assert!(dashboard.loading);
        assert!(!dashboard.water_needed);
    }

    #[tokio::test(start_paused = true)]
    async fn run_polls_every_interval_until_shutdown() {
        let poller = poller(StaticSource::default().with(Factor::Temperature, json!({ "value": 20 })));
        let mut dashboard = schema::Dashboard::new(chrono::Utc::now());
        let mut updates = 0;

        poller
            .run(
                &mut dashboard,
                |_| {
                    updates += 1;
                    Ok(())
                },
                tokio::time::sleep(time::Duration::from_secs(12)),
            )
            .await
            .unwrap();

        // Ticks at 0s, 5s and 10s.
        assert_eq!(updates, 3);
        assert_eq!(poller.source.fetches.load(sync::atomic::Ordering::SeqCst), 9);
        assert!(!dashboard.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn run_survives_failed_polls() {
        let poller = poller(StaticSource::default().failing(Factor::SoilMoisture, "timed out"));
        let mut dashboard = schema::Dashboard::new(chrono::Utc::now());
        let mut updates = 0;

        poller
            .run(
                &mut dashboard,
                |_| {
                    updates += 1;
                    Ok(())
                },
                tokio::time::sleep(time::Duration::from_secs(7)),
            )
            .await
            .unwrap();

        assert_eq!(updates, 0);
        assert!(dashboard.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_on_render_error() {
        let poller = poller(StaticSource::default());
        let mut dashboard = schema::Dashboard::new(chrono::Utc::now());

        let err = poller
            .run(
                &mut dashboard,
                |_| Err(format_err!("stdout closed")),
                futures::future::pending(),
            )
            .await
            .err()
            .unwrap();

        assert_eq!(err.to_string(), "stdout closed");
    }
}
