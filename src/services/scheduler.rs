use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Local, NaiveTime, TimeZone};
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};

use super::alert_engine::AlertEngine;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub sweep_every: Duration,
    /// Local wall-clock time of the daily digest.
    pub digest_at: NaiveTime,
}

/// Handles of the two timer tasks. Dropping it leaves them running.
pub struct SchedulerHandle {
    sweep: JoinHandle<()>,
    digest: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn shutdown(self) {
        self.sweep.abort();
        self.digest.abort();
    }
}

/// Starts the sweep and digest timers as independent tasks.
///
/// Each run executes in its own spawned task so a slow run never delays the
/// next tick. A tick that arrives while the previous run of the same kind is
/// still going is skipped, not queued.
pub fn spawn(engine: Arc<AlertEngine>, config: SchedulerConfig) -> SchedulerHandle {
    let sweep = tokio::spawn(sweep_timer(engine.clone(), config.sweep_every));
    let digest = tokio::spawn(digest_timer(engine, config.digest_at));

    SchedulerHandle { sweep, digest }
}

async fn sweep_timer(engine: Arc<AlertEngine>, every: Duration) {
    let running = Arc::new(Mutex::new(()));
    let mut interval = time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        let Ok(guard) = running.clone().try_lock_owned() else {
            tracing::warn!("[alert-sweep] previous sweep still running, skipping tick");
            continue;
        };

        let engine = engine.clone();
        tokio::spawn(async move {
            let _guard = guard;
            if let Err(e) = engine.sweep().await {
                tracing::error!("[alert-sweep] sweep error: {}", e);
            }
        });
    }
}

async fn digest_timer(engine: Arc<AlertEngine>, at: NaiveTime) {
    let running = Arc::new(Mutex::new(()));
    let mut next = next_occurrence(&Local::now(), at);

    loop {
        let delay = (next.clone() - Local::now()).to_std().unwrap_or(Duration::ZERO);
        tracing::debug!(secs = delay.as_secs(), "[digest] next run scheduled");
        time::sleep(delay).await;

        next = next_after_run(&next, &Local::now(), at);

        let Ok(guard) = running.clone().try_lock_owned() else {
            tracing::warn!("[digest] previous digest still running, skipping");
            continue;
        };

        let engine = engine.clone();
        tokio::spawn(async move {
            let _guard = guard;
            if let Err(e) = engine.digest().await {
                tracing::error!("[digest] digest error: {}", e);
            }
        });
    }
}

/// First occurrence of `at` strictly after `after`, in `after`'s time zone.
pub fn next_occurrence<Tz: TimeZone>(after: &DateTime<Tz>, at: NaiveTime) -> DateTime<Tz> {
    let tz = after.timezone();

    let mut day = after.date_naive();
    for _ in 0..3 {
        // `earliest` covers DST gaps/overlaps; a skipped local time rolls to the next day
        if let Some(candidate) = tz.from_local_datetime(&day.and_time(at)).earliest() {
            if candidate > *after {
                return candidate;
            }
        }
        day = match day.succ_opt() {
            Some(d) => d,
            None => break,
        };
    }

    after.clone() + chrono::Duration::days(1)
}

/// Target of the run after the one due at `target`. Counted from the later of
/// `target` and `now`, so a wall clock stepped back during the sleep cannot
/// repeat the same day's run.
pub fn next_after_run<Tz: TimeZone>(target: &DateTime<Tz>, now: &DateTime<Tz>, at: NaiveTime) -> DateTime<Tz> {
    next_occurrence(if now > target { now } else { target }, at)
}

/// Time from `now` until the next occurrence of `at` in `now`'s time zone.
/// If `now` is exactly `at`, the next occurrence is a day later.
pub fn next_run_delay<Tz: TimeZone>(now: DateTime<Tz>, at: NaiveTime) -> Duration {
    (next_occurrence(&now, at) - now)
        .to_std()
        .unwrap_or(Duration::ZERO)
}
