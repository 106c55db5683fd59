//! Local-midnight date rollover.
//!
//! The "today" scope of the sales report has to follow the wall clock. A
//! [`DayRollover`] owns a background task that publishes the current local
//! date through a watch channel just after every local midnight. The wait is
//! recomputed from the wall clock each time, so DST days and suspends do not
//! shift the schedule. The task belongs to whoever created the rollover and
//! stops on [`DayRollover::shutdown`] or when the rollover is dropped.

use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Slack after midnight so the clock has definitely crossed the boundary.
const MIDNIGHT_SLACK: Duration = Duration::from_secs(1);

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Time left until the next local midnight, plus [`MIDNIGHT_SLACK`].
pub fn until_next_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> Duration {
    let tz = now.timezone();
    let tomorrow = now.date_naive().succ_opt().unwrap_or(NaiveDate::MAX);
    let midnight = tomorrow
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| tz.from_local_datetime(&naive).earliest())
        // midnight skipped by a DST jump: retry an hour later
        .or_else(|| {
            tomorrow
                .and_hms_opt(1, 0, 0)
                .and_then(|naive| tz.from_local_datetime(&naive).earliest())
        });

    let wait = midnight
        .map(|m| m.signed_duration_since(now.clone()))
        .and_then(|d| d.to_std().ok())
        .unwrap_or(DAY);
    wait + MIDNIGHT_SLACK
}

pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

pub struct DayRollover {
    rx: watch::Receiver<NaiveDate>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl DayRollover {
    /// Spawn the rollover task on the current tokio runtime.
    pub fn start() -> Self {
        let (tx, rx) = watch::channel(local_today());
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        let handle = tokio::spawn(async move {
            loop {
                let wait = until_next_midnight(&Local::now());
                debug!(wait_secs = wait.as_secs(), "day rollover scheduled");

                tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    _ = tokio::time::sleep(wait) => publish(&tx),
                }
            }
        });

        Self {
            rx,
            cancel,
            handle: Some(handle),
        }
    }

    pub fn today(&self) -> NaiveDate {
        *self.rx.borrow()
    }

    /// A receiver that observes every published date.
    pub fn subscribe(&self) -> watch::Receiver<NaiveDate> {
        self.rx.clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Cancel the task and wait for it to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for DayRollover {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn publish(tx: &watch::Sender<NaiveDate>) {
    let today = local_today();
    tx.send_if_modified(|current| {
        if *current == today {
            false
        } else {
            info!(date = %today, "local date rolled over");
            *current = today;
            true
        }
    });
}
