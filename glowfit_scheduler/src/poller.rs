use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use glowfit_models::target::TargetKind;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    delivery::{DueReminder, DueReminderSource, ReminderDeliveryChannel},
    recurrence::next_trigger,
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PollReport {
    /// Reminders delivered successfully.
    pub fired: usize,
    /// Reminders whose delivery or advance failed.
    pub failed: usize,
    /// Reminder kinds that could not be queried at all.
    pub failed_queries: usize,
}

impl PollReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Fires reminders whose `next_reminder` has passed and moves them to their
/// next occurrence.
pub struct DueReminderPoller {
    source: Arc<dyn DueReminderSource>,
    delivery: Arc<dyn ReminderDeliveryChannel>,
    poll_interval: Duration,
}

impl DueReminderPoller {
    pub fn new(
        source: Arc<dyn DueReminderSource>,
        delivery: Arc<dyn ReminderDeliveryChannel>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            source,
            delivery,
            poll_interval,
        }
    }

    pub fn spawn(self, cancellation_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(cancellation_token).await })
    }

    pub async fn run(&self, cancellation_token: CancellationToken) {
        log::info!(
            "Starting due reminder poller. [poll_interval = {:?}]",
            self.poll_interval
        );

        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    log::info!("Due reminder poller shutting down");
                    break;
                }
                _ = interval.tick() => {
                    let report = self.poll_once(Utc::now()).await;
                    if !report.is_empty() {
                        log::info!(
                            "Reminder poll finished. [fired = {}, failed = {}, failed_queries = {}]",
                            report.fired,
                            report.failed,
                            report.failed_queries
                        );
                    }
                }
            }
        }
    }

    /// Runs a single pass over every reminder kind.
    pub async fn poll_once(&self, now: DateTime<Utc>) -> PollReport {
        let mut report = PollReport::default();

        for kind in TargetKind::ALL {
            let due_reminders = match self.source.get_due_reminders(kind, now).await {
                Ok(due_reminders) => due_reminders,
                Err(error) => {
                    log::error!("Could not query due reminders. [kind = {kind}, error = {error:#}]");
                    report.failed_queries += 1;
                    continue;
                }
            };

            for due in due_reminders {
                if self.fire(kind, &due, now).await {
                    report.fired += 1;
                } else {
                    report.failed += 1;
                }
            }
        }

        report
    }

    async fn fire(&self, kind: TargetKind, due: &DueReminder, now: DateTime<Utc>) -> bool {
        let reminder = &due.reminder;
        let mut ok = true;

        if let Err(error) = self.delivery.send_reminder_notification(due).await {
            log::error!(
                "Could not deliver reminder. [kind = {kind}, reminder_id = {}, error = {error:#}]",
                reminder.id
            );
            ok = false;
        }

        // Advanced even when delivery failed, otherwise the reminder is due
        // again on the next tick.
        let next_reminder = next_trigger(
            &reminder.schedule,
            Some(reminder.next_reminder),
            now,
            due.owner.timezone,
        );

        if let Err(error) = self
            .source
            .advance_reminder(kind, reminder.id, next_reminder)
            .await
        {
            log::error!(
                "Could not advance reminder. [kind = {kind}, reminder_id = {}, error = {error:#}]",
                reminder.id
            );
            ok = false;
        } else {
            log::debug!(
                "Reminder advanced. [kind = {kind}, reminder_id = {}, next_reminder = {next_reminder}]",
                reminder.id
            );
        }

        ok
    }
}
