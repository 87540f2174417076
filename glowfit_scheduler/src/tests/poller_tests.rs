use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use glowfit_models::{
    reminder::{Recurrence, Reminder, ReminderFireTime, ReminderId, ReminderSchedule, Weekdays},
    target::{Target, TargetKind},
};
use tokio_util::sync::CancellationToken;

use crate::{
    DueReminder, DueReminderPoller, DueReminderSource, PollReport, ReminderDeliveryChannel,
    ReminderOwner,
};

#[derive(Default)]
struct TestSource {
    due: Mutex<Vec<(TargetKind, DueReminder)>>,
    failing_kind: Option<TargetKind>,
    queries: Mutex<usize>,
    advanced: Mutex<Vec<(TargetKind, ReminderId, DateTime<Utc>)>>,
}

#[async_trait]
impl DueReminderSource for TestSource {
    async fn get_due_reminders(
        &self,
        kind: TargetKind,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<DueReminder>> {
        *self.queries.lock().unwrap() += 1;
        if self.failing_kind == Some(kind) {
            anyhow::bail!("database is gone");
        }

        Ok(self
            .due
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, due)| *k == kind && due.reminder.next_reminder <= now)
            .map(|(_, due)| due.clone())
            .collect())
    }

    async fn advance_reminder(
        &self,
        kind: TargetKind,
        id: ReminderId,
        next_reminder: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        self.advanced.lock().unwrap().push((kind, id, next_reminder));
        Ok(())
    }
}

#[derive(Default)]
struct TestDeliveryChannel {
    delivered: Mutex<Vec<ReminderId>>,
    failing_reminder: Option<ReminderId>,
}

#[async_trait]
impl ReminderDeliveryChannel for TestDeliveryChannel {
    async fn send_reminder_notification(&self, due: &DueReminder) -> anyhow::Result<()> {
        if self.failing_reminder == Some(due.reminder.id) {
            anyhow::bail!("mailbox full");
        }
        self.delivered.lock().unwrap().push(due.reminder.id);
        Ok(())
    }
}

fn fired_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 4, 9, 0, 0).unwrap()
}

fn due_reminder(id: ReminderId, target: Target) -> DueReminder {
    DueReminder {
        reminder: Reminder {
            id,
            user_id: 1,
            target,
            schedule: ReminderSchedule {
                recurrence: Recurrence::Daily,
                interval: 1,
                fire_at: ReminderFireTime::new(NaiveTime::from_hms_opt(9, 0, 0).unwrap()),
                weekdays: Weekdays::default(),
            },
            is_active: true,
            next_reminder: fired_at(),
            created_at: fired_at() - TimeDelta::days(10),
        },
        target_name: "Evening routine".to_string(),
        owner: ReminderOwner {
            email: "someone@example.com".to_string(),
            name: "Someone".to_string(),
            timezone: Tz::UTC,
            email_notifications: true,
        },
    }
}

fn poller(source: &Arc<TestSource>, delivery: &Arc<TestDeliveryChannel>) -> DueReminderPoller {
    DueReminderPoller::new(
        Arc::clone(source) as Arc<dyn DueReminderSource>,
        Arc::clone(delivery) as Arc<dyn ReminderDeliveryChannel>,
        Duration::from_secs(60),
    )
}

#[tokio::test]
async fn poll_fires_due_reminders_of_both_kinds_and_advances_them() {
    let source = Arc::new(TestSource::default());
    source.due.lock().unwrap().extend([
        (TargetKind::Skincare, due_reminder(1, Target::skincare(10))),
        (TargetKind::Fitness, due_reminder(2, Target::fitness(20))),
    ]);
    let delivery = Arc::new(TestDeliveryChannel::default());

    let now = fired_at() + TimeDelta::seconds(15);
    let report = poller(&source, &delivery).poll_once(now).await;

    assert_eq!(
        report,
        PollReport {
            fired: 2,
            failed: 0,
            failed_queries: 0
        }
    );
    assert_eq!(*delivery.delivered.lock().unwrap(), vec![1, 2]);

    let tomorrow = fired_at() + TimeDelta::days(1);
    assert_eq!(
        *source.advanced.lock().unwrap(),
        vec![
            (TargetKind::Skincare, 1, tomorrow),
            (TargetKind::Fitness, 2, tomorrow)
        ]
    );
}

#[tokio::test]
async fn reminders_not_yet_due_are_left_alone() {
    let source = Arc::new(TestSource::default());
    source
        .due
        .lock()
        .unwrap()
        .push((TargetKind::Skincare, due_reminder(1, Target::skincare(10))));
    let delivery = Arc::new(TestDeliveryChannel::default());

    let report = poller(&source, &delivery)
        .poll_once(fired_at() - TimeDelta::minutes(1))
        .await;

    assert!(report.is_empty());
    assert!(source.advanced.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_delivery_does_not_block_other_reminders() {
    let source = Arc::new(TestSource::default());
    source.due.lock().unwrap().extend([
        (TargetKind::Skincare, due_reminder(1, Target::skincare(10))),
        (TargetKind::Skincare, due_reminder(2, Target::skincare(11))),
    ]);
    let delivery = Arc::new(TestDeliveryChannel {
        failing_reminder: Some(1),
        ..Default::default()
    });

    let report = poller(&source, &delivery)
        .poll_once(fired_at() + TimeDelta::seconds(5))
        .await;

    assert_eq!(report.fired, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(*delivery.delivered.lock().unwrap(), vec![2]);
    // The failing reminder still moves on so it does not fire every minute.
    assert_eq!(source.advanced.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn failing_query_for_one_kind_does_not_stop_the_other() {
    let source = Arc::new(TestSource {
        failing_kind: Some(TargetKind::Skincare),
        ..Default::default()
    });
    source
        .due
        .lock()
        .unwrap()
        .push((TargetKind::Fitness, due_reminder(7, Target::fitness(1))));
    let delivery = Arc::new(TestDeliveryChannel::default());

    let report = poller(&source, &delivery)
        .poll_once(fired_at() + TimeDelta::seconds(5))
        .await;

    assert_eq!(report.failed_queries, 1);
    assert_eq!(report.fired, 1);
    assert_eq!(*delivery.delivered.lock().unwrap(), vec![7]);
}

#[tokio::test(start_paused = true)]
async fn poller_queries_every_interval_until_cancelled() {
    let source = Arc::new(TestSource::default());
    let delivery = Arc::new(TestDeliveryChannel::default());
    let cancellation_token = CancellationToken::new();

    let handle = poller(&source, &delivery).spawn(cancellation_token.clone());

    // Ticks at 0s, 60s and 120s, each querying both kinds.
    tokio::time::sleep(Duration::from_secs(150)).await;
    assert_eq!(*source.queries.lock().unwrap(), 6);

    cancellation_token.cancel();
    handle.await.unwrap();

    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(*source.queries.lock().unwrap(), 6);
}
