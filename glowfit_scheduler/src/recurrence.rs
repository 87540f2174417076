use chrono::{DateTime, Datelike, Days, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use glowfit_models::reminder::{Recurrence, ReminderSchedule};

/// Computes the next instant strictly after `now` at which a reminder with
/// `schedule` is due.
///
/// `last_trigger` is the instant the reminder was last due, if it has fired
/// before. Daily and weekly reminders keep their cadence relative to it, so a
/// reminder that just fired moves exactly `interval` days (or weeks) forward.
/// Without it the cadence starts from today. Custom reminders only depend on
/// the weekday set and ignore both `interval` and `last_trigger`.
///
/// Time of day and weekdays are read in `tz`.
pub fn next_trigger(
    schedule: &ReminderSchedule,
    last_trigger: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    tz: Tz,
) -> DateTime<Utc> {
    let fire_at = *schedule.fire_at.time();
    let interval = u64::from(schedule.interval.max(1));
    let anchor = last_trigger
        .unwrap_or(now)
        .with_timezone(&tz)
        .date_naive();

    match schedule.recurrence {
        Recurrence::Daily => advance_by_days(anchor, fire_at, interval, now, tz),
        Recurrence::Weekly => advance_by_days(anchor, fire_at, 7 * interval, now, tz),
        Recurrence::Custom if schedule.weekdays.is_empty() => {
            log::warn!("Custom reminder schedule without weekdays, falling back to daily.");
            advance_by_days(now.with_timezone(&tz).date_naive(), fire_at, 1, now, tz)
        }
        Recurrence::Custom => next_weekday(schedule, fire_at, now, tz),
    }
}

fn advance_by_days(
    anchor: NaiveDate,
    fire_at: NaiveTime,
    step_days: u64,
    now: DateTime<Utc>,
    tz: Tz,
) -> DateTime<Utc> {
    let mut date = anchor;
    let mut candidate = resolve_local(tz, date.and_time(fire_at));

    while candidate <= now {
        date = date
            .checked_add_days(Days::new(step_days))
            .expect("Not realistic to overflow");
        candidate = resolve_local(tz, date.and_time(fire_at));
    }

    candidate
}

fn next_weekday(
    schedule: &ReminderSchedule,
    fire_at: NaiveTime,
    now: DateTime<Utc>,
    tz: Tz,
) -> DateTime<Utc> {
    let local_now = now.with_timezone(&tz);
    let today = local_now.date_naive();
    let today_weekday = local_now.weekday().num_days_from_sunday() as u8;

    // Offset 7 is today's weekday one week later, reached when today is the
    // only member of the set and its time has passed.
    for offset in 0..=7u8 {
        let weekday = (today_weekday + offset) % 7;
        if !schedule.weekdays.contains(weekday) {
            continue;
        }

        let date = today
            .checked_add_days(Days::new(u64::from(offset)))
            .expect("Not realistic to overflow");
        let candidate = resolve_local(tz, date.and_time(fire_at));
        if candidate > now {
            return candidate;
        }
    }

    advance_by_days(today, fire_at, 1, now, tz)
}

/// Maps a local wall-clock time to UTC. Times inside a DST gap move one hour
/// forward, ambiguous times resolve to the earlier instant.
fn resolve_local(tz: Tz, local: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            let shifted = local + TimeDelta::hours(1);
            tz.from_local_datetime(&shifted)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| Utc.from_utc_datetime(&shifted))
        }
    }
}
