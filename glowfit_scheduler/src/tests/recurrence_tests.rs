use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use glowfit_models::reminder::{Recurrence, ReminderFireTime, ReminderSchedule, Weekdays};
use proptest::prelude::*;
use test_strategy::proptest;

use crate::next_trigger;

fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.from_utc_datetime(
        &NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap(),
    )
}

fn schedule(recurrence: Recurrence, interval: u32, h: u32, m: u32, weekdays: &[u8]) -> ReminderSchedule {
    ReminderSchedule {
        recurrence,
        interval,
        fire_at: ReminderFireTime::new(NaiveTime::from_hms_opt(h, m, 0).unwrap()),
        weekdays: Weekdays::new(weekdays.iter().copied()).unwrap(),
    }
}

#[test]
fn daily_reminder_fires_today_when_time_is_yet_to_come() {
    let now = utc(2025, 6, 4, 10, 0);
    let next = next_trigger(&schedule(Recurrence::Daily, 1, 13, 0, &[]), None, now, Tz::UTC);

    assert_eq!(next, utc(2025, 6, 4, 13, 0));
}

#[test]
fn daily_reminder_skips_interval_when_time_has_passed() {
    let now = utc(2025, 6, 4, 10, 0);
    let next = next_trigger(&schedule(Recurrence::Daily, 3, 9, 0, &[]), None, now, Tz::UTC);

    assert_eq!(next, utc(2025, 6, 7, 9, 0));
}

#[test]
fn weekly_reminder_that_fired_moves_by_whole_weeks() {
    let fired_at = utc(2025, 6, 4, 9, 0);
    let now = fired_at + TimeDelta::seconds(20);
    let next = next_trigger(
        &schedule(Recurrence::Weekly, 2, 9, 0, &[]),
        Some(fired_at),
        now,
        Tz::UTC,
    );

    assert_eq!(next, utc(2025, 6, 18, 9, 0));
}

#[test]
fn reminder_fired_just_before_midnight_keeps_its_cadence() {
    let fired_at = utc(2025, 6, 4, 23, 59);
    let now = utc(2025, 6, 5, 0, 0) + TimeDelta::seconds(30);
    let next = next_trigger(
        &schedule(Recurrence::Daily, 2, 23, 59, &[]),
        Some(fired_at),
        now,
        Tz::UTC,
    );

    assert_eq!(next, utc(2025, 6, 6, 23, 59));
}

#[test]
fn overdue_reminder_catches_up_to_the_first_future_occurrence() {
    let last = utc(2025, 6, 1, 8, 0);
    let now = utc(2025, 6, 10, 12, 0);
    let next = next_trigger(&schedule(Recurrence::Daily, 2, 8, 0, &[]), Some(last), now, Tz::UTC);

    assert_eq!(next, utc(2025, 6, 11, 8, 0));
}

#[test]
fn custom_reminder_fires_later_today_when_today_is_in_the_set() {
    // 2025-06-04 is a Wednesday.
    let now = utc(2025, 6, 4, 10, 0);
    let next = next_trigger(&schedule(Recurrence::Custom, 1, 11, 0, &[1, 3, 5]), None, now, Tz::UTC);

    assert_eq!(next, utc(2025, 6, 4, 11, 0));
}

#[test]
fn custom_reminder_moves_to_next_weekday_when_time_has_passed() {
    let now = utc(2025, 6, 4, 10, 0);
    let next = next_trigger(&schedule(Recurrence::Custom, 1, 9, 0, &[1, 3, 5]), None, now, Tz::UTC);

    assert_eq!(next, utc(2025, 6, 6, 9, 0));
}

#[test]
fn custom_reminder_wraps_to_next_week() {
    // Friday, only Mondays configured.
    let now = utc(2025, 6, 6, 10, 0);
    let next = next_trigger(&schedule(Recurrence::Custom, 1, 9, 0, &[1]), None, now, Tz::UTC);

    assert_eq!(next, utc(2025, 6, 9, 9, 0));
}

#[test]
fn custom_reminder_with_single_weekday_waits_a_full_week() {
    let now = utc(2025, 6, 4, 10, 0);
    let next = next_trigger(&schedule(Recurrence::Custom, 1, 9, 0, &[3]), None, now, Tz::UTC);

    assert_eq!(next, utc(2025, 6, 11, 9, 0));
}

#[test]
fn time_of_day_is_read_in_the_owner_timezone() {
    // Tokyo is UTC+9, 08:00 local on 2025-06-05 is 23:00 UTC on 2025-06-04.
    let now = utc(2025, 6, 4, 12, 0);
    let next = next_trigger(
        &schedule(Recurrence::Daily, 1, 8, 0, &[]),
        None,
        now,
        Tz::Asia__Tokyo,
    );

    assert_eq!(next, utc(2025, 6, 4, 23, 0));
}

#[test]
fn nonexistent_local_time_moves_forward_an_hour() {
    // Berlin skips 02:00-03:00 on 2025-03-30.
    let now = utc(2025, 3, 29, 12, 0);
    let next = next_trigger(
        &schedule(Recurrence::Daily, 1, 2, 30, &[]),
        None,
        now,
        Tz::Europe__Berlin,
    );

    assert_eq!(next, utc(2025, 3, 30, 1, 30));
}

#[test]
fn ambiguous_local_time_takes_the_earlier_instant() {
    // Berlin repeats 02:00-03:00 on 2025-10-26, first in CEST (UTC+2) then in CET.
    let now = utc(2025, 10, 25, 12, 0);
    let schedule = schedule(Recurrence::Daily, 1, 2, 30, &[]);

    let first = next_trigger(&schedule, None, now, Tz::Europe__Berlin);
    assert_eq!(first, utc(2025, 10, 26, 0, 30));

    let after_firing = next_trigger(
        &schedule,
        Some(first),
        first + TimeDelta::seconds(20),
        Tz::Europe__Berlin,
    );
    assert_eq!(after_firing, utc(2025, 10, 27, 1, 30));
}

#[test]
fn repeated_hour_does_not_fire_twice() {
    // 01:45 UTC is 02:45 CET, the second pass through the repeated hour.
    let now = utc(2025, 10, 26, 1, 45);
    let next = next_trigger(
        &schedule(Recurrence::Daily, 1, 2, 30, &[]),
        None,
        now,
        Tz::Europe__Berlin,
    );

    assert_eq!(next, utc(2025, 10, 27, 1, 30));
}

#[test]
fn daily_reminder_keeps_local_time_across_spring_forward() {
    // New York moves to EDT on 2025-03-09, so the gap between firings is 23 hours.
    let previous = utc(2025, 3, 8, 13, 0);
    let next = next_trigger(
        &schedule(Recurrence::Daily, 1, 8, 0, &[]),
        Some(previous),
        previous + TimeDelta::seconds(5),
        Tz::America__New_York,
    );

    assert_eq!(next, utc(2025, 3, 9, 12, 0));
    assert_eq!(next - previous, TimeDelta::hours(23));
}

#[test]
fn custom_without_weekdays_behaves_like_daily() {
    let now = utc(2025, 6, 4, 10, 0);
    let next = next_trigger(&schedule(Recurrence::Custom, 1, 9, 0, &[]), None, now, Tz::UTC);

    assert_eq!(next, utc(2025, 6, 5, 9, 0));
}

fn now_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    // 2000-01-01 .. 2099-12-31
    (946_684_800i64..4_102_358_400i64)
        .prop_map(|secs| DateTime::from_timestamp(secs, 0).unwrap())
}

fn fire_time_strategy() -> impl Strategy<Value = (u32, u32)> {
    (0u32..24, 0u32..60)
}

/// Times of day that exist exactly once on every date in the zones below.
/// Their DST switches all happen between 01:00 and 04:00 local time.
fn unambiguous_fire_time_strategy() -> impl Strategy<Value = (u32, u32)> {
    (prop_oneof![Just(0u32), 4u32..24], 0u32..60)
}

fn timezone_strategy() -> impl Strategy<Value = Tz> {
    prop_oneof![
        Just(Tz::UTC),
        Just(Tz::Asia__Tokyo),
        Just(Tz::Asia__Kolkata),
        Just(Tz::Europe__Berlin),
        Just(Tz::America__New_York),
        Just(Tz::Australia__Sydney),
    ]
}

fn same_offset(tz: Tz, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.with_timezone(&tz).offset().fix() == b.with_timezone(&tz).offset().fix()
}

fn local_days_between(tz: Tz, from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to.with_timezone(&tz).date_naive() - from.with_timezone(&tz).date_naive()).num_days()
}

fn weekdays_strategy() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(0u8..7, 1..7)
}

#[proptest]
fn daily_reminder_moves_exactly_interval_days(
    #[strategy(now_strategy())] now: DateTime<Utc>,
    #[strategy(unambiguous_fire_time_strategy())] fire_at: (u32, u32),
    #[strategy(1u32..10)] interval: u32,
    #[strategy(0i64..3600)] fired_late_by: i64,
    #[strategy(timezone_strategy())] tz: Tz,
) {
    let schedule = schedule(Recurrence::Daily, interval, fire_at.0, fire_at.1, &[]);
    let previous = next_trigger(&schedule, None, now, tz);
    let fired_now = previous + TimeDelta::seconds(fired_late_by);

    let next = next_trigger(&schedule, Some(previous), fired_now, tz);

    prop_assert_eq!(local_days_between(tz, previous, next), i64::from(interval));
    prop_assert_eq!(
        next.with_timezone(&tz).time(),
        previous.with_timezone(&tz).time()
    );
    if same_offset(tz, previous, next) {
        prop_assert_eq!(next - previous, TimeDelta::days(i64::from(interval)));
    }
}

#[proptest]
fn weekly_reminder_moves_exactly_seven_times_interval_days(
    #[strategy(now_strategy())] now: DateTime<Utc>,
    #[strategy(unambiguous_fire_time_strategy())] fire_at: (u32, u32),
    #[strategy(1u32..5)] interval: u32,
    #[strategy(0i64..3600)] fired_late_by: i64,
    #[strategy(timezone_strategy())] tz: Tz,
) {
    let schedule = schedule(Recurrence::Weekly, interval, fire_at.0, fire_at.1, &[]);
    let previous = next_trigger(&schedule, None, now, tz);
    let fired_now = previous + TimeDelta::seconds(fired_late_by);

    let next = next_trigger(&schedule, Some(previous), fired_now, tz);

    prop_assert_eq!(local_days_between(tz, previous, next), 7 * i64::from(interval));
    prop_assert_eq!(
        next.with_timezone(&tz).weekday(),
        previous.with_timezone(&tz).weekday()
    );
    prop_assert_eq!(
        next.with_timezone(&tz).time(),
        previous.with_timezone(&tz).time()
    );
    if same_offset(tz, previous, next) {
        prop_assert_eq!(next - previous, TimeDelta::days(7 * i64::from(interval)));
    }
}

#[proptest]
fn custom_reminder_lands_on_a_configured_weekday_in_the_future(
    #[strategy(now_strategy())] now: DateTime<Utc>,
    #[strategy(fire_time_strategy())] fire_at: (u32, u32),
    #[strategy(weekdays_strategy())] weekdays: Vec<u8>,
    #[strategy(timezone_strategy())] tz: Tz,
) {
    let schedule = schedule(Recurrence::Custom, 1, fire_at.0, fire_at.1, &weekdays);

    let next = next_trigger(&schedule, None, now, tz);
    let local = next.with_timezone(&tz);

    prop_assert!(next > now);
    // A week, plus the hour a clock change in between can add.
    prop_assert!(next - now <= TimeDelta::days(7) + TimeDelta::hours(1));
    prop_assert!(weekdays.contains(&(local.weekday().num_days_from_sunday() as u8)));
}

#[proptest]
fn fresh_and_just_fired_reminders_agree(
    #[strategy(now_strategy())] now: DateTime<Utc>,
    #[strategy(0u32..20)] hour: u32,
    #[strategy(0u32..60)] minute: u32,
    #[strategy(1u32..10)] interval: u32,
    #[strategy(0i64..3600)] fired_late_by: i64,
    #[strategy(prop_oneof![Just(Recurrence::Daily), Just(Recurrence::Weekly)])] recurrence: Recurrence,
) {
    let schedule = schedule(recurrence, interval, hour, minute, &[]);
    let previous = next_trigger(&schedule, None, now, Tz::UTC);
    let fired_now = previous + TimeDelta::seconds(fired_late_by);

    let from_fresh = next_trigger(&schedule, None, fired_now, Tz::UTC);
    let from_fired = next_trigger(&schedule, Some(previous), fired_now, Tz::UTC);

    prop_assert_eq!(from_fresh, from_fired);
}
