//! Epoch/calendar conversion and target-date pattern arithmetic.
//!
//! `TdPattern` mirrors the original `td_pattern` enum and its
//! day/month rollover rules. Calendar math is delegated to `chrono`
//! throughout rather than hand-rolled.

use chrono::{Datelike, Duration as ChronoDuration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};

use crate::error::TimeError;

/// Sentinel epoch-seconds value standing in for "no effective target date."
pub const T_MAX: i64 = i64::MAX;

/// One minute in seconds.
pub const MINUTE: i64 = 60;
/// One day in seconds.
pub const DAY: i64 = 86_400;

/// Target-date repetition patterns, in the order declared by the reference
/// implementation's `td_pattern` enum. `Span` is retained only as a legacy
/// variant (`OLD_patt_span`); new Nodes should not use it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TdPattern {
    Daily,
    Workdays,
    Weekly,
    Biweekly,
    Monthly,
    EndOfMonthOffset,
    Yearly,
    Span,
    NonPeriodic,
}

fn naive_from_epoch(epoch: i64) -> NaiveDateTime {
    Utc.timestamp_opt(epoch, 0)
        .single()
        .expect("epoch seconds in representable range")
        .naive_utc()
}

fn epoch_from_naive(dt: NaiveDateTime) -> i64 {
    dt.and_utc().timestamp()
}

/// Advance `t` (epoch seconds, already offset into local time by the caller)
/// by `n` periods of `pattern`. `Workdays` skips Saturday/Sunday; `Monthly`
/// and `Yearly` use calendar month/year arithmetic; `EndOfMonthOffset`
/// preserves the original distance from the last day of the month.
pub fn add_to_date(t: i64, pattern: TdPattern, n: u32) -> Result<i64, TimeError> {
    if n == 0 {
        return Ok(t);
    }
    match pattern {
        TdPattern::NonPeriodic => Err(TimeError::NonPeriodic),
        TdPattern::Daily => Ok(t + i64::from(n) * DAY),
        TdPattern::Weekly => Ok(t + i64::from(n) * 7 * DAY),
        TdPattern::Biweekly => Ok(t + i64::from(n) * 14 * DAY),
        TdPattern::Span => Ok(t + i64::from(n) * DAY),
        TdPattern::Workdays => {
            let mut dt = naive_from_epoch(t);
            let mut remaining = n;
            while remaining > 0 {
                dt += ChronoDuration::days(1);
                let is_weekend = matches!(
                    dt.weekday(),
                    chrono::Weekday::Sat | chrono::Weekday::Sun
                );
                if !is_weekend {
                    remaining -= 1;
                }
            }
            Ok(epoch_from_naive(dt))
        }
        TdPattern::Monthly => {
            let dt = naive_from_epoch(t);
            add_months(dt, n as i32).map(epoch_from_naive)
        }
        TdPattern::Yearly => {
            let dt = naive_from_epoch(t);
            let target_year = dt.year() + n as i32;
            let day = dt.day().min(days_in_month(target_year, dt.month()));
            NaiveDate::from_ymd_opt(target_year, dt.month(), day)
                .map(|d| d.and_time(dt.time()))
                .map(epoch_from_naive)
                .ok_or(TimeError::BadTimestamp)
        }
        TdPattern::EndOfMonthOffset => {
            let dt = naive_from_epoch(t);
            let last_day = days_in_month(dt.year(), dt.month());
            let distance_from_end = last_day - dt.day();
            let advanced = add_months(dt, n as i32)?;
            let new_last_day = days_in_month(advanced.year(), advanced.month());
            let new_day = new_last_day.saturating_sub(distance_from_end).max(1);
            NaiveDate::from_ymd_opt(advanced.year(), advanced.month(), new_day)
                .map(|d| d.and_time(advanced.time()))
                .map(epoch_from_naive)
                .ok_or(TimeError::BadTimestamp)
        }
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let this_month = NaiveDate::from_ymd_opt(year, month, 1);
    match (this_month, next_month) {
        (Some(a), Some(b)) => (b - a).num_days() as u32,
        _ => 30,
    }
}

fn add_months(dt: NaiveDateTime, n: i32) -> Result<NaiveDateTime, TimeError> {
    let total_months = dt.year() * 12 + dt.month() as i32 - 1 + n;
    let year = total_months.div_euclid(12);
    let month = (total_months.rem_euclid(12) + 1) as u32;
    let day = dt.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
        .map(|d| d.and_time(dt.time()))
        .ok_or(TimeError::BadTimestamp)
}

/// The epoch time of local midnight on the day containing `t`, given a
/// timezone offset in hours.
pub fn day_start_time(t: i64, tz_offset_hours: i32) -> i64 {
    let local = t + i64::from(tz_offset_hours) * 3600;
    let dt = naive_from_epoch(local);
    let midnight = dt.date().and_hms_opt(0, 0, 0).expect("midnight is valid");
    epoch_from_naive(midnight) - i64::from(tz_offset_hours) * 3600
}

/// The epoch time of 23:59:59 on the day containing "now" (`t`).
pub fn today_end_time(t: i64, tz_offset_hours: i32) -> i64 {
    day_start_time(t, tz_offset_hours) + DAY - 1
}

/// Advance `t` by `n` calendar days (fixed 86400-second steps).
pub const fn time_add_day(t: i64, n: i64) -> i64 {
    t + n * DAY
}

/// Advance `t` by `n` calendar months, matching `add_to_date` with
/// `TdPattern::Monthly`.
pub fn time_add_month(t: i64, n: i32) -> Result<i64, TimeError> {
    add_to_date(t, TdPattern::Monthly, n.unsigned_abs())
        .map(|advanced| if n < 0 { t - (advanced - t) } else { advanced })
}

pub(crate) fn epoch_to_calendar(epoch: i64, tz_offset_hours: i32) -> (u16, u8, u8, u8, u8, u8) {
    let local = epoch + i64::from(tz_offset_hours) * 3600;
    let dt = naive_from_epoch(local);
    (
        dt.year() as u16,
        dt.month() as u8,
        dt.day() as u8,
        dt.hour() as u8,
        dt.minute() as u8,
        dt.second() as u8,
    )
}

pub(crate) fn calendar_to_epoch(
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    tz_offset_hours: i32,
) -> i64 {
    let date = NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
        .expect("validated calendar fields");
    let dt = date
        .and_hms_opt(u32::from(hour), u32::from(minute), u32::from(second))
        .expect("validated calendar fields");
    epoch_from_naive(dt) - i64::from(tz_offset_hours) * 3600
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn epoch(y: i32, m: u32, d: u32, h: u32, mi: u32) -> i64 {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
            .and_utc()
            .timestamp()
    }

    #[test]
    fn daily_and_weekly_are_fixed_offsets() {
        let t = epoch(2024, 3, 1, 9, 0);
        assert_eq!(add_to_date(t, TdPattern::Daily, 1).unwrap(), t + DAY);
        assert_eq!(add_to_date(t, TdPattern::Weekly, 2).unwrap(), t + 14 * DAY);
        assert_eq!(add_to_date(t, TdPattern::Biweekly, 1).unwrap(), t + 14 * DAY);
    }

    #[test]
    fn workdays_skips_weekends() {
        // 2024-03-01 is a Friday.
        let friday = epoch(2024, 3, 1, 9, 0);
        let advanced = add_to_date(friday, TdPattern::Workdays, 1).unwrap();
        let dt = naive_from_epoch(advanced);
        assert_eq!(dt.weekday(), chrono::Weekday::Mon);
    }

    #[test]
    fn monthly_clamps_short_months() {
        let jan31 = epoch(2024, 1, 31, 8, 0);
        let advanced = add_to_date(jan31, TdPattern::Monthly, 1).unwrap();
        let dt = naive_from_epoch(advanced);
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 2, 29));
    }

    #[test]
    fn end_of_month_offset_preserves_distance_from_end() {
        // Jan 29, 2024 is 2 days before the end of Jan (31 days).
        let t = epoch(2024, 1, 29, 8, 0);
        let advanced = add_to_date(t, TdPattern::EndOfMonthOffset, 1).unwrap();
        let dt = naive_from_epoch(advanced);
        // Feb 2024 has 29 days; 2 days before the end is Feb 27.
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 2, 27));
    }

    #[test]
    fn nonperiodic_is_an_error() {
        let t = epoch(2024, 1, 1, 0, 0);
        assert!(matches!(
            add_to_date(t, TdPattern::NonPeriodic, 1),
            Err(TimeError::NonPeriodic)
        ));
    }

    #[test]
    fn day_start_time_is_local_midnight() {
        let t = epoch(2024, 6, 15, 14, 30);
        let start = day_start_time(t, 0);
        let dt = naive_from_epoch(start);
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (0, 0, 0));
    }

    #[test]
    fn node_id_epoch_round_trip_ignores_minor() {
        let t = epoch(2024, 6, 15, 14, 30);
        let (y, mo, d, h, mi, s) = epoch_to_calendar(t, 0);
        let back = calendar_to_epoch(y, mo, d, h, mi, s, 0);
        assert_eq!(back, t);
    }
}
