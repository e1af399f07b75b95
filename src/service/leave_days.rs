//! Leave-day arithmetic on office hours.
//!
//! A working day is split into a morning half (09:30 - 13:30) and an
//! afternoon half (13:30 - 18:00). A leave request is charged half a day for
//! every half its window overlaps.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use derive_more::Display;

use crate::error::ApiError;

const OFFICE_START: u32 = 9 * 3600 + 30 * 60;
const HALF_DAY_CUTOFF: u32 = 13 * 3600 + 30 * 60;
const OFFICE_END: u32 = 18 * 3600;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum LeaveSpanError {
    #[display(fmt = "leave must end after it starts")]
    EndBeforeStart,
    #[display(fmt = "leave window does not cover any office hours")]
    NoWorkingTime,
}

impl std::error::Error for LeaveSpanError {}

impl From<LeaveSpanError> for ApiError {
    fn from(e: LeaveSpanError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

fn seconds(time: NaiveTime) -> u32 {
    time.num_seconds_from_midnight()
}

/// Halves still available on the first day when leave starts at `start`.
fn halves_from(start: NaiveTime) -> u32 {
    let s = seconds(start);
    u32::from(s < HALF_DAY_CUTOFF) + u32::from(s < OFFICE_END)
}

/// Halves consumed on the last day when leave ends at `end`.
fn halves_until(end: NaiveTime) -> u32 {
    let e = seconds(end);
    u32::from(e > OFFICE_START) + u32::from(e > HALF_DAY_CUTOFF)
}

/// Computes the number of leave days for the window `[start, end]`.
///
/// Results are multiples of 0.5 and never below 0.5.
pub fn leave_days(start: NaiveDateTime, end: NaiveDateTime) -> Result<f64, LeaveSpanError> {
    if end <= start {
        return Err(LeaveSpanError::EndBeforeStart);
    }

    let halves = if start.date() == end.date() {
        let (s, e) = (seconds(start.time()), seconds(end.time()));
        let morning = s < HALF_DAY_CUTOFF && e > OFFICE_START;
        let afternoon = s < OFFICE_END && e > HALF_DAY_CUTOFF;
        u32::from(morning) + u32::from(afternoon)
    } else {
        let between = (end.date() - start.date()).num_days() - 1;
        let between = u32::try_from(between).unwrap_or(0);
        halves_from(start.time()) + between * 2 + halves_until(end.time())
    };

    if halves == 0 {
        return Err(LeaveSpanError::NoWorkingTime);
    }

    Ok(f64::from(halves) / 2.0)
}

/// Convenience wrapper taking the date and time columns of a leave form.
pub fn leave_days_between(
    start_date: NaiveDate,
    start_time: NaiveTime,
    end_date: NaiveDate,
    end_time: NaiveTime,
) -> Result<f64, LeaveSpanError> {
    leave_days(start_date.and_time(start_time), end_date.and_time(end_time))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn same_day_morning_is_half() {
        assert_eq!(leave_days(at(2, 9, 30), at(2, 13, 0)), Ok(0.5));
        assert_eq!(leave_days(at(2, 9, 30), at(2, 13, 30)), Ok(0.5));
    }

    #[test]
    fn same_day_afternoon_is_half() {
        assert_eq!(leave_days(at(2, 13, 30), at(2, 18, 0)), Ok(0.5));
        assert_eq!(leave_days(at(2, 15, 0), at(2, 17, 0)), Ok(0.5));
    }

    #[test]
    fn same_day_across_cutoff_is_full() {
        assert_eq!(leave_days(at(2, 9, 30), at(2, 18, 0)), Ok(1.0));
        assert_eq!(leave_days(at(2, 8, 0), at(2, 19, 0)), Ok(1.0));
        assert_eq!(leave_days(at(2, 12, 0), at(2, 14, 0)), Ok(1.0));
    }

    #[test]
    fn multi_day_counts_partial_ends() {
        // full first day, one full day between, morning on the last day
        assert_eq!(leave_days(at(2, 9, 30), at(4, 13, 30)), Ok(2.5));
        // afternoon start, full last day
        assert_eq!(leave_days(at(2, 14, 0), at(4, 18, 0)), Ok(2.5));
        // afternoon start, morning end
        assert_eq!(leave_days(at(2, 13, 30), at(3, 13, 30)), Ok(1.0));
        assert_eq!(leave_days(at(2, 9, 30), at(6, 18, 0)), Ok(5.0));
    }

    #[test]
    fn edges_outside_office_hours_add_nothing() {
        // starts after close, ends before opening the next morning
        assert_eq!(
            leave_days(at(2, 18, 30), at(3, 9, 0)),
            Err(LeaveSpanError::NoWorkingTime)
        );
        assert_eq!(leave_days(at(2, 18, 30), at(3, 13, 0)), Ok(0.5));
    }

    #[test]
    fn rejects_inverted_or_empty_windows() {
        assert_eq!(
            leave_days(at(3, 9, 30), at(2, 18, 0)),
            Err(LeaveSpanError::EndBeforeStart)
        );
        assert_eq!(
            leave_days(at(2, 10, 0), at(2, 10, 0)),
            Err(LeaveSpanError::EndBeforeStart)
        );
        assert_eq!(
            leave_days(at(2, 19, 0), at(2, 21, 0)),
            Err(LeaveSpanError::NoWorkingTime)
        );
        assert_eq!(
            leave_days(at(2, 7, 0), at(2, 9, 0)),
            Err(LeaveSpanError::NoWorkingTime)
        );
    }
}
