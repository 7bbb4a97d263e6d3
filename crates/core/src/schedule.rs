//! Appointment slots.
//!
//! The shop books services in fixed one-hour slots, four in the morning and
//! four in the afternoon, on weekdays only. Times are shop-local; the shop's
//! UTC offset is passed in explicitly so nothing here depends on the host's
//! time zone.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Utc, Weekday};
use serde::Serialize;
use thiserror::Error;

/// Start hours of the daily slots.
pub const SLOT_HOURS: [u32; 8] = [8, 9, 10, 11, 14, 15, 16, 17];

/// Length of one slot.
pub const SLOT_MINUTES: i64 = 60;

/// Default shop offset (Brasília time, UTC-3).
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = -3;

/// Why a date or slot cannot be booked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("appointments are not available on weekends")]
    Weekend,
    #[error("cannot book a date in the past")]
    PastDate,
    #[error("{0} is not one of the available time slots")]
    UnknownSlot(String),
    #[error("the {0} slot is already taken")]
    SlotTaken(String),
    #[error("invalid UTC offset: {0} hours")]
    InvalidOffset(i32),
}

/// Availability of one candidate slot on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotAvailability {
    /// Slot start, `HH:MM`.
    pub time: String,
    pub available: bool,
}

/// Build a [`FixedOffset`] from whole hours.
///
/// # Errors
///
/// Returns [`ScheduleError::InvalidOffset`] outside ±23 hours.
pub fn shop_offset(hours: i32) -> Result<FixedOffset, ScheduleError> {
    hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .ok_or(ScheduleError::InvalidOffset(hours))
}

/// The daily candidate slots, in order.
#[must_use]
pub fn candidate_slots() -> Vec<NaiveTime> {
    SLOT_HOURS
        .iter()
        .filter_map(|&hour| NaiveTime::from_hms_opt(hour, 0, 0))
        .collect()
}

/// `HH:MM` label of a slot.
#[must_use]
pub fn slot_label(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Parse an `HH:MM` label and check it is one of the candidate slots.
///
/// # Errors
///
/// Returns [`ScheduleError::UnknownSlot`] for anything else.
pub fn parse_slot(label: &str) -> Result<NaiveTime, ScheduleError> {
    NaiveTime::parse_from_str(label.trim(), "%H:%M")
        .ok()
        .filter(|time| candidate_slots().contains(time))
        .ok_or_else(|| ScheduleError::UnknownSlot(label.to_string()))
}

/// Check that `date` can be picked in the date selector.
///
/// Today is allowed; earlier days and weekends are not.
///
/// # Errors
///
/// Returns [`ScheduleError::PastDate`] or [`ScheduleError::Weekend`].
pub fn is_bookable_date(date: NaiveDate, today: NaiveDate) -> Result<(), ScheduleError> {
    if date < today {
        return Err(ScheduleError::PastDate);
    }
    if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        return Err(ScheduleError::Weekend);
    }
    Ok(())
}

/// UTC instant at which `time` on `date` starts, shop-local.
#[must_use]
pub fn slot_start(date: NaiveDate, time: NaiveTime, offset: FixedOffset) -> Option<DateTime<Utc>> {
    date.and_time(time)
        .and_local_timezone(offset)
        .single()
        .map(|local| local.with_timezone(&Utc))
}

/// `[start, end)` of a shop-local calendar day, in UTC.
#[must_use]
pub fn day_bounds(date: NaiveDate, offset: FixedOffset) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = slot_start(date, NaiveTime::MIN, offset)?;
    Some((start, start + Duration::days(1)))
}

/// Reduce booked start instants to the set of occupied `HH:MM` labels.
#[must_use]
pub fn occupied_times<'a, I>(starts: I, offset: FixedOffset) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a DateTime<Utc>>,
{
    starts
        .into_iter()
        .map(|start| slot_label(start.with_timezone(&offset).time()))
        .collect()
}

/// Mark each candidate slot available unless its label is in `occupied`.
#[must_use]
pub fn slot_availability(occupied: &BTreeSet<String>) -> Vec<SlotAvailability> {
    candidate_slots()
        .into_iter()
        .map(|time| {
            let label = slot_label(time);
            SlotAvailability {
                available: !occupied.contains(&label),
                time: label,
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn brt() -> FixedOffset {
        shop_offset(DEFAULT_UTC_OFFSET_HOURS).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_eight_candidate_slots() {
        let labels: Vec<String> = candidate_slots().into_iter().map(slot_label).collect();
        assert_eq!(
            labels,
            ["08:00", "09:00", "10:00", "11:00", "14:00", "15:00", "16:00", "17:00"]
        );
    }

    #[test]
    fn test_two_booked_slots_leave_six_available() {
        // Wednesday 2026-10-21, bookings at 08:00 and 14:00 local time.
        let day = date(2026, 10, 21);
        let starts = [
            slot_start(day, NaiveTime::from_hms_opt(8, 0, 0).unwrap(), brt()).unwrap(),
            slot_start(day, NaiveTime::from_hms_opt(14, 0, 0).unwrap(), brt()).unwrap(),
        ];
        let occupied = occupied_times(&starts, brt());
        let slots = slot_availability(&occupied);

        let unavailable: Vec<&str> = slots
            .iter()
            .filter(|s| !s.available)
            .map(|s| s.time.as_str())
            .collect();
        assert_eq!(unavailable, ["08:00", "14:00"]);
        assert_eq!(slots.iter().filter(|s| s.available).count(), 6);
    }

    #[test]
    fn test_occupied_times_use_shop_offset() {
        // 11:00 UTC is 08:00 in Brasília.
        let start = "2026-10-21T11:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let occupied = occupied_times([&start], brt());
        assert!(occupied.contains("08:00"));
    }

    #[test]
    fn test_weekends_and_past_dates_rejected() {
        let today = date(2026, 10, 19); // Monday
        assert_eq!(is_bookable_date(today, today), Ok(()));
        assert_eq!(
            is_bookable_date(date(2026, 10, 16), today),
            Err(ScheduleError::PastDate)
        );
        assert_eq!(
            is_bookable_date(date(2026, 10, 24), today),
            Err(ScheduleError::Weekend)
        );
        assert_eq!(
            is_bookable_date(date(2026, 10, 25), today),
            Err(ScheduleError::Weekend)
        );
    }

    #[test]
    fn test_parse_slot() {
        assert_eq!(
            parse_slot("14:00").unwrap(),
            NaiveTime::from_hms_opt(14, 0, 0).unwrap()
        );
        assert_eq!(
            parse_slot("12:00"),
            Err(ScheduleError::UnknownSlot("12:00".to_string()))
        );
        assert!(parse_slot("2pm").is_err());
    }

    #[test]
    fn test_day_bounds_cover_one_local_day() {
        let (start, end) = day_bounds(date(2026, 10, 21), brt()).unwrap();
        assert_eq!(start.to_rfc3339(), "2026-10-21T03:00:00+00:00");
        assert_eq!(end - start, Duration::days(1));
    }

    #[test]
    fn test_shop_offset_bounds() {
        assert!(shop_offset(-3).is_ok());
        assert_eq!(shop_offset(30), Err(ScheduleError::InvalidOffset(30)));
    }
}
