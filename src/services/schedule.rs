//! Opening-hours arithmetic for reservations and the `isOpen` check.
//!
//! Times are minutes since midnight. A day whose closing time is not after its
//! opening time closes after midnight.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

use crate::config::ReservationConfig;
use crate::database::models::{DayHours, OpeningHours};
use crate::services::error::{ServiceError, ServiceResult};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Parse `"HH:MM"` (24-hour clock).
pub fn parse_hhmm(value: &str) -> Option<u32> {
    let (h, m) = value.split_once(':')?;
    if h.len() != 2 || m.len() != 2 {
        return None;
    }
    let h: u32 = h.parse().ok()?;
    let m: u32 = m.parse().ok()?;
    (h < 24 && m < 60).then_some(h * 60 + m)
}

pub fn format_hhmm(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Opening and closing minute for a day, with closing pushed past midnight
/// when needed. `None` when the day is closed or its hours are unreadable.
fn service_span(day: &DayHours) -> Option<(u32, u32)> {
    if day.is_closed {
        return None;
    }
    let open = parse_hhmm(&day.open)?;
    let mut close = parse_hhmm(&day.close)?;
    if close <= open {
        close += MINUTES_PER_DAY;
    }
    Some((open, close))
}

/// First and last bookable start time for a day. Bookings stay on the
/// calendar day, so the window never reaches past 23:59.
pub fn booking_window(day: &DayHours, last_seating_buffer: u32) -> Option<(u32, u32)> {
    let (open, close) = service_span(day)?;
    let last = close.checked_sub(last_seating_buffer)?.min(MINUTES_PER_DAY - 1);
    (last >= open).then_some((open, last))
}

/// Check a requested reservation start against the day's hours.
pub fn check_reservation_time(hours: &OpeningHours, date: NaiveDate, time: &str, last_seating_buffer: u32) -> ServiceResult<()> {
    let day = hours.for_weekday(date.weekday());
    if day.is_closed {
        return Err(ServiceError::bad_request(format!("The restaurant is closed on {}", date.weekday())));
    }
    let requested = parse_hhmm(time).ok_or_else(|| ServiceError::bad_request(format!("Invalid time '{}'", time)))?;
    let (first, last) = booking_window(day, last_seating_buffer)
        .ok_or_else(|| ServiceError::bad_request("No reservations are taken on that day"))?;

    if requested < first {
        return Err(ServiceError::bad_request(format!(
            "Reservations start at {}",
            format_hhmm(first)
        )));
    }
    if requested > last {
        return Err(ServiceError::bad_request(format!(
            "The last reservation is at {}",
            format_hhmm(last)
        )));
    }
    Ok(())
}

/// Candidate slot start times for a date, in order.
pub fn slot_times(hours: &OpeningHours, date: NaiveDate, config: &ReservationConfig) -> Vec<String> {
    let day = hours.for_weekday(date.weekday());
    let Some((first, last)) = booking_window(day, config.last_seating_buffer_minutes) else {
        return vec![];
    };
    let step = config.slot_interval_minutes.max(1) as usize;
    (first..=last).step_by(step).map(format_hhmm).collect()
}

/// Whether the restaurant is serving at `now`, including spill-over from the
/// previous day's late closing.
pub fn is_open_at(hours: &OpeningHours, now: NaiveDateTime) -> bool {
    let minute = minute_of_day(now);

    let today = hours.for_weekday(now.date().weekday());
    if let Some((open, close)) = service_span(today) {
        if minute >= open && minute < close {
            return true;
        }
    }

    let yesterday = hours.for_weekday((now.date() - Duration::days(1)).weekday());
    match service_span(yesterday) {
        Some((_, close)) if close > MINUTES_PER_DAY => minute < close - MINUTES_PER_DAY,
        _ => false,
    }
}

/// Minute of day for a local timestamp.
pub fn minute_of_day(now: NaiveDateTime) -> u32 {
    now.hour() * 60 + now.minute()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CapacityMode;

    fn day(open: &str, close: &str, is_closed: bool) -> DayHours {
        DayHours {
            open: open.into(),
            close: close.into(),
            is_closed,
        }
    }

    fn week(open: &str, close: &str) -> OpeningHours {
        let d = || day(open, close, false);
        OpeningHours {
            monday: d(),
            tuesday: d(),
            wednesday: d(),
            thursday: d(),
            friday: d(),
            saturday: d(),
            sunday: day(open, close, true),
        }
    }

    fn config() -> ReservationConfig {
        ReservationConfig {
            slot_interval_minutes: 30,
            last_seating_buffer_minutes: 120,
            slot_capacity: 3,
            capacity_mode: CapacityMode::Fixed,
        }
    }

    // 2024-06-03 is a Monday, 2024-06-09 a Sunday.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    #[test]
    fn parses_clock_times() {
        assert_eq!(parse_hhmm("09:00"), Some(540));
        assert_eq!(parse_hhmm("23:59"), Some(1439));
        assert_eq!(parse_hhmm("24:00"), None);
        assert_eq!(parse_hhmm("9:00"), None);
        assert_eq!(parse_hhmm("noon"), None);
        assert_eq!(format_hhmm(1230), "20:30");
    }

    #[test]
    fn last_seating_is_two_hours_before_close() {
        let hours = week("09:00", "22:00");
        assert!(matches!(
            check_reservation_time(&hours, monday(), "20:30", 120),
            Err(ServiceError::BadRequest(_))
        ));
        assert!(check_reservation_time(&hours, monday(), "19:30", 120).is_ok());
        assert!(check_reservation_time(&hours, monday(), "20:00", 120).is_ok());
        assert!(check_reservation_time(&hours, monday(), "08:59", 120).is_err());
    }

    #[test]
    fn closed_day_rejects_every_time() {
        let hours = week("09:00", "22:00");
        let sunday = NaiveDate::from_ymd_opt(2024, 6, 9).unwrap();
        assert!(matches!(
            check_reservation_time(&hours, sunday, "12:00", 120),
            Err(ServiceError::BadRequest(_))
        ));
        assert!(slot_times(&hours, sunday, &config()).is_empty());
    }

    #[test]
    fn slots_run_from_open_to_last_seating() {
        let slots = slot_times(&week("09:00", "22:00"), monday(), &config());
        assert_eq!(slots.first().map(String::as_str), Some("09:00"));
        assert_eq!(slots.last().map(String::as_str), Some("20:00"));
        assert_eq!(slots.len(), 23);
    }

    #[test]
    fn late_closing_extends_past_midnight() {
        let hours = week("18:00", "02:00");
        assert_eq!(booking_window(&hours.monday, 120), Some((18 * 60, 23 * 60 + 59)));

        let monday_late = monday().and_hms_opt(23, 30, 0).unwrap();
        let tuesday_early = NaiveDate::from_ymd_opt(2024, 6, 4).unwrap().and_hms_opt(1, 30, 0).unwrap();
        let tuesday_noon = NaiveDate::from_ymd_opt(2024, 6, 4).unwrap().and_hms_opt(12, 0, 0).unwrap();
        assert!(is_open_at(&hours, monday_late));
        assert!(is_open_at(&hours, tuesday_early));
        assert!(!is_open_at(&hours, tuesday_noon));
    }

    #[test]
    fn open_check_respects_regular_hours() {
        let hours = week("09:00", "22:00");
        assert!(is_open_at(&hours, monday().and_hms_opt(9, 0, 0).unwrap()));
        assert!(!is_open_at(&hours, monday().and_hms_opt(22, 0, 0).unwrap()));
        assert!(!is_open_at(&hours, monday().and_hms_opt(8, 59, 0).unwrap()));
    }
}
