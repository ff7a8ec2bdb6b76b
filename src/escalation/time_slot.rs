use chrono::{NaiveTime, Timelike};

use crate::entities::alert::TimeSlot;

/// Customer business-hours settings, each field "HH:MM" in the deployment's
/// local time zone.
#[derive(Debug, Clone, Copy)]
pub struct BusinessHours<'a> {
    pub opening_time: &'a str,
    pub closing_time: &'a str,
    pub night_start: &'a str,
}

impl<'a> BusinessHours<'a> {
    pub fn of(customer: &'a crate::entities::customer::Model) -> Self {
        Self {
            opening_time: &customer.opening_time,
            closing_time: &customer.closing_time,
            night_start: &customer.night_start,
        }
    }
}

/// Parse "HH:MM" to minutes since midnight. Malformed components count as 0,
/// matching how legacy customer records were tolerated.
fn parse_time_to_minutes(time_str: &str) -> u32 {
    let mut parts = time_str.trim().splitn(2, ':');
    let h: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let m: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    h * 60 + m
}

/// Resolve the time slot for a customer at the given local wall-clock time.
///
/// - OPEN_HOURS:  opening_time <= now < closing_time
/// - AFTER_HOURS: closing_time <= now < night_start
/// - NIGHT:       everything else, wrapping past midnight up to opening_time
pub fn resolve(hours: &BusinessHours, at: NaiveTime) -> TimeSlot {
    let open = parse_time_to_minutes(hours.opening_time);
    let close = parse_time_to_minutes(hours.closing_time);
    let night = parse_time_to_minutes(hours.night_start);

    let now = at.hour() * 60 + at.minute();

    if now >= open && now < close {
        return TimeSlot::OpenHours;
    }

    if now >= close && now < night {
        return TimeSlot::AfterHours;
    }

    TimeSlot::Night
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hours() -> BusinessHours<'static> {
        BusinessHours {
            opening_time: "07:00",
            closing_time: "17:00",
            night_start: "23:00",
        }
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn mid_morning_is_open_hours() {
        assert_eq!(resolve(&hours(), at(10, 0)), TimeSlot::OpenHours);
    }

    #[test]
    fn evening_is_after_hours() {
        assert_eq!(resolve(&hours(), at(19, 0)), TimeSlot::AfterHours);
    }

    #[test]
    fn night_wraps_past_midnight() {
        assert_eq!(resolve(&hours(), at(23, 30)), TimeSlot::Night);
        assert_eq!(resolve(&hours(), at(2, 0)), TimeSlot::Night);
    }

    #[test]
    fn boundaries_are_half_open() {
        assert_eq!(resolve(&hours(), at(7, 0)), TimeSlot::OpenHours);
        assert_eq!(resolve(&hours(), at(17, 0)), TimeSlot::AfterHours);
        assert_eq!(resolve(&hours(), at(23, 0)), TimeSlot::Night);
        assert_eq!(resolve(&hours(), at(6, 59)), TimeSlot::Night);
    }

    #[test]
    fn malformed_times_fall_back_to_zero() {
        let broken = BusinessHours {
            opening_time: "oops",
            closing_time: "17:00",
            night_start: "23:00",
        };
        // opening parses as 00:00, so 02:00 counts as open hours
        assert_eq!(resolve(&broken, at(2, 0)), TimeSlot::OpenHours);
    }
}
