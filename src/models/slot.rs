use std::fmt;

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::Serialize;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

/// A half-open `[start, end)` wall-clock interval. `start < end` holds for
/// every value of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Slot {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl Slot {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Option<Self> {
        if start < end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    pub fn overlaps(&self, other: &Slot) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format(TIME_FORMAT),
            self.end.format(TIME_FORMAT)
        )
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// Parse a wall-clock time in any of the shapes clients send and return it
/// truncated to the minute.
///
/// Accepted: `14:30`, `9:05`, `14:30:00`, `2:30 PM`, `2:30pm`, `2 PM`.
pub fn normalize_time(raw: &str) -> Option<NaiveTime> {
    let upper = raw.trim().to_uppercase();

    let (clock, meridiem) = if let Some(rest) = upper.strip_suffix("AM") {
        (rest.trim_end(), Some(false))
    } else if let Some(rest) = upper.strip_suffix("PM") {
        (rest.trim_end(), Some(true))
    } else {
        (upper.as_str(), None)
    };

    let parts: Vec<&str> = clock.split(':').collect();
    let (hour, minute, second) = match (parts.as_slice(), meridiem) {
        ([h], Some(_)) => (parse_field(h, 1, 2)?, 0, 0),
        ([h, m], _) => (parse_field(h, 1, 2)?, parse_field(m, 2, 2)?, 0),
        ([h, m, s], None) => (
            parse_field(h, 1, 2)?,
            parse_field(m, 2, 2)?,
            parse_field(s, 2, 2)?,
        ),
        _ => return None,
    };

    let hour = match meridiem {
        None => hour,
        Some(_) if hour == 0 || hour > 12 => return None,
        Some(false) => hour % 12,
        Some(true) => hour % 12 + 12,
    };

    NaiveTime::from_hms_opt(hour, minute, 0).filter(|_| second < 60)
}

pub fn format_time(time: &NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

fn parse_field(s: &str, min_len: usize, max_len: usize) -> Option<u32> {
    if s.len() < min_len || s.len() > max_len || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Serde adapter writing times as `HH:MM` and reading any shape
/// [`normalize_time`] understands.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_time(time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::normalize_time(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid time: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn slot(start: &str, end: &str) -> Slot {
        Slot::new(t(start), t(end)).unwrap()
    }

    #[test]
    fn test_normalize_24_hour() {
        assert_eq!(normalize_time("14:30"), Some(t("14:30")));
        assert_eq!(normalize_time("09:05"), Some(t("09:05")));
        assert_eq!(normalize_time("9:05"), Some(t("09:05")));
        assert_eq!(normalize_time("00:00"), Some(t("00:00")));
        assert_eq!(normalize_time(" 23:59 "), Some(t("23:59")));
    }

    #[test]
    fn test_normalize_with_seconds_truncates() {
        assert_eq!(normalize_time("14:30:00"), Some(t("14:30")));
        assert_eq!(normalize_time("14:30:45"), Some(t("14:30")));
    }

    #[test]
    fn test_normalize_12_hour() {
        assert_eq!(normalize_time("2:30 PM"), Some(t("14:30")));
        assert_eq!(normalize_time("2:30pm"), Some(t("14:30")));
        assert_eq!(normalize_time("02:30 pm"), Some(t("14:30")));
        assert_eq!(normalize_time("12:00 AM"), Some(t("00:00")));
        assert_eq!(normalize_time("12:15 PM"), Some(t("12:15")));
        assert_eq!(normalize_time("11:59 am"), Some(t("11:59")));
        assert_eq!(normalize_time("7 PM"), Some(t("19:00")));
    }

    #[test]
    fn test_12_and_24_hour_agree() {
        assert_eq!(normalize_time("2:30 PM"), normalize_time("14:30"));
        assert_eq!(normalize_time("9:00 AM"), normalize_time("09:00"));
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        for raw in [
            "", "noon", "24:00", "12:60", "13:00 PM", "0:30 AM", "1:5", "14", "14:30:61",
            "1:2:3:4", "-1:00", "14:3a",
        ] {
            assert_eq!(normalize_time(raw), None, "{raw:?} should be rejected");
        }
    }

    #[test]
    fn test_format_time_zero_pads() {
        assert_eq!(format_time(&t("09:05")), "09:05");
        assert_eq!(format_time(&normalize_time("7 pm").unwrap()), "19:00");
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2025-06-01"),
            NaiveDate::from_ymd_opt(2025, 6, 1)
        );
        assert_eq!(parse_date("2025-02-30"), None);
        assert_eq!(parse_date("06/01/2025"), None);
    }

    #[test]
    fn test_slot_rejects_empty_and_inverted() {
        assert!(Slot::new(t("10:00"), t("10:00")).is_none());
        assert!(Slot::new(t("11:00"), t("10:00")).is_none());
        assert!(Slot::new(t("10:00"), t("10:01")).is_some());
    }

    #[test]
    fn test_overlap_cases() {
        let existing = slot("10:00", "11:00");
        assert!(slot("10:30", "11:30").overlaps(&existing));
        assert!(slot("09:30", "10:30").overlaps(&existing));
        assert!(slot("09:00", "12:00").overlaps(&existing));
        assert!(slot("10:15", "10:45").overlaps(&existing));
        assert!(slot("10:00", "11:00").overlaps(&existing));
    }

    #[test]
    fn test_adjacent_slots_do_not_overlap() {
        let existing = slot("10:00", "11:00");
        assert!(!slot("11:00", "12:00").overlaps(&existing));
        assert!(!slot("09:00", "10:00").overlaps(&existing));
    }

    #[test]
    fn test_slot_serializes_as_hhmm() {
        let json = serde_json::to_value(slot("09:00", "10:30")).unwrap();
        assert_eq!(json, serde_json::json!({"start": "09:00", "end": "10:30"}));
        assert_eq!(slot("09:00", "10:30").to_string(), "09:00-10:30");
        assert_eq!(slot("09:00", "10:30").duration_minutes(), 90);
    }
}
