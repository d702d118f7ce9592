//! Common type definitions and the fixed option lists used by the forms.
//!
//! # ID Types
//!
//! All record IDs are UUIDs wrapped in type aliases:
//!
//! - [`StudentId`], [`TeacherId`], [`ClassId`], [`AnnouncementId`]
//!
//! # Utility Functions
//!
//! - [`abbrev_uuid`]: Abbreviate UUIDs to first 8 chars for logging
//! - [`parse_int_prefix`]: Lenient integer parsing for form fields

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// Type aliases for IDs
pub type StudentId = Uuid;
pub type TeacherId = Uuid;
pub type ClassId = Uuid;
pub type AnnouncementId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// Grades a class (and therefore a student) can belong to.
pub const GRADE_OPTIONS: [&str; 5] = ["6", "7", "8", "9", "10"];

/// Grade used when a student form omits one.
pub const DEFAULT_GRADE: &str = "6";

pub const SUBJECT_OPTIONS: [&str; 7] = [
    "Mathematics",
    "Biology",
    "History",
    "English",
    "Chemistry",
    "Physics",
    "Computer Science",
];

pub const AUDIENCE_OPTIONS: [&str; 10] = [
    "All",
    "Teachers",
    "Students",
    "Parents",
    "Grade 6",
    "Grade 7",
    "Grade 8",
    "Grade 9",
    "Grade 10",
    "Grades 7-10",
];

/// Category filter value meaning "no restriction".
pub const FILTER_ALL: &str = "all";

/// Kind of an announcement. Stored as its display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnouncementType {
    Notice,
    Event,
    Campaign,
    Reminder,
}

impl AnnouncementType {
    pub const ALL: [AnnouncementType; 4] = [
        AnnouncementType::Notice,
        AnnouncementType::Event,
        AnnouncementType::Campaign,
        AnnouncementType::Reminder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnnouncementType::Notice => "Notice",
            AnnouncementType::Event => "Event",
            AnnouncementType::Campaign => "Campaign",
            AnnouncementType::Reminder => "Reminder",
        }
    }
}

impl fmt::Display for AnnouncementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AnnouncementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnnouncementType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown announcement type: {s}"))
    }
}

/// Parse the leading integer of a form value, ignoring any trailing garbage.
///
/// Browsers submit number inputs as text and users type things like `"12 students"`; the
/// leading digits are what counts. Returns `None` when there is no leading integer at all.
pub fn parse_int_prefix(raw: &str) -> Option<i32> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    // Saturate instead of failing on absurdly long inputs; callers clamp anyway.
    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    let value = if negative { -magnitude } else { magnitude };
    Some(value.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_prefix() {
        assert_eq!(parse_int_prefix("12"), Some(12));
        assert_eq!(parse_int_prefix("  7 years"), Some(7));
        assert_eq!(parse_int_prefix("-3"), Some(-3));
        assert_eq!(parse_int_prefix("+4"), Some(4));
        assert_eq!(parse_int_prefix("12abc"), Some(12));
        assert_eq!(parse_int_prefix("abc"), None);
        assert_eq!(parse_int_prefix(""), None);
        assert_eq!(parse_int_prefix("-"), None);
        assert_eq!(parse_int_prefix("99999999999999999999"), Some(i32::MAX));
    }

    #[test]
    fn test_announcement_type_round_trip_names() {
        for kind in AnnouncementType::ALL {
            assert_eq!(kind.as_str().parse::<AnnouncementType>().unwrap(), kind);
        }
        assert!("notice".parse::<AnnouncementType>().is_err());
    }

    #[test]
    fn test_abbrev_uuid() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(abbrev_uuid(&id), "550e8400");
    }
}
