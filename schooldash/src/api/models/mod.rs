//! Request and view models for the HTML pages.
//!
//! Per entity:
//!
//! - a `*ListQuery` deserialized from the list page's query string
//! - a `*Form` deserialized from the urlencoded add/update body, with `validate()` producing the
//!   trimmed and clamped input the repositories take
//! - a `*FormView` that refills the form after a failed submit or for editing
//! - a `*Row` with the derived labels a list row displays

pub mod announcements;
pub mod classes;
pub mod students;
pub mod teachers;

use serde::Serialize;

use crate::errors::Error;
use crate::types::parse_int_prefix;

/// One `<option>` of a `<select>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub selected: bool,
}

/// Build options from a fixed list, marking `selected`.
pub fn select_options<'a>(values: impl IntoIterator<Item = &'a str>, selected: &str) -> Vec<SelectOption> {
    values
        .into_iter()
        .map(|value| SelectOption {
            value: value.to_string(),
            selected: value == selected,
        })
        .collect()
}

/// Trimmed value, or the "incomplete" validation error when blank.
pub(crate) fn required(value: &str, incomplete: &str) -> Result<String, Error> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation {
            message: incomplete.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Leniently parsed integer, or the "incomplete" validation error.
pub(crate) fn required_int(value: &str, incomplete: &str) -> Result<i32, Error> {
    parse_int_prefix(value).ok_or_else(|| Error::Validation {
        message: incomplete.to_string(),
    })
}

/// Trimmed query value, empty when absent.
pub(crate) fn query_value(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or("")
}
