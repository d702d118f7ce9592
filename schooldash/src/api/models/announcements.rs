//! Models for the announcements page.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{query_value, required};
use crate::db::models::announcements::{AnnouncementCreateDBRequest, AnnouncementDBResponse};
use crate::db::query::{ListFilter, SortDirection};
use crate::errors::Error;
use crate::types::{AUDIENCE_OPTIONS, AnnouncementId, AnnouncementType, FILTER_ALL};

pub const INCOMPLETE: &str = "Please complete all announcement fields.";
pub const INVALID_TYPE: &str = "Please choose a valid announcement type.";
pub const INVALID_DATE: &str = "Please enter the date as YYYY-MM-DD.";
pub const DUPLICATE_ON_ADD: &str = "Announcement title already exists.";
pub const DUPLICATE_ON_UPDATE: &str = "Another announcement already uses this title.";
pub const ADD_FAILED: &str = "Unable to add announcement right now.";
pub const UPDATE_FAILED: &str = "Unable to update announcement right now.";

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnouncementListQuery {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(rename = "dateSort")]
    pub date_sort: Option<String>,
    #[serde(rename = "editId")]
    pub edit_id: Option<String>,
}

impl AnnouncementListQuery {
    pub fn category(&self) -> &str {
        match query_value(&self.kind) {
            "" => FILTER_ALL,
            kind => kind,
        }
    }

    pub fn sort(&self) -> SortDirection {
        SortDirection::parse(self.date_sort.as_deref())
    }

    pub fn filter(&self) -> ListFilter {
        ListFilter::new(query_value(&self.search), self.category(), self.sort())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AnnouncementForm {
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub audience: String,
    pub date: String,
}

impl AnnouncementForm {
    /// Trimmed fields with a known type and the date normalised to `YYYY-MM-DD`.
    pub fn validate(&self) -> Result<AnnouncementCreateDBRequest, Error> {
        let title = required(&self.title, INCOMPLETE)?;
        let message = required(&self.message, INCOMPLETE)?;
        let kind = required(&self.kind, INCOMPLETE)?;
        let audience = required(&self.audience, INCOMPLETE)?;
        let date = required(&self.date, INCOMPLETE)?;

        let kind = kind.parse::<AnnouncementType>().map_err(|_| Error::Validation {
            message: INVALID_TYPE.to_string(),
        })?;
        let date = NaiveDate::parse_from_str(&date, DATE_FORMAT).map_err(|_| Error::Validation {
            message: INVALID_DATE.to_string(),
        })?;

        Ok(AnnouncementCreateDBRequest {
            title,
            message,
            kind,
            audience,
            date: date.format(DATE_FORMAT).to_string(),
        })
    }

    pub fn preserve(&self, id: Option<&str>) -> AnnouncementFormView {
        let kind = self.kind.trim();
        let audience = self.audience.trim();
        AnnouncementFormView {
            id: id.map(str::to_string),
            title: self.title.trim().to_string(),
            message: self.message.trim().to_string(),
            kind: if kind.is_empty() { AnnouncementType::Notice.as_str() } else { kind }.to_string(),
            audience: if audience.is_empty() { AUDIENCE_OPTIONS[0] } else { audience }.to_string(),
            date: self.date.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnouncementFormView {
    pub id: Option<String>,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub audience: String,
    pub date: String,
}

impl Default for AnnouncementFormView {
    fn default() -> Self {
        Self {
            id: None,
            title: String::new(),
            message: String::new(),
            kind: AnnouncementType::Notice.as_str().to_string(),
            audience: AUDIENCE_OPTIONS[0].to_string(),
            date: String::new(),
        }
    }
}

impl From<&AnnouncementDBResponse> for AnnouncementFormView {
    fn from(announcement: &AnnouncementDBResponse) -> Self {
        Self {
            id: Some(announcement.id.to_string()),
            title: announcement.title.clone(),
            message: announcement.message.clone(),
            kind: announcement.kind.clone(),
            audience: announcement.audience.clone(),
            date: announcement.date.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnouncementRow {
    pub id: AnnouncementId,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub audience: String,
    pub date: String,
}

impl From<AnnouncementDBResponse> for AnnouncementRow {
    fn from(announcement: AnnouncementDBResponse) -> Self {
        Self {
            id: announcement.id,
            title: announcement.title,
            message: announcement.message,
            kind: announcement.kind,
            audience: announcement.audience,
            date: announcement.date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(kind: &str, date: &str) -> AnnouncementForm {
        AnnouncementForm {
            title: " Sports Day ".to_string(),
            message: "Bring water".to_string(),
            kind: kind.to_string(),
            audience: "Students".to_string(),
            date: date.to_string(),
        }
    }

    #[test]
    fn test_valid_form() {
        let input = form("Event", "2026-05-01").validate().unwrap();
        assert_eq!(input.title, "Sports Day");
        assert_eq!(input.kind, AnnouncementType::Event);
        assert_eq!(input.date, "2026-05-01");
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = form("Party", "2026-05-01").validate().unwrap_err();
        assert_eq!(err.form_message(ADD_FAILED), INVALID_TYPE);
    }

    #[test]
    fn test_date_must_be_a_calendar_date() {
        assert_eq!(
            form("Notice", "01/05/2026").validate().unwrap_err().form_message(ADD_FAILED),
            INVALID_DATE
        );
        assert!(form("Notice", "2026-02-30").validate().is_err());
        assert_eq!(
            form("Notice", "").validate().unwrap_err().form_message(ADD_FAILED),
            INCOMPLETE
        );
    }

    #[test]
    fn test_type_field_name() {
        let f: AnnouncementForm =
            serde_urlencoded::from_str("title=Fair&message=Hall&type=Campaign&audience=All&date=2026-04-02").unwrap();
        assert_eq!(f.validate().unwrap().kind, AnnouncementType::Campaign);

        let q: AnnouncementListQuery = serde_urlencoded::from_str("type=Event&dateSort=desc").unwrap();
        assert_eq!(q.category(), "Event");
        assert_eq!(q.sort(), SortDirection::Desc);
    }
}
