//! Models for the teachers page.

use serde::{Deserialize, Serialize};

use super::{query_value, required, required_int};
use crate::db::models::teachers::{TeacherCreateDBRequest, TeacherDBResponse};
use crate::db::query::{ListFilter, SortDirection};
use crate::errors::Error;
use crate::types::{FILTER_ALL, SUBJECT_OPTIONS, TeacherId};

pub const INCOMPLETE: &str = "Please complete all teacher fields.";
pub const DUPLICATE_ON_ADD: &str = "Employee ID already exists.";
pub const DUPLICATE_ON_UPDATE: &str = "Another teacher already uses this employee ID.";
pub const ADD_FAILED: &str = "Unable to add teacher right now.";
pub const UPDATE_FAILED: &str = "Unable to update teacher right now.";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeacherListQuery {
    pub search: Option<String>,
    pub subject: Option<String>,
    #[serde(rename = "experienceSort")]
    pub experience_sort: Option<String>,
    #[serde(rename = "editId")]
    pub edit_id: Option<String>,
}

impl TeacherListQuery {
    pub fn category(&self) -> &str {
        match query_value(&self.subject) {
            "" => FILTER_ALL,
            subject => subject,
        }
    }

    pub fn sort(&self) -> SortDirection {
        SortDirection::parse(self.experience_sort.as_deref())
    }

    pub fn filter(&self) -> ListFilter {
        ListFilter::new(query_value(&self.search), self.category(), self.sort())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TeacherForm {
    pub employee_id: String,
    pub name: String,
    pub subject: String,
    pub classes: String,
    pub experience: String,
    pub phone: String,
}

impl TeacherForm {
    /// Trimmed fields with counts clamped to be non-negative.
    pub fn validate(&self) -> Result<TeacherCreateDBRequest, Error> {
        Ok(TeacherCreateDBRequest {
            employee_id: required(&self.employee_id, INCOMPLETE)?,
            name: required(&self.name, INCOMPLETE)?,
            subject: required(&self.subject, INCOMPLETE)?,
            classes: required_int(&self.classes, INCOMPLETE)?.max(0),
            experience: required_int(&self.experience, INCOMPLETE)?.max(0),
            phone: required(&self.phone, INCOMPLETE)?,
        })
    }

    pub fn preserve(&self, id: Option<&str>) -> TeacherFormView {
        let subject = self.subject.trim();
        TeacherFormView {
            id: id.map(str::to_string),
            employee_id: self.employee_id.trim().to_string(),
            name: self.name.trim().to_string(),
            subject: if subject.is_empty() { SUBJECT_OPTIONS[0] } else { subject }.to_string(),
            classes: self.classes.trim().to_string(),
            experience: self.experience.trim().to_string(),
            phone: self.phone.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeacherFormView {
    pub id: Option<String>,
    pub employee_id: String,
    pub name: String,
    pub subject: String,
    pub classes: String,
    pub experience: String,
    pub phone: String,
}

impl Default for TeacherFormView {
    fn default() -> Self {
        Self {
            id: None,
            employee_id: String::new(),
            name: String::new(),
            subject: SUBJECT_OPTIONS[0].to_string(),
            classes: String::new(),
            experience: String::new(),
            phone: String::new(),
        }
    }
}

impl From<&TeacherDBResponse> for TeacherFormView {
    fn from(teacher: &TeacherDBResponse) -> Self {
        Self {
            id: Some(teacher.id.to_string()),
            employee_id: teacher.employee_id.clone(),
            name: teacher.name.clone(),
            subject: teacher.subject.clone(),
            classes: teacher.classes.to_string(),
            experience: teacher.experience.to_string(),
            phone: teacher.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TeacherRow {
    pub id: TeacherId,
    pub employee_id: String,
    pub name: String,
    pub subject: String,
    pub classes: i32,
    pub experience: i32,
    pub experience_label: String,
    pub phone: String,
}

impl From<TeacherDBResponse> for TeacherRow {
    fn from(teacher: TeacherDBResponse) -> Self {
        Self {
            id: teacher.id,
            experience_label: format!("{} years", teacher.experience),
            experience: teacher.experience,
            employee_id: teacher.employee_id,
            name: teacher.name,
            subject: teacher.subject,
            classes: teacher.classes,
            phone: teacher.phone,
        }
    }
}
