//! Models for the students page.

use serde::{Deserialize, Serialize};

use super::{query_value, required};
use crate::db::models::students::StudentDBResponse;
use crate::db::query::{ListFilter, SortDirection};
use crate::errors::Error;
use crate::types::{DEFAULT_GRADE, FILTER_ALL, StudentId, parse_int_prefix};

pub const INCOMPLETE: &str = "Please complete all student fields.";
pub const DUPLICATE_ON_ADD: &str = "Roll number already exists.";
pub const DUPLICATE_ON_UPDATE: &str = "Another student already uses this roll number.";
pub const ADD_FAILED: &str = "Unable to add student right now.";
pub const UPDATE_FAILED: &str = "Unable to update student right now.";

/// Query string of `GET /students`. The grade filter is accepted as `class` or `grade`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentListQuery {
    pub search: Option<String>,
    pub class: Option<String>,
    pub grade: Option<String>,
    #[serde(rename = "attendanceSort")]
    pub attendance_sort: Option<String>,
    #[serde(rename = "editId")]
    pub edit_id: Option<String>,
}

impl StudentListQuery {
    pub fn category(&self) -> &str {
        let value = self.class.as_deref().or(self.grade.as_deref()).map(str::trim).unwrap_or("");
        if value.is_empty() { FILTER_ALL } else { value }
    }

    pub fn sort(&self) -> SortDirection {
        SortDirection::parse(self.attendance_sort.as_deref())
    }

    pub fn filter(&self) -> ListFilter {
        ListFilter::new(query_value(&self.search), self.category(), self.sort())
    }
}

/// Body of `POST /students/add` and `POST /students/update/{id}`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StudentForm {
    pub roll: String,
    pub name: String,
    pub class: Option<String>,
    pub grade: Option<String>,
    /// Only honoured on update; new students start at 0
    pub attendance: Option<String>,
    pub phone: String,
}

/// Validated student fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentInput {
    pub roll: String,
    pub name: String,
    pub grade: String,
    /// `None` when the form left it blank
    pub attendance: Option<i32>,
    pub phone: String,
}

impl StudentForm {
    /// The submitted grade, falling back to the default grade when absent or blank.
    pub fn grade(&self) -> String {
        let value = self.class.as_deref().or(self.grade.as_deref()).map(str::trim).unwrap_or("");
        if value.is_empty() {
            DEFAULT_GRADE.to_string()
        } else {
            value.to_string()
        }
    }

    pub fn validate(&self) -> Result<StudentInput, Error> {
        let roll = required(&self.roll, INCOMPLETE)?;
        let name = required(&self.name, INCOMPLETE)?;
        let phone = required(&self.phone, INCOMPLETE)?;

        let attendance = match self.attendance.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                parse_int_prefix(raw)
                    .ok_or_else(|| Error::Validation {
                        message: INCOMPLETE.to_string(),
                    })?
                    .clamp(0, 100),
            ),
        };

        Ok(StudentInput {
            roll,
            name,
            grade: self.grade(),
            attendance,
            phone,
        })
    }

    /// Refill values after a failed submit. `id` is set when the submit was an update.
    pub fn preserve(&self, id: Option<&str>) -> StudentFormView {
        StudentFormView {
            id: id.map(str::to_string),
            roll: self.roll.trim().to_string(),
            name: self.name.trim().to_string(),
            class: self.grade(),
            attendance: self.attendance.as_deref().unwrap_or("").trim().to_string(),
            phone: self.phone.trim().to_string(),
        }
    }
}

/// Values shown in the add/edit form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentFormView {
    /// Present when editing an existing student
    pub id: Option<String>,
    pub roll: String,
    pub name: String,
    pub class: String,
    pub attendance: String,
    pub phone: String,
}

impl Default for StudentFormView {
    fn default() -> Self {
        Self {
            id: None,
            roll: String::new(),
            name: String::new(),
            class: DEFAULT_GRADE.to_string(),
            attendance: String::new(),
            phone: String::new(),
        }
    }
}

impl From<&StudentDBResponse> for StudentFormView {
    fn from(student: &StudentDBResponse) -> Self {
        Self {
            id: Some(student.id.to_string()),
            roll: student.roll.clone(),
            name: student.name.clone(),
            class: student.grade.clone(),
            attendance: student.attendance.to_string(),
            phone: student.phone.clone(),
        }
    }
}

/// One row of the student table.
#[derive(Debug, Clone, Serialize)]
pub struct StudentRow {
    pub id: StudentId,
    pub roll: String,
    pub name: String,
    pub class: String,
    pub section: Option<String>,
    pub attendance: i32,
    pub attendance_label: String,
    pub phone: String,
}

impl From<StudentDBResponse> for StudentRow {
    fn from(student: StudentDBResponse) -> Self {
        Self {
            id: student.id,
            attendance_label: format!("{}%", student.attendance),
            attendance: student.attendance,
            roll: student.roll,
            name: student.name,
            class: student.grade,
            section: student.section,
            phone: student.phone,
        }
    }
}
