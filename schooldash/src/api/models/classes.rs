//! Models for the classes page.

use serde::{Deserialize, Serialize};

use super::{query_value, required, required_int};
use crate::db::models::classes::{ClassCreateDBRequest, ClassDBResponse};
use crate::db::query::{ListFilter, SortDirection, percentage};
use crate::errors::Error;
use crate::types::{ClassId, DEFAULT_GRADE, FILTER_ALL};

pub const INCOMPLETE: &str = "Please complete all class fields.";
pub const DUPLICATE_ON_ADD: &str = "Class name already exists.";
pub const DUPLICATE_ON_UPDATE: &str = "Another class already uses this name.";
pub const ADD_FAILED: &str = "Unable to add class right now.";
pub const UPDATE_FAILED: &str = "Unable to update class right now.";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassListQuery {
    pub search: Option<String>,
    pub grade: Option<String>,
    #[serde(rename = "occupancySort")]
    pub occupancy_sort: Option<String>,
    #[serde(rename = "editId")]
    pub edit_id: Option<String>,
}

impl ClassListQuery {
    pub fn category(&self) -> &str {
        match query_value(&self.grade) {
            "" => FILTER_ALL,
            grade => grade,
        }
    }

    pub fn sort(&self) -> SortDirection {
        SortDirection::parse(self.occupancy_sort.as_deref())
    }

    pub fn filter(&self) -> ListFilter {
        ListFilter::new(query_value(&self.search), self.category(), self.sort())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassForm {
    pub class_name: String,
    pub grade: String,
    pub room: String,
    pub class_teacher: String,
    pub capacity: String,
    pub enrolled: String,
}

impl ClassForm {
    /// Trimmed fields; capacity is at least 1 and enrolled is clamped into `0..=capacity`.
    pub fn validate(&self) -> Result<ClassCreateDBRequest, Error> {
        let class_name = required(&self.class_name, INCOMPLETE)?;
        let grade = required(&self.grade, INCOMPLETE)?;
        let room = required(&self.room, INCOMPLETE)?;
        let class_teacher = required(&self.class_teacher, INCOMPLETE)?;
        let capacity = required_int(&self.capacity, INCOMPLETE)?.max(1);
        let enrolled = required_int(&self.enrolled, INCOMPLETE)?.clamp(0, capacity);

        Ok(ClassCreateDBRequest {
            class_name,
            grade,
            room,
            class_teacher,
            capacity,
            enrolled,
        })
    }

    pub fn preserve(&self, id: Option<&str>) -> ClassFormView {
        let grade = self.grade.trim();
        ClassFormView {
            id: id.map(str::to_string),
            class_name: self.class_name.trim().to_string(),
            grade: if grade.is_empty() { DEFAULT_GRADE } else { grade }.to_string(),
            room: self.room.trim().to_string(),
            class_teacher: self.class_teacher.trim().to_string(),
            capacity: self.capacity.trim().to_string(),
            enrolled: self.enrolled.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassFormView {
    pub id: Option<String>,
    pub class_name: String,
    pub grade: String,
    pub room: String,
    pub class_teacher: String,
    pub capacity: String,
    pub enrolled: String,
}

impl Default for ClassFormView {
    fn default() -> Self {
        Self {
            id: None,
            class_name: String::new(),
            grade: DEFAULT_GRADE.to_string(),
            room: String::new(),
            class_teacher: String::new(),
            capacity: String::new(),
            enrolled: String::new(),
        }
    }
}

impl From<&ClassDBResponse> for ClassFormView {
    fn from(class: &ClassDBResponse) -> Self {
        Self {
            id: Some(class.id.to_string()),
            class_name: class.class_name.clone(),
            grade: class.grade.clone(),
            room: class.room.clone(),
            class_teacher: class.class_teacher.clone(),
            capacity: class.capacity.to_string(),
            enrolled: class.enrolled.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassRow {
    pub id: ClassId,
    pub class_name: String,
    pub grade: String,
    pub room: String,
    pub class_teacher: String,
    pub capacity: i32,
    pub enrolled: i32,
    /// `enrolled/capacity`
    pub seats_label: String,
    /// Whole percent
    pub occupancy: i64,
}

impl From<ClassDBResponse> for ClassRow {
    fn from(class: ClassDBResponse) -> Self {
        Self {
            id: class.id,
            seats_label: format!("{}/{}", class.enrolled, class.capacity),
            occupancy: percentage(class.enrolled.into(), class.capacity.into()),
            class_name: class.class_name,
            grade: class.grade,
            room: class.room,
            class_teacher: class.class_teacher,
            capacity: class.capacity,
            enrolled: class.enrolled,
        }
    }
}
