//! Database models for students.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::{ClassId, StudentId};

#[derive(Debug, Clone)]
pub struct StudentCreateDBRequest {
    pub roll: String,
    pub name: String,
    pub grade: String,
    pub attendance: i32,
    pub phone: String,
    /// Class whose seat was allocated for this student
    pub class_id: Option<ClassId>,
}

#[derive(Debug, Clone)]
pub struct StudentUpdateDBRequest {
    pub roll: String,
    pub name: String,
    pub grade: String,
    /// `None` keeps the stored attendance
    pub attendance: Option<i32>,
    pub phone: String,
    pub class_id: Option<ClassId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudentDBResponse {
    pub id: StudentId,
    pub roll: String,
    pub name: String,
    pub grade: String,
    pub attendance: i32,
    pub phone: String,
    pub class_id: Option<ClassId>,
    /// Name of the held class, joined in at read time
    pub section: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Whole-table aggregates shown above the student list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StudentStats {
    pub total: i64,
    /// Rounded to a whole percent
    pub average_attendance: i64,
    /// Students at or above 95% attendance
    pub high_attendance: i64,
}
