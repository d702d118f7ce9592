//! Database models for teachers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::TeacherId;

#[derive(Debug, Clone)]
pub struct TeacherCreateDBRequest {
    pub employee_id: String,
    pub name: String,
    pub subject: String,
    pub classes: i32,
    pub experience: i32,
    pub phone: String,
}

pub type TeacherUpdateDBRequest = TeacherCreateDBRequest;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TeacherDBResponse {
    pub id: TeacherId,
    pub employee_id: String,
    pub name: String,
    pub subject: String,
    pub classes: i32,
    pub experience: i32,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TeacherStats {
    pub total: i64,
    /// Sum of classes taught across all teachers
    pub total_classes: i64,
    /// Years, rounded to one decimal place
    pub average_experience: f64,
    /// Teachers with at least 8 years of experience
    pub senior: i64,
}
