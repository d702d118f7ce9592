//! Database models for classes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::ClassId;

#[derive(Debug, Clone)]
pub struct ClassCreateDBRequest {
    pub class_name: String,
    pub grade: String,
    pub room: String,
    pub class_teacher: String,
    pub capacity: i32,
    /// Must already be clamped to `0..=capacity`
    pub enrolled: i32,
}

pub type ClassUpdateDBRequest = ClassCreateDBRequest;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClassDBResponse {
    pub id: ClassId,
    pub class_name: String,
    pub grade: String,
    pub room: String,
    pub class_teacher: String,
    pub capacity: i32,
    pub enrolled: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClassDBResponse {
    pub fn has_free_seat(&self) -> bool {
        self.enrolled < self.capacity
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ClassStats {
    pub total: i64,
    pub capacity: i64,
    pub enrolled: i64,
    /// Whole percent of seats taken, 0 when there is no capacity
    pub occupancy_rate: i64,
}
