//! Database models for announcements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::{AnnouncementId, AnnouncementType};

#[derive(Debug, Clone)]
pub struct AnnouncementCreateDBRequest {
    pub title: String,
    pub message: String,
    pub kind: AnnouncementType,
    pub audience: String,
    /// `YYYY-MM-DD`
    pub date: String,
}

pub type AnnouncementUpdateDBRequest = AnnouncementCreateDBRequest;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnnouncementDBResponse {
    pub id: AnnouncementId,
    pub title: String,
    pub message: String,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub audience: String,
    pub date: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AnnouncementStats {
    pub total: i64,
    pub events: i64,
    pub notices: i64,
    /// Announcements dated today or later
    pub upcoming: i64,
}
