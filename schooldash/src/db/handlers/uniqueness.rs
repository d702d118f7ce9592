//! Case-insensitive duplicate checks on each entity's identifying field.
//!
//! These checks let a form report a friendly message before writing. Two concurrent writes can
//! both pass the check, so the `LOWER(...)` unique indexes remain the real guard; a write that
//! trips one surfaces as [`DbError::UniqueViolation`](crate::db::errors::DbError::UniqueViolation).

use crate::db::errors::Result;
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

/// An identifying field and the table it lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    StudentRoll,
    TeacherEmployeeId,
    ClassName,
    AnnouncementTitle,
}

impl UniqueField {
    pub fn table(&self) -> &'static str {
        match self {
            UniqueField::StudentRoll => "students",
            UniqueField::TeacherEmployeeId => "teachers",
            UniqueField::ClassName => "classes",
            UniqueField::AnnouncementTitle => "announcements",
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            UniqueField::StudentRoll => "roll",
            UniqueField::TeacherEmployeeId => "employee_id",
            UniqueField::ClassName => "class_name",
            UniqueField::AnnouncementTitle => "title",
        }
    }
}

/// Whether another record already uses `value` for `field`, ignoring case.
///
/// `exclude` skips one record, so an update can keep its own value.
#[instrument(skip(db), err)]
pub async fn is_duplicate(db: &mut PgConnection, field: UniqueField, value: &str, exclude: Option<Uuid>) -> Result<bool> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE LOWER({}) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2))",
        field.table(),
        field.column()
    );

    let exists: bool = sqlx::query_scalar(&sql).bind(value).bind(exclude).fetch_one(&mut *db).await?;

    Ok(exists)
}
