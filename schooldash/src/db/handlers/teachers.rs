//! Database repository for teachers.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::teachers::{TeacherCreateDBRequest, TeacherDBResponse, TeacherStats, TeacherUpdateDBRequest},
    query::{ListColumns, ListFilter, build_list_query, round_to},
};
use crate::types::{TeacherId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

const LIST_COLUMNS: ListColumns = ListColumns {
    search: &["name", "employee_id", "phone"],
    category: "subject",
    sort: "experience",
    created_at: "created_at",
};

/// Years of experience from which a teacher counts as senior.
pub const SENIOR_EXPERIENCE_YEARS: i32 = 8;

pub struct Teachers<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Teachers<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn stats(&mut self) -> Result<TeacherStats> {
        let (total, total_classes, average_experience, senior): (i64, i64, f64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*)::bigint,
                   COALESCE(SUM(classes), 0)::bigint,
                   COALESCE(AVG(experience), 0)::float8,
                   COUNT(*) FILTER (WHERE experience >= $1)::bigint
            FROM teachers
            "#,
        )
        .bind(SENIOR_EXPERIENCE_YEARS)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(TeacherStats {
            total,
            total_classes,
            average_experience: round_to(average_experience, 1),
            senior,
        })
    }

    #[instrument(skip(self), err)]
    pub async fn recent(&mut self, limit: i64) -> Result<Vec<TeacherDBResponse>> {
        let teachers = sqlx::query_as::<_, TeacherDBResponse>("SELECT * FROM teachers ORDER BY created_at DESC LIMIT $1")
            .bind(limit)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(teachers)
    }

    /// Every teacher's name, alphabetically. Offered as class teacher choices.
    #[instrument(skip(self), err)]
    pub async fn names(&mut self) -> Result<Vec<String>> {
        let names = sqlx::query_scalar("SELECT name FROM teachers ORDER BY name ASC")
            .fetch_all(&mut *self.db)
            .await?;

        Ok(names)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Teachers<'c> {
    type CreateRequest = TeacherCreateDBRequest;
    type UpdateRequest = TeacherUpdateDBRequest;
    type Response = TeacherDBResponse;
    type Id = TeacherId;
    type Filter = ListFilter;

    #[instrument(skip(self, request), fields(employee_id = %request.employee_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let teacher = sqlx::query_as::<_, TeacherDBResponse>(
            r#"
            INSERT INTO teachers (employee_id, name, subject, classes, experience, phone)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&request.employee_id)
        .bind(&request.name)
        .bind(&request.subject)
        .bind(request.classes)
        .bind(request.experience)
        .bind(&request.phone)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(teacher)
    }

    #[instrument(skip(self), fields(teacher_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let teacher = sqlx::query_as::<_, TeacherDBResponse>("SELECT * FROM teachers WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(teacher)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = build_list_query("SELECT * FROM teachers", &LIST_COLUMNS, filter);
        let teachers = query.build_query_as::<TeacherDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(teachers)
    }

    #[instrument(skip(self), fields(teacher_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM teachers WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(teacher_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let teacher = sqlx::query_as::<_, TeacherDBResponse>(
            r#"
            UPDATE teachers
            SET employee_id = $2, name = $3, subject = $4, classes = $5,
                experience = $6, phone = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.employee_id)
        .bind(&request.name)
        .bind(&request.subject)
        .bind(request.classes)
        .bind(request.experience)
        .bind(&request.phone)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(teacher)
    }
}
