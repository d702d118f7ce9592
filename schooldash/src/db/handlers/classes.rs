//! Database repository for classes.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::classes::{ClassCreateDBRequest, ClassDBResponse, ClassStats, ClassUpdateDBRequest},
    query::{ListColumns, ListFilter, build_list_query, percentage},
};
use crate::types::{ClassId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

const LIST_COLUMNS: ListColumns = ListColumns {
    search: &["class_name", "room", "class_teacher"],
    category: "grade",
    // Whole occupancy percent, so classes that display the same rate keep insertion order
    sort: "ROUND(enrolled * 100.0 / capacity)",
    created_at: "created_at",
};

pub struct Classes<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Classes<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Totals over every class, ignoring any list filter.
    #[instrument(skip(self), err)]
    pub async fn stats(&mut self) -> Result<ClassStats> {
        let (total, capacity, enrolled): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*)::bigint,
                   COALESCE(SUM(capacity), 0)::bigint,
                   COALESCE(SUM(enrolled), 0)::bigint
            FROM classes
            "#,
        )
        .fetch_one(&mut *self.db)
        .await?;

        Ok(ClassStats {
            total,
            capacity,
            enrolled,
            occupancy_rate: percentage(enrolled, capacity),
        })
    }

    /// Most recently created classes first.
    #[instrument(skip(self), err)]
    pub async fn recent(&mut self, limit: i64) -> Result<Vec<ClassDBResponse>> {
        let classes = sqlx::query_as::<_, ClassDBResponse>("SELECT * FROM classes ORDER BY created_at DESC LIMIT $1")
            .bind(limit)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(classes)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Classes<'c> {
    type CreateRequest = ClassCreateDBRequest;
    type UpdateRequest = ClassUpdateDBRequest;
    type Response = ClassDBResponse;
    type Id = ClassId;
    type Filter = ListFilter;

    #[instrument(skip(self, request), fields(class_name = %request.class_name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let class = sqlx::query_as::<_, ClassDBResponse>(
            r#"
            INSERT INTO classes (class_name, grade, room, class_teacher, capacity, enrolled)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&request.class_name)
        .bind(&request.grade)
        .bind(&request.room)
        .bind(&request.class_teacher)
        .bind(request.capacity)
        .bind(request.enrolled)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(class)
    }

    #[instrument(skip(self), fields(class_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let class = sqlx::query_as::<_, ClassDBResponse>("SELECT * FROM classes WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(class)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = build_list_query("SELECT * FROM classes", &LIST_COLUMNS, filter);
        let classes = query.build_query_as::<ClassDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(classes)
    }

    #[instrument(skip(self), fields(class_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM classes WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(class_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let class = sqlx::query_as::<_, ClassDBResponse>(
            r#"
            UPDATE classes
            SET class_name = $2, grade = $3, room = $4, class_teacher = $5,
                capacity = $6, enrolled = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.class_name)
        .bind(&request.grade)
        .bind(&request.room)
        .bind(&request.class_teacher)
        .bind(request.capacity)
        .bind(request.enrolled)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(class)
    }
}
