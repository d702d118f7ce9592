//! Database repository for students.
//!
//! Every read joins `classes` so a student carries the name of the class holding its seat
//! (`section`). Seat bookkeeping itself lives in [`Seats`](crate::db::handlers::Seats); this
//! repository only records which class was allocated.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::students::{StudentCreateDBRequest, StudentDBResponse, StudentStats, StudentUpdateDBRequest},
    query::{ListColumns, ListFilter, build_list_query, round_to},
};
use crate::types::{StudentId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

const SELECT_WITH_SECTION: &str = "SELECT s.*, c.class_name AS section FROM students s LEFT JOIN classes c ON c.id = s.class_id";

const LIST_COLUMNS: ListColumns = ListColumns {
    search: &["s.name", "s.roll", "s.phone"],
    category: "s.grade",
    sort: "s.attendance",
    created_at: "s.created_at",
};

/// Attendance percentage from which a student counts towards the high-attendance total.
pub const HIGH_ATTENDANCE: i32 = 95;

pub struct Students<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Students<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn stats(&mut self) -> Result<StudentStats> {
        let (total, average_attendance, high_attendance): (i64, f64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*)::bigint,
                   COALESCE(AVG(attendance), 0)::float8,
                   COUNT(*) FILTER (WHERE attendance >= $1)::bigint
            FROM students
            "#,
        )
        .bind(HIGH_ATTENDANCE)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(StudentStats {
            total,
            average_attendance: round_to(average_attendance, 0) as i64,
            high_attendance,
        })
    }

    #[instrument(skip(self), err)]
    pub async fn recent(&mut self, limit: i64) -> Result<Vec<StudentDBResponse>> {
        let students = sqlx::query_as::<_, StudentDBResponse>(&format!(
            "{SELECT_WITH_SECTION} ORDER BY s.created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(students)
    }

    /// Delete a student and return what was deleted, so the caller can release its seat.
    #[instrument(skip(self), fields(student_id = %abbrev_uuid(&id)), err)]
    pub async fn delete_returning(&mut self, id: StudentId) -> Result<Option<StudentDBResponse>> {
        let student = sqlx::query_as::<_, StudentDBResponse>(
            r#"
            WITH s AS (DELETE FROM students WHERE id = $1 RETURNING *)
            SELECT s.*, c.class_name AS section FROM s LEFT JOIN classes c ON c.id = s.class_id
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(student)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Students<'c> {
    type CreateRequest = StudentCreateDBRequest;
    type UpdateRequest = StudentUpdateDBRequest;
    type Response = StudentDBResponse;
    type Id = StudentId;
    type Filter = ListFilter;

    #[instrument(skip(self, request), fields(roll = %request.roll, grade = %request.grade), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let student = sqlx::query_as::<_, StudentDBResponse>(
            r#"
            WITH s AS (
                INSERT INTO students (roll, name, grade, attendance, phone, class_id)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
            )
            SELECT s.*, c.class_name AS section FROM s LEFT JOIN classes c ON c.id = s.class_id
            "#,
        )
        .bind(&request.roll)
        .bind(&request.name)
        .bind(&request.grade)
        .bind(request.attendance)
        .bind(&request.phone)
        .bind(request.class_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(student)
    }

    #[instrument(skip(self), fields(student_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let student = sqlx::query_as::<_, StudentDBResponse>(&format!("{SELECT_WITH_SECTION} WHERE s.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(student)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = build_list_query(SELECT_WITH_SECTION, &LIST_COLUMNS, filter);
        let students = query.build_query_as::<StudentDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(students)
    }

    #[instrument(skip(self), fields(student_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        Ok(self.delete_returning(id).await?.is_some())
    }

    #[instrument(skip(self, request), fields(student_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let student = sqlx::query_as::<_, StudentDBResponse>(
            r#"
            WITH s AS (
                UPDATE students
                SET roll = $2, name = $3, grade = $4, attendance = COALESCE($5, attendance),
                    phone = $6, class_id = $7, updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT s.*, c.class_name AS section FROM s LEFT JOIN classes c ON c.id = s.class_id
            "#,
        )
        .bind(id)
        .bind(&request.roll)
        .bind(&request.name)
        .bind(&request.grade)
        .bind(request.attendance)
        .bind(&request.phone)
        .bind(request.class_id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(student)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::{Classes, Seats};
    use crate::db::models::classes::ClassCreateDBRequest;
    use crate::db::query::SortDirection;
    use sqlx::PgPool;

    fn request(roll: &str, name: &str, grade: &str, attendance: i32) -> StudentCreateDBRequest {
        StudentCreateDBRequest {
            roll: roll.to_string(),
            name: name.to_string(),
            grade: grade.to_string(),
            attendance,
            phone: format!("555-{roll}"),
            class_id: None,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_section_comes_from_held_class(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        Classes::new(&mut conn)
            .create(&ClassCreateDBRequest {
                class_name: "6A".to_string(),
                grade: "6".to_string(),
                room: "12".to_string(),
                class_teacher: "Mrs. Chen".to_string(),
                capacity: 30,
                enrolled: 0,
            })
            .await
            .unwrap();
        let seat = Seats::new(&mut conn).allocate("6").await.unwrap().unwrap();

        let mut repo = Students::new(&mut conn);
        let mut create = request("A100", "Ada", "6", 0);
        create.class_id = Some(seat.id);
        let student = repo.create(&create).await.unwrap();
        assert_eq!(student.section.as_deref(), Some("6A"));
        assert_eq!(student.attendance, 0);

        let fetched = repo.get_by_id(student.id).await.unwrap().unwrap();
        assert_eq!(fetched.class_id, Some(seat.id));
        assert_eq!(fetched.section.as_deref(), Some("6A"));

        let deleted = repo.delete_returning(student.id).await.unwrap().unwrap();
        assert_eq!(deleted.class_id, Some(seat.id));
        assert!(repo.delete_returning(student.id).await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_keeps_attendance_when_omitted(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Students::new(&mut conn);

        let student = repo.create(&request("B7", "Bo", "7", 88)).await.unwrap();

        let mut update = StudentUpdateDBRequest {
            roll: "B7".to_string(),
            name: "Bo Chen".to_string(),
            grade: "7".to_string(),
            attendance: None,
            phone: "555-0000".to_string(),
            class_id: None,
        };
        let updated = repo.update(student.id, &update).await.unwrap();
        assert_eq!(updated.name, "Bo Chen");
        assert_eq!(updated.attendance, 88);

        update.attendance = Some(91);
        let updated = repo.update(student.id, &update).await.unwrap();
        assert_eq!(updated.attendance, 91);

        let missing = repo.update(uuid::Uuid::new_v4(), &update).await;
        assert!(matches!(missing, Err(DbError::NotFound)));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_roll_unique_ignoring_case(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Students::new(&mut conn);

        repo.create(&request("A100", "Ada", "6", 0)).await.unwrap();
        let err = repo.create(&request("a100", "Alan", "6", 0)).await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_search_is_literal(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Students::new(&mut conn);

        repo.create(&request("R1", "Ann (twin)", "6", 90)).await.unwrap();
        repo.create(&request("R2", "Anna", "7", 70)).await.unwrap();
        repo.create(&request("R_3", "Zed", "6", 99)).await.unwrap();

        let parens = repo.list(&ListFilter::new("(twin", "all", SortDirection::Default)).await.unwrap();
        assert_eq!(parens.len(), 1);
        assert_eq!(parens[0].roll, "R1");

        // `_` is not a wildcard
        let underscore = repo.list(&ListFilter::new("r_", "all", SortDirection::Default)).await.unwrap();
        assert_eq!(underscore.len(), 1);
        assert_eq!(underscore[0].roll, "R_3");

        let grade_six = repo.list(&ListFilter::new("ann", "6", SortDirection::Default)).await.unwrap();
        assert_eq!(grade_six.len(), 1);

        let by_attendance = repo.list(&ListFilter::new("", "all", SortDirection::Desc)).await.unwrap();
        let rolls: Vec<_> = by_attendance.iter().map(|s| s.roll.as_str()).collect();
        assert_eq!(rolls, ["R_3", "R1", "R2"]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_stats(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Students::new(&mut conn);

        assert_eq!(repo.stats().await.unwrap(), StudentStats::default());

        repo.create(&request("S1", "A", "6", 90)).await.unwrap();
        repo.create(&request("S2", "B", "6", 95)).await.unwrap();

        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.average_attendance, 93);
        assert_eq!(stats.high_attendance, 1);

        let recent = repo.recent(4).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].roll, "S2");
    }
}
