//! Database repository for announcements.
//!
//! Dates are stored as `YYYY-MM-DD` text, which sorts and compares correctly as a string.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::announcements::{
        AnnouncementCreateDBRequest, AnnouncementDBResponse, AnnouncementStats, AnnouncementUpdateDBRequest,
    },
    query::{ListColumns, ListFilter, build_list_query},
};
use crate::types::{AnnouncementId, AnnouncementType, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

const LIST_COLUMNS: ListColumns = ListColumns {
    search: &["title", "message", "audience"],
    category: "type",
    sort: "date",
    created_at: "created_at",
};

pub struct Announcements<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Announcements<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Totals over every announcement. `today` is `YYYY-MM-DD`.
    #[instrument(skip(self), err)]
    pub async fn stats(&mut self, today: &str) -> Result<AnnouncementStats> {
        let (total, events, notices, upcoming): (i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*)::bigint,
                   COUNT(*) FILTER (WHERE type = $1)::bigint,
                   COUNT(*) FILTER (WHERE type = $2)::bigint,
                   COUNT(*) FILTER (WHERE date >= $3)::bigint
            FROM announcements
            "#,
        )
        .bind(AnnouncementType::Event.as_str())
        .bind(AnnouncementType::Notice.as_str())
        .bind(today)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(AnnouncementStats {
            total,
            events,
            notices,
            upcoming,
        })
    }

    /// Announcements with the latest dates first.
    #[instrument(skip(self), err)]
    pub async fn latest(&mut self, limit: i64) -> Result<Vec<AnnouncementDBResponse>> {
        let announcements = sqlx::query_as::<_, AnnouncementDBResponse>(
            "SELECT * FROM announcements ORDER BY date DESC, created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(announcements)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Announcements<'c> {
    type CreateRequest = AnnouncementCreateDBRequest;
    type UpdateRequest = AnnouncementUpdateDBRequest;
    type Response = AnnouncementDBResponse;
    type Id = AnnouncementId;
    type Filter = ListFilter;

    #[instrument(skip(self, request), fields(title = %request.title), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let announcement = sqlx::query_as::<_, AnnouncementDBResponse>(
            r#"
            INSERT INTO announcements (title, message, type, audience, date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&request.title)
        .bind(&request.message)
        .bind(request.kind.as_str())
        .bind(&request.audience)
        .bind(&request.date)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(announcement)
    }

    #[instrument(skip(self), fields(announcement_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let announcement = sqlx::query_as::<_, AnnouncementDBResponse>("SELECT * FROM announcements WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(announcement)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = build_list_query("SELECT * FROM announcements", &LIST_COLUMNS, filter);
        let announcements = query
            .build_query_as::<AnnouncementDBResponse>()
            .fetch_all(&mut *self.db)
            .await?;

        Ok(announcements)
    }

    #[instrument(skip(self), fields(announcement_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM announcements WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(announcement_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let announcement = sqlx::query_as::<_, AnnouncementDBResponse>(
            r#"
            UPDATE announcements
            SET title = $2, message = $3, type = $4, audience = $5, date = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.title)
        .bind(&request.message)
        .bind(request.kind.as_str())
        .bind(&request.audience)
        .bind(&request.date)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(announcement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::query::SortDirection;
    use sqlx::PgPool;

    fn request(title: &str, kind: AnnouncementType, date: &str) -> AnnouncementCreateDBRequest {
        AnnouncementCreateDBRequest {
            title: title.to_string(),
            message: format!("Details about {title}"),
            kind,
            audience: "All".to_string(),
            date: date.to_string(),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_update_delete(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Announcements::new(&mut conn);

        let created = repo
            .create(&request("Sports Day", AnnouncementType::Event, "2026-05-01"))
            .await
            .unwrap();
        assert_eq!(created.kind, "Event");

        let mut change = request("Sports Day", AnnouncementType::Reminder, "2026-05-02");
        change.audience = "Parents".to_string();
        let updated = repo.update(created.id, &change).await.unwrap();
        assert_eq!(updated.kind, "Reminder");
        assert_eq!(updated.audience, "Parents");
        assert_eq!(updated.date, "2026-05-02");

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_type_filter_and_date_sort(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Announcements::new(&mut conn);

        repo.create(&request("Exam week", AnnouncementType::Notice, "2026-03-10")).await.unwrap();
        repo.create(&request("Science fair", AnnouncementType::Event, "2026-02-01")).await.unwrap();
        repo.create(&request("Book drive", AnnouncementType::Campaign, "2026-04-20")).await.unwrap();

        let ascending = repo.list(&ListFilter::new("", "all", SortDirection::Asc)).await.unwrap();
        let dates: Vec<_> = ascending.iter().map(|a| a.date.as_str()).collect();
        assert_eq!(dates, ["2026-02-01", "2026-03-10", "2026-04-20"]);

        let events = repo.list(&ListFilter::new("", "Event", SortDirection::Default)).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Science fair");

        let by_message = repo.list(&ListFilter::new("about book", "all", SortDirection::Default)).await.unwrap();
        assert_eq!(by_message.len(), 1);

        let latest = repo.latest(2).await.unwrap();
        let titles: Vec<_> = latest.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, ["Book drive", "Exam week"]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_stats(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Announcements::new(&mut conn);

        repo.create(&request("Old notice", AnnouncementType::Notice, "2026-01-05")).await.unwrap();
        repo.create(&request("Today event", AnnouncementType::Event, "2026-03-01")).await.unwrap();
        repo.create(&request("Later event", AnnouncementType::Event, "2026-06-01")).await.unwrap();

        let stats = repo.stats("2026-03-01").await.unwrap();
        assert_eq!(
            stats,
            AnnouncementStats {
                total: 3,
                events: 2,
                notices: 1,
                upcoming: 2,
            }
        );
    }
}
