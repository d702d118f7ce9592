//! Handler for the home dashboard.

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::Response,
};
use chrono::Utc;
use minijinja::context;
use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

use super::{acquire, html};
use crate::AppState;
use crate::api::models::{classes::ClassRow, students::StudentRow, teachers::TeacherRow};
use crate::db::handlers::{Announcements, Classes, Students, Teachers};
use crate::errors::{Error, Result};

const RECENT_ROWS: i64 = 4;
const LATEST_ANNOUNCEMENTS: i64 = 3;

/// One summary card.
#[derive(Debug, Serialize)]
struct StatCard {
    label: &'static str,
    value: String,
    note: String,
}

/// `GET /`
#[instrument(skip_all)]
pub async fn home(State(state): State<AppState>, Extension(pool): Extension<PgPool>) -> Result<Response> {
    let page = async {
        let mut conn = acquire(&pool).await?;
        let students = Students::new(&mut conn).stats().await?;
        let teachers = Teachers::new(&mut conn).stats().await?;
        let classes = Classes::new(&mut conn).stats().await?;

        let recent_students = Students::new(&mut conn).recent(RECENT_ROWS).await?;
        let recent_teachers = Teachers::new(&mut conn).recent(RECENT_ROWS).await?;
        let recent_classes = Classes::new(&mut conn).recent(RECENT_ROWS).await?;
        let announcements = Announcements::new(&mut conn).latest(LATEST_ANNOUNCEMENTS).await?;

        let stats = [
            StatCard {
                label: "Students",
                value: students.total.to_string(),
                note: format!("{}% average attendance", students.average_attendance),
            },
            StatCard {
                label: "Teachers",
                value: teachers.total.to_string(),
                note: format!("{} classes assigned", teachers.total_classes),
            },
            StatCard {
                label: "Classes",
                value: classes.total.to_string(),
                note: format!("{} of {} seats filled", classes.enrolled, classes.capacity),
            },
            StatCard {
                label: "Occupancy",
                value: format!("{}%", classes.occupancy_rate),
                note: "Across all classes".to_string(),
            },
        ];

        let body = state.views.render(
            "home.html",
            context! {
                title => "Dashboard",
                subtitle => "Overview of the school",
                active => "home",
                date => Utc::now().format("%A, %B %-d, %Y").to_string(),
                stats,
                announcements,
                students => recent_students.into_iter().map(StudentRow::from).collect::<Vec<_>>(),
                teachers => recent_teachers.into_iter().map(TeacherRow::from).collect::<Vec<_>>(),
                classes => recent_classes.into_iter().map(ClassRow::from).collect::<Vec<_>>(),
            },
        )?;
        Ok::<_, Error>(body)
    }
    .await;

    match page {
        Ok(body) => Ok(html(StatusCode::OK, body)),
        Err(err) => {
            tracing::error!("Failed to load dashboard: {:#}", err);
            Err(Error::Internal {
                operation: "load dashboard".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use sqlx::PgPool;

    use crate::test_utils::{create_test_app, create_test_class, create_test_student};

    #[sqlx::test]
    #[test_log::test]
    async fn test_empty_dashboard(pool: PgPool) {
        let server = create_test_app(pool);

        let response = server.get("/").await;

        response.assert_status_ok();
        let text = response.text();
        assert!(text.contains("Dashboard"));
        assert!(text.contains("No announcements yet."));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_dashboard_shows_totals_and_recent_rows(pool: PgPool) {
        create_test_class(&pool, "6A", "6", 4, 0).await;
        create_test_student(&pool, "R1", "Ada Lovelace", "6").await;
        let server = create_test_app(pool);

        let response = server.get("/").await;

        response.assert_status(StatusCode::OK);
        let text = response.text();
        assert!(text.contains("Ada Lovelace"));
        assert!(text.contains("1 of 4 seats filled"));
        assert!(text.contains("25%"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_dashboard_failure_is_generic(pool: PgPool) {
        sqlx::query("DROP TABLE announcements").execute(&pool).await.unwrap();
        let server = create_test_app(pool);

        let response = server.get("/").await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.text(), "Unable to load dashboard.");
    }
}
