//! Test utilities for integration testing (available with `test-utils` feature).

use axum_test::TestServer;
use sqlx::PgPool;

use crate::config::{Config, DatabaseConfig, PoolSettings};
use crate::db::{
    handlers::{Announcements, Classes, Repository, Seats, Students, Teachers},
    models::{
        announcements::{AnnouncementCreateDBRequest, AnnouncementDBResponse},
        classes::{ClassCreateDBRequest, ClassDBResponse},
        students::{StudentCreateDBRequest, StudentDBResponse},
        teachers::{TeacherCreateDBRequest, TeacherDBResponse},
    },
};
use crate::types::AnnouncementType;

/// A test server for the full router, backed by `pool`.
pub fn create_test_app(pool: PgPool) -> TestServer {
    crate::Application::from_pool(create_test_config(), pool)
        .expect("Failed to create application")
        .into_test_server()
}

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: None,
        database: DatabaseConfig {
            // Replaced by the pool each test is handed
            url: "postgres://localhost:5432/schooldash_test".to_string(),
            pool: PoolSettings {
                max_connections: 2,
                min_connections: 0,
                ..Default::default()
            },
        },
        enable_otel_export: false,
    }
}

pub async fn create_test_class(pool: &PgPool, name: &str, grade: &str, capacity: i32, enrolled: i32) -> ClassDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Classes::new(&mut conn)
        .create(&ClassCreateDBRequest {
            class_name: name.to_string(),
            grade: grade.to_string(),
            room: format!("Room {name}"),
            class_teacher: "Test Teacher".to_string(),
            capacity,
            enrolled,
        })
        .await
        .expect("Failed to create test class")
}

/// Create a student holding a seat in `grade`, the way an admission through the form would.
/// Panics when the grade has no free seat.
pub async fn create_test_student(pool: &PgPool, roll: &str, name: &str, grade: &str) -> StudentDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let class = Seats::new(&mut conn)
        .allocate(grade)
        .await
        .expect("Failed to allocate seat")
        .expect("No free seat for test student");

    Students::new(&mut conn)
        .create(&StudentCreateDBRequest {
            roll: roll.to_string(),
            name: name.to_string(),
            grade: grade.to_string(),
            attendance: 0,
            phone: "555-0100".to_string(),
            class_id: Some(class.id),
        })
        .await
        .expect("Failed to create test student")
}

pub async fn create_test_teacher(pool: &PgPool, employee_id: &str, name: &str, subject: &str) -> TeacherDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Teachers::new(&mut conn)
        .create(&TeacherCreateDBRequest {
            employee_id: employee_id.to_string(),
            name: name.to_string(),
            subject: subject.to_string(),
            classes: 2,
            experience: 5,
            phone: "555-0101".to_string(),
        })
        .await
        .expect("Failed to create test teacher")
}

pub async fn create_test_announcement(
    pool: &PgPool,
    title: &str,
    kind: AnnouncementType,
    date: &str,
) -> AnnouncementDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Announcements::new(&mut conn)
        .create(&AnnouncementCreateDBRequest {
            title: title.to_string(),
            message: format!("Details about {title}"),
            kind,
            audience: "All".to_string(),
            date: date.to_string(),
        })
        .await
        .expect("Failed to create test announcement")
}
