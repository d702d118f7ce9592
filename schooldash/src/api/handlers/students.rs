//! Handlers for the students page.
//!
//! Adding a student takes a seat in the least-filled class of its grade; a grade change on update
//! takes a seat in the new grade and gives the old one back; deleting a student gives its seat
//! back. A failed write after a seat was taken releases that seat again.

use axum::{
    Extension, Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use minijinja::context;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, error, info, instrument};

use super::{acquire, conflict_on_unique, html, load_failure, log_write_failure, parse_record_id, release_seat};
use crate::AppState;
use crate::api::models::{
    select_options,
    students::{
        ADD_FAILED, DUPLICATE_ON_ADD, DUPLICATE_ON_UPDATE, StudentForm, StudentFormView, StudentListQuery, StudentRow,
        UPDATE_FAILED,
    },
};
use crate::db::{
    errors::DbError,
    handlers::{Repository, Seats, Students, UniqueField, uniqueness::is_duplicate},
    models::students::{StudentCreateDBRequest, StudentDBResponse, StudentUpdateDBRequest},
};
use crate::errors::{Error, Result};
use crate::types::{ClassId, GRADE_OPTIONS, abbrev_uuid};

const PAGE: &str = "/students";

/// `GET /students`
#[instrument(skip_all)]
pub async fn list_students(
    State(state): State<AppState>,
    Extension(pool): Extension<PgPool>,
    Query(query): Query<StudentListQuery>,
) -> Result<Response> {
    render_page(&state, &pool, &query, StatusCode::OK, None, None).await
}

/// `POST /students/add`
#[instrument(skip_all, fields(roll = %form.roll.trim()))]
pub async fn add_student(
    State(state): State<AppState>,
    Extension(pool): Extension<PgPool>,
    Query(query): Query<StudentListQuery>,
    Form(form): Form<StudentForm>,
) -> Result<Response> {
    match create_student(&pool, &form).await {
        Ok(student) => {
            info!(
                student_id = %abbrev_uuid(&student.id),
                section = student.section.as_deref().unwrap_or("-"),
                "Student added"
            );
            Ok(Redirect::to(PAGE).into_response())
        }
        Err(err) => {
            log_write_failure("add student", &err);
            let message = err.form_message(ADD_FAILED);
            render_page(&state, &pool, &query, err.status_code(), Some(message), Some(form.preserve(None))).await
        }
    }
}

/// `POST /students/update/{id}`
#[instrument(skip_all, fields(student_id = %id))]
pub async fn update_student(
    State(state): State<AppState>,
    Extension(pool): Extension<PgPool>,
    Path(id): Path<String>,
    Query(query): Query<StudentListQuery>,
    Form(form): Form<StudentForm>,
) -> Result<Response> {
    match modify_student(&pool, &id, &form).await {
        Ok(_) => {
            info!("Student updated");
            Ok(Redirect::to(PAGE).into_response())
        }
        Err(err) => {
            log_write_failure("update student", &err);
            let message = err.form_message(UPDATE_FAILED);
            let form = (!err.is_terminal()).then(|| form.preserve(Some(&id)));
            render_page(&state, &pool, &query, err.status_code(), Some(message), form).await
        }
    }
}

/// `POST /students/delete/{id}`. Always redirects back to the list.
#[instrument(skip_all, fields(student_id = %id))]
pub async fn delete_student(Extension(pool): Extension<PgPool>, Path(id): Path<String>) -> Redirect {
    if let Err(err) = remove_student(&pool, &id).await {
        error!("Failed to delete student: {:#}", err);
    }
    Redirect::to(PAGE)
}

async fn create_student(pool: &PgPool, form: &StudentForm) -> Result<StudentDBResponse> {
    let input = form.validate()?;
    let mut conn = acquire(pool).await?;

    if is_duplicate(&mut conn, UniqueField::StudentRoll, &input.roll, None).await? {
        return Err(Error::Conflict {
            message: DUPLICATE_ON_ADD.to_string(),
        });
    }

    let seat = take_seat(&mut conn, &input.grade).await?;
    let request = StudentCreateDBRequest {
        roll: input.roll,
        name: input.name,
        grade: input.grade,
        attendance: 0,
        phone: input.phone,
        class_id: Some(seat),
    };

    match Students::new(&mut conn).create(&request).await {
        Ok(student) => Ok(student),
        Err(err) => {
            release_seat(&mut conn, seat).await;
            Err(conflict_on_unique(err, DUPLICATE_ON_ADD))
        }
    }
}

async fn modify_student(pool: &PgPool, raw_id: &str, form: &StudentForm) -> Result<StudentDBResponse> {
    let input = form.validate()?;
    let not_found = || Error::NotFound {
        resource: "Student".to_string(),
        id: raw_id.to_string(),
    };
    let id = parse_record_id(raw_id).ok_or_else(not_found)?;

    let mut conn = acquire(pool).await?;
    let existing = Students::new(&mut conn).get_by_id(id).await?.ok_or_else(not_found)?;

    if is_duplicate(&mut conn, UniqueField::StudentRoll, &input.roll, Some(id)).await? {
        return Err(Error::Conflict {
            message: DUPLICATE_ON_UPDATE.to_string(),
        });
    }

    let new_seat = if input.grade != existing.grade {
        Some(take_seat(&mut conn, &input.grade).await?)
    } else {
        None
    };

    let request = StudentUpdateDBRequest {
        roll: input.roll,
        name: input.name,
        grade: input.grade,
        attendance: input.attendance,
        phone: input.phone,
        class_id: new_seat.or(existing.class_id),
    };

    match Students::new(&mut conn).update(id, &request).await {
        Ok(student) => {
            if new_seat.is_some()
                && let Some(old_seat) = existing.class_id
            {
                release_seat(&mut conn, old_seat).await;
            }
            Ok(student)
        }
        Err(err) => {
            if let Some(seat) = new_seat {
                release_seat(&mut conn, seat).await;
            }
            Err(match err {
                DbError::NotFound => not_found(),
                err => conflict_on_unique(err, DUPLICATE_ON_UPDATE),
            })
        }
    }
}

async fn remove_student(pool: &PgPool, raw_id: &str) -> Result<()> {
    let Some(id) = parse_record_id(raw_id) else {
        debug!("Ignoring delete of malformed student id");
        return Ok(());
    };

    let mut conn = acquire(pool).await?;
    match Students::new(&mut conn).delete_returning(id).await? {
        Some(student) => {
            if let Some(class_id) = student.class_id {
                release_seat(&mut conn, class_id).await;
            }
            info!("Student deleted");
        }
        None => debug!("No student to delete"),
    }
    Ok(())
}

/// Allocate a seat in `grade`, failing with the capacity message when every class is full.
async fn take_seat(conn: &mut PgConnection, grade: &str) -> Result<ClassId> {
    Seats::new(conn)
        .allocate(grade)
        .await?
        .map(|class| class.id)
        .ok_or_else(|| Error::CapacityExhausted {
            grade: grade.to_string(),
        })
}

async fn render_page(
    state: &AppState,
    pool: &PgPool,
    query: &StudentListQuery,
    status: StatusCode,
    message: Option<String>,
    form: Option<StudentFormView>,
) -> Result<Response> {
    let filter = query.filter();
    let (students, stats, editing) = async {
        let mut conn = acquire(pool).await?;
        let mut repo = Students::new(&mut conn);
        let students = repo.list(&filter).await?;
        let stats = repo.stats().await?;
        let editing = match query.edit_id.as_deref().and_then(parse_record_id) {
            Some(id) => repo.get_by_id(id).await?,
            None => None,
        };
        Ok::<_, Error>((students, stats, editing))
    }
    .await
    .map_err(|e| load_failure("students", e))?;

    let form = form
        .or_else(|| editing.as_ref().map(StudentFormView::from))
        .unwrap_or_default();
    let rows: Vec<StudentRow> = students.into_iter().map(StudentRow::from).collect();

    let body = state
        .views
        .render(
            "students.html",
            context! {
                title => "Students",
                subtitle => "Manage student records and attendance",
                active => "students",
                message,
                stats,
                filters => context! {
                    search => filter.search.as_deref().unwrap_or(""),
                    category => query.category(),
                    sort => filter.sort.as_str(),
                },
                grade_options => select_options(GRADE_OPTIONS, query.category()),
                form_grade_options => select_options(GRADE_OPTIONS, &form.class),
                is_editing => form.id.is_some(),
                form,
                students => rows,
            },
        )
        .map_err(|e| load_failure("students", e))?;

    Ok(html(status, body))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use sqlx::PgPool;

    use crate::db::handlers::{Classes, Repository, Students};
    use crate::db::query::ListFilter;
    use crate::test_utils::{create_test_app, create_test_class, create_test_student};

    fn student_body<'a>(roll: &'a str, class: &'a str) -> [(&'static str, &'a str); 4] {
        [("roll", roll), ("name", "Test Student"), ("class", class), ("phone", "555-0100")]
    }

    async fn enrolled(pool: &PgPool, name: &str) -> i32 {
        let mut conn = pool.acquire().await.unwrap();
        Classes::new(&mut conn)
            .list(&ListFilter::default())
            .await
            .unwrap()
            .into_iter()
            .find(|c| c.class_name == name)
            .unwrap()
            .enrolled
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_seats_fill_least_occupied_class_first(pool: PgPool) {
        create_test_class(&pool, "6A", "6", 2, 1).await;
        create_test_class(&pool, "6B", "6", 2, 0).await;
        let server = create_test_app(pool.clone());

        for roll in ["R1", "R2", "R3"] {
            let response = server
                .post("/students/add")
                .form(&student_body(roll, "6"))
                .await;
            response.assert_status(StatusCode::SEE_OTHER);
            assert_eq!(response.header("location"), "/students");
        }

        assert_eq!(enrolled(&pool, "6A").await, 2);
        assert_eq!(enrolled(&pool, "6B").await, 2);

        let response = server
            .post("/students/add")
            .form(&student_body("R4", "6"))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let text = response.text();
        assert!(text.contains("No available seats found in Class 6."));
        // Submitted values come back in the form
        assert!(text.contains("value=\"R4\""));

        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(Students::new(&mut conn).stats().await.unwrap().total, 3);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_roll_ignores_case(pool: PgPool) {
        create_test_class(&pool, "6A", "6", 10, 0).await;
        let server = create_test_app(pool.clone());

        server
            .post("/students/add")
            .form(&student_body("A100", "6"))
            .await
            .assert_status(StatusCode::SEE_OTHER);

        let response = server
            .post("/students/add")
            .form(&student_body("a100", "6"))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        assert!(response.text().contains("Roll number already exists."));

        // The rejected add did not take a seat
        assert_eq!(enrolled(&pool, "6A").await, 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_missing_field_rerenders_with_message(pool: PgPool) {
        let server = create_test_app(pool);

        let body = [("roll", "R1"), ("name", ""), ("phone", "555")];
        let response = server
            .post("/students/add")
            .form(&body)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(response.text().contains("Please complete all student fields."));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_search_treats_metacharacters_literally(pool: PgPool) {
        create_test_class(&pool, "6A", "6", 10, 0).await;
        create_test_student(&pool, "R1", "Ann (twin)", "6").await;
        create_test_student(&pool, "R2", "Annabel", "6").await;
        let server = create_test_app(pool);

        let response = server.get("/students").add_query_param("search", "(twin").await;
        response.assert_status_ok();
        let text = response.text();
        assert!(text.contains("Ann (twin)"));
        assert!(!text.contains("Annabel"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_moves_seat_to_new_grade(pool: PgPool) {
        create_test_class(&pool, "6A", "6", 10, 0).await;
        create_test_class(&pool, "7A", "7", 10, 0).await;
        let student = create_test_student(&pool, "R1", "Ada", "6").await;
        assert_eq!(enrolled(&pool, "6A").await, 1);
        let server = create_test_app(pool.clone());

        let body = [
            ("roll", "R1"),
            ("name", "Ada"),
            ("class", "7"),
            ("attendance", "88"),
            ("phone", "555"),
        ];
        server
            .post(&format!("/students/update/{}", student.id))
            .form(&body)
            .await
            .assert_status(StatusCode::SEE_OTHER);

        assert_eq!(enrolled(&pool, "6A").await, 0);
        assert_eq!(enrolled(&pool, "7A").await, 1);

        let mut conn = pool.acquire().await.unwrap();
        let updated = Students::new(&mut conn).get_by_id(student.id).await.unwrap().unwrap();
        assert_eq!(updated.grade, "7");
        assert_eq!(updated.attendance, 88);
        assert_eq!(updated.section.as_deref(), Some("7A"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_into_full_grade_keeps_old_seat(pool: PgPool) {
        create_test_class(&pool, "6A", "6", 10, 0).await;
        create_test_class(&pool, "7A", "7", 1, 1).await;
        let student = create_test_student(&pool, "R1", "Ada", "6").await;
        let server = create_test_app(pool.clone());

        let body = [("roll", "R1"), ("name", "Ada"), ("class", "7"), ("phone", "555")];
        let response = server
            .post(&format!("/students/update/{}", student.id))
            .form(&body)
            .await;

        response.assert_status(StatusCode::CONFLICT);
        assert!(response.text().contains("No available seats found in Class 7."));
        assert_eq!(enrolled(&pool, "6A").await, 1);
        assert_eq!(enrolled(&pool, "7A").await, 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_unknown_student(pool: PgPool) {
        let server = create_test_app(pool);

        let response = server
            .post(&format!("/students/update/{}", uuid::Uuid::new_v4()))
            .form(&student_body("R1", "6"))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        let text = response.text();
        assert!(text.contains("Student not found for update."));
        // The stale form is dropped in favour of a blank add form
        assert!(text.contains("action=\"/students/add\""));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_releases_seat(pool: PgPool) {
        create_test_class(&pool, "6A", "6", 10, 0).await;
        let student = create_test_student(&pool, "R1", "Ada", "6").await;
        let server = create_test_app(pool.clone());

        let response = server.post(&format!("/students/delete/{}", student.id)).await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(enrolled(&pool, "6A").await, 0);

        // Unknown and malformed ids still redirect
        server
            .post(&format!("/students/delete/{}", student.id))
            .await
            .assert_status(StatusCode::SEE_OTHER);
        server.post("/students/delete/not-an-id").await.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(enrolled(&pool, "6A").await, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_edit_id_preloads_form(pool: PgPool) {
        create_test_class(&pool, "6A", "6", 10, 0).await;
        let student = create_test_student(&pool, "R77", "Grace", "6").await;
        let server = create_test_app(pool);

        let response = server.get("/students").add_query_param("editId", student.id).await;
        response.assert_status_ok();
        let text = response.text();
        assert!(text.contains("Edit student"));
        assert!(text.contains(&format!("action=\"/students/update/{}\"", student.id)));

        // An unknown editId just shows the add form
        let response = server.get("/students").add_query_param("editId", "nope").await;
        assert!(response.text().contains("Add student"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_failed_insert_gives_seat_back(pool: PgPool) {
        create_test_class(&pool, "6A", "6", 3, 1).await;
        sqlx::query(
            r#"
            CREATE FUNCTION reject_students() RETURNS trigger AS $$
            BEGIN
                RAISE EXCEPTION 'students table is read only';
            END;
            $$ LANGUAGE plpgsql
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("CREATE TRIGGER reject_students BEFORE INSERT ON students FOR EACH ROW EXECUTE FUNCTION reject_students()")
            .execute(&pool)
            .await
            .unwrap();
        let server = create_test_app(pool.clone());

        let response = server.post("/students/add").form(&student_body("R9", "6")).await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let text = response.text();
        assert!(text.contains("Unable to add student right now."));
        assert!(!text.contains("read only"));
        assert!(text.contains("value=\"R9\""));
        assert_eq!(enrolled(&pool, "6A").await, 1);
    }
}
