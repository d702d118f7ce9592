//! Handlers for the teachers page.

use axum::{
    Extension, Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use minijinja::context;
use sqlx::PgPool;
use tracing::{debug, error, info, instrument};

use super::{acquire, conflict_on_unique, html, load_failure, log_write_failure, parse_record_id};
use crate::AppState;
use crate::api::models::{
    select_options,
    teachers::{
        ADD_FAILED, DUPLICATE_ON_ADD, DUPLICATE_ON_UPDATE, TeacherForm, TeacherFormView, TeacherListQuery, TeacherRow,
        UPDATE_FAILED,
    },
};
use crate::db::{
    errors::DbError,
    handlers::{Repository, Teachers, UniqueField, uniqueness::is_duplicate},
    models::teachers::TeacherDBResponse,
};
use crate::errors::{Error, Result};
use crate::types::{SUBJECT_OPTIONS, abbrev_uuid};

const PAGE: &str = "/teachers";

/// `GET /teachers`
#[instrument(skip_all)]
pub async fn list_teachers(
    State(state): State<AppState>,
    Extension(pool): Extension<PgPool>,
    Query(query): Query<TeacherListQuery>,
) -> Result<Response> {
    render_page(&state, &pool, &query, StatusCode::OK, None, None).await
}

/// `POST /teachers/add`
#[instrument(skip_all, fields(employee_id = %form.employee_id.trim()))]
pub async fn add_teacher(
    State(state): State<AppState>,
    Extension(pool): Extension<PgPool>,
    Query(query): Query<TeacherListQuery>,
    Form(form): Form<TeacherForm>,
) -> Result<Response> {
    match create_teacher(&pool, &form).await {
        Ok(teacher) => {
            info!(teacher_id = %abbrev_uuid(&teacher.id), "Teacher added");
            Ok(Redirect::to(PAGE).into_response())
        }
        Err(err) => {
            log_write_failure("add teacher", &err);
            let message = err.form_message(ADD_FAILED);
            render_page(&state, &pool, &query, err.status_code(), Some(message), Some(form.preserve(None))).await
        }
    }
}

/// `POST /teachers/update/{id}`
#[instrument(skip_all, fields(teacher_id = %id))]
pub async fn update_teacher(
    State(state): State<AppState>,
    Extension(pool): Extension<PgPool>,
    Path(id): Path<String>,
    Query(query): Query<TeacherListQuery>,
    Form(form): Form<TeacherForm>,
) -> Result<Response> {
    match modify_teacher(&pool, &id, &form).await {
        Ok(_) => {
            info!("Teacher updated");
            Ok(Redirect::to(PAGE).into_response())
        }
        Err(err) => {
            log_write_failure("update teacher", &err);
            let message = err.form_message(UPDATE_FAILED);
            let form = (!err.is_terminal()).then(|| form.preserve(Some(&id)));
            render_page(&state, &pool, &query, err.status_code(), Some(message), form).await
        }
    }
}

/// `POST /teachers/delete/{id}`
#[instrument(skip_all, fields(teacher_id = %id))]
pub async fn delete_teacher(Extension(pool): Extension<PgPool>, Path(id): Path<String>) -> Redirect {
    let Some(teacher_id) = parse_record_id(&id) else {
        debug!("Ignoring delete of malformed teacher id");
        return Redirect::to(PAGE);
    };

    let result = async {
        let mut conn = acquire(&pool).await?;
        Ok::<_, Error>(Teachers::new(&mut conn).delete(teacher_id).await?)
    }
    .await;

    match result {
        Ok(true) => info!("Teacher deleted"),
        Ok(false) => debug!("No teacher to delete"),
        Err(err) => error!("Failed to delete teacher: {:#}", err),
    }
    Redirect::to(PAGE)
}

async fn create_teacher(pool: &PgPool, form: &TeacherForm) -> Result<TeacherDBResponse> {
    let request = form.validate()?;
    let mut conn = acquire(pool).await?;

    if is_duplicate(&mut conn, UniqueField::TeacherEmployeeId, &request.employee_id, None).await? {
        return Err(Error::Conflict {
            message: DUPLICATE_ON_ADD.to_string(),
        });
    }

    Teachers::new(&mut conn)
        .create(&request)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_ON_ADD))
}

async fn modify_teacher(pool: &PgPool, raw_id: &str, form: &TeacherForm) -> Result<TeacherDBResponse> {
    let request = form.validate()?;
    let not_found = || Error::NotFound {
        resource: "Teacher".to_string(),
        id: raw_id.to_string(),
    };
    let id = parse_record_id(raw_id).ok_or_else(not_found)?;

    let mut conn = acquire(pool).await?;
    Teachers::new(&mut conn).get_by_id(id).await?.ok_or_else(not_found)?;

    if is_duplicate(&mut conn, UniqueField::TeacherEmployeeId, &request.employee_id, Some(id)).await? {
        return Err(Error::Conflict {
            message: DUPLICATE_ON_UPDATE.to_string(),
        });
    }

    Teachers::new(&mut conn).update(id, &request).await.map_err(|e| match e {
        DbError::NotFound => not_found(),
        e => conflict_on_unique(e, DUPLICATE_ON_UPDATE),
    })
}

async fn render_page(
    state: &AppState,
    pool: &PgPool,
    query: &TeacherListQuery,
    status: StatusCode,
    message: Option<String>,
    form: Option<TeacherFormView>,
) -> Result<Response> {
    let filter = query.filter();
    let (teachers, stats, editing) = async {
        let mut conn = acquire(pool).await?;
        let mut repo = Teachers::new(&mut conn);
        let teachers = repo.list(&filter).await?;
        let stats = repo.stats().await?;
        let editing = match query.edit_id.as_deref().and_then(parse_record_id) {
            Some(id) => repo.get_by_id(id).await?,
            None => None,
        };
        Ok::<_, Error>((teachers, stats, editing))
    }
    .await
    .map_err(|e| load_failure("teachers", e))?;

    let form = form
        .or_else(|| editing.as_ref().map(TeacherFormView::from))
        .unwrap_or_default();
    let rows: Vec<TeacherRow> = teachers.into_iter().map(TeacherRow::from).collect();

    let body = state
        .views
        .render(
            "teachers.html",
            context! {
                title => "Teachers",
                subtitle => "Staff directory, subjects and experience",
                active => "teachers",
                message,
                stats,
                filters => context! {
                    search => filter.search.as_deref().unwrap_or(""),
                    category => query.category(),
                    sort => filter.sort.as_str(),
                },
                subject_options => select_options(SUBJECT_OPTIONS, query.category()),
                form_subject_options => select_options(SUBJECT_OPTIONS, &form.subject),
                is_editing => form.id.is_some(),
                form,
                teachers => rows,
            },
        )
        .map_err(|e| load_failure("teachers", e))?;

    Ok(html(status, body))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use sqlx::PgPool;

    use crate::db::handlers::{Repository, Teachers};
    use crate::test_utils::{create_test_app, create_test_teacher};

    fn teacher_body<'a>(employee_id: &'a str, name: &'a str) -> [(&'static str, &'a str); 6] {
        [
            ("employeeId", employee_id),
            ("name", name),
            ("subject", "Physics"),
            ("classes", "3"),
            ("experience", "9"),
            ("phone", "555-0199"),
        ]
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_add_and_list(pool: PgPool) {
        let server = create_test_app(pool);

        let response = server.post("/teachers/add").form(&teacher_body("EMP-1", "Marie Curie")).await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/teachers");

        let response = server.get("/teachers").await;
        response.assert_status_ok();
        let text = response.text();
        assert!(text.contains("Marie Curie"));
        assert!(text.contains("9 years"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_to_taken_employee_id(pool: PgPool) {
        create_test_teacher(&pool, "EMP-1", "Ada", "Mathematics").await;
        let other = create_test_teacher(&pool, "EMP-2", "Alan", "Computer Science").await;
        let server = create_test_app(pool.clone());

        let response = server
            .post(&format!("/teachers/update/{}", other.id))
            .form(&teacher_body("emp-1", "Alan"))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        let text = response.text();
        assert!(text.contains("Another teacher already uses this employee ID."));
        // The edit form is kept
        assert!(text.contains(&format!("action=\"/teachers/update/{}\"", other.id)));

        // Keeping its own id is not a duplicate
        server
            .post(&format!("/teachers/update/{}", other.id))
            .form(&teacher_body("EMP-2", "Alan Turing"))
            .await
            .assert_status(StatusCode::SEE_OTHER);

        let mut conn = pool.acquire().await.unwrap();
        let updated = Teachers::new(&mut conn).get_by_id(other.id).await.unwrap().unwrap();
        assert_eq!(updated.name, "Alan Turing");
        assert_eq!(updated.experience, 9);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_unknown_teacher(pool: PgPool) {
        let server = create_test_app(pool);

        let response = server.post("/teachers/update/not-an-id").form(&teacher_body("EMP-9", "Nobody")).await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert!(response.text().contains("Teacher not found for update."));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_subject_filter(pool: PgPool) {
        create_test_teacher(&pool, "EMP-1", "Ada", "Mathematics").await;
        create_test_teacher(&pool, "EMP-2", "Rosalind", "Biology").await;
        let server = create_test_app(pool);

        let response = server.get("/teachers").add_query_param("subject", "Biology").await;
        let text = response.text();
        assert!(text.contains("Rosalind"));
        assert!(!text.contains("Ada"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete(pool: PgPool) {
        let teacher = create_test_teacher(&pool, "EMP-1", "Ada", "Mathematics").await;
        let server = create_test_app(pool.clone());

        server
            .post(&format!("/teachers/delete/{}", teacher.id))
            .await
            .assert_status(StatusCode::SEE_OTHER);
        server
            .post(&format!("/teachers/delete/{}", teacher.id))
            .await
            .assert_status(StatusCode::SEE_OTHER);

        let mut conn = pool.acquire().await.unwrap();
        assert!(Teachers::new(&mut conn).get_by_id(teacher.id).await.unwrap().is_none());
    }
}
