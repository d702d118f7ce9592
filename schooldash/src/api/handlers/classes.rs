//! Handlers for the classes page.
//!
//! Capacity and enrolment are edited directly here; the form clamps enrolment into the capacity.
//! Deleting a class leaves its students without a section.

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
    classes::{
        ADD_FAILED, ClassForm, ClassFormView, ClassListQuery, ClassRow, DUPLICATE_ON_ADD, DUPLICATE_ON_UPDATE,
        UPDATE_FAILED,
    },
    select_options,
};
use crate::db::{
    errors::DbError,
    handlers::{Classes, Repository, Teachers, UniqueField, uniqueness::is_duplicate},
    models::classes::ClassDBResponse,
};
use crate::errors::{Error, Result};
use crate::types::{GRADE_OPTIONS, abbrev_uuid};

const PAGE: &str = "/classes";

/// `GET /classes`
#[instrument(skip_all)]
pub async fn list_classes(
    State(state): State<AppState>,
    Extension(pool): Extension<PgPool>,
    Query(query): Query<ClassListQuery>,
) -> Result<Response> {
    render_page(&state, &pool, &query, StatusCode::OK, None, None).await
}

/// `POST /classes/add`
#[instrument(skip_all, fields(class_name = %form.class_name.trim()))]
pub async fn add_class(
    State(state): State<AppState>,
    Extension(pool): Extension<PgPool>,
    Query(query): Query<ClassListQuery>,
    Form(form): Form<ClassForm>,
) -> Result<Response> {
    match create_class(&pool, &form).await {
        Ok(class) => {
            info!(class_id = %abbrev_uuid(&class.id), capacity = class.capacity, "Class added");
            Ok(Redirect::to(PAGE).into_response())
        }
        Err(err) => {
            log_write_failure("add class", &err);
            let message = err.form_message(ADD_FAILED);
            render_page(&state, &pool, &query, err.status_code(), Some(message), Some(form.preserve(None))).await
        }
    }
}

/// `POST /classes/update/{id}`
#[instrument(skip_all, fields(class_id = %id))]
pub async fn update_class(
    State(state): State<AppState>,
    Extension(pool): Extension<PgPool>,
    Path(id): Path<String>,
    Query(query): Query<ClassListQuery>,
    Form(form): Form<ClassForm>,
) -> Result<Response> {
    match modify_class(&pool, &id, &form).await {
        Ok(class) => {
            info!(enrolled = class.enrolled, capacity = class.capacity, "Class updated");
            Ok(Redirect::to(PAGE).into_response())
        }
        Err(err) => {
            log_write_failure("update class", &err);
            let message = err.form_message(UPDATE_FAILED);
            let form = (!err.is_terminal()).then(|| form.preserve(Some(&id)));
            render_page(&state, &pool, &query, err.status_code(), Some(message), form).await
        }
    }
}

/// `POST /classes/delete/{id}`
#[instrument(skip_all, fields(class_id = %id))]
pub async fn delete_class(Extension(pool): Extension<PgPool>, Path(id): Path<String>) -> Redirect {
    let Some(class_id) = parse_record_id(&id) else {
        debug!("Ignoring delete of malformed class id");
        return Redirect::to(PAGE);
    };

    let result = async {
        let mut conn = acquire(&pool).await?;
        Ok::<_, Error>(Classes::new(&mut conn).delete(class_id).await?)
    }
    .await;

    match result {
        Ok(true) => info!("Class deleted"),
        Ok(false) => debug!("No class to delete"),
        Err(err) => error!("Failed to delete class: {:#}", err),
    }
    Redirect::to(PAGE)
}

async fn create_class(pool: &PgPool, form: &ClassForm) -> Result<ClassDBResponse> {
    let request = form.validate()?;
    let mut conn = acquire(pool).await?;

    if is_duplicate(&mut conn, UniqueField::ClassName, &request.class_name, None).await? {
        return Err(Error::Conflict {
            message: DUPLICATE_ON_ADD.to_string(),
        });
    }

    Classes::new(&mut conn)
        .create(&request)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_ON_ADD))
}

async fn modify_class(pool: &PgPool, raw_id: &str, form: &ClassForm) -> Result<ClassDBResponse> {
    let request = form.validate()?;
    let not_found = || Error::NotFound {
        resource: "Class".to_string(),
        id: raw_id.to_string(),
    };
    let id = parse_record_id(raw_id).ok_or_else(not_found)?;

    let mut conn = acquire(pool).await?;
    Classes::new(&mut conn).get_by_id(id).await?.ok_or_else(not_found)?;

    if is_duplicate(&mut conn, UniqueField::ClassName, &request.class_name, Some(id)).await? {
        return Err(Error::Conflict {
            message: DUPLICATE_ON_UPDATE.to_string(),
        });
    }

    Classes::new(&mut conn).update(id, &request).await.map_err(|e| match e {
        DbError::NotFound => not_found(),
        e => conflict_on_unique(e, DUPLICATE_ON_UPDATE),
    })
}

async fn render_page(
    state: &AppState,
    pool: &PgPool,
    query: &ClassListQuery,
    status: StatusCode,
    message: Option<String>,
    form: Option<ClassFormView>,
) -> Result<Response> {
    let filter = query.filter();
    let (classes, stats, editing, teacher_names) = async {
        let mut conn = acquire(pool).await?;
        let mut repo = Classes::new(&mut conn);
        let classes = repo.list(&filter).await?;
        let stats = repo.stats().await?;
        let editing = match query.edit_id.as_deref().and_then(parse_record_id) {
            Some(id) => repo.get_by_id(id).await?,
            None => None,
        };
        let teacher_names = Teachers::new(&mut conn).names().await?;
        Ok::<_, Error>((classes, stats, editing, teacher_names))
    }
    .await
    .map_err(|e| load_failure("classes", e))?;

    let form = form.or_else(|| editing.as_ref().map(ClassFormView::from)).unwrap_or_default();
    let rows: Vec<ClassRow> = classes.into_iter().map(ClassRow::from).collect();

    let body = state
        .views
        .render(
            "classes.html",
            context! {
                title => "Classes",
                subtitle => "Sections, rooms and seat occupancy",
                active => "classes",
                message,
                stats,
                filters => context! {
                    search => filter.search.as_deref().unwrap_or(""),
                    category => query.category(),
                    sort => filter.sort.as_str(),
                },
                grade_options => select_options(GRADE_OPTIONS, query.category()),
                form_grade_options => select_options(GRADE_OPTIONS, &form.grade),
                teacher_options => select_options(teacher_names.iter().map(String::as_str), ""),
                is_editing => form.id.is_some(),
                form,
                classes => rows,
            },
        )
        .map_err(|e| load_failure("classes", e))?;

    Ok(html(status, body))
}
