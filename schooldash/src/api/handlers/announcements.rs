//! Handlers for the announcements page.

use axum::{
    Extension, Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use minijinja::context;
use sqlx::PgPool;
use tracing::{debug, error, info, instrument};

use super::{acquire, conflict_on_unique, html, load_failure, log_write_failure, parse_record_id};
use crate::AppState;
use crate::api::models::{
    announcements::{
        ADD_FAILED, AnnouncementForm, AnnouncementFormView, AnnouncementListQuery, AnnouncementRow, DATE_FORMAT,
        DUPLICATE_ON_ADD, DUPLICATE_ON_UPDATE, UPDATE_FAILED,
    },
    select_options,
};
use crate::db::{
    errors::DbError,
    handlers::{Announcements, Repository, UniqueField, uniqueness::is_duplicate},
    models::announcements::AnnouncementDBResponse,
};
use crate::errors::{Error, Result};
use crate::types::{AUDIENCE_OPTIONS, AnnouncementType, abbrev_uuid};

const PAGE: &str = "/announcements";

/// `GET /announcements`
#[instrument(skip_all)]
pub async fn list_announcements(
    State(state): State<AppState>,
    Extension(pool): Extension<PgPool>,
    Query(query): Query<AnnouncementListQuery>,
) -> Result<Response> {
    render_page(&state, &pool, &query, StatusCode::OK, None, None).await
}

/// `POST /announcements/add`
#[instrument(skip_all, fields(title = %form.title.trim()))]
pub async fn add_announcement(
    State(state): State<AppState>,
    Extension(pool): Extension<PgPool>,
    Query(query): Query<AnnouncementListQuery>,
    Form(form): Form<AnnouncementForm>,
) -> Result<Response> {
    match create_announcement(&pool, &form).await {
        Ok(announcement) => {
            info!(announcement_id = %abbrev_uuid(&announcement.id), kind = %announcement.kind, "Announcement added");
            Ok(Redirect::to(PAGE).into_response())
        }
        Err(err) => {
            log_write_failure("add announcement", &err);
            let message = err.form_message(ADD_FAILED);
            render_page(&state, &pool, &query, err.status_code(), Some(message), Some(form.preserve(None))).await
        }
    }
}

/// `POST /announcements/update/{id}`
#[instrument(skip_all, fields(announcement_id = %id))]
pub async fn update_announcement(
    State(state): State<AppState>,
    Extension(pool): Extension<PgPool>,
    Path(id): Path<String>,
    Query(query): Query<AnnouncementListQuery>,
    Form(form): Form<AnnouncementForm>,
) -> Result<Response> {
    match modify_announcement(&pool, &id, &form).await {
        Ok(_) => {
            info!("Announcement updated");
            Ok(Redirect::to(PAGE).into_response())
        }
        Err(err) => {
            log_write_failure("update announcement", &err);
            let message = err.form_message(UPDATE_FAILED);
            let form = (!err.is_terminal()).then(|| form.preserve(Some(&id)));
            render_page(&state, &pool, &query, err.status_code(), Some(message), form).await
        }
    }
}

/// `POST /announcements/delete/{id}`
#[instrument(skip_all, fields(announcement_id = %id))]
pub async fn delete_announcement(Extension(pool): Extension<PgPool>, Path(id): Path<String>) -> Redirect {
    let Some(announcement_id) = parse_record_id(&id) else {
        debug!("Ignoring delete of malformed announcement id");
        return Redirect::to(PAGE);
    };

    let result = async {
        let mut conn = acquire(&pool).await?;
        Ok::<_, Error>(Announcements::new(&mut conn).delete(announcement_id).await?)
    }
    .await;

    match result {
        Ok(true) => info!("Announcement deleted"),
        Ok(false) => debug!("No announcement to delete"),
        Err(err) => error!("Failed to delete announcement: {:#}", err),
    }
    Redirect::to(PAGE)
}

async fn create_announcement(pool: &PgPool, form: &AnnouncementForm) -> Result<AnnouncementDBResponse> {
    let request = form.validate()?;
    let mut conn = acquire(pool).await?;

    if is_duplicate(&mut conn, UniqueField::AnnouncementTitle, &request.title, None).await? {
        return Err(Error::Conflict {
            message: DUPLICATE_ON_ADD.to_string(),
        });
    }

    Announcements::new(&mut conn)
        .create(&request)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_ON_ADD))
}

async fn modify_announcement(pool: &PgPool, raw_id: &str, form: &AnnouncementForm) -> Result<AnnouncementDBResponse> {
    let request = form.validate()?;
    let not_found = || Error::NotFound {
        resource: "Announcement".to_string(),
        id: raw_id.to_string(),
    };
    let id = parse_record_id(raw_id).ok_or_else(not_found)?;

    let mut conn = acquire(pool).await?;
    Announcements::new(&mut conn).get_by_id(id).await?.ok_or_else(not_found)?;

    if is_duplicate(&mut conn, UniqueField::AnnouncementTitle, &request.title, Some(id)).await? {
        return Err(Error::Conflict {
            message: DUPLICATE_ON_UPDATE.to_string(),
        });
    }

    Announcements::new(&mut conn).update(id, &request).await.map_err(|e| match e {
        DbError::NotFound => not_found(),
        e => conflict_on_unique(e, DUPLICATE_ON_UPDATE),
    })
}

async fn render_page(
    state: &AppState,
    pool: &PgPool,
    query: &AnnouncementListQuery,
    status: StatusCode,
    message: Option<String>,
    form: Option<AnnouncementFormView>,
) -> Result<Response> {
    let filter = query.filter();
    let today = Utc::now().date_naive().format(DATE_FORMAT).to_string();
    let (announcements, stats, editing) = async {
        let mut conn = acquire(pool).await?;
        let mut repo = Announcements::new(&mut conn);
        let announcements = repo.list(&filter).await?;
        let stats = repo.stats(&today).await?;
        let editing = match query.edit_id.as_deref().and_then(parse_record_id) {
            Some(id) => repo.get_by_id(id).await?,
            None => None,
        };
        Ok::<_, Error>((announcements, stats, editing))
    }
    .await
    .map_err(|e| load_failure("announcements", e))?;

    let form = form
        .or_else(|| editing.as_ref().map(AnnouncementFormView::from))
        .unwrap_or_default();
    let rows: Vec<AnnouncementRow> = announcements.into_iter().map(AnnouncementRow::from).collect();
    let types = AnnouncementType::ALL.map(|kind| kind.as_str());

    let body = state
        .views
        .render(
            "announcements.html",
            context! {
                title => "Announcements",
                subtitle => "Notices, events and campaigns for the school",
                active => "announcements",
                message,
                stats,
                filters => context! {
                    search => filter.search.as_deref().unwrap_or(""),
                    category => query.category(),
                    sort => filter.sort.as_str(),
                },
                type_options => select_options(types, query.category()),
                form_type_options => select_options(types, &form.kind),
                form_audience_options => select_options(AUDIENCE_OPTIONS, &form.audience),
                is_editing => form.id.is_some(),
                form,
                announcements => rows,
            },
        )
        .map_err(|e| load_failure("announcements", e))?;

    Ok(html(status, body))
}
