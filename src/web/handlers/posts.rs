use super::{json_page, json_single};
use crate::models::{PostInput, Summary};
use crate::services::error::ServiceError;
use crate::services::posts;
use crate::web::error::AppResult;
use crate::web::extractors::CurrentUser;
use crate::web::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use std::sync::Arc;

const MAX_PAGE: usize = 10000;

#[derive(Deserialize)]
pub struct ListParams {
    #[serde(default = "default_page")]
    page: usize,
    #[serde(default)]
    q: Option<String>,
}

fn default_page() -> usize {
    1
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<serde_json::Value>> {
    let page = params.page.clamp(1, MAX_PAGE);
    let result = posts::list_published(
        &state.db,
        params.q.as_deref(),
        page,
        state.config.content.posts_per_page,
    )?;
    Ok(json_page(&result))
}

/// Runs the summarizer when the client asked for it. Validation happens
/// first so invalid input never reaches the external service.
async fn requested_summary(state: &AppState, input: &PostInput) -> AppResult<Option<Summary>> {
    if !input.generate_summary {
        return Ok(None);
    }
    let normalized = input.clone().normalized();
    posts::validate_post(&normalized)?;
    Ok(state.summarizer.summarize_post(&normalized.content).await)
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    CurrentUser(account): CurrentUser,
    Json(input): Json<PostInput>,
) -> AppResult<Response> {
    let summary = requested_summary(&state, &input).await?;
    let post = posts::create_post(&state.db, account.id, input, summary)?;
    Ok((StatusCode::CREATED, json_single(&post)).into_response())
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let post = posts::view_post(&state.db, &slug)?.ok_or(ServiceError::NotFound("Post"))?;
    Ok(json_single(&post))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    CurrentUser(account): CurrentUser,
    Path(slug): Path<String>,
    Json(input): Json<PostInput>,
) -> AppResult<Json<serde_json::Value>> {
    // Checked before summarizing so a non-author's request never reaches the model.
    let existing = posts::get_post_by_slug(&state.db, &slug)?.ok_or(ServiceError::NotFound("Post"))?;
    if existing.author_id != account.id {
        return Err(ServiceError::Forbidden.into());
    }

    let summary = requested_summary(&state, &input).await?;
    let post = posts::update_post(&state.db, &slug, account.id, input, summary)?;
    Ok(json_single(&post))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    CurrentUser(account): CurrentUser,
    Path(slug): Path<String>,
) -> AppResult<StatusCode> {
    posts::delete_post(&state.db, &slug, account.id)?;
    Ok(StatusCode::NO_CONTENT)
}
