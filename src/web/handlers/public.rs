use super::json_single;
use crate::services::posts;
use crate::web::error::AppResult;
use crate::web::extractors::OptionalUser;
use crate::web::state::AppState;
use axum::extract::State;
use axum::response::Json;
use std::sync::Arc;

pub async fn index(
    State(state): State<Arc<AppState>>,
    OptionalUser(account): OptionalUser,
) -> AppResult<Json<serde_json::Value>> {
    let recent = posts::list_recent(&state.db, state.config.content.posts_per_page)?;

    Ok(json_single(serde_json::json!({
        "site": state.config.site,
        "account": account,
        "posts": recent,
    })))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
