pub mod auth;
pub mod posts;
pub mod public;
pub mod stats;
pub mod users;

use axum::response::Json;
use serde::Serialize;

fn json_single<T: Serialize>(data: T) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "data": data }))
}

fn json_page<T: Serialize>(page: &crate::models::Page<T>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "data": page.items,
        "meta": {
            "total": page.total,
            "page": page.page,
            "per_page": page.per_page,
            "pages": page.pages,
        }
    }))
}
