use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::app::extract::ApiJson;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_item).get(list_items))
        .route("/:id", get(get_item))
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<dto::CreateItemRequest>,
) -> axum::response::Response {
    match services.create_item(body.name, body.total_stock).await {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Recomputes every item before answering, so the listing never shows a stale cache.
pub async fn list_items(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.list_items().await {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_entity_id(&id, "item") {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.item_detail(&id).await {
        Ok(detail) => (StatusCode::OK, Json(dto::item_detail_to_json(&detail))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
