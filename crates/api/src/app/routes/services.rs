use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use crate::app::extract::ApiJson;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_service))
        .route("/:id/items", post(add_usage))
}

pub async fn create_service(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<dto::CreateServiceRequest>,
) -> axum::response::Response {
    match services.create_service(body.name, body.description).await {
        Ok(service) => (StatusCode::CREATED, Json(service)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn add_usage(
    Extension(services): Extension<Arc<AppServices>>,
    Path(service_id): Path<String>,
    ApiJson(body): ApiJson<dto::AddUsageRequest>,
) -> axum::response::Response {
    let service_id = match errors::parse_entity_id(&service_id, "service") {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let item_id = match errors::parse_entity_id(&body.item_id, "item") {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.add_usage(service_id, item_id, body.quantity).await {
        Ok(change) => (StatusCode::CREATED, Json(dto::usage_change_to_json(&change))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_usage(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::UpdateUsageRequest>,
) -> axum::response::Response {
    let id = match errors::parse_entity_id(&id, "usage record") {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.update_usage(&id, body.quantity).await {
        Ok(change) => (StatusCode::OK, Json(dto::usage_change_to_json(&change))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn remove_usage(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_entity_id(&id, "usage record") {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.remove_usage(&id).await {
        Ok(change) => (StatusCode::OK, Json(dto::usage_change_to_json(&change))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
