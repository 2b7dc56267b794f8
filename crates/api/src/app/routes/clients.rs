use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use crate::app::extract::ApiJson;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/", post(create_client))
}

pub async fn create_client(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<dto::CreateClientRequest>,
) -> axum::response::Response {
    match services.create_client(body.name, body.email).await {
        Ok(client) => (StatusCode::CREATED, Json(client)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
