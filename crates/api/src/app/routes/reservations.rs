use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{post, put},
    Json, Router,
};

use eventdesk_inventory::ReservationStatus;

use crate::app::extract::ApiJson;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_reservation))
        .route("/:id/status", put(change_status))
}

pub async fn create_reservation(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<dto::CreateReservationRequest>,
) -> axum::response::Response {
    let client_id = match errors::parse_optional_entity_id(body.client_id.as_deref(), "client") {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let service_id = match errors::parse_optional_entity_id(body.service_id.as_deref(), "service") {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.create_reservation(client_id, service_id).await {
        Ok(reservation) => (StatusCode::CREATED, Json(reservation)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn change_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::ChangeReservationStatusRequest>,
) -> axum::response::Response {
    let id = match errors::parse_entity_id(&id, "reservation") {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let status: ReservationStatus = match body.status.parse() {
        Ok(s) => s,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_status",
                "status must be one of: pending, confirmed, cancelled, finished",
            );
        }
    };

    match services.change_reservation_status(&id, status).await {
        Ok(reservation) => (StatusCode::OK, Json(reservation)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
