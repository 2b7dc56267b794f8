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
    Router::new().route("/", post(record_payment))
}

pub async fn record_payment(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<dto::RecordPaymentRequest>,
) -> axum::response::Response {
    let reservation_id = match errors::parse_entity_id(&body.reservation_id, "reservation") {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services
        .record_payment(reservation_id, body.amount, body.payment_type)
        .await
    {
        Ok(payment) => (StatusCode::CREATED, Json(payment)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
