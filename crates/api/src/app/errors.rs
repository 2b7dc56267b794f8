use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use crate::app::services::ServiceError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        ServiceError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        ServiceError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        ServiceError::Invariant(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        ServiceError::Store(e) => {
            tracing::error!(error = %e, "catalog store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Parse an identifier from a path segment or body field.
pub fn parse_entity_id(raw: &str, what: &str) -> Result<eventdesk_core::EntityId, axum::response::Response> {
    raw.parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what} id: {raw}")))
}

pub fn parse_optional_entity_id(
    raw: Option<&str>,
    what: &str,
) -> Result<Option<eventdesk_core::EntityId>, axum::response::Response> {
    raw.map(|r| parse_entity_id(r, what)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_pick_status_codes() {
        let cases = [
            (ServiceError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ServiceError::Conflict("x".into()), StatusCode::CONFLICT),
            (ServiceError::Invariant("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
        ];
        for (err, status) in cases {
            assert_eq!(service_error_to_response(err).status(), status);
        }
    }

    #[test]
    fn malformed_ids_are_bad_requests() {
        let err = parse_entity_id("chair", "item").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(parse_entity_id("ITM00001-2025", "item").is_ok());
        assert_eq!(parse_optional_entity_id(None, "client").ok(), Some(None));
    }
}
