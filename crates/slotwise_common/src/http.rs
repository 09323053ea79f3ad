// --- File: crates/slotwise_common/src/http.rs ---
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::{HttpStatusCode, SlotwiseError};

// Include the client module
pub mod client;

/// Builds the JSON error response for any error that knows its HTTP mapping.
///
/// Only `public_message` reaches the client.
pub fn error_response<E: HttpStatusCode>(err: &E) -> Response {
    let status_code =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let body = Json(json!({
        "error": {
            "message": err.public_message(),
            "code": status_code.as_u16(),
            "kind": err.kind(),
        }
    }));

    (status_code, body).into_response()
}

impl IntoResponse for SlotwiseError {
    fn into_response(self) -> Response {
        error_response(&self)
    }
}
