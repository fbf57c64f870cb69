/// Server error redaction
///
/// In production, the body of every 500 response is replaced with a generic
/// envelope so storage details never reach clients. Development responses
/// pass through untouched.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::config::Environment;
use crate::error::{ApiResponse, GENERIC_SERVER_ERROR};

pub async fn redact_server_errors(
    State(environment): State<Environment>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;
    if response.status() != StatusCode::INTERNAL_SERVER_ERROR {
        return response;
    }

    warn!(%method, %path, "Request failed with server error");
    if environment.is_production() {
        return ApiResponse::failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            vec![GENERIC_SERVER_ERROR.to_string()],
        )
        .into_response();
    }
    response
}
