/// Error handling and the response envelope
///
/// Every response body, success or failure, is an [`ApiResponse`]:
///
/// ```json
/// { "success": false, "statusCode": 404, "data": null,
///   "errorMessages": ["Task not found or access denied."] }
/// ```
///
/// Handlers return `ApiResult<ApiResponse<T>>`; service, datastore, token and
/// extractor errors convert into [`ApiError`] with `?`.
///
/// | Error | Status |
/// |---|---|
/// | `BadRequest`, `Validation` | 400 |
/// | `Unauthorized` | 401 |
/// | `NotFound` | 404 |
/// | `Conflict` | 409 |
/// | `Internal` | 500 |

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use taskdesk_shared::auth::jwt::JwtError;
use taskdesk_shared::db::store::StoreError;
use taskdesk_shared::error::ServiceError;
use taskdesk_shared::validation::FieldViolation;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Message substituted for server errors in production
pub const GENERIC_SERVER_ERROR: &str = "Internal server error";

/// Uniform response body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,

    pub status_code: u16,

    pub data: Option<T>,

    pub error_messages: Vec<String>,
}

impl<T> ApiResponse<T> {
    /// 200 with `data`
    pub fn ok(data: T) -> Self {
        Self::with_status(StatusCode::OK, Some(data))
    }

    /// 201 with `data`
    pub fn created(data: T) -> Self {
        Self::with_status(StatusCode::CREATED, Some(data))
    }

    pub fn with_status(status: StatusCode, data: Option<T>) -> Self {
        Self {
            success: status.is_success(),
            status_code: status.as_u16(),
            data,
            error_messages: Vec::new(),
        }
    }
}

impl ApiResponse<()> {
    /// Failure envelope without data
    pub fn failure(status: StatusCode, error_messages: Vec<String>) -> Self {
        Self {
            success: false,
            status_code: status.as_u16(),
            data: None,
            error_messages,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Field-level validation failures (400)
    Validation(Vec<FieldViolation>),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - e.g., duplicate username or email
    Conflict(String),

    /// Internal server error (500)
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Validation(violations) => {
                write!(f, "Validation failed: {} errors", violations.len())
            }
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let messages = match self {
            ApiError::Validation(violations) => violations.into_iter().map(|v| v.message).collect(),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                vec![msg]
            }
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => {
                tracing::debug!(status = status.as_u16(), "Returning error response: {}", msg);
                vec![msg]
            }
        };

        ApiResponse::failure(status, messages).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidArgument(msg) => ApiError::BadRequest(msg),
            ServiceError::Validation(violations) => ApiError::Validation(violations),
            ServiceError::NotFound(msg) => ApiError::NotFound(msg),
            ServiceError::Conflict(msg) => ApiError::Conflict(msg),
            ServiceError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            other @ (ServiceError::Credential(_) | ServiceError::Storage(_)) => {
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ServiceError::from(err).into()
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidIssuer { .. } => ApiError::Unauthorized("Invalid token issuer".to_string()),
            JwtError::InvalidAudience { .. } => {
                ApiError::Unauthorized("Invalid token audience".to_string())
            }
            JwtError::CreateError(msg) => ApiError::Internal(msg),
            JwtError::ValidationError(_) => ApiError::Unauthorized("Invalid token".to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
