/// JWT bearer authentication
///
/// [`jwt_auth_layer`] validates the `Authorization: Bearer <token>` header
/// and inserts the caller's [`AuthUser`] into the request extensions, where
/// handlers pick it up with `Extension<AuthUser>`.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use taskdesk_shared::db::store::Store;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// Identity asserted by a validated token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,

    pub email: String,

    pub username: String,
}

/// Rejects requests without a valid bearer token
pub async fn jwt_auth_layer<S: Store>(
    State(state): State<AppState<S>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("User is not authenticated".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))?;

    let claims = state.tokens.validate(token)?;

    req.extensions_mut().insert(AuthUser {
        user_id: claims.sub,
        email: claims.email,
        username: claims.username,
    });

    Ok(next.run(req).await)
}
