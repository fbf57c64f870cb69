/// User endpoints
///
/// # Endpoints
///
/// - `POST /api/users/register` - Register new user
/// - `POST /api/users/login` - Exchange username or email and password for a token
/// - `POST /api/users/change-password` - Replace the caller's password (bearer)

use crate::{
    app::AppState,
    error::{ApiResponse, ApiResult},
    middleware::auth::AuthUser,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskdesk_shared::{
    db::store::Store,
    models::user::{ChangePassword, RegisterUser, SignIn},
    services::UserService,
    validation::ValidateRequest,
};
use tracing::info;

/// Cookie carrying the token issued at login
pub const TOKEN_COOKIE: &str = "jwt-token";

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for the authenticated user
    pub token: String,
}

/// Register a new user
///
/// ```text
/// POST /api/users/register
/// Content-Type: application/json
///
/// {
///   "username": "alice.b",
///   "email": "a@x.com",
///   "password": "secret1",
///   "confirmPassword": "secret1"
/// }
/// ```
///
/// Answers 201 with no data. A username or email already in use, in any
/// letter case, is a 409.
pub async fn register<S: Store>(
    State(state): State<AppState<S>>,
    payload: Result<Json<RegisterUser>, JsonRejection>,
) -> ApiResult<ApiResponse<()>> {
    let Json(request) = payload?;
    request.ensure_valid()?;

    let mut uow = state.unit_of_work().await?;
    let result = UserService::new(&mut uow).register(request).await;
    uow.close().await;
    result?;

    Ok(ApiResponse::with_status(StatusCode::CREATED, None))
}

/// Log in and receive a token
///
/// ```text
/// POST /api/users/login
/// Content-Type: application/json
///
/// { "login": "alice.b", "password": "secret1" }
/// ```
///
/// The token is returned in the body and also set as the `jwt-token`
/// cookie (`HttpOnly`, plus `Secure` in production).
pub async fn login<S: Store>(
    State(state): State<AppState<S>>,
    payload: Result<Json<SignIn>, JsonRejection>,
) -> ApiResult<([(header::HeaderName, String); 1], ApiResponse<LoginResponse>)> {
    let Json(request) = payload?;
    request.ensure_valid()?;

    let mut uow = state.unit_of_work().await?;
    let result = UserService::new(&mut uow)
        .authenticate(&request.login, &request.password)
        .await;
    uow.close().await;
    let user = result?;

    let token = state.tokens.issue(&user)?;
    let mut cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Strict", TOKEN_COOKIE, token);
    if state.config.api.environment.is_production() {
        cookie.push_str("; Secure");
    }

    Ok((
        [(header::SET_COOKIE, cookie)],
        ApiResponse::ok(LoginResponse { token }),
    ))
}

/// Change the authenticated user's password
pub async fn change_password<S: Store>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthUser>,
    payload: Result<Json<ChangePassword>, JsonRejection>,
) -> ApiResult<ApiResponse<String>> {
    let Json(request) = payload?;
    request.ensure_valid()?;

    let mut uow = state.unit_of_work().await?;
    let result = UserService::new(&mut uow)
        .change_password(auth.user_id, request)
        .await;
    uow.close().await;
    result?;

    info!(user_id = %auth.user_id, "Password change accepted");
    Ok(ApiResponse::ok("Password changed successfully.".to_string()))
}
