/// Task endpoints
///
/// All routes sit behind the bearer layer and act on the caller's own tasks.
/// A task owned by someone else answers 404, same as a missing one.
///
/// # Endpoints
///
/// - `GET /api/tasks` - List, with optional `status`, `priority`,
///   `dueDateFrom`, `dueDateTo` and `sortBy` query parameters
/// - `POST /api/tasks` - Create (201, data is `{ "id": ... }`)
/// - `GET /api/tasks/:id` - Fetch one
/// - `PUT /api/tasks/:id` - Update
/// - `DELETE /api/tasks/:id` - Delete

use crate::{
    app::AppState,
    error::{ApiResponse, ApiResult},
    middleware::auth::AuthUser,
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskdesk_shared::{
    db::store::Store,
    models::task::{CreateTask, Task, TaskFilter, UpdateTask},
    services::TaskService,
    validation::ValidateRequest,
};
use uuid::Uuid;

/// Create task response
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedTask {
    pub id: Uuid,
}

pub async fn list_tasks<S: Store>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthUser>,
    query: Result<Query<TaskFilter>, QueryRejection>,
) -> ApiResult<ApiResponse<Vec<Task>>> {
    let Query(filter) = query?;

    let mut uow = state.unit_of_work().await?;
    let result = TaskService::new(&mut uow)
        .get_all_user_tasks(auth.user_id, Some(filter))
        .await;
    uow.close().await;

    Ok(ApiResponse::ok(result?))
}

pub async fn get_task<S: Store>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<ApiResponse<Task>> {
    let Path(task_id) = path?;

    let mut uow = state.unit_of_work().await?;
    let result = TaskService::new(&mut uow)
        .get_task_by_id(task_id, auth.user_id)
        .await;
    uow.close().await;

    Ok(ApiResponse::ok(result?))
}

pub async fn create_task<S: Store>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthUser>,
    payload: Result<Json<CreateTask>, JsonRejection>,
) -> ApiResult<ApiResponse<CreatedTask>> {
    let Json(request) = payload?;
    request.ensure_valid()?;

    let mut uow = state.unit_of_work().await?;
    let result = TaskService::new(&mut uow).add_task(auth.user_id, request).await;
    uow.close().await;

    Ok(ApiResponse::created(CreatedTask { id: result? }))
}

pub async fn update_task<S: Store>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateTask>, JsonRejection>,
) -> ApiResult<ApiResponse<()>> {
    let Path(task_id) = path?;
    let Json(request) = payload?;
    request.ensure_valid()?;

    let mut uow = state.unit_of_work().await?;
    let result = TaskService::new(&mut uow)
        .update_task(auth.user_id, task_id, request)
        .await;
    uow.close().await;
    result?;

    Ok(ApiResponse::with_status(StatusCode::OK, None))
}

pub async fn delete_task<S: Store>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<ApiResponse<()>> {
    let Path(task_id) = path?;

    let mut uow = state.unit_of_work().await?;
    let result = TaskService::new(&mut uow)
        .delete_task(auth.user_id, task_id)
        .await;
    uow.close().await;
    result?;

    Ok(ApiResponse::with_status(StatusCode::OK, None))
}
