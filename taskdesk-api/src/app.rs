/// Application state and router builder
///
/// The router is generic over the datastore, so the server runs on
/// [`PgStore`](taskdesk_shared::db::postgres::PgStore) while tests drive the
/// same routes over [`MemoryStore`](taskdesk_shared::db::memory::MemoryStore).
///
/// # Routes
///
/// - `GET /health`
/// - `POST /api/users/register`, `POST /api/users/login`
/// - `POST /api/users/change-password` (bearer)
/// - `GET|POST /api/tasks`, `GET|PUT|DELETE /api/tasks/:id` (bearer)
///
/// # Example
///
/// ```no_run
/// use taskdesk_api::{app::{build_router, AppState}, config::Config};
/// use taskdesk_shared::db::memory::MemoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::from_env()?;
/// let app = build_router(AppState::new(MemoryStore::new(), config));
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiResult,
    middleware::{auth::jwt_auth_layer, errors::redact_server_errors},
    routes,
};
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use taskdesk_shared::auth::jwt::TokenIssuer;
use taskdesk_shared::db::store::Store;
use taskdesk_shared::db::unit_of_work::UnitOfWork;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
#[derive(Clone)]
pub struct AppState<S: Store> {
    /// Datastore every request opens its unit of work against
    pub store: S,

    pub config: Arc<Config>,

    pub tokens: Arc<TokenIssuer>,
}

impl<S: Store> AppState<S> {
    pub fn new(store: S, config: Config) -> Self {
        let tokens = TokenIssuer::new(config.jwt.clone());
        Self {
            store,
            config: Arc::new(config),
            tokens: Arc::new(tokens),
        }
    }

    /// Opens a unit of work for one request
    pub async fn unit_of_work(&self) -> ApiResult<UnitOfWork<S>> {
        Ok(UnitOfWork::begin(&self.store).await?)
    }
}

/// Builds the complete router with middleware
pub fn build_router<S: Store>(state: AppState<S>) -> Router {
    let auth = from_fn_with_state(state.clone(), jwt_auth_layer::<S>);

    let user_routes = Router::new()
        .route("/change-password", post(routes::users::change_password::<S>))
        .route_layer(auth.clone())
        .route("/register", post(routes::users::register::<S>))
        .route("/login", post(routes::users::login::<S>));

    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::list_tasks::<S>).post(routes::tasks::create_task::<S>),
        )
        .route(
            "/:id",
            get(routes::tasks::get_task::<S>)
                .put(routes::tasks::update_task::<S>)
                .delete(routes::tasks::delete_task::<S>),
        )
        .route_layer(auth);

    Router::new()
        .route("/health", get(routes::health::health_check::<S>))
        .nest("/api/users", user_routes)
        .nest("/api/tasks", task_routes)
        .layer(from_fn_with_state(
            state.config.api.environment,
            redact_server_errors,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
