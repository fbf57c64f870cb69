/// Business services
///
/// Services borrow a [`UnitOfWork`](crate::db::unit_of_work::UnitOfWork)
/// for their lifetime and fail fast with a
/// [`ServiceError`](crate::error::ServiceError).
///
/// - `user_service`: registration, password change, login lookup and
///   credential verification
/// - `task_service`: owner-scoped task CRUD with filtering and sorting

pub mod task_service;
pub mod user_service;

pub use task_service::TaskService;
pub use user_service::UserService;
