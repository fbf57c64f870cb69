/// Domain models for TaskDesk
///
/// # Models
///
/// - `user`: User accounts, registration, login and password-change payloads
/// - `task`: Tasks, their status and priority, and the listing filter
///
/// Both models implement [`Entity`](crate::db::store::Entity), so they are
/// read and written through a [`UnitOfWork`](crate::db::unit_of_work::UnitOfWork).

pub mod task;
pub mod user;
