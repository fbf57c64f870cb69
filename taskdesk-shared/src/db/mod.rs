/// Persistence layer for TaskDesk
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with health checks
/// - `migrations`: Embedded schema migrations
/// - `store`: Datastore traits, filters and the `Entity` description trait
/// - `postgres`: sqlx-backed datastore
/// - `memory`: Process-local datastore
/// - `repository`: Staged CRUD and query façade over one entity kind
/// - `unit_of_work`: Session owner and atomic commit
///
/// # Example
///
/// ```
/// use taskdesk_shared::db::memory::MemoryStore;
/// use taskdesk_shared::db::store::Filter;
/// use taskdesk_shared::db::unit_of_work::UnitOfWork;
/// use taskdesk_shared::models::user::{User, UserField};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut uow = UnitOfWork::begin(&MemoryStore::new()).await?;
/// let alice = uow
///     .repository::<User>()
///     .get(Some(Filter::eq(UserField::Username, "alice.b")), &[])
///     .await?;
/// assert!(alice.is_none());
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod migrations;
pub mod pool;
pub mod postgres;
pub mod repository;
pub mod store;
pub mod unit_of_work;
