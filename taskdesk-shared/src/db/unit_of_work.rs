/// Unit of work
///
/// A [`UnitOfWork`] owns exactly one datastore session and one repository per
/// entity kind. All writes staged through its repositories are flushed in a
/// single transaction by [`commit`](UnitOfWork::commit).
///
/// # Commit Ordering
///
/// 1. User inserts and updates
/// 2. Task inserts and updates
/// 3. Task deletes
/// 4. User deletes
///
/// # Lifetime
///
/// The session is released by [`close`](UnitOfWork::close), which is
/// idempotent, or when the unit of work is dropped. A unit of work is not
/// `Clone` and all of its operations take `&mut self`, so it cannot be shared
/// across concurrent operations.
///
/// # Example
///
/// ```
/// use taskdesk_shared::db::memory::MemoryStore;
/// use taskdesk_shared::db::unit_of_work::UnitOfWork;
/// use taskdesk_shared::models::task::Task;
/// use taskdesk_shared::models::user::User;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let mut uow = UnitOfWork::begin(&store).await?;
///
/// let user = User::new("alice.b", "a@x.com", "hash");
/// let task = Task::new(user.id, "Buy milk");
/// uow.repository::<Task>().add(task);
/// uow.repository::<User>().add(user);
///
/// // Users are written before their tasks
/// assert!(uow.commit().await?);
/// assert!(!uow.commit().await?);
///
/// uow.close().await;
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::db::repository::{Repository, SharedSession};
use crate::db::store::{Entity, Session, Store, StoreError};
use crate::models::task::Task;
use crate::models::user::User;

/// One repository per entity kind, built eagerly
pub struct Repositories<S: Store> {
    pub users: Repository<User, S>,
    pub tasks: Repository<Task, S>,
}

/// Scoped transaction boundary over one datastore session
pub struct UnitOfWork<S: Store> {
    session: SharedSession<S>,
    repositories: Repositories<S>,
}

impl<S: Store> UnitOfWork<S> {
    /// Opens a session on `store` and builds every repository
    pub async fn begin(store: &S) -> Result<Self, StoreError> {
        let session: SharedSession<S> = Arc::new(Mutex::new(Some(store.open().await?)));
        debug!("Unit of work opened");

        Ok(Self {
            repositories: Repositories {
                users: Repository::new(session.clone()),
                tasks: Repository::new(session.clone()),
            },
            session,
        })
    }

    /// The repository for `E`; the same instance on every call
    pub fn repository<E: Entity>(&mut self) -> &mut Repository<E, S> {
        E::repository(&mut self.repositories)
    }

    /// Flushes every staged change in one transaction
    ///
    /// Returns `true` if at least one row was affected. On error nothing is
    /// committed; either way the staged changes are cleared.
    pub async fn commit(&mut self) -> Result<bool, StoreError> {
        let (user_upserts, user_deletes) = self.repositories.users.take_changes();
        let (task_upserts, task_deletes) = self.repositories.tasks.take_changes();

        let mut changes = user_upserts;
        changes.extend(task_upserts);
        changes.extend(task_deletes);
        changes.extend(user_deletes);

        if changes.is_empty() {
            return Ok(false);
        }

        let staged = changes.len();
        let mut guard = self.session.lock().await;
        let session = guard.as_mut().ok_or(StoreError::Released)?;

        match session.apply(changes).await {
            Ok(affected) => {
                debug!(staged, affected, "Unit of work committed");
                Ok(affected > 0)
            }
            Err(e) => {
                warn!(staged, error = %e, "Unit of work commit failed");
                Err(e)
            }
        }
    }

    /// Releases the session; later calls are no-ops
    pub async fn close(&mut self) {
        if self.session.lock().await.take().is_some() {
            debug!("Unit of work closed");
        }
    }
}

impl<S: Store> Drop for UnitOfWork<S> {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.session.try_lock() {
            if guard.take().is_some() {
                debug!("Unit of work released on drop");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::db::store::{Filter, Relation};
    use crate::models::task::TaskField;
    use crate::models::user::UserField;

    #[tokio::test]
    async fn test_commit_with_nothing_staged() {
        let mut uow = UnitOfWork::begin(&MemoryStore::new()).await.unwrap();
        assert!(!uow.commit().await.unwrap());
    }

    #[tokio::test]
    async fn test_repository_is_stable() {
        let mut uow = UnitOfWork::begin(&MemoryStore::new()).await.unwrap();
        uow.repository::<User>().add(User::new("alice.b", "a@x.com", "hash"));
        assert!(uow.repository::<User>().has_changes());
        assert!(!uow.repository::<Task>().has_changes());
    }

    #[tokio::test]
    async fn test_commit_orders_users_before_tasks() {
        let store = MemoryStore::new();
        let mut uow = UnitOfWork::begin(&store).await.unwrap();

        let user = User::new("alice.b", "a@x.com", "hash");
        uow.repository::<Task>().add(Task::new(user.id, "Buy milk"));
        uow.repository::<User>().add(user.clone());
        assert!(uow.commit().await.unwrap());

        let mut other = UnitOfWork::begin(&store).await.unwrap();
        let loaded = other
            .repository::<User>()
            .get(Some(Filter::eq(UserField::Id, user.id)), &[Relation::Tasks])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_commit_orders_task_deletes_before_user_deletes() {
        let store = MemoryStore::new();
        let user = User::new("alice.b", "a@x.com", "hash");
        let task = Task::new(user.id, "Buy milk");

        let mut uow = UnitOfWork::begin(&store).await.unwrap();
        uow.repository::<User>().add(user.clone());
        uow.repository::<Task>().add(task.clone());
        uow.commit().await.unwrap();

        uow.repository::<User>().delete(&user);
        uow.repository::<Task>().delete(&task);
        assert!(uow.commit().await.unwrap());
        assert!(!uow.repository::<Task>().exists(Filter::All).await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_commit_discards_staged_changes() {
        let store = MemoryStore::new();
        let mut uow = UnitOfWork::begin(&store).await.unwrap();

        uow.repository::<User>().add(User::new("alice.b", "a@x.com", "hash"));
        uow.repository::<User>().add(User::new("ALICE.B", "other@x.com", "hash"));
        let result = uow.commit().await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));

        assert!(!uow.repository::<User>().has_changes());
        assert!(!uow.repository::<User>().exists(Filter::All).await.unwrap());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mut uow = UnitOfWork::begin(&MemoryStore::new()).await.unwrap();
        assert!(uow.repository::<Task>().get_all(None, &[]).await.is_ok());

        uow.close().await;
        uow.close().await;

        let result = uow
            .repository::<Task>()
            .get_all(Some(Filter::eq(TaskField::Title, "x")), &[])
            .await;
        assert!(matches!(result, Err(StoreError::Released)));
    }
}
