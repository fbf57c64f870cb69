/// In-memory datastore
///
/// Process-local tables behind a mutex. The store enforces what the
/// PostgreSQL schema does: primary keys, the case-insensitive unique indexes
/// on username and email, the task-to-user foreign key with cascading delete,
/// and all-or-nothing application of a change batch.
///
/// Clones share the same tables.
///
/// # Example
///
/// ```
/// use taskdesk_shared::db::memory::MemoryStore;
/// use taskdesk_shared::db::store::EntityKind;
///
/// let store = MemoryStore::new();
/// assert_eq!(store.len(EntityKind::User), 0);
/// ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::db::store::{Change, Entity, EntityKind, Filter, Record, Session, Store, StoreError};

type Tables = HashMap<EntityKind, Vec<Record>>;

/// Datastore backed by process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed rows of `kind`
    pub fn len(&self, kind: EntityKind) -> usize {
        self.lock().get(&kind).map_or(0, Vec::len)
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Session = MemorySession;

    async fn open(&self) -> Result<MemorySession, StoreError> {
        Ok(MemorySession {
            store: self.clone(),
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Session on a [`MemoryStore`]
#[derive(Debug)]
pub struct MemorySession {
    store: MemoryStore,
}

#[async_trait]
impl Session for MemorySession {
    async fn fetch<E: Entity>(&mut self, filter: &Filter<E::Field>) -> Result<Vec<E>, StoreError> {
        let tables = self.store.lock();
        Ok(tables
            .get(&E::KIND)
            .into_iter()
            .flatten()
            .filter_map(E::from_record)
            .filter(|entity| filter.matches(*entity))
            .cloned()
            .collect())
    }

    async fn apply(&mut self, changes: Vec<Change>) -> Result<u64, StoreError> {
        let mut tables = self.store.lock();

        // Work on a copy so a failing change leaves the tables untouched
        let mut draft = tables.clone();
        let mut affected = 0;
        for change in changes {
            affected += apply_change(&mut draft, change)?;
        }

        *tables = draft;
        debug!(affected, "Applied change batch to memory store");
        Ok(affected)
    }
}

fn apply_change(tables: &mut Tables, change: Change) -> Result<u64, StoreError> {
    match change {
        Change::Insert(record) => {
            let kind = record.kind();
            if rows(tables, kind).iter().any(|r| r.id() == record.id()) {
                return Err(StoreError::Conflict(format!("{}_pkey", kind.table())));
            }
            check_constraints(tables, &record)?;
            tables.entry(kind).or_default().push(record);
            Ok(1)
        }
        Change::Update(record) => {
            let kind = record.kind();
            let Some(index) = rows(tables, kind).iter().position(|r| r.id() == record.id()) else {
                return Ok(0);
            };
            check_constraints(tables, &record)?;
            tables.entry(kind).or_default()[index] = record;
            Ok(1)
        }
        Change::Delete { kind, id } => {
            let table = tables.entry(kind).or_default();
            let before = table.len();
            table.retain(|r| r.id() != id);
            let removed = (before - table.len()) as u64;

            if removed > 0 {
                for children in tables.values_mut() {
                    children.retain(|r| !matches!(r.parent(), Some((k, parent, _)) if k == kind && parent == id));
                }
            }
            Ok(removed)
        }
    }
}

fn rows(tables: &Tables, kind: EntityKind) -> &[Record] {
    tables.get(&kind).map_or(&[], Vec::as_slice)
}

fn check_constraints(tables: &Tables, record: &Record) -> Result<(), StoreError> {
    let keys = record.unique_keys();
    for other in rows(tables, record.kind()).iter().filter(|r| r.id() != record.id()) {
        for ((index, key), (_, other_key)) in keys.iter().zip(other.unique_keys()) {
            if *key == other_key {
                return Err(StoreError::Conflict(index.to_string()));
            }
        }
    }

    if let Some((parent_kind, parent_id, constraint)) = record.parent() {
        if !rows(tables, parent_kind).iter().any(|r| r.id() == parent_id) {
            return Err(StoreError::ForeignKey(constraint.to_string()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::{Task, TaskField};
    use crate::models::user::{User, UserField};

    fn insert(entity: impl Entity) -> Change {
        Change::Insert(entity.into_record())
    }

    async fn session() -> (MemoryStore, MemorySession) {
        let store = MemoryStore::new();
        let session = store.open().await.unwrap();
        (store, session)
    }

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let (store, mut session) = session().await;
        let user = User::new("alice.b", "a@x.com", "hash");

        let affected = session.apply(vec![insert(user.clone())]).await.unwrap();
        assert_eq!(affected, 1);
        assert_eq!(store.len(EntityKind::User), 1);

        let found: Vec<User> = session.fetch(&Filter::eq(UserField::Username, "alice.b")).await.unwrap();
        assert_eq!(found, vec![user]);
    }

    #[tokio::test]
    async fn test_unique_index_is_case_insensitive() {
        let (store, mut session) = session().await;
        session
            .apply(vec![insert(User::new("alice.b", "a@x.com", "hash"))])
            .await
            .unwrap();

        let result = session
            .apply(vec![insert(User::new("bob", "A@X.COM", "hash"))])
            .await;
        assert!(matches!(result, Err(StoreError::Conflict(index)) if index == "users_email_key"));
        assert_eq!(store.len(EntityKind::User), 1);
    }

    #[tokio::test]
    async fn test_failed_batch_applies_nothing() {
        let (store, mut session) = session().await;
        let user = User::new("alice.b", "a@x.com", "hash");
        let orphan = Task::new(uuid::Uuid::new_v4(), "Orphan");

        let result = session.apply(vec![insert(user), insert(orphan)]).await;
        assert!(matches!(result, Err(StoreError::ForeignKey(_))));
        assert_eq!(store.len(EntityKind::User), 0);
        assert_eq!(store.len(EntityKind::Task), 0);
    }

    #[tokio::test]
    async fn test_update_missing_row_affects_nothing() {
        let (_, mut session) = session().await;
        let user = User::new("alice.b", "a@x.com", "hash");
        let affected = session
            .apply(vec![Change::Update(user.into_record())])
            .await
            .unwrap();
        assert_eq!(affected, 0);
    }

    #[tokio::test]
    async fn test_user_delete_cascades_to_tasks() {
        let (store, mut session) = session().await;
        let user = User::new("alice.b", "a@x.com", "hash");
        let task = Task::new(user.id, "Buy milk");
        session
            .apply(vec![insert(user.clone()), insert(task)])
            .await
            .unwrap();

        let affected = session
            .apply(vec![Change::Delete {
                kind: EntityKind::User,
                id: user.id,
            }])
            .await
            .unwrap();
        assert_eq!(affected, 1);
        assert_eq!(store.len(EntityKind::Task), 0);

        let left: Vec<Task> = session.fetch(&Filter::eq(TaskField::UserId, user.id)).await.unwrap();
        assert!(left.is_empty());
    }
}
