/// Generic repository
///
/// A [`Repository`] is the only gateway to one entity kind inside a
/// [`UnitOfWork`](crate::db::unit_of_work::UnitOfWork). Writes are staged in
/// memory and only reach the datastore on commit; reads see committed state
/// overlaid with the writes staged so far.
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
///
/// uow.repository::<User>().add(User::new("alice.b", "a@x.com", "hash"));
///
/// // Staged but not yet committed, still visible to this unit of work
/// let by_email = Filter::eq_ignore_case(UserField::Email, "A@X.COM");
/// assert!(uow.repository::<User>().exists(by_email).await?);
///
/// assert!(uow.commit().await?);
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::db::store::{Change, Entity, Filter, Relation, Session, Store, StoreError};

/// Session shared by a unit of work and its repositories
pub(crate) type SharedSession<S> = Arc<Mutex<Option<<S as Store>::Session>>>;

#[derive(Debug, Clone)]
enum Staged<E> {
    Insert(E),
    Update(E),
    Delete(Uuid),
}

impl<E: Entity> Staged<E> {
    fn id(&self) -> Uuid {
        match self {
            Staged::Insert(entity) | Staged::Update(entity) => entity.id(),
            Staged::Delete(id) => *id,
        }
    }
}

/// CRUD and query façade over one entity kind
pub struct Repository<E: Entity, S: Store> {
    session: SharedSession<S>,
    staged: Vec<Staged<E>>,
}

impl<E: Entity, S: Store> Repository<E, S> {
    pub(crate) fn new(session: SharedSession<S>) -> Self {
        Self {
            session,
            staged: Vec::new(),
        }
    }

    /// Stages an insert
    pub fn add(&mut self, entity: E) -> bool {
        self.staged.push(Staged::Insert(entity));
        true
    }

    /// Stages an update-in-place
    ///
    /// Updating an entity added in this unit of work folds into its insert.
    /// Updating an entity staged for deletion withdraws the delete, so reads
    /// and the eventual commit both keep the row.
    pub fn update(&mut self, entity: E) -> bool {
        let id = entity.id();
        match self.staged.iter_mut().rev().find(|s| s.id() == id) {
            Some(Staged::Insert(pending)) => *pending = entity,
            Some(Staged::Update(pending)) => *pending = entity,
            Some(Staged::Delete(_)) => {
                self.staged.retain(|s| s.id() != id);
                self.staged.push(Staged::Update(entity));
            }
            None => self.staged.push(Staged::Update(entity)),
        }
        true
    }

    /// Stages a removal
    ///
    /// Deleting an entity added in this unit of work cancels its insert.
    pub fn delete(&mut self, entity: &E) -> bool {
        let id = entity.id();
        let was_pending_insert = self
            .staged
            .iter()
            .any(|s| matches!(s, Staged::Insert(e) if e.id() == id));

        self.staged.retain(|s| s.id() != id);
        if !was_pending_insert {
            self.staged.push(Staged::Delete(id));
        }
        true
    }

    /// Whether any entity matches `filter`
    pub async fn exists(&self, filter: Filter<E::Field>) -> Result<bool, StoreError> {
        Ok(!self.get_all(Some(filter), &[]).await?.is_empty())
    }

    /// First entity matching `filter`, if any
    pub async fn get(
        &self,
        filter: Option<Filter<E::Field>>,
        relations: &[Relation],
    ) -> Result<Option<E>, StoreError> {
        Ok(self.get_all(filter, relations).await?.into_iter().next())
    }

    /// Every entity matching `filter` (`None` matches all), with `relations`
    /// eagerly expanded
    pub async fn get_all(
        &self,
        filter: Option<Filter<E::Field>>,
        relations: &[Relation],
    ) -> Result<Vec<E>, StoreError> {
        let filter = filter.unwrap_or(Filter::All);

        let mut guard = self.session.lock().await;
        let session = guard.as_mut().ok_or(StoreError::Released)?;

        // Committed rows with a staged update are fetched regardless of the
        // filter, since the update may be what makes them match.
        let updated: Vec<Uuid> = self
            .staged
            .iter()
            .filter_map(|s| match s {
                Staged::Update(entity) => Some(entity.id()),
                _ => None,
            })
            .collect();
        let query = if updated.is_empty() {
            filter.clone()
        } else {
            filter.clone().or(Filter::is_in(E::ID, updated))
        };

        let committed = session.fetch::<E>(&query).await?;
        let mut rows = self.overlay(committed, &filter);

        for relation in relations {
            E::load_related(session, &mut rows, *relation).await?;
        }

        Ok(rows)
    }

    fn overlay(&self, committed: Vec<E>, filter: &Filter<E::Field>) -> Vec<E> {
        let mut rows: Vec<E> = committed
            .into_iter()
            .filter_map(|row| {
                let id = row.id();
                match self.staged.iter().rev().find(|s| s.id() == id) {
                    Some(Staged::Delete(_)) => None,
                    Some(Staged::Update(pending)) | Some(Staged::Insert(pending)) => {
                        Some(pending.clone())
                    }
                    None => Some(row),
                }
            })
            .filter(|row| filter.matches(row))
            .collect();

        rows.extend(self.staged.iter().filter_map(|s| match s {
            Staged::Insert(entity) if filter.matches(entity) => Some(entity.clone()),
            _ => None,
        }));

        rows
    }

    /// Whether anything is staged
    pub fn has_changes(&self) -> bool {
        !self.staged.is_empty()
    }

    /// Drains staged writes as `(inserts and updates, deletes)`
    pub(crate) fn take_changes(&mut self) -> (Vec<Change>, Vec<Change>) {
        let mut upserts = Vec::new();
        let mut deletes = Vec::new();

        for staged in std::mem::take(&mut self.staged) {
            match staged {
                Staged::Insert(entity) => upserts.push(Change::Insert(entity.into_record())),
                Staged::Update(entity) => upserts.push(Change::Update(entity.into_record())),
                Staged::Delete(id) => deletes.push(Change::Delete { kind: E::KIND, id }),
            }
        }

        (upserts, deletes)
    }
}
