/// Datastore abstraction
///
/// A [`Store`] is the capability a unit of work is opened against. Opening it
/// yields one [`Session`], which reads entities through a [`Filter`] and
/// applies a batch of [`Change`]s atomically.
///
/// Entities describe themselves statically through the [`Entity`] trait: their
/// kind, their `Field` enum with its column mapping, and how to convert to and
/// from the type-erased [`Record`] the datastores store. There is no runtime
/// type dispatch.
///
/// Two implementations ship with the crate:
///
/// - [`PgStore`](crate::db::postgres::PgStore): PostgreSQL via sqlx
/// - [`MemoryStore`](crate::db::memory::MemoryStore): process-local tables with
///   the same unique indexes and all-or-nothing commit

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, FromRow};
use uuid::Uuid;

use crate::db::repository::Repository;
use crate::db::unit_of_work::Repositories;
use crate::models::{task::Task, user::User};

/// Error type for datastore operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique index rejected a write
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    /// A foreign key rejected a write
    #[error("Foreign key constraint violated: {0}")]
    ForeignKey(String),

    /// Relation expansion requested on an entity that has no such relation
    #[error("Relation {relation:?} is not defined for {entity}")]
    InvalidRelation {
        entity: &'static str,
        relation: Relation,
    },

    /// The unit of work's session was already released
    #[error("Datastore session has been released")]
    Released,

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            if db_err.is_unique_violation() {
                return StoreError::Conflict(constraint);
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::ForeignKey(constraint);
            }
        }
        StoreError::Database(err)
    }
}

/// Closed set of persisted entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Task,
}

impl EntityKind {
    /// Backing table name
    pub fn table(self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::Task => "tasks",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EntityKind::User => "User",
            EntityKind::Task => "Task",
        }
    }
}

/// Navigations that can be eagerly expanded on read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// A user's tasks
    Tasks,
}

/// Column value, as bound into SQL or compared in memory
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Uuid(Uuid),
    Text(String),
    Timestamp(Option<DateTime<Utc>>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Timestamp(None))
    }

    fn eq_ignore_case(&self, other: &str) -> bool {
        match self {
            Value::Text(text) => text.to_lowercase() == other.to_lowercase(),
            _ => false,
        }
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Value::Uuid(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(Some(value))
    }
}

impl From<Option<DateTime<Utc>>> for Value {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        Value::Timestamp(value)
    }
}

/// A queryable field of one entity, statically mapped to its column
pub trait Field: Copy + fmt::Debug + PartialEq + Send + Sync + 'static {
    fn column(self) -> &'static str;
}

/// Predicate over the fields of one entity kind
///
/// Rendered to SQL by the PostgreSQL adapter and evaluated directly by the
/// in-memory adapter and the staged-change overlay.
///
/// # Example
///
/// ```
/// use taskdesk_shared::db::store::Filter;
/// use taskdesk_shared::models::user::UserField;
///
/// let either = Filter::eq_ignore_case(UserField::Email, "A@X.com")
///     .or(Filter::eq_ignore_case(UserField::Username, "alice.b"));
/// assert!(matches!(either, Filter::Or(ref parts) if parts.len() == 2));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Filter<F> {
    /// Matches every entity
    All,

    /// Exact equality (`IS NULL` for a null value)
    Eq(F, Value),

    /// Case-insensitive text equality
    EqIgnoreCase(F, String),

    /// Membership in a list; an empty list matches nothing
    In(F, Vec<Value>),

    /// All parts match; empty matches everything
    And(Vec<Filter<F>>),

    /// Any part matches; empty matches nothing
    Or(Vec<Filter<F>>),
}

impl<F: Field> Filter<F> {
    pub fn eq(field: F, value: impl Into<Value>) -> Self {
        Filter::Eq(field, value.into())
    }

    pub fn eq_ignore_case(field: F, value: impl Into<String>) -> Self {
        Filter::EqIgnoreCase(field, value.into())
    }

    pub fn is_in<I, V>(field: F, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Filter::In(field, values.into_iter().map(Into::into).collect())
    }

    pub fn and(self, other: Filter<F>) -> Self {
        match self {
            Filter::And(mut parts) => {
                parts.push(other);
                Filter::And(parts)
            }
            first => Filter::And(vec![first, other]),
        }
    }

    pub fn or(self, other: Filter<F>) -> Self {
        match self {
            Filter::Or(mut parts) => {
                parts.push(other);
                Filter::Or(parts)
            }
            first => Filter::Or(vec![first, other]),
        }
    }

    /// Evaluates the predicate against an entity in memory
    pub fn matches<E: Entity<Field = F>>(&self, entity: &E) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, value) => entity.value(*field) == *value,
            Filter::EqIgnoreCase(field, value) => entity.value(*field).eq_ignore_case(value),
            Filter::In(field, values) => {
                let actual = entity.value(*field);
                values.iter().any(|v| *v == actual)
            }
            Filter::And(parts) => parts.iter().all(|p| p.matches(entity)),
            Filter::Or(parts) => parts.iter().any(|p| p.matches(entity)),
        }
    }
}

/// Static description of a persisted entity
#[async_trait]
pub trait Entity: Clone + Send + Sync + Unpin + for<'r> FromRow<'r, PgRow> + 'static {
    type Field: Field;

    const KIND: EntityKind;

    /// Primary key field
    const ID: Self::Field;

    /// Every persisted field, in column order
    const FIELDS: &'static [Self::Field];

    fn id(&self) -> Uuid;

    fn value(&self, field: Self::Field) -> Value;

    fn into_record(self) -> Record;

    fn from_record(record: &Record) -> Option<&Self>;

    /// This entity's repository within a unit of work
    fn repository<S: Store>(repositories: &mut Repositories<S>) -> &mut Repository<Self, S>;

    /// Eagerly loads `relation` onto every entity in `entities`
    async fn load_related<T: Session>(
        _session: &mut T,
        _entities: &mut [Self],
        relation: Relation,
    ) -> Result<(), StoreError> {
        Err(StoreError::InvalidRelation {
            entity: Self::KIND.name(),
            relation,
        })
    }
}

/// Type-erased row held by the datastores
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    User(User),
    Task(Task),
}

impl Record {
    pub fn kind(&self) -> EntityKind {
        match self {
            Record::User(_) => EntityKind::User,
            Record::Task(_) => EntityKind::Task,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Record::User(user) => user.id,
            Record::Task(task) => task.id,
        }
    }

    /// `(column, value)` pairs in column order
    pub fn columns(&self) -> Vec<(&'static str, Value)> {
        match self {
            Record::User(user) => columns_of(user),
            Record::Task(task) => columns_of(task),
        }
    }

    /// `(index name, normalized key)` for each unique index beyond the primary key
    pub fn unique_keys(&self) -> Vec<(&'static str, String)> {
        match self {
            Record::User(user) => vec![
                ("users_username_key", user.username.to_lowercase()),
                ("users_email_key", user.email.to_lowercase()),
            ],
            Record::Task(_) => Vec::new(),
        }
    }

    /// `(parent kind, parent id, constraint name)` for rows with a foreign key
    pub fn parent(&self) -> Option<(EntityKind, Uuid, &'static str)> {
        match self {
            Record::User(_) => None,
            Record::Task(task) => Some((EntityKind::User, task.user_id, "tasks_user_id_fkey")),
        }
    }
}

fn columns_of<E: Entity>(entity: &E) -> Vec<(&'static str, Value)> {
    E::FIELDS
        .iter()
        .map(|field| (field.column(), entity.value(*field)))
        .collect()
}

/// One staged write
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Insert(Record),
    Update(Record),
    Delete { kind: EntityKind, id: Uuid },
}

/// A datastore a unit of work can be opened against
#[async_trait]
pub trait Store: Clone + Send + Sync + 'static {
    type Session: Session;

    /// Acquires a session (one connection)
    async fn open(&self) -> Result<Self::Session, StoreError>;

    /// Cheap liveness check
    async fn ping(&self) -> Result<(), StoreError>;
}

/// One exclusive connection to a datastore
///
/// Dropping the session releases it.
#[async_trait]
pub trait Session: Send + 'static {
    /// Committed entities of kind `E` matching `filter`, in storage order
    async fn fetch<E: Entity>(&mut self, filter: &Filter<E::Field>) -> Result<Vec<E>, StoreError>;

    /// Applies `changes` in order inside one transaction
    ///
    /// Returns the number of rows affected. On error nothing is applied.
    async fn apply(&mut self, changes: Vec<Change>) -> Result<u64, StoreError>;
}
