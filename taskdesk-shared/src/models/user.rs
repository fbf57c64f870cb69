/// User model and request payloads
///
/// Users own tasks. Usernames and emails are unique across users regardless
/// of case; the unique indexes on `LOWER(username)` and `LOWER(email)` are
/// the authoritative guard.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY,
///     username VARCHAR(100) NOT NULL,
///     email VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```
/// use taskdesk_shared::models::user::User;
///
/// let user = User::new("alice.b", "a@x.com", "c2FsdA==");
/// assert!(user.tasks.is_empty());
/// assert_eq!(user.created_at, user.updated_at);
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::db::repository::Repository;
use crate::db::store::{Entity, EntityKind, Field, Filter, Record, Relation, Session, Store, StoreError, Value};
use crate::db::unit_of_work::Repositories;
use crate::models::task::{Task, TaskField};

/// User account
///
/// The password hash is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    pub username: String,

    pub email: String,

    /// Base64 of salt and SHA-256 digest
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Populated only when the `Tasks` relation is expanded
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<Task>,
}

impl User {
    /// Builds a new user with a fresh id and both timestamps set to now
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            created_at: now,
            updated_at: now,
            tasks: Vec::new(),
        }
    }
}

/// Queryable user fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Id,
    Username,
    Email,
    PasswordHash,
    CreatedAt,
    UpdatedAt,
}

impl Field for UserField {
    fn column(self) -> &'static str {
        match self {
            UserField::Id => "id",
            UserField::Username => "username",
            UserField::Email => "email",
            UserField::PasswordHash => "password_hash",
            UserField::CreatedAt => "created_at",
            UserField::UpdatedAt => "updated_at",
        }
    }
}

#[async_trait]
impl Entity for User {
    type Field = UserField;

    const KIND: EntityKind = EntityKind::User;
    const ID: UserField = UserField::Id;
    const FIELDS: &'static [UserField] = &[
        UserField::Id,
        UserField::Username,
        UserField::Email,
        UserField::PasswordHash,
        UserField::CreatedAt,
        UserField::UpdatedAt,
    ];

    fn id(&self) -> Uuid {
        self.id
    }

    fn value(&self, field: UserField) -> Value {
        match field {
            UserField::Id => self.id.into(),
            UserField::Username => self.username.clone().into(),
            UserField::Email => self.email.clone().into(),
            UserField::PasswordHash => self.password_hash.clone().into(),
            UserField::CreatedAt => self.created_at.into(),
            UserField::UpdatedAt => self.updated_at.into(),
        }
    }

    fn into_record(mut self) -> Record {
        self.tasks.clear();
        Record::User(self)
    }

    fn from_record(record: &Record) -> Option<&Self> {
        match record {
            Record::User(user) => Some(user),
            _ => None,
        }
    }

    fn repository<S: Store>(repositories: &mut Repositories<S>) -> &mut Repository<Self, S> {
        &mut repositories.users
    }

    async fn load_related<T: Session>(
        session: &mut T,
        users: &mut [Self],
        relation: Relation,
    ) -> Result<(), StoreError> {
        match relation {
            Relation::Tasks => {
                if users.is_empty() {
                    return Ok(());
                }
                let filter = Filter::is_in(TaskField::UserId, users.iter().map(|u| u.id));
                let tasks: Vec<Task> = session.fetch(&filter).await?;
                for user in users.iter_mut() {
                    user.tasks = tasks
                        .iter()
                        .filter(|task| task.user_id == user.id)
                        .cloned()
                        .collect();
                }
                Ok(())
            }
        }
    }
}

/// Latin letters, digits and `!_.|()[]^`
pub static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9!_.|()\[\]^]+$").expect("valid username regex"));

/// Registration payload
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUser {
    #[validate(
        length(max = 50, message = "Username can't be longer than 50 characters."),
        regex(
            path = *USERNAME_RE,
            message = "Username must contain only latin letters, digits and symbols !_.|()[]^"
        )
    )]
    pub username: String,

    #[validate(email(message = "Invalid email format."))]
    pub email: String,

    #[validate(length(min = 6, max = 100, message = "Password must be at least 6 characters long."))]
    pub password: String,

    pub confirm_password: String,
}

/// Password change payload; the user is identified separately
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePassword {
    #[validate(length(min = 6, max = 100, message = "Password must be at least 6 characters long."))]
    pub password: String,

    pub confirm_password: String,
}

/// Login payload; `login` is a username or an email
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignIn {
    pub login: String,

    pub password: String,
}
