/// Task model and request payloads
///
/// A task is a personal to-do item owned by exactly one user. Tasks are only
/// visible and mutable through operations scoped by the owner's id.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     title VARCHAR(200) NOT NULL,
///     description VARCHAR(200) NOT NULL DEFAULT '',
///     due_date TIMESTAMPTZ,
///     status VARCHAR(20) NOT NULL DEFAULT 'Pending',
///     priority VARCHAR(20) NOT NULL DEFAULT 'Medium',
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Status and priority are stored by name.
///
/// # Example
///
/// ```
/// use taskdesk_shared::models::task::{Task, TaskPriority, TaskStatus};
/// use uuid::Uuid;
///
/// let task = Task::new(Uuid::new_v4(), "Buy milk");
/// assert_eq!(task.status, TaskStatus::Pending);
/// assert_eq!(task.priority, TaskPriority::Medium);
/// assert!(TaskPriority::Low < TaskPriority::High);
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::db::repository::Repository;
use crate::db::store::{Entity, EntityKind, Field, Record, Store, Value};
use crate::db::unit_of_work::Repositories;

/// Error returned when a stored status or priority name is not recognized
#[derive(Debug, thiserror::Error)]
#[error("Unknown {kind} value: {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

/// Task progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "InProgress",
            TaskStatus::Completed => "Completed",
        }
    }
}

impl TryFrom<String> for TaskStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "Pending" => Ok(TaskStatus::Pending),
            "InProgress" => Ok(TaskStatus::InProgress),
            "Completed" => Ok(TaskStatus::Completed),
            _ => Err(UnknownVariant {
                kind: "status",
                value,
            }),
        }
    }
}

/// Task priority, ranked `Low < Medium < High`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
        }
    }
}

impl TryFrom<String> for TaskPriority {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "Low" => Ok(TaskPriority::Low),
            "Medium" => Ok(TaskPriority::Medium),
            "High" => Ok(TaskPriority::High),
            _ => Err(UnknownVariant {
                kind: "priority",
                value,
            }),
        }
    }
}

/// Ordering applied to a task listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskSortBy {
    /// Storage order
    #[default]
    None,
    DueDateAsc,
    DueDateDesc,
    PriorityAsc,
    PriorityDesc,
}

/// Personal to-do item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,

    pub title: String,

    /// Empty when not provided
    pub description: String,

    pub due_date: Option<DateTime<Utc>>,

    #[sqlx(try_from = "String")]
    pub status: TaskStatus,

    #[sqlx(try_from = "String")]
    pub priority: TaskPriority,

    /// Owning user
    pub user_id: Uuid,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Builds a pending, medium-priority task with a fresh id and timestamps
    pub fn new(user_id: Uuid, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: String::new(),
            due_date: None,
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            user_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builds a task for `user_id` from a creation payload
    pub fn from_request(user_id: Uuid, request: CreateTask) -> Self {
        let mut task = Task::new(user_id, request.title);
        task.description = request.description.unwrap_or_default();
        task.due_date = request.due_date;
        task.status = request.status;
        task.priority = request.priority;
        task
    }
}

/// Queryable task fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Id,
    Title,
    Description,
    DueDate,
    Status,
    Priority,
    UserId,
    CreatedAt,
    UpdatedAt,
}

impl Field for TaskField {
    fn column(self) -> &'static str {
        match self {
            TaskField::Id => "id",
            TaskField::Title => "title",
            TaskField::Description => "description",
            TaskField::DueDate => "due_date",
            TaskField::Status => "status",
            TaskField::Priority => "priority",
            TaskField::UserId => "user_id",
            TaskField::CreatedAt => "created_at",
            TaskField::UpdatedAt => "updated_at",
        }
    }
}

impl Entity for Task {
    type Field = TaskField;

    const KIND: EntityKind = EntityKind::Task;
    const ID: TaskField = TaskField::Id;
    const FIELDS: &'static [TaskField] = &[
        TaskField::Id,
        TaskField::Title,
        TaskField::Description,
        TaskField::DueDate,
        TaskField::Status,
        TaskField::Priority,
        TaskField::UserId,
        TaskField::CreatedAt,
        TaskField::UpdatedAt,
    ];

    fn id(&self) -> Uuid {
        self.id
    }

    fn value(&self, field: TaskField) -> Value {
        match field {
            TaskField::Id => self.id.into(),
            TaskField::Title => self.title.clone().into(),
            TaskField::Description => self.description.clone().into(),
            TaskField::DueDate => self.due_date.into(),
            TaskField::Status => self.status.as_str().into(),
            TaskField::Priority => self.priority.as_str().into(),
            TaskField::UserId => self.user_id.into(),
            TaskField::CreatedAt => self.created_at.into(),
            TaskField::UpdatedAt => self.updated_at.into(),
        }
    }

    fn into_record(self) -> Record {
        Record::Task(self)
    }

    fn from_record(record: &Record) -> Option<&Self> {
        match record {
            Record::Task(task) => Some(task),
            _ => None,
        }
    }

    fn repository<S: Store>(repositories: &mut Repositories<S>) -> &mut Repository<Self, S> {
        &mut repositories.tasks
    }
}

/// Task creation payload
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    #[validate(length(max = 50, message = "Title should be less than 50 symbols long."))]
    pub title: String,

    #[validate(length(max = 200, message = "Description should be less than 200 symbols long."))]
    pub description: Option<String>,

    pub due_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub priority: TaskPriority,
}

/// Task update payload
///
/// `None` keeps the stored title, description or due date. Status and
/// priority are always overwritten.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    #[validate(length(max = 50, message = "Title should be less than 50 symbols long."))]
    pub title: Option<String>,

    #[validate(length(max = 200, message = "Description should be less than 200 symbols long."))]
    pub description: Option<String>,

    pub due_date: Option<DateTime<Utc>>,

    pub status: TaskStatus,

    pub priority: TaskPriority,
}

/// Listing filter; every criterion is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,

    /// Inclusive lower bound on the due date's calendar day
    pub due_date_from: Option<NaiveDate>,

    /// Inclusive upper bound on the due date's calendar day
    pub due_date_to: Option<NaiveDate>,

    pub priority: Option<TaskPriority>,

    #[serde(default)]
    pub sort_by: TaskSortBy,
}
