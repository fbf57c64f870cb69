/// Task CRUD scoped to the owning user
///
/// Every operation takes the caller's user id and only ever sees tasks owned
/// by that user. A task owned by someone else is reported exactly like a
/// task that does not exist.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::store::{Filter, Store};
use crate::db::unit_of_work::UnitOfWork;
use crate::error::{ServiceError, ServiceResult};
use crate::models::task::{CreateTask, Task, TaskField, TaskFilter, TaskSortBy, UpdateTask};

pub const TASK_NOT_FOUND: &str = "Task not found or access denied.";

/// Task operations over one unit of work
pub struct TaskService<'u, S: Store> {
    uow: &'u mut UnitOfWork<S>,
}

impl<'u, S: Store> TaskService<'u, S> {
    pub fn new(uow: &'u mut UnitOfWork<S>) -> Self {
        Self { uow }
    }

    /// Tasks owned by `user_id`, narrowed and ordered by `filter`
    ///
    /// Status and priority narrow the datastore query. Due-date bounds
    /// compare calendar days inclusively and exclude tasks without a due
    /// date. Sorting is stable; tasks without a due date come first when
    /// ascending and last when descending.
    pub async fn get_all_user_tasks(
        &mut self,
        user_id: Uuid,
        filter: Option<TaskFilter>,
    ) -> ServiceResult<Vec<Task>> {
        let filter = filter.unwrap_or_default();

        let mut query = Filter::eq(TaskField::UserId, user_id);
        if let Some(status) = filter.status {
            query = query.and(Filter::eq(TaskField::Status, status.as_str()));
        }
        if let Some(priority) = filter.priority {
            query = query.and(Filter::eq(TaskField::Priority, priority.as_str()));
        }

        let mut tasks = self.uow.repository::<Task>().get_all(Some(query), &[]).await?;

        if let Some(from) = filter.due_date_from {
            tasks.retain(|t| t.due_date.is_some_and(|due| due.date_naive() >= from));
        }
        if let Some(to) = filter.due_date_to {
            tasks.retain(|t| t.due_date.is_some_and(|due| due.date_naive() <= to));
        }

        match filter.sort_by {
            TaskSortBy::None => {}
            TaskSortBy::DueDateAsc => tasks.sort_by_key(|t| t.due_date),
            TaskSortBy::DueDateDesc => tasks.sort_by(|a, b| b.due_date.cmp(&a.due_date)),
            TaskSortBy::PriorityAsc => tasks.sort_by_key(|t| t.priority),
            TaskSortBy::PriorityDesc => tasks.sort_by(|a, b| b.priority.cmp(&a.priority)),
        }

        debug!(user_id = %user_id, count = tasks.len(), "Listed tasks");
        Ok(tasks)
    }

    /// The task `task_id` if it is owned by `user_id`
    ///
    /// # Errors
    ///
    /// `NotFound` when the task does not exist or belongs to another user
    pub async fn get_task_by_id(&mut self, task_id: Uuid, user_id: Uuid) -> ServiceResult<Task> {
        let owned = Filter::eq(TaskField::Id, task_id).and(Filter::eq(TaskField::UserId, user_id));
        self.uow
            .repository::<Task>()
            .get(Some(owned), &[])
            .await?
            .ok_or_else(|| ServiceError::not_found(TASK_NOT_FOUND))
    }

    /// Creates a task owned by `user_id` and returns its id
    pub async fn add_task(&mut self, user_id: Uuid, request: CreateTask) -> ServiceResult<Uuid> {
        if request.title.trim().is_empty() {
            return Err(ServiceError::invalid_argument("Task title is required"));
        }

        let task = Task::from_request(user_id, request);
        let task_id = task.id;

        self.uow.repository::<Task>().add(task);
        self.uow.commit().await?;

        info!(user_id = %user_id, task_id = %task_id, "Task created");
        Ok(task_id)
    }

    /// Applies `request` to an owned task
    ///
    /// Title, description and due date are replaced only when present;
    /// status and priority are always overwritten.
    ///
    /// # Errors
    ///
    /// `NotFound` when the task does not exist, belongs to another user or
    /// is removed before the change is written
    pub async fn update_task(
        &mut self,
        user_id: Uuid,
        task_id: Uuid,
        request: UpdateTask,
    ) -> ServiceResult<bool> {
        let mut task = self.get_task_by_id(task_id, user_id).await?;

        if let Some(title) = request.title {
            task.title = title;
        }
        if let Some(description) = request.description {
            task.description = description;
        }
        if let Some(due_date) = request.due_date {
            task.due_date = Some(due_date);
        }
        task.status = request.status;
        task.priority = request.priority;
        task.updated_at = Utc::now();

        self.uow.repository::<Task>().update(task);
        if !self.uow.commit().await? {
            return Err(ServiceError::not_found(TASK_NOT_FOUND));
        }

        info!(user_id = %user_id, task_id = %task_id, "Task updated");
        Ok(true)
    }

    /// Deletes an owned task
    ///
    /// # Errors
    ///
    /// `NotFound` when the task does not exist or was already removed
    pub async fn delete_task(&mut self, user_id: Uuid, task_id: Uuid) -> ServiceResult<bool> {
        let task = self.get_task_by_id(task_id, user_id).await?;

        self.uow.repository::<Task>().delete(&task);
        if !self.uow.commit().await? {
            return Err(ServiceError::not_found(TASK_NOT_FOUND));
        }

        info!(user_id = %user_id, task_id = %task_id, "Task deleted");
        Ok(true)
    }
}
