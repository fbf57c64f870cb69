/// PostgreSQL datastore
///
/// Filters are rendered to SQL with bound parameters; column names come only
/// from the static `Field` mappings. A change batch runs inside one
/// transaction on the session's pooled connection.
///
/// # Example
///
/// ```no_run
/// use taskdesk_shared::db::pool::{create_pool, DatabaseConfig};
/// use taskdesk_shared::db::postgres::PgStore;
/// use taskdesk_shared::db::unit_of_work::UnitOfWork;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig {
///     url: std::env::var("DATABASE_URL")?,
///     ..Default::default()
/// })
/// .await?;
///
/// let store = PgStore::new(pool);
/// let mut uow = UnitOfWork::begin(&store).await?;
/// uow.close().await;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPool, Postgres};
use sqlx::QueryBuilder;
use tracing::debug;

use crate::db::pool::health_check;
use crate::db::store::{Change, Entity, Field, Filter, Session, Store, StoreError, Value};

/// Datastore backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    type Session = PgSession;

    async fn open(&self) -> Result<PgSession, StoreError> {
        let conn = self.pool.acquire().await?;
        Ok(PgSession { conn })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        health_check(&self.pool).await?;
        Ok(())
    }
}

/// One pooled connection; returned to the pool on drop
#[derive(Debug)]
pub struct PgSession {
    conn: PoolConnection<Postgres>,
}

#[async_trait]
impl Session for PgSession {
    async fn fetch<E: Entity>(&mut self, filter: &Filter<E::Field>) -> Result<Vec<E>, StoreError> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM ");
        query.push(E::KIND.table()).push(" WHERE ");
        push_filter(&mut query, filter);
        query.push(" ORDER BY created_at, id");

        let rows = query.build_query_as::<E>().fetch_all(&mut *self.conn).await?;
        Ok(rows)
    }

    async fn apply(&mut self, changes: Vec<Change>) -> Result<u64, StoreError> {
        let mut tx = sqlx::Connection::begin(&mut *self.conn).await?;
        let mut affected = 0;

        for change in &changes {
            let mut query = change_query(change);
            affected += query.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        debug!(changes = changes.len(), affected, "Applied change batch");
        Ok(affected)
    }
}

fn push_value(query: &mut QueryBuilder<'_, Postgres>, value: &Value) {
    match value.clone() {
        Value::Uuid(v) => query.push_bind(v),
        Value::Text(v) => query.push_bind(v),
        Value::Timestamp(v) => query.push_bind(v),
    };
}

/// Appends `filter` as a boolean SQL expression
pub(crate) fn push_filter<F: Field>(query: &mut QueryBuilder<'_, Postgres>, filter: &Filter<F>) {
    match filter {
        Filter::All => {
            query.push("TRUE");
        }
        Filter::Eq(field, value) if value.is_null() => {
            query.push(field.column()).push(" IS NULL");
        }
        Filter::Eq(field, value) => {
            query.push(field.column()).push(" = ");
            push_value(query, value);
        }
        Filter::EqIgnoreCase(field, value) => {
            query.push("LOWER(").push(field.column()).push(") = LOWER(");
            query.push_bind(value.clone()).push(")");
        }
        Filter::In(_, values) if values.is_empty() => {
            query.push("FALSE");
        }
        Filter::In(field, values) => {
            query.push(field.column()).push(" IN (");
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    query.push(", ");
                }
                push_value(query, value);
            }
            query.push(")");
        }
        Filter::And(parts) => push_joined(query, parts, " AND ", "TRUE"),
        Filter::Or(parts) => push_joined(query, parts, " OR ", "FALSE"),
    }
}

fn push_joined<F: Field>(
    query: &mut QueryBuilder<'_, Postgres>,
    parts: &[Filter<F>],
    separator: &str,
    empty: &str,
) {
    if parts.is_empty() {
        query.push(empty);
        return;
    }
    query.push("(");
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            query.push(separator);
        }
        push_filter(query, part);
    }
    query.push(")");
}

fn change_query(change: &Change) -> QueryBuilder<'static, Postgres> {
    match change {
        Change::Insert(record) => {
            let columns = record.columns();
            let mut query = QueryBuilder::new("INSERT INTO ");
            query.push(record.kind().table()).push(" (");
            for (i, (column, _)) in columns.iter().enumerate() {
                if i > 0 {
                    query.push(", ");
                }
                query.push(*column);
            }
            query.push(") VALUES (");
            for (i, (_, value)) in columns.iter().enumerate() {
                if i > 0 {
                    query.push(", ");
                }
                push_value(&mut query, value);
            }
            query.push(")");
            query
        }
        Change::Update(record) => {
            let mut query = QueryBuilder::new("UPDATE ");
            query.push(record.kind().table()).push(" SET ");
            let columns = record.columns();
            for (i, (column, value)) in columns.iter().filter(|(c, _)| *c != "id").enumerate() {
                if i > 0 {
                    query.push(", ");
                }
                query.push(*column).push(" = ");
                push_value(&mut query, value);
            }
            query.push(" WHERE id = ").push_bind(record.id());
            query
        }
        Change::Delete { kind, id } => {
            let mut query = QueryBuilder::new("DELETE FROM ");
            query.push(kind.table()).push(" WHERE id = ").push_bind(*id);
            query
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::EntityKind;
    use crate::models::task::{Task, TaskField};
    use crate::models::user::UserField;
    use uuid::Uuid;

    fn render<F: Field>(filter: &Filter<F>) -> String {
        let mut query = QueryBuilder::<Postgres>::new("");
        push_filter(&mut query, filter);
        query.sql().to_string()
    }

    #[test]
    fn test_render_simple_filters() {
        assert_eq!(render::<TaskField>(&Filter::All), "TRUE");
        assert_eq!(render(&Filter::eq(TaskField::UserId, Uuid::new_v4())), "user_id = $1");
        assert_eq!(
            render(&Filter::eq(TaskField::DueDate, None::<chrono::DateTime<chrono::Utc>>)),
            "due_date IS NULL"
        );
        assert_eq!(
            render(&Filter::eq_ignore_case(UserField::Email, "A@X.com")),
            "LOWER(email) = LOWER($1)"
        );
    }

    #[test]
    fn test_render_in() {
        let ids = vec![Uuid::new_v4(), Uuid::new_v4()];
        assert_eq!(render(&Filter::is_in(TaskField::Id, ids)), "id IN ($1, $2)");
        assert_eq!(render(&Filter::is_in(TaskField::Id, Vec::<Uuid>::new())), "FALSE");
    }

    #[test]
    fn test_render_composite() {
        let filter = Filter::eq_ignore_case(UserField::Email, "a@x.com")
            .or(Filter::eq_ignore_case(UserField::Username, "alice.b"));
        assert_eq!(
            render(&filter),
            "(LOWER(email) = LOWER($1) OR LOWER(username) = LOWER($2))"
        );
        assert_eq!(render::<UserField>(&Filter::Or(vec![])), "FALSE");
    }

    #[test]
    fn test_change_queries() {
        let task = Task::new(Uuid::new_v4(), "Buy milk");

        let insert = change_query(&Change::Insert(task.clone().into_record()));
        assert_eq!(
            insert.sql(),
            "INSERT INTO tasks (id, title, description, due_date, status, priority, user_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        );

        let update = change_query(&Change::Update(task.clone().into_record()));
        assert!(update.sql().starts_with("UPDATE tasks SET title = $1, "));
        assert!(update.sql().ends_with("updated_at = $8 WHERE id = $9"));

        let delete = change_query(&Change::Delete {
            kind: EntityKind::Task,
            id: task.id,
        });
        assert_eq!(delete.sql(), "DELETE FROM tasks WHERE id = $1");
    }
}
