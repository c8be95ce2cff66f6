//! SQLite ticket store.
//!
//! Two tables:
//! - `users` — caller-chosen integer ids, unique names
//! - `tickets` — generated ids, unique titles, at most one ticket per user
//!
//! Deleting a user cascades to their ticket. Multi-statement operations run
//! inside one `BEGIN IMMEDIATE` transaction, so concurrent writers queue on
//! the busy timeout instead of failing on lock upgrade; a transaction dropped
//! before `commit` rolls back.

use async_trait::async_trait;
use minijira_core::error::StoreError;
use minijira_core::store::{Ticket, TicketFilter, TicketStatus, TicketStore, User};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// How long a writer waits for the database lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const TICKET_COLUMNS: &str =
    "SELECT t.id, t.title, t.assignee_id, u.name AS assignee, t.status \
     FROM tickets t JOIN users u ON t.assignee_id = u.id";

/// A SQLite implementation of [`TicketStore`].
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database file at `path` and migrate it.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StoreError::Unavailable(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Failed to open SQLite: {e}")))?;

        let store = Self::from_pool(pool).await?;
        info!("SQLite ticket store initialized at {}", path.display());
        Ok(store)
    }

    /// An ephemeral database that lives as long as the store.
    ///
    /// Every pooled connection to `:memory:` is a separate database, so the
    /// pool holds exactly one connection and never recycles it.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StoreError::Unavailable(format!("Invalid SQLite path: {e}")))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Failed to open SQLite: {e}")))?;

        Self::from_pool(pool).await
    }

    /// Create from an existing pool (schema is migrated).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Create tables if they do not exist. Idempotent.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id   INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("users table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tickets (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                title       TEXT NOT NULL UNIQUE,
                assignee_id INTEGER NOT NULL UNIQUE
                            REFERENCES users(id) ON DELETE CASCADE,
                status      TEXT NOT NULL DEFAULT 'OPEN'
                            CHECK(status IN ('OPEN', 'IN_PROGRESS', 'CLOSED'))
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("tickets table: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Number of users and tickets currently stored.
    pub async fn counts(&self) -> Result<(i64, i64), StoreError> {
        let row = sqlx::query(
            "SELECT (SELECT COUNT(*) FROM users) AS users, (SELECT COUNT(*) FROM tickets) AS tickets",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(sql_err)?;

        let users: i64 = row.try_get("users").map_err(sql_err)?;
        let tickets: i64 = row.try_get("tickets").map_err(sql_err)?;
        Ok((users, tickets))
    }

    /// Close the pool. Later operations fail with [`StoreError::Unavailable`].
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Start a transaction that holds the write lock from its first statement.
    async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>, StoreError> {
        self.pool.begin_with("BEGIN IMMEDIATE").await.map_err(sql_err)
    }

    fn row_to_ticket(row: &sqlx::sqlite::SqliteRow) -> Result<Ticket, StoreError> {
        let status: String = row.try_get("status").map_err(sql_err)?;
        Ok(Ticket {
            id: row.try_get("id").map_err(sql_err)?,
            title: row.try_get("title").map_err(sql_err)?,
            assignee_id: row.try_get("assignee_id").map_err(sql_err)?,
            assignee: row.try_get("assignee").map_err(sql_err)?,
            status: TicketStatus::parse(&status)
                .map_err(|_| StoreError::QueryFailed(format!("corrupt status column: {status}")))?,
        })
    }
}

/// Map a driver error that is not a known constraint violation.
fn sql_err(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(e.to_string())
        }
        other => StoreError::QueryFailed(other.to_string()),
    }
}

/// The message of a UNIQUE constraint failure, e.g.
/// `UNIQUE constraint failed: users.name`.
fn unique_violation(e: &sqlx::Error) -> Option<String> {
    e.as_database_error()
        .map(|db| db.message())
        .filter(|msg| msg.starts_with("UNIQUE constraint failed"))
        .map(str::to_string)
}

#[async_trait]
impl TicketStore for SqliteStore {
    async fn add_user(&self, user_id: i64, name: &str) -> Result<User, StoreError> {
        let result = sqlx::query("INSERT INTO users (id, name) VALUES (?, ?)")
            .bind(user_id)
            .bind(name)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => {
                debug!(user_id, name, "User added");
                Ok(User {
                    user_id,
                    name: name.to_string(),
                })
            }
            Err(e) => match unique_violation(&e) {
                Some(msg) if msg.contains("users.name") => {
                    Err(StoreError::UsernameTaken(name.to_string()))
                }
                Some(msg) if msg.contains("users.id") => Err(StoreError::UserIdTaken(user_id)),
                _ => Err(sql_err(e)),
            },
        }
    }

    async fn create_ticket(&self, title: &str, assignee_name: &str) -> Result<Ticket, StoreError> {
        let mut tx = self.begin_write().await?;

        let assignee_id: i64 = sqlx::query("SELECT id FROM users WHERE name = ?")
            .bind(assignee_name)
            .fetch_optional(&mut *tx)
            .await
            .map_err(sql_err)?
            .ok_or_else(|| StoreError::UnknownAssignee(assignee_name.to_string()))?
            .try_get("id")
            .map_err(sql_err)?;

        let duplicate = sqlx::query("SELECT id FROM tickets WHERE title = ?")
            .bind(title)
            .fetch_optional(&mut *tx)
            .await
            .map_err(sql_err)?;
        if duplicate.is_some() {
            return Err(StoreError::DuplicateTitle(title.to_string()));
        }

        let owned = sqlx::query("SELECT id FROM tickets WHERE assignee_id = ?")
            .bind(assignee_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(sql_err)?;
        if owned.is_some() {
            return Err(StoreError::AssigneeHasTicket(assignee_name.to_string()));
        }

        let id = sqlx::query("INSERT INTO tickets (title, assignee_id, status) VALUES (?, ?, 'OPEN')")
            .bind(title)
            .bind(assignee_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| match unique_violation(&e) {
                Some(msg) if msg.contains("tickets.title") => {
                    StoreError::DuplicateTitle(title.to_string())
                }
                Some(msg) if msg.contains("tickets.assignee_id") => {
                    StoreError::AssigneeHasTicket(assignee_name.to_string())
                }
                _ => sql_err(e),
            })?
            .last_insert_rowid();

        tx.commit().await.map_err(sql_err)?;
        debug!(id, title, assignee_id, "Ticket created");

        Ok(Ticket {
            id,
            title: title.to_string(),
            assignee_id,
            assignee: assignee_name.to_string(),
            status: TicketStatus::Open,
        })
    }

    async fn ticket_for_user(&self, user_id: i64) -> Result<Ticket, StoreError> {
        let sql = format!("{TICKET_COLUMNS} WHERE t.assignee_id = ?");
        let row = sqlx::query(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(sql_err)?
            .ok_or(StoreError::TicketNotFound(user_id))?;
        Self::row_to_ticket(&row)
    }

    async fn update_status(&self, user_id: i64, status: TicketStatus) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE tickets SET status = ? WHERE assignee_id = ?")
            .bind(status.as_str())
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(sql_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::TicketNotFound(user_id));
        }
        debug!(user_id, %status, "Ticket status updated");
        Ok(())
    }

    async fn list_tickets(&self, filter: TicketFilter) -> Result<Vec<Ticket>, StoreError> {
        let rows = match filter {
            TicketFilter::All => {
                let sql = format!("{TICKET_COLUMNS} ORDER BY t.id ASC");
                sqlx::query(&sql).fetch_all(&self.pool).await
            }
            TicketFilter::Status(status) => {
                let sql = format!("{TICKET_COLUMNS} WHERE t.status = ? ORDER BY t.id ASC");
                sqlx::query(&sql)
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(sql_err)?;

        rows.iter().map(Self::row_to_ticket).collect()
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query("SELECT id, name FROM users ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(sql_err)?;

        rows.iter()
            .map(|row| {
                Ok::<_, StoreError>(User {
                    user_id: row.try_get("id").map_err(sql_err)?,
                    name: row.try_get("name").map_err(sql_err)?,
                })
            })
            .collect()
    }

    async fn delete_user(&self, user_id: i64) -> Result<(), StoreError> {
        let mut tx = self.begin_write().await?;

        sqlx::query("DELETE FROM tickets WHERE assignee_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(sql_err)?;

        let deleted = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(sql_err)?
            .rows_affected();

        if deleted == 0 {
            // Dropping `tx` rolls back.
            return Err(StoreError::UserNotFound(user_id));
        }

        tx.commit().await.map_err(sql_err)?;
        debug!(user_id, "User deleted");
        Ok(())
    }

    async fn delete_ticket(&self, user_id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM tickets WHERE assignee_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(sql_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::TicketNotFound(user_id));
        }
        Ok(())
    }

    async fn reset(&self) -> Result<(), StoreError> {
        let mut tx = self.begin_write().await?;

        for sql in [
            "DELETE FROM tickets",
            "DELETE FROM users",
            "DELETE FROM sqlite_sequence WHERE name IN ('tickets', 'users')",
        ] {
            sqlx::query(sql).execute(&mut *tx).await.map_err(sql_err)?;
        }

        tx.commit().await.map_err(sql_err)?;
        info!("Database reset");
        Ok(())
    }
}
