use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::Task;
use crate::schema::{TableSchema, TASK_TABLE};
use crate::text;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
    #[error("Task not found (ID: {0})")]
    NotFound(i64),
    #[error("Task has no ID yet; insert it before updating")]
    Unassigned,
    #[error("A task with ID {0} already exists")]
    DuplicateId(i64),
    #[error("Table '{table}' is missing column '{column}'")]
    SchemaMismatch { table: String, column: String },
}

/// How listed tasks are ordered after important tasks are moved to the top
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    ByName,
    ByDateCreated,
}

impl SortOrder {
    pub fn next(self) -> Self {
        match self {
            SortOrder::ByName => SortOrder::ByDateCreated,
            SortOrder::ByDateCreated => SortOrder::ByName,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOrder::ByName => "name",
            SortOrder::ByDateCreated => "date created",
        }
    }

    fn order_by(self) -> &'static str {
        match self {
            SortOrder::ByName => "sort_key(name) ASC, fold_case(name) ASC, created ASC",
            SortOrder::ByDateCreated => "created ASC, id ASC",
        }
    }
}

/// Filter and ordering for listing tasks
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskQuery {
    /// Case-insensitive substring of the name; empty matches everything
    pub search: String,
    pub sort_order: SortOrder,
    pub hide_completed: bool,
}

const TASK_COLUMNS: &str = "id, name, important, completed, created";

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create a new database connection and initialize the schema
    pub fn new(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let db_path = path.as_ref();

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(db_path)?;
        info!(path = %db_path.display(), "opened task database");

        let db = Database { conn };
        db.register_functions()?;
        db.initialize_schema()?;

        Ok(db)
    }

    /// Open a database that lives only as long as this value
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let db = Database { conn: Connection::open_in_memory()? };
        db.register_functions()?;
        db.initialize_schema()?;
        Ok(db)
    }

    /// SQL functions for Unicode-aware search and ordering.
    /// SQLite's own `LIKE` and `NOCASE` only fold ASCII.
    fn register_functions(&self) -> Result<(), DatabaseError> {
        let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;
        self.conn.create_scalar_function("fold_case", 1, flags, |ctx| {
            Ok(text::fold_case(&ctx.get::<String>(0)?))
        })?;
        self.conn.create_scalar_function("sort_key", 1, flags, |ctx| {
            Ok(text::sort_key(&ctx.get::<String>(0)?))
        })?;
        Ok(())
    }

    /// Create the task table and its indexes, then check the columns are all there
    fn initialize_schema(&self) -> Result<(), DatabaseError> {
        self.conn.execute(&TASK_TABLE.create_table_sql(), [])?;
        for sql in TASK_TABLE.create_index_sql() {
            self.conn.execute(&sql, [])?;
        }
        self.verify_schema(&TASK_TABLE)
    }

    fn verify_schema(&self, schema: &TableSchema) -> Result<(), DatabaseError> {
        fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, DatabaseError> {
            let mut stmt = conn.prepare(
                "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2"
            )?;
            let count: i64 = stmt.query_row(rusqlite::params![table, column], |row| row.get(0))?;
            Ok(count > 0)
        }

        for column in schema.columns {
            if !column_exists(&self.conn, schema.name, column.name)? {
                return Err(DatabaseError::SchemaMismatch {
                    table: schema.name.to_string(),
                    column: column.name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Get a reference to the underlying connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Helper function to map a row to a Task
    fn row_to_task(row: &rusqlite::Row) -> Result<Task, rusqlite::Error> {
        Ok(Task::from_parts(
            row.get::<_, String>(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(0)?,
        ))
    }

    fn query_task(conn: &Connection, id: i64) -> Result<Option<Task>, DatabaseError> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM {} WHERE id = ?1",
            TASK_TABLE.name
        ))?;
        Ok(stmt.query_row(rusqlite::params![id], Self::row_to_task).optional()?)
    }

    /// Store a task and return it with its storage-assigned ID.
    /// A task that already carries an ID is stored under that ID.
    pub fn insert_task(&self, task: &Task) -> Result<Task, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let stored = Self::insert_in(&tx, task)?;
        tx.commit()?;
        debug!(id = stored.id(), "inserted task");
        Ok(stored)
    }

    /// Store several tasks in one transaction; either all are stored or none
    pub fn insert_tasks(&self, tasks: &[Task]) -> Result<Vec<Task>, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let stored = tasks
            .iter()
            .map(|task| Self::insert_in(&tx, task))
            .collect::<Result<Vec<_>, _>>()?;
        tx.commit()?;
        debug!(count = stored.len(), "inserted tasks");
        Ok(stored)
    }

    fn insert_in(conn: &Connection, task: &Task) -> Result<Task, DatabaseError> {
        if task.is_persisted() {
            if Self::query_task(conn, task.id())?.is_some() {
                return Err(DatabaseError::DuplicateId(task.id()));
            }
            conn.execute(
                &format!(
                    "INSERT INTO {} (id, name, important, completed, created) VALUES (?1, ?2, ?3, ?4, ?5)",
                    TASK_TABLE.name
                ),
                rusqlite::params![
                    task.id(),
                    task.name(),
                    task.is_important(),
                    task.is_completed(),
                    task.created()
                ],
            )?;
        } else {
            conn.execute(
                &format!(
                    "INSERT INTO {} (name, important, completed, created) VALUES (?1, ?2, ?3, ?4)",
                    TASK_TABLE.name
                ),
                rusqlite::params![
                    task.name(),
                    task.is_important(),
                    task.is_completed(),
                    task.created()
                ],
            )?;
        }
        Ok(task.clone().with_id(conn.last_insert_rowid()))
    }

    /// Get a single task by ID
    pub fn get_task(&self, id: i64) -> Result<Task, DatabaseError> {
        self.find_task(id)?.ok_or(DatabaseError::NotFound(id))
    }

    pub fn find_task(&self, id: i64) -> Result<Option<Task>, DatabaseError> {
        Self::query_task(&self.conn, id)
    }

    /// Tasks matching the query, important ones first
    pub fn get_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM {}
             WHERE fold_case(name) LIKE '%' || fold_case(?1) || '%' ESCAPE '\\' AND (?2 = 0 OR completed = 0)
             ORDER BY important DESC, {}",
            TASK_TABLE.name,
            query.sort_order.order_by()
        ))?;
        let tasks = stmt
            .query_map(
                rusqlite::params![escape_like(&query.search), query.hide_completed],
                Self::row_to_task,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    /// Every task in ID order
    pub fn get_all_tasks(&self) -> Result<Vec<Task>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM {} ORDER BY id ASC",
            TASK_TABLE.name
        ))?;
        let tasks = stmt.query_map([], Self::row_to_task)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    /// Replace the stored row that has this task's ID.
    /// The creation time is set once on insert and never rewritten.
    pub fn update_task(&self, task: &Task) -> Result<(), DatabaseError> {
        if !task.is_persisted() {
            return Err(DatabaseError::Unassigned);
        }

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            &format!(
                "UPDATE {} SET name = ?1, important = ?2, completed = ?3 WHERE id = ?4",
                TASK_TABLE.name
            ),
            rusqlite::params![
                task.name(),
                task.is_important(),
                task.is_completed(),
                task.id()
            ],
        )?;
        if changed == 0 {
            return Err(DatabaseError::NotFound(task.id()));
        }
        tx.commit()?;
        debug!(id = task.id(), "updated task");
        Ok(())
    }

    /// Delete a task by ID
    pub fn delete_task(&self, id: i64) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            &format!("DELETE FROM {} WHERE id = ?1", TASK_TABLE.name),
            rusqlite::params![id],
        )?;
        if changed == 0 {
            return Err(DatabaseError::NotFound(id));
        }
        tx.commit()?;
        debug!(id, "deleted task");
        Ok(())
    }

    /// Delete every completed task and return how many were removed
    pub fn delete_completed_tasks(&self) -> Result<usize, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute(
            &format!("DELETE FROM {} WHERE completed = 1", TASK_TABLE.name),
            [],
        )?;
        tx.commit()?;
        debug!(removed, "deleted completed tasks");
        Ok(removed)
    }

    pub fn count_tasks(&self) -> Result<usize, DatabaseError> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", TASK_TABLE.name),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

/// Escape LIKE wildcards so the search matches literally
fn escape_like(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len());
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
