//! Task Storage
//! Mission: Persist tasks with SQLite

use crate::tasks::models::{Task, TaskCreate, TaskUpdate};
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use tracing::info;
use uuid::Uuid;

/// Task storage with SQLite backend. Unlike users, tasks are hard-deleted.
pub struct TaskStore {
    db_path: String,
}

impl TaskStore {
    /// Create a new task store and initialize the schema.
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    fn init_db(&self) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                status TEXT NOT NULL,
                assigned_to TEXT
            )",
            [],
        )
        .context("Failed to create tasks table")?;

        Ok(())
    }

    pub fn create_task(&self, new: &TaskCreate) -> Result<Task> {
        let task = Task {
            id: Uuid::new_v4(),
            title: new.title.clone(),
            description: new.description.clone(),
            status: new.status.clone(),
            assigned_to: new.assigned_to.clone(),
        };

        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "INSERT INTO tasks (id, title, description, status, assigned_to)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                task.id.to_string(),
                task.title,
                task.description,
                task.status,
                task.assigned_to,
            ],
        )
        .context("Failed to insert task")?;

        info!(
            task_id = %task.id,
            assigned_to = task.assigned_to.as_deref().unwrap_or("-"),
            "Created task: {}",
            task.title
        );

        Ok(task)
    }

    pub fn get_task(&self, id: &Uuid) -> Result<Option<Task>> {
        let conn = Connection::open(&self.db_path)?;
        let mut stmt = conn.prepare(
            "SELECT id, title, description, status, assigned_to FROM tasks WHERE id = ?1",
        )?;

        let task = stmt.query_row(params![id.to_string()], Self::row_to_task);
        match task {
            Ok(task) => Ok(Some(task)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List all tasks, optionally filtered by assignee username.
    pub fn list_tasks(&self, assigned_to: Option<&str>) -> Result<Vec<Task>> {
        let conn = Connection::open(&self.db_path)?;

        let tasks = match assigned_to {
            Some(assignee) => {
                let mut stmt = conn.prepare(
                    "SELECT id, title, description, status, assigned_to
                     FROM tasks WHERE assigned_to = ?1",
                )?;
                let rows = stmt.query_map(params![assignee], Self::row_to_task)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn
                    .prepare("SELECT id, title, description, status, assigned_to FROM tasks")?;
                let rows = stmt.query_map([], Self::row_to_task)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };

        Ok(tasks)
    }

    /// Partial update. Returns the updated task, or `None` when the id
    /// matches no task.
    pub fn update_task(&self, id: &Uuid, update: &TaskUpdate) -> Result<Option<Task>> {
        let Some(mut task) = self.get_task(id)? else {
            return Ok(None);
        };

        if let Some(title) = &update.title {
            task.title = title.clone();
        }
        if let Some(description) = &update.description {
            task.description = Some(description.clone());
        }
        if let Some(status) = &update.status {
            task.status = status.clone();
        }
        if let Some(assigned_to) = &update.assigned_to {
            task.assigned_to = Some(assigned_to.clone());
        }

        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "UPDATE tasks SET title = ?1, description = ?2, status = ?3, assigned_to = ?4
             WHERE id = ?5",
            params![
                task.title,
                task.description,
                task.status,
                task.assigned_to,
                id.to_string(),
            ],
        )
        .context("Failed to update task")?;

        info!(task_id = %id, "Updated task");
        Ok(Some(task))
    }

    /// Hard delete. Returns false when the id matches no task.
    pub fn delete_task(&self, id: &Uuid) -> Result<bool> {
        let conn = Connection::open(&self.db_path)?;
        let rows = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id.to_string()])?;

        if rows > 0 {
            info!(task_id = %id, "Deleted task");
        }
        Ok(rows > 0)
    }

    fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
        let id_str: String = row.get(0)?;
        Ok(Task {
            id: Uuid::parse_str(&id_str).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?,
            title: row.get(1)?,
            description: row.get(2)?,
            status: row.get(3)?,
            assigned_to: row.get(4)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_store() -> (TaskStore, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let store = TaskStore::new(temp_file.path().to_str().unwrap()).unwrap();
        (store, temp_file)
    }

    fn sample_create(title: &str, assignee: Option<&str>) -> TaskCreate {
        TaskCreate {
            title: title.to_string(),
            description: Some("a task".to_string()),
            status: "open".to_string(),
            assigned_to: assignee.map(str::to_string),
        }
    }

    #[test]
    fn test_create_and_get_task() {
        let (store, _temp) = create_test_store();

        let task = store.create_task(&sample_create("write docs", Some("alice"))).unwrap();
        let found = store.get_task(&task.id).unwrap().unwrap();
        assert_eq!(found.title, "write docs");
        assert_eq!(found.assigned_to.as_deref(), Some("alice"));

        assert!(store.get_task(&Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_list_tasks_with_filter() {
        let (store, _temp) = create_test_store();
        store.create_task(&sample_create("t1", Some("alice"))).unwrap();
        store.create_task(&sample_create("t2", Some("bob"))).unwrap();
        store.create_task(&sample_create("t3", Some("alice"))).unwrap();

        assert_eq!(store.list_tasks(None).unwrap().len(), 3);
        assert_eq!(store.list_tasks(Some("alice")).unwrap().len(), 2);
        assert_eq!(store.list_tasks(Some("carol")).unwrap().len(), 0);
    }

    #[test]
    fn test_update_task_partial() {
        let (store, _temp) = create_test_store();
        let task = store.create_task(&sample_create("t1", Some("alice"))).unwrap();

        let update = TaskUpdate {
            title: None,
            description: None,
            status: Some("done".to_string()),
            assigned_to: None,
        };
        let updated = store.update_task(&task.id, &update).unwrap().unwrap();
        assert_eq!(updated.status, "done");
        assert_eq!(updated.title, "t1");
        assert_eq!(updated.assigned_to.as_deref(), Some("alice"));

        assert!(store.update_task(&Uuid::new_v4(), &update).unwrap().is_none());
    }

    #[test]
    fn test_delete_task() {
        let (store, _temp) = create_test_store();
        let task = store.create_task(&sample_create("t1", None)).unwrap();

        assert!(store.delete_task(&task.id).unwrap());
        assert!(store.get_task(&task.id).unwrap().is_none());
        assert!(!store.delete_task(&task.id).unwrap());
    }
}
