//! Tasks within a project.

use crate::db::db::Db;
use anyhow::Result;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

const INSERT_TASK: &str = "INSERT INTO tasks (project_id, name, created_at) VALUES (?1, ?2, datetime(CURRENT_TIMESTAMP, 'localtime'))";
const SELECT_TASKS: &str = "SELECT id, project_id, name, created_at FROM tasks";
const DELETE_TASK: &str = "DELETE FROM tasks WHERE id = ?1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub created_at: Option<NaiveDateTime>,
}

pub struct Tasks {
    conn: Connection,
}

impl Tasks {
    pub fn new() -> Result<Self> {
        Ok(Self::from_db(Db::new()?))
    }

    pub fn from_db(db: Db) -> Self {
        Self { conn: db.conn }
    }

    pub fn insert(&self, project_id: i64, name: &str) -> Result<i64> {
        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("Task name must not be empty");
        }
        self.conn.execute(INSERT_TASK, params![project_id, name])?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_by_id(&self, id: i64) -> Result<Option<Task>> {
        let task = self
            .conn
            .query_row(&format!("{} WHERE id = ?1", SELECT_TASKS), [id], map_task)
            .optional()?;
        Ok(task)
    }

    pub fn list(&self, project_id: Option<i64>) -> Result<Vec<Task>> {
        let tasks = match project_id {
            Some(project_id) => {
                let mut stmt = self.conn.prepare(&format!("{} WHERE project_id = ?1 ORDER BY id", SELECT_TASKS))?;
                let rows = stmt.query_map([project_id], map_task)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = self.conn.prepare(&format!("{} ORDER BY project_id, id", SELECT_TASKS))?;
                let rows = stmt.query_map([], map_task)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(tasks)
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        let affected_rows = self.conn.execute(DELETE_TASK, [id])?;
        if affected_rows == 0 {
            anyhow::bail!("Task with ID {} not found", id);
        }
        Ok(())
    }
}

fn map_task(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        created_at: row.get(3)?,
    })
}
