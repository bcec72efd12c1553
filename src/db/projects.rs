//! Projects under a client. A project rate overrides the client rate.

use crate::db::db::Db;
use crate::db::store::parse_decimal;
use anyhow::Result;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use serde::Serialize;

const INSERT_PROJECT: &str =
    "INSERT INTO projects (client_id, name, hourly_rate, created_at) VALUES (?1, ?2, ?3, datetime(CURRENT_TIMESTAMP, 'localtime'))";
const SELECT_PROJECTS: &str = "SELECT id, client_id, name, hourly_rate, created_at FROM projects";
const DELETE_PROJECT: &str = "DELETE FROM projects WHERE id = ?1";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub id: i64,
    pub client_id: i64,
    pub name: String,
    pub hourly_rate: Option<Decimal>,
    pub created_at: Option<NaiveDateTime>,
}

pub struct Projects {
    conn: Connection,
}

impl Projects {
    pub fn new() -> Result<Self> {
        Ok(Self::from_db(Db::new()?))
    }

    pub fn from_db(db: Db) -> Self {
        Self { conn: db.conn }
    }

    pub fn insert(&self, client_id: i64, name: &str, hourly_rate: Option<Decimal>) -> Result<i64> {
        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("Project name must not be empty");
        }
        self.conn
            .execute(INSERT_PROJECT, params![client_id, name, hourly_rate.map(|rate| rate.to_string())])?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_by_id(&self, id: i64) -> Result<Option<Project>> {
        let project = self
            .conn
            .query_row(&format!("{} WHERE id = ?1", SELECT_PROJECTS), [id], map_project)
            .optional()?;
        Ok(project)
    }

    /// All projects, or only those of `client_id`.
    pub fn list(&self, client_id: Option<i64>) -> Result<Vec<Project>> {
        let projects = match client_id {
            Some(client_id) => {
                let mut stmt = self.conn.prepare(&format!("{} WHERE client_id = ?1 ORDER BY name", SELECT_PROJECTS))?;
                let rows = stmt.query_map([client_id], map_project)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = self.conn.prepare(&format!("{} ORDER BY client_id, name", SELECT_PROJECTS))?;
                let rows = stmt.query_map([], map_project)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(projects)
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        let affected_rows = self.conn.execute(DELETE_PROJECT, [id])?;
        if affected_rows == 0 {
            anyhow::bail!("Project with ID {} not found", id);
        }
        Ok(())
    }
}

fn map_project(row: &Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        client_id: row.get(1)?,
        name: row.get(2)?,
        hourly_rate: parse_decimal(row, 3)?,
        created_at: row.get(4)?,
    })
}
