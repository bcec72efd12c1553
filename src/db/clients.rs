//! Clients: who time is billed to, with an optional default hourly rate.

use crate::db::db::Db;
use crate::db::store::parse_decimal;
use anyhow::Result;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use serde::Serialize;

const INSERT_CLIENT: &str = "INSERT INTO clients (name, hourly_rate, created_at) VALUES (?1, ?2, datetime(CURRENT_TIMESTAMP, 'localtime'))";
const SELECT_CLIENTS: &str = "SELECT id, name, hourly_rate, created_at FROM clients";
const UPDATE_RATE: &str = "UPDATE clients SET hourly_rate = ?1 WHERE id = ?2";
const DELETE_CLIENT: &str = "DELETE FROM clients WHERE id = ?1";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Client {
    pub id: i64,
    pub name: String,
    /// Default rate for entries whose project has none.
    pub hourly_rate: Option<Decimal>,
    pub created_at: Option<NaiveDateTime>,
}

pub struct Clients {
    conn: Connection,
}

impl Clients {
    pub fn new() -> Result<Self> {
        Ok(Self::from_db(Db::new()?))
    }

    pub fn from_db(db: Db) -> Self {
        Self { conn: db.conn }
    }

    pub fn insert(&self, name: &str, hourly_rate: Option<Decimal>) -> Result<i64> {
        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("Client name must not be empty");
        }
        self.conn.execute(INSERT_CLIENT, params![name, hourly_rate.map(|rate| rate.to_string())])?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_by_id(&self, id: i64) -> Result<Option<Client>> {
        let client = self
            .conn
            .query_row(&format!("{} WHERE id = ?1", SELECT_CLIENTS), [id], map_client)
            .optional()?;
        Ok(client)
    }

    pub fn get_by_name(&self, name: &str) -> Result<Option<Client>> {
        let client = self
            .conn
            .query_row(&format!("{} WHERE name = ?1", SELECT_CLIENTS), [name], map_client)
            .optional()?;
        Ok(client)
    }

    pub fn list(&self) -> Result<Vec<Client>> {
        let mut stmt = self.conn.prepare(&format!("{} ORDER BY name", SELECT_CLIENTS))?;
        let clients = stmt.query_map([], map_client)?.collect::<Result<Vec<_>, _>>()?;
        Ok(clients)
    }

    pub fn update_rate(&self, id: i64, hourly_rate: Option<Decimal>) -> Result<()> {
        let affected_rows = self.conn.execute(UPDATE_RATE, params![hourly_rate.map(|rate| rate.to_string()), id])?;
        if affected_rows == 0 {
            anyhow::bail!("Client with ID {} not found", id);
        }
        Ok(())
    }

    /// Deletes a client and its projects. Fails while invoices reference it.
    pub fn delete(&self, id: i64) -> Result<()> {
        let affected_rows = self.conn.execute(DELETE_CLIENT, [id])?;
        if affected_rows == 0 {
            anyhow::bail!("Client with ID {} not found", id);
        }
        Ok(())
    }
}

fn map_client(row: &Row) -> rusqlite::Result<Client> {
    Ok(Client {
        id: row.get(0)?,
        name: row.get(1)?,
        hourly_rate: parse_decimal(row, 2)?,
        created_at: row.get(3)?,
    })
}
