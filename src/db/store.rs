//! SQLite implementation of [`TimerRepository`].
//!
//! Timestamps are stored as local `YYYY-MM-DD HH:MM:SS` text, money as
//! decimal text so no rate or total ever passes through a float.
//!
//! ## Transactions
//!
//! `atomically` opens a `BEGIN IMMEDIATE` transaction, so the write lock is
//! taken before the first read and a second process cannot interleave a
//! timer start between our reconcile and insert. Nested calls join the
//! outer transaction.

use crate::db::db::Db;
use crate::db::repository::TimerRepository;
use crate::libs::entry::{BillableEntry, EntryFilter, EntryUpdate, NewTimeEntry, TimeEntry};
use crate::libs::error::{RecordKind, Result, TrackerError};
use crate::libs::invoice::{Invoice, InvoiceStatus, NewInvoice};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::str::FromStr;

const ENTRY_COLUMNS: &str =
    "e.id, e.client_id, e.project_id, e.task_id, e.description, e.start_time, e.end_time, e.duration, e.is_active, e.is_invoiced, e.invoice_id";
const SELECT_ENTRY_BY_ID: &str = "SELECT {columns} FROM time_entries e WHERE e.id = ?1";
const SELECT_ACTIVE_ENTRIES: &str = "SELECT {columns} FROM time_entries e WHERE e.is_active = 1 ORDER BY e.start_time DESC, e.id DESC";
const SELECT_LATEST_STOPPED: &str =
    "SELECT {columns} FROM time_entries e WHERE e.is_active = 0 AND e.end_time IS NOT NULL ORDER BY e.end_time DESC, e.id DESC LIMIT 1";
const INSERT_ENTRY: &str = "INSERT INTO time_entries (client_id, project_id, task_id, description, start_time, end_time, duration, is_active)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";
const UPDATE_ENTRY: &str = "UPDATE time_entries
    SET client_id = ?1, project_id = ?2, task_id = ?3, description = ?4, start_time = ?5, end_time = ?6, duration = ?7, is_active = ?8
    WHERE id = ?9";
const DELETE_ENTRY: &str = "DELETE FROM time_entries WHERE id = ?1";
const MARK_ENTRY_INVOICED: &str = "UPDATE time_entries SET is_invoiced = 1, invoice_id = ?1 WHERE id = ?2";
const CLEAR_INVOICE_MARKING: &str = "UPDATE time_entries SET is_invoiced = 0, invoice_id = NULL WHERE invoice_id = ?1";

const INVOICE_COLUMNS: &str = "id, invoice_number, client_id, total_amount, status, period_start, period_end, due_date, created_at";
const INSERT_INVOICE: &str = "INSERT INTO invoices (invoice_number, client_id, total_amount, status, period_start, period_end, due_date, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";
const UPDATE_INVOICE_STATUS: &str = "UPDATE invoices SET status = ?1 WHERE id = ?2";
const DELETE_INVOICE: &str = "DELETE FROM invoices WHERE id = ?1";

pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Opens the default database in the platform data directory.
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self::from_db(Db::new()?))
    }

    pub fn from_db(db: Db) -> Self {
        Self { conn: db.conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn entry_query(template: &str) -> String {
        template.replace("{columns}", ENTRY_COLUMNS)
    }

    fn invoice_query(filter: &str) -> String {
        format!("SELECT {} FROM invoices {}", INVOICE_COLUMNS, filter)
    }

    fn placeholders(count: usize) -> String {
        vec!["?"; count].join(", ")
    }
}

fn map_entry(row: &Row) -> rusqlite::Result<TimeEntry> {
    Ok(TimeEntry {
        id: row.get(0)?,
        client_id: row.get(1)?,
        project_id: row.get(2)?,
        task_id: row.get(3)?,
        description: row.get(4)?,
        start_time: row.get(5)?,
        end_time: row.get(6)?,
        duration: row.get(7)?,
        is_active: row.get(8)?,
        is_invoiced: row.get(9)?,
        invoice_id: row.get(10)?,
    })
}

fn map_invoice(row: &Row) -> rusqlite::Result<Invoice> {
    let status: String = row.get(4)?;
    Ok(Invoice {
        id: row.get(0)?,
        invoice_number: row.get(1)?,
        client_id: row.get(2)?,
        total_amount: parse_decimal(row, 3)?.unwrap_or(Decimal::ZERO),
        status: InvoiceStatus::from_str(&status).map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?,
        period_start: row.get(5)?,
        period_end: row.get(6)?,
        due_date: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Reads a decimal stored as text.
pub(crate) fn parse_decimal(row: &Row, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    row.get::<_, Option<String>>(idx)?
        .map(|text| Decimal::from_str(&text).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))))
        .transpose()
}

impl TimerRepository for SqliteRepository {
    fn find_active_entries(&self) -> Result<Vec<TimeEntry>> {
        let mut stmt = self.conn.prepare(&Self::entry_query(SELECT_ACTIVE_ENTRIES))?;
        let entries = stmt.query_map([], map_entry)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn find_entry_by_id(&self, id: i64) -> Result<Option<TimeEntry>> {
        let entry = self
            .conn
            .query_row(&Self::entry_query(SELECT_ENTRY_BY_ID), [id], map_entry)
            .optional()?;
        Ok(entry)
    }

    fn find_latest_stopped_entry(&self) -> Result<Option<TimeEntry>> {
        let entry = self
            .conn
            .query_row(&Self::entry_query(SELECT_LATEST_STOPPED), [], map_entry)
            .optional()?;
        Ok(entry)
    }

    fn create_entry(&self, fields: &NewTimeEntry) -> Result<TimeEntry> {
        self.conn.execute(
            INSERT_ENTRY,
            params![
                fields.context.client_id,
                fields.context.project_id,
                fields.context.task_id,
                fields.context.description,
                fields.start_time,
                fields.end_time,
                fields.duration.max(0),
                fields.is_active,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        self.find_entry_by_id(id)?
            .ok_or_else(|| TrackerError::not_found(RecordKind::TimeEntry, id))
    }

    fn update_entry(&self, id: i64, fields: &EntryUpdate) -> Result<TimeEntry> {
        let mut entry = self
            .find_entry_by_id(id)?
            .ok_or_else(|| TrackerError::not_found(RecordKind::TimeEntry, id))?;
        entry.apply(fields);

        self.conn.execute(
            UPDATE_ENTRY,
            params![
                entry.client_id,
                entry.project_id,
                entry.task_id,
                entry.description,
                entry.start_time,
                entry.end_time,
                entry.duration,
                entry.is_active,
                entry.id,
            ],
        )?;

        Ok(entry)
    }

    fn delete_entry(&self, id: i64) -> Result<()> {
        let affected_rows = self.conn.execute(DELETE_ENTRY, [id])?;
        if affected_rows == 0 {
            return Err(TrackerError::not_found(RecordKind::TimeEntry, id));
        }
        Ok(())
    }

    fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<TimeEntry>> {
        let mut conditions: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(client_id) = filter.client_id {
            conditions.push("e.client_id = ?");
            values.push(Value::Integer(client_id));
        }
        if let Some(from) = filter.from {
            conditions.push("date(e.start_time) >= ?");
            values.push(Value::Text(from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = filter.to {
            conditions.push("date(e.start_time) <= ?");
            values.push(Value::Text(to.format("%Y-%m-%d").to_string()));
        }
        if let Some(invoiced) = filter.invoiced {
            conditions.push("e.is_invoiced = ?");
            values.push(Value::Integer(invoiced as i64));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT {} FROM time_entries e {} ORDER BY e.start_time, e.id",
            ENTRY_COLUMNS, where_clause
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params_from_iter(values), map_entry)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn find_billable_entries(&self, ids: &[i64]) -> Result<Vec<BillableEntry>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {}, p.hourly_rate, c.hourly_rate
             FROM time_entries e
             LEFT JOIN projects p ON p.id = e.project_id
             LEFT JOIN clients c ON c.id = e.client_id
             WHERE e.id IN ({})
             ORDER BY e.start_time, e.id",
            ENTRY_COLUMNS,
            Self::placeholders(ids.len())
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params_from_iter(ids.iter()), |row| {
                Ok(BillableEntry {
                    entry: map_entry(row)?,
                    project_rate: parse_decimal(row, 11)?,
                    client_rate: parse_decimal(row, 12)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn create_invoice(&self, fields: &NewInvoice) -> Result<Invoice> {
        self.conn.execute(
            INSERT_INVOICE,
            params![
                fields.invoice_number,
                fields.client_id,
                fields.total_amount.to_string(),
                fields.status.as_str(),
                fields.period_start,
                fields.period_end,
                fields.due_date,
                fields.created_at,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        self.find_invoice_by_id(id)?
            .ok_or_else(|| TrackerError::not_found(RecordKind::Invoice, id))
    }

    fn find_invoice_by_id(&self, id: i64) -> Result<Option<Invoice>> {
        let invoice = self
            .conn
            .query_row(&Self::invoice_query("WHERE id = ?1"), [id], map_invoice)
            .optional()?;
        Ok(invoice)
    }

    fn list_invoices(&self) -> Result<Vec<Invoice>> {
        let mut stmt = self.conn.prepare(&Self::invoice_query("ORDER BY created_at, id"))?;
        let invoices = stmt.query_map([], map_invoice)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(invoices)
    }

    fn update_invoice_status(&self, id: i64, status: InvoiceStatus) -> Result<Invoice> {
        let affected_rows = self.conn.execute(UPDATE_INVOICE_STATUS, params![status.as_str(), id])?;
        if affected_rows == 0 {
            return Err(TrackerError::not_found(RecordKind::Invoice, id));
        }
        self.find_invoice_by_id(id)?
            .ok_or_else(|| TrackerError::not_found(RecordKind::Invoice, id))
    }

    fn delete_invoice(&self, id: i64) -> Result<()> {
        let affected_rows = self.conn.execute(DELETE_INVOICE, [id])?;
        if affected_rows == 0 {
            return Err(TrackerError::not_found(RecordKind::Invoice, id));
        }
        Ok(())
    }

    fn mark_entries_invoiced(&self, ids: &[i64], invoice_id: i64) -> Result<()> {
        let mut stmt = self.conn.prepare(MARK_ENTRY_INVOICED)?;
        for id in ids {
            if stmt.execute(params![invoice_id, id])? == 0 {
                return Err(TrackerError::not_found(RecordKind::TimeEntry, *id));
            }
        }
        Ok(())
    }

    fn clear_invoice_marking(&self, invoice_id: i64) -> Result<()> {
        self.conn.execute(CLEAR_INVOICE_MARKING, [invoice_id])?;
        Ok(())
    }

    fn atomically<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        if !self.conn.is_autocommit() {
            return f(self);
        }

        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        let result = f(self).and_then(|value| {
            self.conn.execute_batch("COMMIT")?;
            Ok(value)
        });

        if result.is_err() && !self.conn.is_autocommit() {
            if let Err(rollback_err) = self.conn.execute_batch("ROLLBACK") {
                tracing::error!(error = %rollback_err, "failed to roll back transaction");
            }
        }

        result
    }
}
