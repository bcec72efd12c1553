//! CSV and JSON export of time entries and invoices.
//!
//! ```rust,no_run
//! use billable::libs::export::{ExportFormat, Exporter};
//! # async fn run(entries: Vec<billable::libs::entry::TimeEntry>) -> anyhow::Result<()> {
//! let exporter = Exporter::new(ExportFormat::Csv, None);
//! let path = exporter.export_entries(&entries).await?;
//! println!("{}", path.display());
//! # Ok(())
//! # }
//! ```

use crate::libs::entry::TimeEntry;
use crate::libs::invoice::Invoice;
use anyhow::Result;
use chrono::Local;
use serde::Serialize;
use std::path::{Path, PathBuf};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportData {
    Entries,
    Invoices,
}

/// Flat row for one time entry.
#[derive(Debug, Serialize)]
pub struct ExportEntry {
    pub id: i64,
    pub client_id: Option<i64>,
    pub project_id: Option<i64>,
    pub task_id: Option<i64>,
    pub description: String,
    pub start_time: String,
    pub end_time: Option<String>,
    pub duration_minutes: i64,
    pub is_active: bool,
    pub is_invoiced: bool,
    pub invoice_id: Option<i64>,
}

impl From<&TimeEntry> for ExportEntry {
    fn from(entry: &TimeEntry) -> Self {
        ExportEntry {
            id: entry.id,
            client_id: entry.client_id,
            project_id: entry.project_id,
            task_id: entry.task_id,
            description: entry.description.clone(),
            start_time: entry.start_time.format(DATETIME_FORMAT).to_string(),
            end_time: entry.end_time.map(|end| end.format(DATETIME_FORMAT).to_string()),
            duration_minutes: entry.duration,
            is_active: entry.is_active,
            is_invoiced: entry.is_invoiced,
            invoice_id: entry.invoice_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExportInvoice {
    pub id: i64,
    pub invoice_number: String,
    pub client_id: i64,
    /// Kept as text so CSV and JSON show the exact two-decimal amount.
    pub total_amount: String,
    pub status: String,
    pub period_start: String,
    pub period_end: String,
    pub due_date: String,
    pub created_at: String,
}

impl From<&Invoice> for ExportInvoice {
    fn from(invoice: &Invoice) -> Self {
        ExportInvoice {
            id: invoice.id,
            invoice_number: invoice.invoice_number.clone(),
            client_id: invoice.client_id,
            total_amount: invoice.total_amount.to_string(),
            status: invoice.status.to_string(),
            period_start: invoice.period_start.to_string(),
            period_end: invoice.period_end.to_string(),
            due_date: invoice.due_date.to_string(),
            created_at: invoice.created_at.format(DATETIME_FORMAT).to_string(),
        }
    }
}

pub struct Exporter {
    format: ExportFormat,
    output_path: PathBuf,
}

impl Exporter {
    /// Without an explicit path the file is `billable_export_<timestamp>.<ext>`
    /// in the working directory.
    pub fn new(format: ExportFormat, output_path: Option<PathBuf>) -> Self {
        let output_path = output_path.unwrap_or_else(|| {
            PathBuf::from(format!(
                "billable_export_{}.{}",
                Local::now().format("%Y%m%d_%H%M%S"),
                format.extension()
            ))
        });

        Self { format, output_path }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub async fn export_entries(&self, entries: &[TimeEntry]) -> Result<PathBuf> {
        let rows: Vec<ExportEntry> = entries.iter().map(ExportEntry::from).collect();
        self.write_rows(&rows).await
    }

    pub async fn export_invoices(&self, invoices: &[Invoice]) -> Result<PathBuf> {
        let rows: Vec<ExportInvoice> = invoices.iter().map(ExportInvoice::from).collect();
        self.write_rows(&rows).await
    }

    async fn write_rows<T: Serialize>(&self, rows: &[T]) -> Result<PathBuf> {
        let bytes = match self.format {
            ExportFormat::Csv => to_csv(rows)?,
            ExportFormat::Json => serde_json::to_vec_pretty(rows)?,
        };
        tokio::fs::write(&self.output_path, bytes).await?;
        tracing::debug!(path = %self.output_path.display(), rows = rows.len(), "export written");
        Ok(self.output_path.clone())
    }
}

fn to_csv<T: Serialize>(rows: &[T]) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(wtr.into_inner()?)
}
