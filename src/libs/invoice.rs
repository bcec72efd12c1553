//! Invoices and the aggregation that turns time entries into one.
//!
//! ## Billing rules
//!
//! - every entry on an invoice belongs to the same client
//! - hourly rate: project rate, else client rate, else zero
//! - amount: `minutes / 60 * rate`, summed, rounded to cents only at the total
//! - billing period: first and last calendar day among the entries' start times
//!
//! Creating the invoice and marking its entries happen in one repository
//! transaction, and so do un-marking and deleting.

use crate::db::repository::TimerRepository;
use crate::libs::clock::Clock;
use crate::libs::entry::BillableEntry;
use crate::libs::error::{RecordKind, Result, TrackerError};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_PAYMENT_TERMS_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Generated,
    Sent,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Generated => "generated",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(InvoiceStatus::Draft),
            "generated" => Ok(InvoiceStatus::Generated),
            "sent" => Ok(InvoiceStatus::Sent),
            "paid" => Ok(InvoiceStatus::Paid),
            other => Err(TrackerError::validation(format!("Unknown invoice status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    pub invoice_number: String,
    pub client_id: i64,
    pub total_amount: Decimal,
    pub status: InvoiceStatus,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub due_date: NaiveDate,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvoice {
    pub invoice_number: String,
    pub client_id: i64,
    pub total_amount: Decimal,
    pub status: InvoiceStatus,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub due_date: NaiveDate,
    pub created_at: NaiveDateTime,
}

/// One entry's contribution to an invoice, before rounding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceLine {
    pub entry_id: i64,
    pub description: String,
    pub minutes: i64,
    pub hourly_rate: Decimal,
    pub amount: Decimal,
}

/// Everything an invoice would contain, computed without writing anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceSummary {
    pub client_id: i64,
    pub entry_ids: Vec<i64>,
    pub lines: Vec<InvoiceLine>,
    pub total_minutes: i64,
    pub total_amount: Decimal,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
}

/// Totals a set of billable entries.
///
/// Fails when the set is empty, when the entries do not share exactly one
/// client, when an entry is still running or already invoiced, or when an
/// amount does not fit a `Decimal`.
pub fn summarize(entries: &[BillableEntry]) -> Result<InvoiceSummary> {
    if entries.is_empty() {
        return Err(TrackerError::validation("No time entries selected for invoicing"));
    }

    let mut clients: Vec<Option<i64>> = Vec::new();
    for billable in entries {
        if !clients.contains(&billable.entry.client_id) {
            clients.push(billable.entry.client_id);
        }
    }
    if clients.len() > 1 {
        return Err(TrackerError::MultipleClients(clients));
    }
    let client_id = clients[0].ok_or_else(|| TrackerError::validation("Time entries have no client to invoice"))?;

    for billable in entries {
        let entry = &billable.entry;
        if entry.is_active {
            return Err(TrackerError::validation(format!(
                "Time entry {} is still running; stop it before invoicing",
                entry.id
            )));
        }
        if entry.is_invoiced {
            return Err(TrackerError::validation(format!(
                "Time entry {} is already on invoice {}",
                entry.id,
                entry.invoice_id.map(|id| id.to_string()).unwrap_or_else(|| "?".to_string())
            )));
        }
    }

    let mut lines = Vec::with_capacity(entries.len());
    let mut minute_rate_sum = Decimal::ZERO;
    for billable in entries {
        let hourly_rate = billable.hourly_rate();
        let minutes = billable.entry.duration;
        let minute_rate = Decimal::from(minutes)
            .checked_mul(hourly_rate)
            .ok_or_else(|| amount_overflow(billable.entry.id))?;
        // Dividing once keeps the sum exact until the final rounding.
        minute_rate_sum = minute_rate_sum
            .checked_add(minute_rate)
            .ok_or_else(|| amount_overflow(billable.entry.id))?;
        lines.push(InvoiceLine {
            entry_id: billable.entry.id,
            description: billable.entry.description.clone(),
            minutes,
            hourly_rate,
            amount: minute_rate / Decimal::from(60),
        });
    }
    let total_amount = round_to_cents(minute_rate_sum / Decimal::from(60));

    let dates = entries.iter().map(|billable| billable.entry.start_time.date());
    let period_start = dates.clone().min().unwrap_or_default();
    let period_end = dates.max().unwrap_or_default();

    Ok(InvoiceSummary {
        client_id,
        entry_ids: lines.iter().map(|line| line.entry_id).collect(),
        total_minutes: lines.iter().fold(0i64, |total, line| total.saturating_add(line.minutes)),
        lines,
        total_amount,
        period_start,
        period_end,
    })
}

fn amount_overflow(entry_id: i64) -> TrackerError {
    TrackerError::validation(format!("Amount for time entry {} is too large to invoice", entry_id))
}

pub fn round_to_cents(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

pub struct InvoiceAggregator<R, C> {
    repo: R,
    clock: C,
    payment_terms_days: i64,
}

impl<R: TimerRepository, C: Clock> InvoiceAggregator<R, C> {
    pub fn new(repo: R, clock: C) -> Self {
        Self {
            repo,
            clock,
            payment_terms_days: DEFAULT_PAYMENT_TERMS_DAYS,
        }
    }

    /// Days between issuing an invoice and its due date.
    pub fn with_payment_terms(mut self, days: i64) -> Self {
        self.payment_terms_days = days.max(0);
        self
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Creates an invoice for `entry_ids` and marks those entries invoiced.
    pub fn generate_invoice(&self, entry_ids: &[i64], invoice_number: &str) -> Result<Invoice> {
        let ids = normalize_ids(entry_ids)?;
        let invoice_number = invoice_number.trim();
        if invoice_number.is_empty() {
            return Err(TrackerError::validation("Invoice number must not be empty"));
        }

        let now = self.clock.now();
        let due_date = now.date() + Duration::days(self.payment_terms_days);

        let invoice = self.repo.atomically(|repo| {
            let summary = summarize(&load_billable(repo, &ids)?)?;
            let invoice = repo.create_invoice(&NewInvoice {
                invoice_number: invoice_number.to_string(),
                client_id: summary.client_id,
                total_amount: summary.total_amount,
                status: InvoiceStatus::Draft,
                period_start: summary.period_start,
                period_end: summary.period_end,
                due_date,
                created_at: now,
            })?;
            repo.mark_entries_invoiced(&summary.entry_ids, invoice.id)?;
            Ok(invoice)
        })?;

        tracing::info!(
            invoice_id = invoice.id,
            number = %invoice.invoice_number,
            client_id = invoice.client_id,
            total = %invoice.total_amount,
            entries = ids.len(),
            "invoice generated"
        );

        Ok(invoice)
    }

    /// Computes what [`generate_invoice`](Self::generate_invoice) would produce, without writing.
    pub fn preview(&self, entry_ids: &[i64]) -> Result<InvoiceSummary> {
        let ids = normalize_ids(entry_ids)?;
        summarize(&load_billable(&self.repo, &ids)?)
    }

    /// Deletes an invoice, returning its entries to the uninvoiced pool.
    pub fn delete_invoice(&self, invoice_id: i64) -> Result<()> {
        self.repo.atomically(|repo| {
            if repo.find_invoice_by_id(invoice_id)?.is_none() {
                return Err(TrackerError::not_found(RecordKind::Invoice, invoice_id));
            }
            repo.clear_invoice_marking(invoice_id)?;
            repo.delete_invoice(invoice_id)
        })?;

        tracing::info!(invoice_id, "invoice deleted");
        Ok(())
    }

    pub fn set_status(&self, invoice_id: i64, status: InvoiceStatus) -> Result<Invoice> {
        self.repo.update_invoice_status(invoice_id, status)
    }

    pub fn find_invoice(&self, invoice_id: i64) -> Result<Invoice> {
        self.repo
            .find_invoice_by_id(invoice_id)?
            .ok_or_else(|| TrackerError::not_found(RecordKind::Invoice, invoice_id))
    }

    pub fn list_invoices(&self) -> Result<Vec<Invoice>> {
        self.repo.list_invoices()
    }
}

/// Sorted, de-duplicated ids. Empty input is a validation error.
fn normalize_ids(entry_ids: &[i64]) -> Result<Vec<i64>> {
    if entry_ids.is_empty() {
        return Err(TrackerError::validation("No time entries selected for invoicing"));
    }
    let mut ids = entry_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

fn load_billable<R: TimerRepository>(repo: &R, ids: &[i64]) -> Result<Vec<BillableEntry>> {
    let entries = repo.find_billable_entries(ids)?;
    if let Some(missing) = ids.iter().find(|id| !entries.iter().any(|billable| billable.entry.id == **id)) {
        return Err(TrackerError::not_found(RecordKind::TimeEntry, *missing));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::entry::TimeEntry;

    fn billable(id: i64, client_id: Option<i64>, minutes: i64, project_rate: Option<i64>, client_rate: Option<i64>) -> BillableEntry {
        let start = NaiveDate::from_ymd_opt(2025, 3, id as u32).unwrap().and_hms_opt(9, 0, 0).unwrap();
        BillableEntry {
            entry: TimeEntry {
                id,
                client_id,
                project_id: None,
                task_id: None,
                description: format!("entry {}", id),
                start_time: start,
                end_time: Some(start + Duration::minutes(minutes)),
                duration: minutes,
                is_active: false,
                is_invoiced: false,
                invoice_id: None,
            },
            project_rate: project_rate.map(Decimal::from),
            client_rate: client_rate.map(Decimal::from),
        }
    }

    #[test]
    fn totals_round_only_at_the_end() {
        // 10 minutes at 1/h is 0.1666..; three of them are exactly 0.50.
        let entries = vec![
            billable(1, Some(1), 10, None, Some(1)),
            billable(2, Some(1), 10, None, Some(1)),
            billable(3, Some(1), 10, None, Some(1)),
        ];

        let summary = summarize(&entries).unwrap();

        assert_eq!(summary.total_amount, Decimal::new(50, 2));
        assert_eq!(summary.total_minutes, 30);
    }

    #[test]
    fn period_spans_first_and_last_day() {
        let entries = vec![billable(5, Some(1), 60, None, Some(10)), billable(2, Some(1), 60, None, Some(10))];

        let summary = summarize(&entries).unwrap();

        assert_eq!(summary.period_start, NaiveDate::from_ymd_opt(2025, 3, 2).unwrap());
        assert_eq!(summary.period_end, NaiveDate::from_ymd_opt(2025, 3, 5).unwrap());
    }

    #[test]
    fn entries_without_client_cannot_be_invoiced() {
        let err = summarize(&[billable(1, None, 30, None, None)]).unwrap_err();
        assert!(matches!(err, TrackerError::Validation(_)));
    }

    #[test]
    fn mixing_client_and_no_client_is_a_conflict() {
        let err = summarize(&[billable(1, Some(1), 30, None, None), billable(2, None, 30, None, None)]).unwrap_err();
        assert!(matches!(err, TrackerError::MultipleClients(ref clients) if clients == &vec![Some(1), None]));
    }

    #[test]
    fn client_conflict_is_reported_before_running_entries() {
        let mut running = billable(2, Some(2), 0, None, None);
        running.entry.is_active = true;
        running.entry.end_time = None;

        let err = summarize(&[billable(1, Some(1), 30, None, None), running]).unwrap_err();

        assert!(matches!(err, TrackerError::MultipleClients(ref clients) if clients == &vec![Some(1), Some(2)]));
    }

    #[test]
    fn oversized_rate_is_a_validation_error() {
        let mut entry = billable(1, Some(1), 120, None, None);
        entry.client_rate = Some(Decimal::MAX);

        let err = summarize(&[entry]).unwrap_err();

        assert!(matches!(err, TrackerError::Validation(_)));
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Paid".parse::<InvoiceStatus>().unwrap(), InvoiceStatus::Paid);
        assert!("void".parse::<InvoiceStatus>().is_err());
    }

    #[test]
    fn cents_rounding_is_half_away_from_zero() {
        assert_eq!(round_to_cents(Decimal::new(12345, 3)).to_string(), "12.35");
        assert_eq!(round_to_cents(Decimal::from(80)).to_string(), "80.00");
    }
}
