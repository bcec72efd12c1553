//! In-process repository for tests and dry runs.
//!
//! Clones share one store, so an engine and an aggregator built from clones
//! of the same `MemoryRepository` see each other's writes. `atomically`
//! snapshots the whole store and restores it when the closure fails.
//!
//! Failures can be injected per operation with [`MemoryRepository::fail_on`]
//! to exercise rollback paths.

use crate::db::repository::TimerRepository;
use crate::libs::entry::{BillableEntry, EntryFilter, EntryUpdate, NewTimeEntry, TimeEntry};
use crate::libs::error::{RecordKind, Result, TrackerError};
use crate::libs::invoice::{Invoice, InvoiceStatus, NewInvoice};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Repository operations that can be made to fail once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    CreateEntry,
    UpdateEntry,
    CreateInvoice,
    MarkEntriesInvoiced,
    ClearInvoiceMarking,
    DeleteInvoice,
}

#[derive(Debug, Clone, Default)]
struct Store {
    entries: BTreeMap<i64, TimeEntry>,
    invoices: BTreeMap<i64, Invoice>,
    clients: BTreeMap<i64, Option<Decimal>>,
    /// Project id to hourly rate.
    projects: BTreeMap<i64, Option<Decimal>>,
    last_id: i64,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

#[derive(Debug, Default)]
struct Inner {
    store: Store,
    failure: Option<FailurePoint>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a client and returns its id.
    pub fn add_client(&self, hourly_rate: Option<Decimal>) -> i64 {
        let mut inner = self.inner.lock();
        let id = inner.store.next_id();
        inner.store.clients.insert(id, hourly_rate);
        id
    }

    /// Registers a project under `client_id` and returns its id.
    pub fn add_project(&self, client_id: i64, hourly_rate: Option<Decimal>) -> i64 {
        let mut inner = self.inner.lock();
        debug_assert!(inner.store.clients.contains_key(&client_id), "unknown client {}", client_id);
        let id = inner.store.next_id();
        inner.store.projects.insert(id, hourly_rate);
        id
    }

    /// Makes the next call to `point` fail with a persistence error.
    pub fn fail_on(&self, point: FailurePoint) {
        self.inner.lock().failure = Some(point);
    }

    /// Every stored entry, ordered by id.
    pub fn entries(&self) -> Vec<TimeEntry> {
        self.inner.lock().store.entries.values().cloned().collect()
    }

    pub fn active_count(&self) -> usize {
        self.inner.lock().store.entries.values().filter(|entry| entry.is_active).count()
    }

    pub fn invoice_count(&self) -> usize {
        self.inner.lock().store.invoices.len()
    }

    fn check_failure(inner: &mut Inner, point: FailurePoint) -> Result<()> {
        if inner.failure == Some(point) {
            inner.failure = None;
            return Err(TrackerError::persistence(format!("injected failure in {:?}", point)));
        }
        Ok(())
    }
}

impl TimerRepository for MemoryRepository {
    fn find_active_entries(&self) -> Result<Vec<TimeEntry>> {
        let inner = self.inner.lock();
        let mut active: Vec<TimeEntry> = inner.store.entries.values().filter(|entry| entry.is_active).cloned().collect();
        active.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(b.id.cmp(&a.id)));
        Ok(active)
    }

    fn find_entry_by_id(&self, id: i64) -> Result<Option<TimeEntry>> {
        Ok(self.inner.lock().store.entries.get(&id).cloned())
    }

    fn find_latest_stopped_entry(&self) -> Result<Option<TimeEntry>> {
        let inner = self.inner.lock();
        let latest = inner
            .store
            .entries
            .values()
            .filter(|entry| !entry.is_active && entry.end_time.is_some())
            .max_by(|a, b| a.end_time.cmp(&b.end_time).then(a.id.cmp(&b.id)))
            .cloned();
        Ok(latest)
    }

    fn create_entry(&self, fields: &NewTimeEntry) -> Result<TimeEntry> {
        let mut inner = self.inner.lock();
        Self::check_failure(&mut inner, FailurePoint::CreateEntry)?;

        let id = inner.store.next_id();
        let entry = TimeEntry {
            id,
            client_id: fields.context.client_id,
            project_id: fields.context.project_id,
            task_id: fields.context.task_id,
            description: fields.context.description.clone(),
            start_time: fields.start_time,
            end_time: fields.end_time,
            duration: fields.duration.max(0),
            is_active: fields.is_active,
            is_invoiced: false,
            invoice_id: None,
        };
        inner.store.entries.insert(id, entry.clone());
        Ok(entry)
    }

    fn update_entry(&self, id: i64, fields: &EntryUpdate) -> Result<TimeEntry> {
        let mut inner = self.inner.lock();
        Self::check_failure(&mut inner, FailurePoint::UpdateEntry)?;

        let entry = inner
            .store
            .entries
            .get_mut(&id)
            .ok_or_else(|| TrackerError::not_found(RecordKind::TimeEntry, id))?;
        entry.apply(fields);
        Ok(entry.clone())
    }

    fn delete_entry(&self, id: i64) -> Result<()> {
        let mut inner = self.inner.lock();
        inner
            .store
            .entries
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| TrackerError::not_found(RecordKind::TimeEntry, id))
    }

    fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<TimeEntry>> {
        let inner = self.inner.lock();
        let mut entries: Vec<TimeEntry> = inner.store.entries.values().filter(|entry| filter.matches(entry)).cloned().collect();
        entries.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
        Ok(entries)
    }

    fn find_billable_entries(&self, ids: &[i64]) -> Result<Vec<BillableEntry>> {
        let inner = self.inner.lock();
        let store = &inner.store;

        let billable = ids
            .iter()
            .filter_map(|id| store.entries.get(id))
            .map(|entry| BillableEntry {
                entry: entry.clone(),
                project_rate: entry
                    .project_id
                    .and_then(|project_id| store.projects.get(&project_id).copied().flatten()),
                client_rate: entry
                    .client_id
                    .and_then(|client_id| store.clients.get(&client_id).copied().flatten()),
            })
            .collect();
        Ok(billable)
    }

    fn create_invoice(&self, fields: &NewInvoice) -> Result<Invoice> {
        let mut inner = self.inner.lock();
        Self::check_failure(&mut inner, FailurePoint::CreateInvoice)?;

        if inner.store.invoices.values().any(|invoice| invoice.invoice_number == fields.invoice_number) {
            return Err(TrackerError::persistence(format!(
                "invoice number '{}' already exists",
                fields.invoice_number
            )));
        }

        let id = inner.store.next_id();
        let invoice = Invoice {
            id,
            invoice_number: fields.invoice_number.clone(),
            client_id: fields.client_id,
            total_amount: fields.total_amount,
            status: fields.status,
            period_start: fields.period_start,
            period_end: fields.period_end,
            due_date: fields.due_date,
            created_at: fields.created_at,
        };
        inner.store.invoices.insert(id, invoice.clone());
        Ok(invoice)
    }

    fn find_invoice_by_id(&self, id: i64) -> Result<Option<Invoice>> {
        Ok(self.inner.lock().store.invoices.get(&id).cloned())
    }

    fn list_invoices(&self) -> Result<Vec<Invoice>> {
        Ok(self.inner.lock().store.invoices.values().cloned().collect())
    }

    fn update_invoice_status(&self, id: i64, status: InvoiceStatus) -> Result<Invoice> {
        let mut inner = self.inner.lock();
        let invoice = inner
            .store
            .invoices
            .get_mut(&id)
            .ok_or_else(|| TrackerError::not_found(RecordKind::Invoice, id))?;
        invoice.status = status;
        Ok(invoice.clone())
    }

    fn delete_invoice(&self, id: i64) -> Result<()> {
        let mut inner = self.inner.lock();
        Self::check_failure(&mut inner, FailurePoint::DeleteInvoice)?;

        inner
            .store
            .invoices
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| TrackerError::not_found(RecordKind::Invoice, id))
    }

    fn mark_entries_invoiced(&self, ids: &[i64], invoice_id: i64) -> Result<()> {
        let mut inner = self.inner.lock();
        Self::check_failure(&mut inner, FailurePoint::MarkEntriesInvoiced)?;

        if let Some(missing) = ids.iter().find(|id| !inner.store.entries.contains_key(*id)) {
            return Err(TrackerError::not_found(RecordKind::TimeEntry, *missing));
        }
        for id in ids {
            if let Some(entry) = inner.store.entries.get_mut(id) {
                entry.is_invoiced = true;
                entry.invoice_id = Some(invoice_id);
            }
        }
        Ok(())
    }

    fn clear_invoice_marking(&self, invoice_id: i64) -> Result<()> {
        let mut inner = self.inner.lock();
        Self::check_failure(&mut inner, FailurePoint::ClearInvoiceMarking)?;

        for entry in inner.store.entries.values_mut().filter(|entry| entry.invoice_id == Some(invoice_id)) {
            entry.is_invoiced = false;
            entry.invoice_id = None;
        }
        Ok(())
    }

    fn atomically<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        let snapshot = self.inner.lock().store.clone();
        let result = f(self);
        if result.is_err() {
            self.inner.lock().store = snapshot;
        }
        result
    }
}
