//! Persistence contract consumed by the timer engine and invoice aggregator.
//!
//! The engine never keeps "the active timer" in memory: every decision is
//! made from what the repository returns, so the single-active-timer
//! invariant is a property of the stored data. Two implementations ship
//! with the crate:
//!
//! - [`SqliteRepository`](crate::db::store::SqliteRepository): the on-disk store
//! - [`MemoryRepository`](crate::db::memory::MemoryRepository): an in-process double for tests
//!
//! ## Transactions
//!
//! Multi-step writes (reconcile then create, invoice then mark) run inside
//! [`TimerRepository::atomically`]. A failing closure leaves the store as it
//! was before the call.

use crate::libs::entry::{BillableEntry, EntryFilter, EntryUpdate, NewTimeEntry, TimeEntry};
use crate::libs::error::Result;
use crate::libs::invoice::{Invoice, InvoiceStatus, NewInvoice};

pub trait TimerRepository {
    /// Every entry flagged active, most recently started first.
    fn find_active_entries(&self) -> Result<Vec<TimeEntry>>;

    fn find_entry_by_id(&self, id: i64) -> Result<Option<TimeEntry>>;

    /// The inactive entry with the latest end time, if any.
    fn find_latest_stopped_entry(&self) -> Result<Option<TimeEntry>>;

    fn create_entry(&self, fields: &NewTimeEntry) -> Result<TimeEntry>;

    /// Fails with `NotFound` when no entry has `id`.
    fn update_entry(&self, id: i64, fields: &EntryUpdate) -> Result<TimeEntry>;

    fn delete_entry(&self, id: i64) -> Result<()>;

    /// Entries matching `filter`, oldest first.
    fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<TimeEntry>>;

    /// Entries with project and client rates resolved. Missing ids are skipped.
    fn find_billable_entries(&self, ids: &[i64]) -> Result<Vec<BillableEntry>>;

    fn create_invoice(&self, fields: &NewInvoice) -> Result<Invoice>;

    fn find_invoice_by_id(&self, id: i64) -> Result<Option<Invoice>>;

    fn list_invoices(&self) -> Result<Vec<Invoice>>;

    fn update_invoice_status(&self, id: i64, status: InvoiceStatus) -> Result<Invoice>;

    fn delete_invoice(&self, id: i64) -> Result<()>;

    fn mark_entries_invoiced(&self, ids: &[i64], invoice_id: i64) -> Result<()>;

    /// Resets `is_invoiced`/`invoice_id` on every entry referencing `invoice_id`.
    fn clear_invoice_marking(&self, invoice_id: i64) -> Result<()>;

    /// Runs `f` as one unit: either all of its writes land or none do.
    fn atomically<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>;
}
