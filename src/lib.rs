//! billable: time tracking with a single running timer, duration rounding
//! and per-client invoicing.
//!
//! - [`libs::timer::TimerEngine`] owns the timer lifecycle
//! - [`libs::invoice::InvoiceAggregator`] turns stopped entries into invoices
//! - [`db::repository::TimerRepository`] is the storage seam, with a SQLite
//!   implementation in [`db::store`] and an in-memory one in [`db::memory`]

pub mod commands;
pub mod db;
pub mod libs;
