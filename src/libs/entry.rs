//! Time entry records and the field sets used to create and change them.

use crate::libs::error::{Result, TrackerError};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A span of tracked time.
///
/// While `is_active` is set the entry has no `end_time` and a zero
/// `duration`; stopping fills both in. At most one entry in the whole data
/// set is active at any moment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: i64,
    pub client_id: Option<i64>,
    pub project_id: Option<i64>,
    pub task_id: Option<i64>,
    pub description: String,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    /// Billed minutes, after rounding.
    pub duration: i64,
    pub is_active: bool,
    pub is_invoiced: bool,
    pub invoice_id: Option<i64>,
}

impl TimeEntry {
    pub fn context(&self) -> TimerContext {
        TimerContext {
            client_id: self.client_id,
            project_id: self.project_id,
            task_id: self.task_id,
            description: self.description.clone(),
        }
    }

    /// Applies every field present in `update`, leaving the rest untouched.
    pub fn apply(&mut self, update: &EntryUpdate) {
        if let Some(client_id) = update.client_id {
            self.client_id = client_id;
        }
        if let Some(project_id) = update.project_id {
            self.project_id = project_id;
        }
        if let Some(task_id) = update.task_id {
            self.task_id = task_id;
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        if let Some(start_time) = update.start_time {
            self.start_time = start_time;
        }
        if let Some(end_time) = update.end_time {
            self.end_time = end_time;
        }
        if let Some(duration) = update.duration {
            self.duration = duration.max(0);
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }
    }
}

/// The identity-defining fields of an entry: what the time was spent on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerContext {
    pub client_id: Option<i64>,
    pub project_id: Option<i64>,
    pub task_id: Option<i64>,
    pub description: String,
}

impl TimerContext {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn client(mut self, client_id: i64) -> Self {
        self.client_id = Some(client_id);
        self
    }

    pub fn project(mut self, project_id: i64) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn task(mut self, task_id: i64) -> Self {
        self.task_id = Some(task_id);
        self
    }

    /// Moves the context to `client_id`. A project and task picked for
    /// another client do not follow it.
    pub fn reassign_client(mut self, client_id: i64) -> Self {
        if self.client_id != Some(client_id) {
            self.project_id = None;
            self.task_id = None;
        }
        self.client_id = Some(client_id);
        self
    }

    /// Attaches a project owned by `project_client_id`.
    ///
    /// Without a client the project's client is taken; a different client is
    /// a validation error, since the project's rate would bill that client.
    pub fn with_project(mut self, project_id: i64, project_client_id: i64) -> Result<Self> {
        match self.client_id {
            Some(client_id) if client_id != project_client_id => Err(TrackerError::validation(format!(
                "Project {} belongs to client {}, not client {}",
                project_id, project_client_id, client_id
            ))),
            _ => {
                self.client_id = Some(project_client_id);
                self.project_id = Some(project_id);
                Ok(self)
            }
        }
    }
}

/// Fields for a row about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTimeEntry {
    pub context: TimerContext,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    pub duration: i64,
    pub is_active: bool,
}

impl NewTimeEntry {
    /// A running entry starting at `now`.
    pub fn running(context: TimerContext, now: NaiveDateTime) -> Self {
        Self {
            context,
            start_time: now,
            end_time: None,
            duration: 0,
            is_active: true,
        }
    }
}

/// Partial update. `None` leaves a field alone; nullable fields use a nested
/// `Option` so they can be cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryUpdate {
    pub client_id: Option<Option<i64>>,
    pub project_id: Option<Option<i64>>,
    pub task_id: Option<Option<i64>>,
    pub description: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<Option<NaiveDateTime>>,
    pub duration: Option<i64>,
    pub is_active: Option<bool>,
}

impl EntryUpdate {
    /// Closes an entry at `end_time` with the given billed minutes.
    pub fn stopped(end_time: NaiveDateTime, duration: i64) -> Self {
        Self {
            end_time: Some(Some(end_time)),
            duration: Some(duration),
            is_active: Some(false),
            ..Default::default()
        }
    }

    /// Reopens an entry with a fresh start time.
    pub fn resumed(now: NaiveDateTime) -> Self {
        Self {
            start_time: Some(now),
            end_time: Some(None),
            duration: Some(0),
            is_active: Some(true),
            ..Default::default()
        }
    }

    /// Replaces client, project, task and description.
    pub fn context(context: &TimerContext) -> Self {
        Self {
            client_id: Some(context.client_id),
            project_id: Some(context.project_id),
            task_id: Some(context.task_id),
            description: Some(context.description.clone()),
            ..Default::default()
        }
    }
}

/// A manually logged entry as entered by the user, before validation.
#[derive(Debug, Clone, Default)]
pub struct EntryDraft {
    pub context: TimerContext,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub client_id: Option<i64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// `Some(false)` keeps only entries not yet invoiced.
    pub invoiced: Option<bool>,
}

impl EntryFilter {
    pub fn matches(&self, entry: &TimeEntry) -> bool {
        let date = entry.start_time.date();
        self.client_id.map_or(true, |client_id| entry.client_id == Some(client_id))
            && self.from.map_or(true, |from| date >= from)
            && self.to.map_or(true, |to| date <= to)
            && self.invoiced.map_or(true, |invoiced| entry.is_invoiced == invoiced)
    }
}

/// A time entry joined with the rates that may apply to it.
#[derive(Debug, Clone, PartialEq)]
pub struct BillableEntry {
    pub entry: TimeEntry,
    pub project_rate: Option<Decimal>,
    pub client_rate: Option<Decimal>,
}

impl BillableEntry {
    /// Project rate, then client rate, then zero.
    pub fn hourly_rate(&self) -> Decimal {
        self.project_rate.or(self.client_rate).unwrap_or(Decimal::ZERO)
    }
}
