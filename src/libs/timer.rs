//! The timer engine: start, stop, resume and reconcile.
//!
//! There is one logical timer slot for the whole data set. The engine keeps
//! no state of its own; every operation reads the active entries from the
//! repository, repairs them if more than one is flagged, and writes inside a
//! single repository transaction.
//!
//! ## State machine
//!
//! ```text
//!   ┌──────┐  start / resume   ┌─────────┐
//!   │ Idle │ ────────────────▶ │ Running │
//!   │      │ ◀──────────────── │         │
//!   └──────┘       stop        └─────────┘
//! ```
//!
//! Resume is not an un-pause: the entry keeps its client, project, task and
//! description, but timing restarts from "now".
//!
//! ## Durations
//!
//! - `stop` bills `round_duration(elapsed, round_to_minutes)`
//! - entries closed as a side effect (by `start`, `resume` or reconciliation)
//!   keep their raw elapsed minutes, unrounded

use crate::db::repository::TimerRepository;
use crate::libs::clock::Clock;
use crate::libs::entry::{EntryDraft, EntryFilter, EntryUpdate, NewTimeEntry, TimeEntry, TimerContext};
use crate::libs::error::{RecordKind, Result, TrackerError};
use crate::libs::event::{TimerEvent, TimerListener};
use crate::libs::rounding::{elapsed_minutes, round_duration};
use chrono::NaiveDateTime;

/// What [`TimerEngine::start_or_resume`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started(TimeEntry),
    Resumed(TimeEntry),
}

impl StartOutcome {
    pub fn entry(&self) -> &TimeEntry {
        match self {
            StartOutcome::Started(entry) | StartOutcome::Resumed(entry) => entry,
        }
    }
}

pub struct TimerEngine<R, C> {
    repo: R,
    clock: C,
    listeners: Vec<Box<dyn TimerListener>>,
}

impl<R: TimerRepository, C: Clock> TimerEngine<R, C> {
    pub fn new(repo: R, clock: C) -> Self {
        Self {
            repo,
            clock,
            listeners: Vec::new(),
        }
    }

    pub fn with_listener(mut self, listener: impl TimerListener + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Starts a new running entry, closing whatever was running before.
    ///
    /// Every entry still flagged active is force-stopped first, so a data set
    /// that somehow holds several active entries comes out with exactly one.
    pub fn start(&self, context: &TimerContext) -> Result<TimeEntry> {
        let now = self.clock.now();

        let (closed, entry) = self.repo.atomically(|repo| {
            let active = repo.find_active_entries()?;
            if active.len() > 1 {
                tracing::warn!(count = active.len(), "multiple active timers found while starting a new one");
            }
            let closed = force_stop_all(repo, &active, now)?;
            let entry = repo.create_entry(&NewTimeEntry::running(context.clone(), now))?;
            Ok((closed, entry))
        })?;

        for stopped in closed {
            self.emit(TimerEvent::Stopped(stopped));
        }
        self.emit(TimerEvent::Started(entry.clone()));
        self.emit(TimerEvent::ActiveChanged(Some(entry.id)));

        Ok(entry)
    }

    /// Stops `entry_id`, billing its elapsed time rounded up to `round_to_minutes`.
    ///
    /// Stop is forgiving, since a caller may hold a stale id after a reconcile
    /// elsewhere or fire twice on a double click:
    ///
    /// - the entry exists but is already stopped: it is returned unchanged
    /// - the entry does not exist: whatever timer is running is stopped instead
    /// - nothing is running at all: `Ok(None)`
    pub fn stop(&self, entry_id: i64, round_to_minutes: i64) -> Result<Option<TimeEntry>> {
        let now = self.clock.now();

        let (result, closed) = self.repo.atomically(|repo| match repo.find_entry_by_id(entry_id)? {
            Some(entry) if !entry.is_active => Ok((Some(entry), Vec::new())),
            Some(entry) => {
                let stopped = close_entry(repo, &entry, now, round_to_minutes)?;
                Ok((Some(stopped.clone()), vec![stopped]))
            }
            None => stop_any_active(repo, entry_id, now, round_to_minutes),
        })?;

        if !closed.is_empty() {
            for stopped in closed {
                self.emit(TimerEvent::Stopped(stopped));
            }
            self.emit(TimerEvent::ActiveChanged(None));
        }

        Ok(result)
    }

    /// Makes `entry_id` the running timer again with a fresh start time.
    ///
    /// Other running entries are closed with their real elapsed time. The
    /// previous duration of the resumed entry is not carried over.
    pub fn resume(&self, entry_id: i64) -> Result<TimeEntry> {
        let now = self.clock.now();

        let (closed, entry, resumed) = self.repo.atomically(|repo| {
            let target = repo
                .find_entry_by_id(entry_id)?
                .ok_or_else(|| TrackerError::not_found(RecordKind::TimeEntry, entry_id))?;
            if target.is_invoiced {
                return Err(TrackerError::validation(format!(
                    "Time entry {} is already invoiced and cannot be resumed",
                    entry_id
                )));
            }

            let others: Vec<TimeEntry> = repo.find_active_entries()?.into_iter().filter(|entry| entry.id != entry_id).collect();
            let closed = force_stop_all(repo, &others, now)?;

            if target.is_active {
                Ok((closed, target, false))
            } else {
                let entry = repo.update_entry(entry_id, &EntryUpdate::resumed(now))?;
                Ok((closed, entry, true))
            }
        })?;

        let changed = resumed || !closed.is_empty();
        for stopped in closed {
            self.emit(TimerEvent::Stopped(stopped));
        }
        if resumed {
            self.emit(TimerEvent::Resumed(entry.clone()));
        }
        if changed {
            self.emit(TimerEvent::ActiveChanged(Some(entry.id)));
        }

        Ok(entry)
    }

    /// Starts a timer, or resumes the entry that was just stopped.
    ///
    /// The most recently stopped entry is resumed instead of creating a new
    /// one when it was stopped no more than `grace_minutes` ago, has the same
    /// client and description as `context`, matches any project or task that
    /// `context` names, and is not invoiced. A non-positive grace window
    /// always starts a new entry.
    pub fn start_or_resume(&self, context: &TimerContext, grace_minutes: i64) -> Result<StartOutcome> {
        if grace_minutes > 0 {
            let now = self.clock.now();
            if let Some(last) = self.repo.find_latest_stopped_entry()? {
                if is_quick_resume_candidate(&last, context, now, grace_minutes) {
                    tracing::debug!(entry_id = last.id, "resuming recently stopped entry");
                    return self.resume(last.id).map(StartOutcome::Resumed);
                }
            }
        }

        self.start(context).map(StartOutcome::Started)
    }

    /// Restores the single-active-timer invariant and returns the survivor.
    ///
    /// The most recently started active entry stays running; every other
    /// active entry is closed with its real elapsed time.
    pub fn reconcile_single_active(&self) -> Result<Option<TimeEntry>> {
        let now = self.clock.now();

        let (survivor, closed) = self.repo.atomically(|repo| {
            let mut active = repo.find_active_entries()?;
            sort_most_recent_first(&mut active);
            if active.len() <= 1 {
                return Ok((active.pop(), Vec::new()));
            }

            tracing::warn!(count = active.len(), keep = active[0].id, "multiple active timers found; keeping the most recent");
            let survivor = active.remove(0);
            let closed = force_stop_all(repo, &active, now)?;
            Ok((Some(survivor), closed))
        })?;

        for stopped in closed {
            self.emit(TimerEvent::Stopped(stopped));
        }

        Ok(survivor)
    }

    /// The running entry, if any. Always reconciles first.
    pub fn active_timer(&self) -> Result<Option<TimeEntry>> {
        self.reconcile_single_active()
    }

    /// Records a finished span of time without touching the running timer.
    pub fn add_manual_entry(&self, draft: &EntryDraft, round_to_minutes: i64) -> Result<TimeEntry> {
        let start_time = draft
            .start_time
            .ok_or_else(|| TrackerError::validation("A manual time entry needs a start time"))?;
        let end_time = draft
            .end_time
            .ok_or_else(|| TrackerError::validation("A manual time entry needs an end time"))?;
        if end_time < start_time {
            return Err(TrackerError::validation(format!(
                "End time {} is before start time {}",
                end_time, start_time
            )));
        }

        let duration = round_duration(elapsed_minutes(start_time, end_time), round_to_minutes);
        self.repo.create_entry(&NewTimeEntry {
            context: draft.context.clone(),
            start_time,
            end_time: Some(end_time),
            duration,
            is_active: false,
        })
    }

    /// Replaces what an entry was spent on.
    ///
    /// An invoiced entry keeps its client; moving it would break the invoice.
    pub fn edit_entry(&self, entry_id: i64, context: &TimerContext) -> Result<TimeEntry> {
        self.repo.atomically(|repo| {
            let entry = repo
                .find_entry_by_id(entry_id)?
                .ok_or_else(|| TrackerError::not_found(RecordKind::TimeEntry, entry_id))?;
            if entry.is_invoiced && entry.client_id != context.client_id {
                return Err(TrackerError::validation(format!(
                    "Time entry {} is invoiced; its client cannot change",
                    entry_id
                )));
            }
            repo.update_entry(entry_id, &EntryUpdate::context(context))
        })
    }

    /// Deletes a stopped, uninvoiced entry.
    pub fn delete_entry(&self, entry_id: i64) -> Result<()> {
        self.repo.atomically(|repo| {
            let entry = repo
                .find_entry_by_id(entry_id)?
                .ok_or_else(|| TrackerError::not_found(RecordKind::TimeEntry, entry_id))?;
            if entry.is_active {
                return Err(TrackerError::validation(format!(
                    "Time entry {} is running; stop it before deleting",
                    entry_id
                )));
            }
            if entry.is_invoiced {
                return Err(TrackerError::validation(format!(
                    "Time entry {} is invoiced; delete the invoice first",
                    entry_id
                )));
            }
            repo.delete_entry(entry_id)
        })
    }

    pub fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<TimeEntry>> {
        self.repo.list_entries(filter)
    }

    fn emit(&self, event: TimerEvent) {
        for listener in &self.listeners {
            listener.notify(&event);
        }
    }
}

/// Fallback for `stop` when the requested entry does not exist.
fn stop_any_active<R: TimerRepository>(
    repo: &R,
    requested_id: i64,
    now: NaiveDateTime,
    round_to_minutes: i64,
) -> Result<(Option<TimeEntry>, Vec<TimeEntry>)> {
    let mut active = repo.find_active_entries()?;
    sort_most_recent_first(&mut active);
    if active.is_empty() {
        tracing::debug!(requested_id, "stop requested but no timer is running");
        return Ok((None, Vec::new()));
    }

    let latest = active.remove(0);
    tracing::warn!(requested_id, fallback_id = latest.id, "time entry not found; stopping the running timer instead");

    let mut closed = force_stop_all(repo, &active, now)?;
    let stopped = close_entry(repo, &latest, now, round_to_minutes)?;
    closed.push(stopped.clone());

    Ok((Some(stopped), closed))
}

fn close_entry<R: TimerRepository>(repo: &R, entry: &TimeEntry, now: NaiveDateTime, round_to_minutes: i64) -> Result<TimeEntry> {
    let duration = round_duration(elapsed_minutes(entry.start_time, now), round_to_minutes);
    repo.update_entry(entry.id, &EntryUpdate::stopped(now, duration))
}

fn force_stop_all<R: TimerRepository>(repo: &R, entries: &[TimeEntry], now: NaiveDateTime) -> Result<Vec<TimeEntry>> {
    entries.iter().map(|entry| close_entry(repo, entry, now, 0)).collect()
}

fn sort_most_recent_first(entries: &mut [TimeEntry]) {
    entries.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(b.id.cmp(&a.id)));
}

fn is_quick_resume_candidate(last: &TimeEntry, context: &TimerContext, now: NaiveDateTime, grace_minutes: i64) -> bool {
    let Some(end_time) = last.end_time else {
        return false;
    };

    !last.is_invoiced
        && last.client_id == context.client_id
        && last.description == context.description
        && context.project_id.map_or(true, |project_id| last.project_id == Some(project_id))
        && context.task_id.map_or(true, |task_id| last.task_id == Some(task_id))
        && (now - end_time).num_minutes() <= grace_minutes
}
