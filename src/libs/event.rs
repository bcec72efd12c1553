//! Timer notifications.
//!
//! The engine announces state changes after they are committed. Listeners
//! (tray icons, status lines, logs) get a reference to the event and cannot
//! fail the operation that produced it.

use crate::libs::entry::TimeEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    Started(TimeEntry),
    Resumed(TimeEntry),
    /// A timer was closed, either by the user or by reconciliation.
    Stopped(TimeEntry),
    /// The active entry changed; `None` means no timer is running.
    ActiveChanged(Option<i64>),
}

pub trait TimerListener {
    fn notify(&self, event: &TimerEvent);
}

impl<F> TimerListener for F
where
    F: Fn(&TimerEvent),
{
    fn notify(&self, event: &TimerEvent) {
        self(event)
    }
}

/// Writes every event to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingListener;

impl TimerListener for TracingListener {
    fn notify(&self, event: &TimerEvent) {
        match event {
            TimerEvent::Started(entry) => {
                tracing::info!(entry_id = entry.id, start = %entry.start_time, "timer started")
            }
            TimerEvent::Resumed(entry) => {
                tracing::info!(entry_id = entry.id, start = %entry.start_time, "timer resumed")
            }
            TimerEvent::Stopped(entry) => {
                tracing::info!(entry_id = entry.id, duration = entry.duration, "timer stopped")
            }
            TimerEvent::ActiveChanged(active) => tracing::debug!(?active, "active timer changed"),
        }
    }
}
