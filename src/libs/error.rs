//! Typed errors for the timer engine, invoice aggregator and repositories.
//!
//! Command handlers work with `anyhow::Result`, but everything underneath
//! returns [`TrackerError`] so callers can tell a missing entry from a
//! rejected invoice request or a storage failure.
//!
//! ## Categories
//!
//! - **NotFound**: a referenced entry, invoice or catalog row does not exist
//! - **MultipleClients**: an invoice request spans more than one client
//! - **Validation**: malformed input, rejected before the repository is touched
//! - **Persistence**: the backing store failed; propagated as-is, never retried

use std::fmt;
use thiserror::Error;

pub type Result<T, E = TrackerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("{kind} with ID {id} not found")]
    NotFound { kind: RecordKind, id: i64 },

    #[error("time entries belong to multiple clients: {}", describe_clients(.0))]
    MultipleClients(Vec<Option<i64>>),

    #[error("{0}")]
    Validation(String),

    #[error("persistence failure: {0}")]
    Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Record type named by [`TrackerError::NotFound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    TimeEntry,
    Invoice,
    Client,
    Project,
    Task,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordKind::TimeEntry => "Time entry",
            RecordKind::Invoice => "Invoice",
            RecordKind::Client => "Client",
            RecordKind::Project => "Project",
            RecordKind::Task => "Task",
        };
        f.write_str(name)
    }
}

impl TrackerError {
    pub fn not_found(kind: RecordKind, id: i64) -> Self {
        TrackerError::NotFound { kind, id }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        TrackerError::Validation(message.into())
    }

    /// Storage failure described by a plain message, for backends without a native error type.
    pub fn persistence(message: impl Into<String>) -> Self {
        TrackerError::Persistence(message.into().into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TrackerError::NotFound { .. })
    }
}

impl From<rusqlite::Error> for TrackerError {
    fn from(err: rusqlite::Error) -> Self {
        TrackerError::Persistence(Box::new(err))
    }
}

fn describe_clients(clients: &[Option<i64>]) -> String {
    clients
        .iter()
        .map(|client| match client {
            Some(id) => format!("client #{}", id),
            None => "no client".to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiple_clients_message_names_every_client() {
        let err = TrackerError::MultipleClients(vec![Some(1), Some(2), None]);
        assert_eq!(
            err.to_string(),
            "time entries belong to multiple clients: client #1, client #2, no client"
        );
    }

    #[test]
    fn not_found_message_names_kind_and_id() {
        let err = TrackerError::not_found(RecordKind::Invoice, 7);
        assert_eq!(err.to_string(), "Invoice with ID 7 not found");
        assert!(err.is_not_found());
    }
}
