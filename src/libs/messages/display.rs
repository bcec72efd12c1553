//! Text for every [`Message`] variant.

use super::types::Message;
use std::fmt::{Display, Formatter, Result};

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let s = match self {
            // === TIMER MESSAGES ===
            Message::TimerStarted(id, description) => format!("Timer #{} started: {}", id, description),
            Message::TimerResumed(id, description) => format!("Timer #{} resumed: {}", id, description),
            Message::TimerStopped(id, minutes) => format!("Timer #{} stopped after {}", id, format_minutes(*minutes)),
            Message::TimerAlreadyStopped(id) => format!("Timer #{} is not running", id),
            Message::TimerStoppedFallback(id) => format!("Requested timer was not found, stopped running timer #{} instead", id),
            Message::NoActiveTimer => "No timer is running".to_string(),
            Message::ActiveTimerHeader => "Running timer".to_string(),
            Message::TimerRunningFor(minutes) => format!("Running for {}", format_minutes(*minutes)),

            // === ENTRY MESSAGES ===
            Message::EntryCreated(id) => format!("Time entry #{} created", id),
            Message::EntryUpdated(id) => format!("Time entry #{} updated", id),
            Message::EntryDeleted(id) => format!("Time entry #{} deleted", id),
            Message::EntriesHeader => "Time entries".to_string(),
            Message::NoEntriesFound => "No time entries found".to_string(),
            Message::ConfirmDeleteEntry(id) => format!("Delete time entry #{}?", id),

            // === CATALOG MESSAGES ===
            Message::ClientCreated(name, id) => format!("Client '{}' created with ID {}", name, id),
            Message::ClientDeleted(id) => format!("Client #{} deleted", id),
            Message::ClientRateUpdated(client) => format!("Hourly rate of client '{}' updated", client),
            Message::ClientsHeader => "Clients".to_string(),
            Message::NoClientsFound => "No clients found".to_string(),
            Message::ClientNameNotFound(name) => format!("Client '{}' not found", name),
            Message::ConfirmDeleteClient(name) => format!("Delete client '{}' and all of its projects?", name),
            Message::ProjectCreated(name, id) => format!("Project '{}' created with ID {}", name, id),
            Message::ProjectsHeader => "Projects".to_string(),
            Message::NoProjectsFound => "No projects found".to_string(),
            Message::ProjectNotFound(id) => format!("Project with ID {} not found", id),
            Message::TaskCreated(name, id) => format!("Task '{}' created with ID {}", name, id),
            Message::TasksHeader => "Tasks".to_string(),
            Message::NoTasksFound => "No tasks found".to_string(),
            Message::InvalidRate(value) => format!("'{}' is not a valid hourly rate", value),

            // === INVOICE MESSAGES ===
            Message::InvoiceGenerated(number, total) => format!("Invoice {} generated, total {}", number, total),
            Message::InvoicePreviewHeader(count) => format!("Invoice preview ({} entries)", count),
            Message::InvoiceTotal(minutes, amount) => format!("Total: {} billed, amount {}", format_minutes(*minutes), amount),
            Message::InvoiceStatusUpdated(id, status) => format!("Invoice #{} is now {}", id, status),
            Message::InvoiceDeleted(id) => format!("Invoice #{} deleted, its entries are billable again", id),
            Message::InvoicesHeader => "Invoices".to_string(),
            Message::NoInvoicesFound => "No invoices found".to_string(),
            Message::ConfirmDeleteInvoice(id) => format!("Delete invoice #{}?", id),

            // === CONFIGURATION MESSAGES ===
            Message::ConfigSaved => "Configuration saved".to_string(),
            Message::ConfigModuleTimer => "Timer".to_string(),
            Message::ConfigModuleInvoice => "Invoicing".to_string(),
            Message::SelectConfigModules => "Select settings to configure".to_string(),
            Message::PromptRoundingMinutes => "Round stopped timers up to (minutes, 0 = no rounding)".to_string(),
            Message::PromptResumeGraceMinutes => "Resume the last entry if started again within (minutes)".to_string(),
            Message::PromptInvoicePrefix => "Invoice number prefix".to_string(),
            Message::PromptPaymentTermsDays => "Payment terms (days)".to_string(),
            Message::PromptCurrency => "Currency".to_string(),
            Message::InvalidNonNegative => "Value must be zero or greater".to_string(),

            // === EXPORT MESSAGES ===
            Message::ExportCompleted(path) => format!("Data exported to {}", path),
            Message::ExportNoData => "Nothing to export".to_string(),

            // === DATABASE MESSAGES ===
            Message::MigrationsFound(count) => format!("Found {} pending migrations", count),
            Message::RunningMigration(version, name) => format!("Running migration v{}: {}", version, name),
            Message::MigrationFailed(version, error) => format!("Migration v{} failed: {}", version, error),
            Message::AllMigrationsCompleted => "All migrations completed".to_string(),
            Message::DbVersion(current, latest) => format!("Database version {} (latest {})", current, latest),

            // === GENERIC ===
            Message::OperationCancelled => "Operation cancelled".to_string(),
            Message::CommandFailed(error) => error.clone(),
        };
        write!(f, "{}", s)
    }
}

/// `95` -> `1h 35m`, `40` -> `40m`.
pub fn format_minutes(minutes: i64) -> String {
    let (hours, rest) = (minutes / 60, minutes % 60);
    if hours > 0 {
        format!("{}h {:02}m", hours, rest)
    } else {
        format!("{}m", rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes() {
        assert_eq!(format_minutes(0), "0m");
        assert_eq!(format_minutes(40), "40m");
        assert_eq!(format_minutes(95), "1h 35m");
        assert_eq!(format_minutes(120), "2h 00m");
    }

    #[test]
    fn interpolates_values() {
        assert_eq!(Message::TimerStopped(4, 60).to_string(), "Timer #4 stopped after 1h 00m");
        assert_eq!(Message::ClientCreated("Acme".into(), 2).to_string(), "Client 'Acme' created with ID 2");
    }
}
