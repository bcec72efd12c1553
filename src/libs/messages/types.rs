use rust_decimal::Decimal;

/// Every user-facing line the application prints.
///
/// Text lives in `display.rs`; call sites only pick a variant and pass
/// the values it interpolates.
#[derive(Debug, Clone)]
pub enum Message {
    // === TIMER MESSAGES ===
    TimerStarted(i64, String),   // id, description
    TimerResumed(i64, String),   // id, description
    TimerStopped(i64, i64),      // id, minutes
    TimerAlreadyStopped(i64),    // id
    TimerStoppedFallback(i64),   // id actually stopped
    NoActiveTimer,
    ActiveTimerHeader,
    TimerRunningFor(i64),        // minutes so far

    // === ENTRY MESSAGES ===
    EntryCreated(i64),
    EntryUpdated(i64),
    EntryDeleted(i64),
    EntriesHeader,
    NoEntriesFound,
    ConfirmDeleteEntry(i64),

    // === CATALOG MESSAGES ===
    ClientCreated(String, i64),
    ClientDeleted(i64),
    ClientRateUpdated(String),
    ClientsHeader,
    NoClientsFound,
    ClientNameNotFound(String),
    ConfirmDeleteClient(String),
    ProjectCreated(String, i64),
    ProjectsHeader,
    NoProjectsFound,
    ProjectNotFound(i64),
    TaskCreated(String, i64),
    TasksHeader,
    NoTasksFound,
    InvalidRate(String),

    // === INVOICE MESSAGES ===
    InvoiceGenerated(String, Decimal), // number, total
    InvoicePreviewHeader(usize),       // entry count
    InvoiceTotal(i64, Decimal),        // minutes, amount
    InvoiceStatusUpdated(i64, String),
    InvoiceDeleted(i64),
    InvoicesHeader,
    NoInvoicesFound,
    ConfirmDeleteInvoice(i64),

    // === CONFIGURATION MESSAGES ===
    ConfigSaved,
    ConfigModuleTimer,
    ConfigModuleInvoice,
    SelectConfigModules,
    PromptRoundingMinutes,
    PromptResumeGraceMinutes,
    PromptInvoicePrefix,
    PromptPaymentTermsDays,
    PromptCurrency,
    InvalidNonNegative,

    // === EXPORT MESSAGES ===
    ExportCompleted(String), // path
    ExportNoData,

    // === DATABASE MESSAGES ===
    MigrationsFound(usize),
    RunningMigration(u32, String),
    MigrationFailed(u32, String),
    AllMigrationsCompleted,
    DbVersion(u32, u32), // current, latest

    // === GENERIC ===
    OperationCancelled,
    CommandFailed(String),
}
