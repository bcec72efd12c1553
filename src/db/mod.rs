/// Connection setup for the SQLite database file.
pub mod db;

/// Versioned schema migrations, applied when a database is opened.
pub mod migrations;

/// The storage seam used by the timer engine and invoice aggregator.
pub mod repository;

/// SQLite implementation of the repository.
pub mod store;

/// In-memory implementation of the repository, with failure injection for tests.
pub mod memory;

/// Client records and their default hourly rates.
pub mod clients;

/// Projects under a client, with optional rate overrides.
pub mod projects;

pub mod tasks;
