//! Command-line interface.
//!
//! Each subcommand lives in its own module with an `Args` struct and a
//! `cmd` function. Commands open the default database and talk to the
//! timer engine or invoice aggregator; the engine and aggregator never see
//! clap types.

pub mod client;
pub mod entry;
pub mod export;
pub mod init;
pub mod invoice;
pub mod migrations;
pub mod project;
pub mod resume;
pub mod start;
pub mod status;
pub mod stop;
pub mod task;

use crate::db::store::SqliteRepository;
use crate::libs::clock::SystemClock;
use crate::libs::config::InvoiceConfig;
use crate::libs::event::TracingListener;
use crate::libs::invoice::InvoiceAggregator;
use crate::libs::timer::TimerEngine;
use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Configuration initialization")]
    Init(init::InitArgs),
    #[command(about = "Manage clients")]
    Client(client::ClientArgs),
    #[command(about = "Manage projects")]
    Project(project::ProjectArgs),
    #[command(about = "Manage tasks")]
    Task(task::TaskArgs),
    #[command(about = "Start a timer, or resume one stopped moments ago")]
    Start(start::StartArgs),
    #[command(about = "Stop the running timer")]
    Stop(stop::StopArgs),
    #[command(about = "Resume a stopped time entry")]
    Resume(resume::ResumeArgs),
    #[command(about = "Show the running timer")]
    Status,
    #[command(about = "Add, edit, delete and list time entries")]
    Entry(entry::EntryArgs),
    #[command(about = "Generate and manage invoices")]
    Invoice(invoice::InvoiceArgs),
    #[command(about = "Export entries or invoices to CSV or JSON")]
    Export(export::ExportArgs),
    #[command(about = "Database migration status and history")]
    Migrations(migrations::MigrationsArgs),
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub async fn menu() -> Result<()> {
        let cli = Self::parse();
        match cli.command {
            Commands::Init(args) => init::cmd(args),
            Commands::Client(args) => client::cmd(args),
            Commands::Project(args) => project::cmd(args),
            Commands::Task(args) => task::cmd(args),
            Commands::Start(args) => start::cmd(args),
            Commands::Stop(args) => stop::cmd(args),
            Commands::Resume(args) => resume::cmd(args),
            Commands::Status => status::cmd(),
            Commands::Entry(args) => entry::cmd(args),
            Commands::Invoice(args) => invoice::cmd(args),
            Commands::Export(args) => export::cmd(args).await,
            Commands::Migrations(args) => migrations::cmd(args),
        }
    }
}

pub(crate) type Engine = TimerEngine<SqliteRepository, SystemClock>;
pub(crate) type Aggregator = InvoiceAggregator<SqliteRepository, SystemClock>;

/// Engine over the default database, logging every timer event.
pub(crate) fn timer_engine() -> Result<Engine> {
    Ok(TimerEngine::new(SqliteRepository::new()?, SystemClock).with_listener(TracingListener))
}

pub(crate) fn invoice_aggregator(settings: &InvoiceConfig) -> Result<Aggregator> {
    Ok(InvoiceAggregator::new(SqliteRepository::new()?, SystemClock).with_payment_terms(settings.payment_terms_days))
}
