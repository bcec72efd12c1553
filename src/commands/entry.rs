use super::client::resolve_client;
use super::start::{attach_project, build_context};
use super::timer_engine;
use crate::{
    db::repository::TimerRepository,
    libs::{
        config::Config,
        entry::{EntryDraft, EntryFilter},
        error::{RecordKind, TrackerError},
        messages::Message,
        view::View,
    },
    msg_info, msg_print, msg_success,
};
use anyhow::Result;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Args, Subcommand};
use dialoguer::{theme::ColorfulTheme, Confirm};

#[derive(Debug, Args)]
pub struct EntryArgs {
    #[command(subcommand)]
    command: EntryCommand,
}

#[derive(Debug, Subcommand)]
enum EntryCommand {
    /// Log a finished span of time
    Add {
        description: String,
        /// `YYYY-MM-DD HH:MM`, or `HH:MM` for today
        #[arg(short, long, value_parser = parse_datetime)]
        start: Option<NaiveDateTime>,
        #[arg(short, long, value_parser = parse_datetime)]
        end: Option<NaiveDateTime>,
        #[arg(short, long)]
        client: Option<String>,
        #[arg(short, long)]
        project: Option<i64>,
        #[arg(short, long)]
        task: Option<i64>,
        /// Round up to this many minutes instead of the configured interval
        #[arg(short, long)]
        round: Option<i64>,
    },
    /// Change what an entry was spent on
    Edit {
        id: i64,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        client: Option<String>,
        #[arg(short, long)]
        project: Option<i64>,
        #[arg(short, long)]
        task: Option<i64>,
    },
    Delete {
        id: i64,
        #[arg(short, long)]
        yes: bool,
    },
    List {
        #[arg(short, long)]
        client: Option<String>,
        #[arg(long, value_parser = parse_date)]
        from: Option<NaiveDate>,
        #[arg(long, value_parser = parse_date)]
        to: Option<NaiveDate>,
        /// Only entries not yet on an invoice
        #[arg(long)]
        uninvoiced: bool,
    },
}

pub fn cmd(args: EntryArgs) -> Result<()> {
    match args.command {
        EntryCommand::Add {
            description,
            start,
            end,
            client,
            project,
            task,
            round,
        } => {
            let round_to = match round {
                Some(minutes) => minutes,
                None => Config::read()?.timer_settings().rounding_minutes,
            };
            let draft = EntryDraft {
                context: build_context(description, client.as_deref(), project, task)?,
                start_time: start,
                end_time: end,
            };
            let entry = timer_engine()?.add_manual_entry(&draft, round_to)?;
            msg_success!(Message::EntryCreated(entry.id));
        }
        EntryCommand::Edit {
            id,
            description,
            client,
            project,
            task,
        } => {
            let engine = timer_engine()?;
            let current = engine
                .repository()
                .find_entry_by_id(id)?
                .ok_or_else(|| TrackerError::not_found(RecordKind::TimeEntry, id))?;

            let mut context = current.context();
            if let Some(description) = description {
                context.description = description;
            }
            if let Some(client) = client {
                context = context.reassign_client(resolve_client(&client)?);
            }
            if let Some(project) = project {
                context = attach_project(context, project)?;
            }
            if let Some(task) = task {
                context = context.task(task);
            }

            engine.edit_entry(id, &context)?;
            msg_success!(Message::EntryUpdated(id));
        }
        EntryCommand::Delete { id, yes } => {
            let confirmed = yes
                || Confirm::with_theme(&ColorfulTheme::default())
                    .with_prompt(Message::ConfirmDeleteEntry(id).to_string())
                    .default(false)
                    .interact()?;

            if confirmed {
                timer_engine()?.delete_entry(id)?;
                msg_success!(Message::EntryDeleted(id));
            } else {
                msg_info!(Message::OperationCancelled);
            }
        }
        EntryCommand::List {
            client,
            from,
            to,
            uninvoiced,
        } => {
            let filter = EntryFilter {
                client_id: client.as_deref().map(resolve_client).transpose()?,
                from,
                to,
                invoiced: uninvoiced.then_some(false),
            };
            let entries = timer_engine()?.list_entries(&filter)?;

            if entries.is_empty() {
                msg_info!(Message::NoEntriesFound);
                return Ok(());
            }

            msg_print!(Message::EntriesHeader, true);
            View::entries(&entries)?;
        }
    }
    Ok(())
}

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate, String> {
    if value.eq_ignore_ascii_case("today") {
        return Ok(Local::now().date_naive());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| format!("'{}': {}", value, e))
}

pub(crate) fn parse_datetime(value: &str) -> Result<NaiveDateTime, String> {
    let value = value.trim();
    if let Ok(datetime) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M") {
        return Ok(datetime);
    }
    NaiveTime::parse_from_str(value, "%H:%M")
        .map(|time| Local::now().date_naive().and_time(time))
        .map_err(|_| format!("'{}' is not a time; use YYYY-MM-DD HH:MM or HH:MM", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_datetimes() {
        let parsed = parse_datetime("2026-03-02 09:15").unwrap();
        assert_eq!(parsed.to_string(), "2026-03-02 09:15:00");
    }

    #[test]
    fn parses_bare_times_as_today() {
        let parsed = parse_datetime("07:30").unwrap();
        assert_eq!(parsed.date(), Local::now().date_naive());
        assert_eq!(parsed.time(), NaiveTime::from_hms_opt(7, 30, 0).unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_datetime("soon").is_err());
        assert!(parse_date("2026-13-01").is_err());
    }
}
