use super::client::resolve_client;
use super::timer_engine;
use crate::{
    db::projects::Projects,
    libs::{config::Config, entry::TimerContext, messages::Message, timer::StartOutcome},
    msg_error_anyhow, msg_success,
};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct StartArgs {
    /// What the time is spent on
    description: String,

    /// Client name or ID
    #[arg(short, long)]
    client: Option<String>,

    #[arg(short, long)]
    project: Option<i64>,

    #[arg(short, long)]
    task: Option<i64>,

    /// Always open a new entry instead of resuming a recently stopped one
    #[arg(long)]
    new: bool,
}

pub fn cmd(args: StartArgs) -> Result<()> {
    let context = build_context(args.description, args.client.as_deref(), args.project, args.task)?;
    let settings = Config::read()?.timer_settings();
    let grace_minutes = if args.new { 0 } else { settings.resume_grace_minutes };

    match timer_engine()?.start_or_resume(&context, grace_minutes)? {
        StartOutcome::Started(entry) => msg_success!(Message::TimerStarted(entry.id, entry.description)),
        StartOutcome::Resumed(entry) => msg_success!(Message::TimerResumed(entry.id, entry.description)),
    }
    Ok(())
}

/// A project implies its client when no client is given.
pub(crate) fn build_context(
    description: String,
    client: Option<&str>,
    project_id: Option<i64>,
    task_id: Option<i64>,
) -> Result<TimerContext> {
    let mut context = TimerContext::new(description);

    if let Some(client) = client {
        context = context.client(resolve_client(client)?);
    }
    if let Some(project_id) = project_id {
        context = attach_project(context, project_id)?;
    }
    if let Some(task_id) = task_id {
        context = context.task(task_id);
    }

    Ok(context)
}

/// Looks up `project_id` and attaches it, refusing a project of another client.
pub(crate) fn attach_project(context: TimerContext, project_id: i64) -> Result<TimerContext> {
    let project = Projects::new()?
        .get_by_id(project_id)?
        .ok_or_else(|| msg_error_anyhow!(Message::ProjectNotFound(project_id)))?;
    Ok(context.with_project(project_id, project.client_id)?)
}
