use crate::{
    db::{projects::Projects, tasks::Tasks},
    libs::{messages::Message, view::View},
    msg_bail_anyhow, msg_info, msg_print, msg_success,
};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct TaskArgs {
    #[command(subcommand)]
    command: TaskCommand,
}

#[derive(Debug, Subcommand)]
enum TaskCommand {
    Add {
        project_id: i64,
        name: String,
    },
    List {
        #[arg(short, long)]
        project: Option<i64>,
    },
}

pub fn cmd(args: TaskArgs) -> Result<()> {
    match args.command {
        TaskCommand::Add { project_id, name } => {
            if Projects::new()?.get_by_id(project_id)?.is_none() {
                msg_bail_anyhow!(Message::ProjectNotFound(project_id));
            }
            let id = Tasks::new()?.insert(project_id, &name)?;
            msg_success!(Message::TaskCreated(name, id));
        }
        TaskCommand::List { project } => {
            let tasks = Tasks::new()?.list(project)?;

            if tasks.is_empty() {
                msg_info!(Message::NoTasksFound);
                return Ok(());
            }

            msg_print!(Message::TasksHeader, true);
            View::tasks(&tasks)?;
        }
    }
    Ok(())
}
