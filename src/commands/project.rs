use super::client::{parse_rate, resolve_client};
use crate::{
    db::projects::Projects,
    libs::{messages::Message, view::View},
    msg_info, msg_print, msg_success,
};
use anyhow::Result;
use clap::{Args, Subcommand};
use rust_decimal::Decimal;

#[derive(Debug, Args)]
pub struct ProjectArgs {
    #[command(subcommand)]
    command: ProjectCommand,
}

#[derive(Debug, Subcommand)]
enum ProjectCommand {
    Add {
        /// Client name or ID
        client: String,
        name: String,
        /// Overrides the client's hourly rate
        #[arg(short, long, value_parser = parse_rate)]
        rate: Option<Decimal>,
    },
    List {
        /// Only this client's projects
        #[arg(short, long)]
        client: Option<String>,
    },
}

pub fn cmd(args: ProjectArgs) -> Result<()> {
    match args.command {
        ProjectCommand::Add { client, name, rate } => {
            let client_id = resolve_client(&client)?;
            let id = Projects::new()?.insert(client_id, &name, rate)?;
            msg_success!(Message::ProjectCreated(name, id));
        }
        ProjectCommand::List { client } => {
            let client_id = client.as_deref().map(resolve_client).transpose()?;
            let projects = Projects::new()?.list(client_id)?;

            if projects.is_empty() {
                msg_info!(Message::NoProjectsFound);
                return Ok(());
            }

            msg_print!(Message::ProjectsHeader, true);
            View::projects(&projects)?;
        }
    }
    Ok(())
}
