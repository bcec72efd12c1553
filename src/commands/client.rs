use crate::{
    db::clients::Clients,
    libs::{messages::Message, view::View},
    msg_error_anyhow, msg_info, msg_print, msg_success,
};
use anyhow::Result;
use clap::{Args, Subcommand};
use dialoguer::{theme::ColorfulTheme, Confirm};
use rust_decimal::Decimal;
use std::str::FromStr;

#[derive(Debug, Args)]
pub struct ClientArgs {
    #[command(subcommand)]
    command: ClientCommand,
}

#[derive(Debug, Subcommand)]
enum ClientCommand {
    Add {
        name: String,
        /// Default hourly rate for this client's work
        #[arg(short, long, value_parser = parse_rate)]
        rate: Option<Decimal>,
    },
    List,
    /// Change or clear the default hourly rate
    Rate {
        client: String,
        #[arg(value_parser = parse_rate)]
        rate: Option<Decimal>,
    },
    Delete {
        client: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

pub fn cmd(args: ClientArgs) -> Result<()> {
    match args.command {
        ClientCommand::Add { name, rate } => handle_add(name, rate),
        ClientCommand::List => handle_list(),
        ClientCommand::Rate { client, rate } => handle_rate(client, rate),
        ClientCommand::Delete { client, yes } => handle_delete(client, yes),
    }
}

fn handle_add(name: String, rate: Option<Decimal>) -> Result<()> {
    let id = Clients::new()?.insert(&name, rate)?;
    msg_success!(Message::ClientCreated(name, id));
    Ok(())
}

fn handle_list() -> Result<()> {
    let clients = Clients::new()?.list()?;

    if clients.is_empty() {
        msg_info!(Message::NoClientsFound);
        return Ok(());
    }

    msg_print!(Message::ClientsHeader, true);
    View::clients(&clients)?;
    Ok(())
}

fn handle_rate(client: String, rate: Option<Decimal>) -> Result<()> {
    let id = resolve_client(&client)?;
    Clients::new()?.update_rate(id, rate)?;
    msg_success!(Message::ClientRateUpdated(client));
    Ok(())
}

fn handle_delete(client: String, yes: bool) -> Result<()> {
    let id = resolve_client(&client)?;

    let confirmed = yes
        || Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::ConfirmDeleteClient(client).to_string())
            .default(false)
            .interact()?;

    if confirmed {
        Clients::new()?.delete(id)?;
        msg_success!(Message::ClientDeleted(id));
    } else {
        msg_info!(Message::OperationCancelled);
    }
    Ok(())
}

/// Looks a client up by numeric ID first, then by name.
pub(crate) fn resolve_client(identifier: &str) -> Result<i64> {
    let clients = Clients::new()?;

    let client = if let Ok(id) = identifier.parse::<i64>() {
        clients.get_by_id(id)?
    } else {
        clients.get_by_name(identifier)?
    };

    client
        .map(|client| client.id)
        .ok_or_else(|| msg_error_anyhow!(Message::ClientNameNotFound(identifier.to_string())))
}

/// Hourly rates are non-negative decimals such as `80` or `72.50`.
pub(crate) fn parse_rate(value: &str) -> Result<Decimal, String> {
    match Decimal::from_str(value.trim()) {
        Ok(rate) if !rate.is_sign_negative() => Ok(rate),
        _ => Err(Message::InvalidRate(value.to_string()).to_string()),
    }
}
