use crate::{
    db::db::Db,
    libs::{config::Config, messages::Message},
    msg_success,
};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Only create the database, skip the configuration wizard
    #[arg(long)]
    db_only: bool,
}

pub fn cmd(init_args: InitArgs) -> Result<()> {
    // Opening the database applies any pending migrations
    Db::new()?;

    if init_args.db_only {
        return Ok(());
    }

    Config::init()?.save()?;
    msg_success!(Message::ConfigSaved);
    Ok(())
}
