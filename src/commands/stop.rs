use super::timer_engine;
use crate::{
    db::repository::TimerRepository,
    libs::{config::Config, messages::Message},
    msg_info, msg_success, msg_warning,
};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct StopArgs {
    /// Entry to stop; defaults to the running timer
    #[arg(short, long)]
    id: Option<i64>,

    /// Round up to this many minutes instead of the configured interval
    #[arg(short, long)]
    round: Option<i64>,
}

pub fn cmd(args: StopArgs) -> Result<()> {
    let engine = timer_engine()?;
    let round_to = match args.round {
        Some(minutes) => minutes,
        None => Config::read()?.timer_settings().rounding_minutes,
    };

    let requested = match args.id {
        Some(id) => {
            if let Some(entry) = engine.repository().find_entry_by_id(id)? {
                if !entry.is_active {
                    msg_info!(Message::TimerAlreadyStopped(id));
                    return Ok(());
                }
            }
            id
        }
        None => match engine.active_timer()? {
            Some(active) => active.id,
            None => {
                msg_info!(Message::NoActiveTimer);
                return Ok(());
            }
        },
    };

    match engine.stop(requested, round_to)? {
        Some(entry) => {
            if entry.id != requested {
                msg_warning!(Message::TimerStoppedFallback(entry.id));
            }
            msg_success!(Message::TimerStopped(entry.id, entry.duration));
        }
        None => msg_info!(Message::NoActiveTimer),
    }
    Ok(())
}
