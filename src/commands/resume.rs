use super::timer_engine;
use crate::{libs::messages::Message, msg_success};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct ResumeArgs {
    /// ID of the time entry to continue
    id: i64,
}

pub fn cmd(args: ResumeArgs) -> Result<()> {
    let entry = timer_engine()?.resume(args.id)?;
    msg_success!(Message::TimerResumed(entry.id, entry.description));
    Ok(())
}
