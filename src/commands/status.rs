use super::timer_engine;
use crate::{
    libs::{clock::Clock, clock::SystemClock, messages::Message, rounding::elapsed_minutes, view::View},
    msg_info, msg_print,
};
use anyhow::Result;

pub fn cmd() -> Result<()> {
    let Some(active) = timer_engine()?.active_timer()? else {
        msg_info!(Message::NoActiveTimer);
        return Ok(());
    };

    msg_print!(Message::ActiveTimerHeader, true);
    View::entries(std::slice::from_ref(&active))?;
    msg_print!(Message::TimerRunningFor(elapsed_minutes(active.start_time, SystemClock.now())));
    Ok(())
}
