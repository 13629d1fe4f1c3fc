//! Command dispatch: bridges CLI args -> core operations -> output.

pub mod discover;
pub mod monitor;
pub mod pair;
pub mod schedule;
pub mod set_temp;
pub mod sid;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a gateway-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Pair(args) => pair::handle(args, global),
        Command::Sid => sid::handle(global).await,
        Command::Discover(args) => discover::handle(args, global).await,
        Command::SetTemp(args) => set_temp::handle(args, global).await,
        Command::Schedule(args) => schedule::handle(args, global).await,
        Command::Monitor => monitor::handle(global).await,
        // Completions are handled before dispatch
        Command::Completions(_) => unreachable!(),
    }
}
