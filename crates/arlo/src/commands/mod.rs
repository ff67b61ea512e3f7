//! Command dispatch: bridges CLI args -> core commands -> output formatting.

pub mod command;
pub mod config_cmd;
pub mod devices;
pub mod run;

use arlo_core::{Action, ClientConfig};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch an account-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    config: &ClientConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Devices => devices::handle(config, global).await,
        Command::Snapshot(arg) => command::handle(config, &arg.device, Action::Snapshot, global).await,
        Command::Stream(arg) => command::handle(config, &arg.device, Action::Stream, global).await,
        Command::Arm(arg) => command::handle(config, &arg.device, Action::Arm, global).await,
        Command::Disarm(arg) => command::handle(config, &arg.device, Action::Disarm, global).await,
        Command::Mode(arg) => command::handle(config, &arg.device, Action::QueryMode, global).await,
        // Run, Config and Completions are handled before dispatch
        Command::Run | Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
