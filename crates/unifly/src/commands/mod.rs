//! Command dispatch: bridges CLI args -> audit core -> output formatting.

pub mod audit;
pub mod config_cmd;
pub mod firewall;
pub mod ports;
pub mod profiles;
pub mod rules;
pub mod topology;
pub mod util;

use crate::cli::Command;
use crate::config::Settings;
use crate::error::CliError;

/// Dispatch a snapshot-bound command to the appropriate handler.
pub fn dispatch(cmd: &Command, settings: &Settings) -> Result<(), CliError> {
    match cmd {
        Command::Audit(args) => audit::handle(args, settings),
        Command::Rules => rules::handle(settings),
        Command::Topology(args) => topology::handle(args, settings),
        Command::Ports(args) => ports::handle(args, settings),
        Command::Profiles(args) => profiles::handle(args, settings),
        Command::Firewall(args) => firewall::handle(args, settings),
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
