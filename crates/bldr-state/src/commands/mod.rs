//! Command dispatch: bridges CLI args -> store operations -> output formatting.

pub mod config_cmd;
pub mod get;
pub mod log;
pub mod schema;
pub mod set;

use crate::cli::Command;
use crate::config::Context;
use crate::error::CliError;

/// Dispatch a state-bound command to the appropriate handler.
pub fn dispatch(cmd: Command, ctx: &Context) -> Result<(), CliError> {
    match cmd {
        Command::Schema(args) => schema::handle(&args, ctx),
        Command::Get(args) => get::handle(&args, ctx),
        Command::Set(args) => set::handle(&args, ctx),
        Command::Log(args) => log::handle(&args, ctx),
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Validation {
            field: "command".into(),
            reason: "not a state command".into(),
        }),
    }
}
