//! Command dispatch: bridges CLI args -> client calls -> output.

pub mod fetch;
pub mod watch;

use foundation_core::Foundation;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a service-bound command to its handler.
pub async fn dispatch(cmd: Command, client: &Foundation, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Environment => fetch::environment(client, global).await,
        Command::Configuration => fetch::configuration(client, global).await,
        Command::Variable(args) => fetch::variable(client, args, global).await,
        Command::Watch(args) => watch::handle(client, args, global).await,
        // Completions is handled before a client exists
        Command::Completions(_) => unreachable!(),
    }
}
