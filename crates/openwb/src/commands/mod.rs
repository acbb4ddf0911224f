//! Command handlers.

pub mod config_cmd;
pub mod fetch;
pub mod watch;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Fetch(args) => fetch::handle(args, global).await,
        Command::Watch(args) => watch::handle(args, global).await,
        Command::Config(args) => config_cmd::handle(args, global),
    }
}
