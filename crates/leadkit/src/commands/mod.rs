//! Command dispatch: bridges CLI args -> dashboard operations -> output.

pub mod analytics;
pub mod auth;
pub mod config_cmd;
pub mod forms;
pub mod leads;
pub mod util;
pub mod websites;

use leadkit_core::Dashboard;

use crate::cli::{Command, GlobalOpts};
use crate::config::Resolved;
use crate::error::CliError;

/// Dispatch a backend-bound command to its handler.
///
/// Everything except `auth` requires a stored session.
pub async fn dispatch(
    cmd: Command,
    dashboard: &Dashboard,
    resolved: &Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Command::Auth(args) = cmd {
        return auth::handle(dashboard, args, resolved, global).await;
    }

    util::require_session(dashboard, resolved)?;
    match cmd {
        Command::Websites(args) => websites::handle(dashboard, args, global).await,
        Command::Forms(args) => forms::handle(dashboard, args, global).await,
        Command::Leads(args) => leads::handle(dashboard, args, global).await,
        Command::Analytics(args) => analytics::handle(dashboard, &args, global).await,
        Command::Auth(_) | Command::Config(_) | Command::Completions(_) => {
            unreachable!("handled before dispatch")
        }
    }
}
