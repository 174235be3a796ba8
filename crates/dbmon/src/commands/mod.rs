//! Command dispatch: bridges CLI args -> store actions -> output formatting.

pub mod config_cmd;
pub mod create;
pub mod delete;
pub mod instances;
pub mod stats;
pub mod sync;
pub mod util;

use dbmon_core::InstanceStore;

use crate::cli::{Command, GlobalOpts};
use crate::config::Context;
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    store: &InstanceStore,
    ctx: &Context,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Stats(args) => stats::handle(store, ctx, args, global).await,
        Command::Instances(args) => instances::handle(store, ctx, args, global).await,
        Command::Sync(args) => sync::handle(store, ctx, args, global).await,
        Command::Delete(args) => delete::handle(store, ctx, args, global).await,
        Command::Create(args) => create::handle(store, ctx, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
