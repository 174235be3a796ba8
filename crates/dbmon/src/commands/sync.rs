//! `dbmon sync`: account and capacity synchronisation.

use dbmon_core::{EntityId, InstanceStore, Outcome};

use super::util;
use crate::cli::{GlobalOpts, SyncArgs, SyncCommand};
use crate::config::Context;
use crate::error::CliError;
use crate::output;
use crate::progress::Spinner;

pub async fn handle(
    store: &InstanceStore,
    ctx: &Context,
    args: SyncArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let actions = store.actions();
    let spinner = Spinner::attach(store, global.quiet);

    let (outcome, fallback) = match args.command {
        SyncCommand::Accounts { id } => {
            let id = EntityId::new(id);
            let outcome = actions.sync_instance_accounts(id).await;
            (outcome, format!("account sync started for instance {id}"))
        }
        SyncCommand::Capacity { id } => {
            let id = EntityId::new(id);
            let outcome = actions.sync_instance_capacity(id).await;
            (outcome, format!("capacity collection started for instance {id}"))
        }
        SyncCommand::All => (
            actions.sync_all_accounts().await,
            "account sync started for all instances".to_owned(),
        ),
    };
    let outcome = outcome.map_err(|e| ctx.explain(e))?;
    drop(spinner);

    print_outcome(&outcome, &fallback, global)
}

fn print_outcome(outcome: &Outcome, fallback: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(
        global.output,
        outcome,
        |o| util::outcome_message(o, fallback),
        |o| util::outcome_message(o, fallback),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
