//! `dbmon delete`: batch-delete instances through the selection.

use dbmon_core::{EntityId, InstanceStore, SelectionReason, StoreEvent};

use super::util;
use crate::cli::{DeleteArgs, GlobalOpts};
use crate::config::Context;
use crate::error::CliError;
use crate::output;
use crate::progress::Spinner;

pub async fn handle(
    store: &InstanceStore,
    ctx: &Context,
    args: DeleteArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let actions = store.actions();
    let requested: Vec<EntityId> = args.ids.into_iter().map(EntityId::new).collect();

    // Deletion goes through the selection, which only holds listed ids
    {
        let _spinner = Spinner::attach(store, global.quiet);
        actions.load_instances().await.map_err(|e| ctx.explain(e))?;
    }
    let state = actions.set_selection(requested.iter().copied(), SelectionReason::Manual)?;
    if let Some(missing) = requested.iter().find(|id| !state.selection.is_selected(**id)) {
        return Err(CliError::NotFound {
            identifier: missing.to_string(),
        });
    }

    let names: Vec<String> = state
        .selected_ids()
        .into_iter()
        .map(|id| match state.instance(id) {
            Some(row) if !row.name.is_empty() => format!("{} ({id})", row.name),
            _ => id.to_string(),
        })
        .collect();
    let prompt = format!(
        "Delete {} instance(s): {}?",
        names.len(),
        names.join(", ")
    );
    if !util::confirm(&prompt, "delete", global)? {
        actions.clear_selection()?;
        util::status(global, "Aborted.");
        return Ok(());
    }

    let mut events = store.events();
    let outcome = {
        let _spinner = Spinner::attach(store, global.quiet);
        actions
            .batch_delete_selected()
            .await
            .map_err(|e| ctx.explain(e))?
    };

    let deleted = std::iter::from_fn(|| events.try_recv())
        .find_map(|event| match event {
            StoreEvent::BatchDeleteSuccess { instance_ids, .. } => Some(instance_ids),
            _ => None,
        })
        .unwrap_or_default();

    let fallback = format!("deleted {}", util::join_ids(&deleted));
    let out = output::render_single(
        global.output,
        &outcome,
        |o| util::outcome_message(o, &fallback),
        |_| {
            deleted
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n")
        },
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
