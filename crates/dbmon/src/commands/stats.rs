//! `dbmon stats`: instance counters, once or on an interval.

use std::fmt::Write as _;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use dbmon_core::{InstanceStats, InstanceStore, LoadOptions};

use crate::cli::{GlobalOpts, StatsArgs};
use crate::config::Context;
use crate::error::CliError;
use crate::output;
use crate::progress::Spinner;

#[derive(Debug, Serialize)]
struct StatsView {
    #[serde(flatten)]
    stats: InstanceStats,
    updated_at: Option<DateTime<Utc>>,
}

pub async fn handle(
    store: &InstanceStore,
    ctx: &Context,
    args: StatsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    {
        let _spinner = Spinner::attach(store, global.quiet);
        store
            .actions()
            .load_stats(LoadOptions::default())
            .await
            .map_err(|e| ctx.explain(e))?;
    }
    print_stats(store, global)?;

    if !args.watch {
        return Ok(());
    }

    let period = args
        .interval
        .map_or(ctx.poll_interval, |secs| Duration::from_secs(secs.max(1)));
    let mut ticker = tokio::time::interval(period);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("watch interrupted");
                return Ok(());
            }
            _ = ticker.tick() => {
                // A failed refresh keeps the previous counters on screen
                match store.actions().load_stats(LoadOptions::silent()).await {
                    Ok(_) => print_stats(store, global)?,
                    Err(err) => tracing::warn!(error = %err, "stats refresh failed"),
                }
            }
        }
    }
}

fn print_stats(store: &InstanceStore, global: &GlobalOpts) -> Result<(), CliError> {
    let state = store.get_state();
    let view = StatsView {
        stats: state.stats.clone(),
        updated_at: state.stats_updated_at,
    };
    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &view,
        |v| detail(v, color),
        |v| v.stats.total_instances.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn detail(view: &StatsView, color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", output::heading("Instances", color));
    for (label, count) in view.stats.counters() {
        let _ = writeln!(out, "  {label:<10} {count}");
    }
    if !view.stats.db_types.is_empty() {
        let _ = writeln!(out, "{}", output::heading("By type", color));
        for (db_type, count) in &view.stats.db_types {
            let _ = writeln!(out, "  {db_type:<10} {count}");
        }
    }
    if let Some(at) = view.updated_at {
        let _ = write!(
            out,
            "Updated {}",
            at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        );
    }
    out.trim_end().to_owned()
}
