//! `dbmon instances`: filtered instance grid.

use serde_json::Value;
use tabled::Tabled;

use dbmon_core::{EntityRef, FilterValue, Filters, InstanceStore};

use crate::cli::{GlobalOpts, InstancesArgs};
use crate::config::Context;
use crate::error::CliError;
use crate::output;
use crate::progress::Spinner;

#[derive(Tabled)]
struct InstanceRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    db_type: String,
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl InstanceRow {
    fn from_ref(row: &EntityRef, color: bool) -> Self {
        let host = match (row.field_str("host"), row.extra.get("port")) {
            (Some(host), Some(port)) if !port.is_null() => format!("{host}:{}", scalar(port)),
            (Some(host), _) => host.to_owned(),
            (None, _) => String::new(),
        };
        let status = row
            .extra
            .get("status")
            .or_else(|| row.extra.get("is_active"))
            .map(scalar)
            .unwrap_or_default();
        Self {
            id: row.id.get(),
            name: row.name.clone(),
            db_type: row.field_str("db_type").unwrap_or_default().to_owned(),
            host,
            status: output::paint_status(&status, color),
        }
    }
}

/// Render a scalar column without JSON quoting.
fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "active".into(),
        Value::Bool(false) => "inactive".into(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Filter set for the grid query. Unset flags are left out.
fn filters_from(args: &InstancesArgs) -> Filters {
    [
        ("search", &args.search),
        ("db_type", &args.db_type),
        ("status", &args.status),
    ]
    .into_iter()
    .filter_map(|(key, value)| {
        value
            .as_ref()
            .map(|v| (key.to_owned(), FilterValue::from(v.as_str())))
    })
    .collect()
}

pub async fn handle(
    store: &InstanceStore,
    ctx: &Context,
    args: InstancesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let actions = store.actions();
    actions.apply_filters(filters_from(&args))?;

    let snapshot = {
        let _spinner = Spinner::attach(store, global.quiet);
        actions.load_instances().await.map_err(|e| ctx.explain(e))?
    };

    let color = output::should_color(global.color);
    let out = output::render_list(
        global.output,
        &snapshot.instances,
        |row| InstanceRow::from_ref(row, color),
        |row| row.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
