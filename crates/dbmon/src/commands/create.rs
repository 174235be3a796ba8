//! `dbmon create`: bulk import from a CSV or spreadsheet.

use std::fmt::Write as _;
use std::path::Path;

use dbmon_core::{InstanceStore, UploadPayload, UploadResult};

use crate::cli::{CreateArgs, GlobalOpts};
use crate::config::Context;
use crate::error::CliError;
use crate::output;
use crate::progress::Spinner;

/// MIME type for the file extensions the import endpoint accepts.
fn guess_content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "csv" => Some("text/csv"),
        "xlsx" => Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        "xls" => Some("application/vnd.ms-excel"),
        _ => None,
    }
}

pub async fn handle(
    store: &InstanceStore,
    ctx: &Context,
    args: CreateArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let content = tokio::fs::read(&args.file).await?;
    let file_name = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_owned();

    let mut payload = UploadPayload::new(file_name, content);
    if let Some(mime) = args
        .content_type
        .as_deref()
        .or_else(|| guess_content_type(&args.file))
    {
        payload = payload.with_content_type(mime);
    }

    let result = {
        let _spinner = Spinner::attach(store, global.quiet);
        store
            .actions()
            .batch_create_instances(payload)
            .await
            .map_err(|e| ctx.explain(e))?
    };

    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &result,
        |r| detail(r, color),
        |r| r.created_count.map(|n| n.to_string()).unwrap_or_default(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn detail(result: &UploadResult, color: bool) -> String {
    let mut out = result.message.clone();
    if !result.errors.is_empty() {
        let _ = write!(out, "\n{}", output::heading("Rejected rows", color));
        for error in &result.errors {
            let _ = write!(out, "\n  {error}");
        }
    }
    out
}
