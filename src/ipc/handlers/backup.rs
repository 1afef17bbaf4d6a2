use std::path::PathBuf;

use serde_json::json;

use crate::backup;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::param_str;
use crate::ipc::types::{AppState, Request, Workspace};

fn handle_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(out_path) = param_str(req, "outPath").map(PathBuf::from) else {
        return err(&req.id, "bad_params", "missing outPath", None);
    };

    match backup::export_workspace_bundle(&ws.path, &out_path) {
        Ok(summary) => ok(
            &req.id,
            json!({
                "bundleFormat": summary.bundle_format,
                "entryCount": summary.entry_count,
                "dbSha256": summary.db_sha256,
                "outPath": out_path.to_string_lossy(),
            }),
        ),
        Err(e) => err(&req.id, "backup_export_failed", e.to_string(), None),
    }
}

fn handle_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(in_path) = param_str(req, "inPath").map(PathBuf::from) else {
        return err(&req.id, "bad_params", "missing inPath", None);
    };
    let Some(workspace_path) = param_str(req, "workspacePath").map(PathBuf::from) else {
        return err(&req.id, "bad_params", "missing workspacePath", None);
    };

    // Swapping the database file under an open connection is not safe;
    // close the workspace first if it is the import target.
    if state
        .workspace
        .as_ref()
        .map(|w| w.path == workspace_path)
        .unwrap_or(false)
    {
        state.workspace = None;
    }

    let summary = match backup::import_workspace_bundle(&in_path, &workspace_path) {
        Ok(summary) => summary,
        Err(e) => return err(&req.id, "backup_import_failed", e.to_string(), None),
    };

    match Workspace::open(workspace_path.clone(), &state.config) {
        Ok(ws) => {
            state.workspace = Some(ws);
            ok(
                &req.id,
                json!({
                    "bundleFormatDetected": summary.bundle_format_detected,
                    "workspacePath": workspace_path.to_string_lossy(),
                }),
            )
        }
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.export" => Some(handle_export(state, req)),
        "backup.import" => Some(handle_import(state, req)),
        _ => None,
    }
}
