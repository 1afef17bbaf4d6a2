use serde_json::json;

use crate::api::CrudApi;
use crate::ipc::error::{api_err, err, ok};
use crate::ipc::helpers::{list_payload, param_id, param_str, parse_data};
use crate::ipc::types::{AppState, Request};
use crate::model::{ActivityDraft, ActivityFilters};

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    ws.activities.ensure_loaded();
    ok(
        &req.id,
        list_payload(
            "activities",
            ws.activities.items(),
            ws.activities.state(),
            ws.activities.error(),
        ),
    )
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(id) = param_id(req, "id") else {
        return err(&req.id, "bad_params", "missing id", None);
    };
    match ws.activities.api().get(id) {
        Ok(Some(mut activity)) => {
            // Attach the polymorphic file back-references on single reads.
            if let Ok(files) = ws.files.api().get_by_entity("curriculum_activity", id) {
                activity.attached_files = files;
            }
            ok(&req.id, json!({ "activity": activity }))
        }
        Ok(None) => err(
            &req.id,
            "not_found",
            format!("curriculum activity {id} not found"),
            None,
        ),
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let draft: ActivityDraft = match parse_data(req) {
        Ok(d) => d,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    ws.activities.ensure_loaded();
    match ws.activities.create(&draft) {
        Ok(activity) => ok(&req.id, json!({ "activity": activity })),
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(id) = param_id(req, "id") else {
        return err(&req.id, "bad_params", "missing id", None);
    };
    let draft: ActivityDraft = match parse_data(req) {
        Ok(d) => d,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    ws.activities.ensure_loaded();
    match ws.activities.update(id, &draft) {
        Ok(activity) => ok(&req.id, json!({ "activity": activity })),
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(id) = param_id(req, "id") else {
        return err(&req.id, "bad_params", "missing id", None);
    };
    ws.activities.ensure_loaded();
    match ws.activities.delete(id) {
        Ok(deleted) => ok(&req.id, json!({ "deleted": deleted })),
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_search(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let query = param_str(req, "query").unwrap_or_default();
    let filters: ActivityFilters = req
        .params
        .get("filters")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .unwrap_or_default()
        .unwrap_or_default();

    let _ = ws
        .activities
        .load_with(|api| api.search(&query, &filters));
    ok(
        &req.id,
        list_payload(
            "activities",
            ws.activities.items(),
            ws.activities.state(),
            ws.activities.error(),
        ),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "curriculum.list" => Some(handle_list(state, req)),
        "curriculum.get" => Some(handle_get(state, req)),
        "curriculum.create" => Some(handle_create(state, req)),
        "curriculum.update" => Some(handle_update(state, req)),
        "curriculum.delete" => Some(handle_delete(state, req)),
        "curriculum.search" => Some(handle_search(state, req)),
        _ => None,
    }
}
