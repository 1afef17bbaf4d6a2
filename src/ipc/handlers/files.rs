use serde_json::json;

use crate::api::CrudApi;
use crate::ipc::error::{api_err, err, ok};
use crate::ipc::helpers::{list_payload, param_id, param_str, parse_data};
use crate::ipc::types::{AppState, Request};
use crate::model::FileDraft;

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    ws.files.ensure_loaded();
    ok(
        &req.id,
        list_payload("files", ws.files.items(), ws.files.state(), ws.files.error()),
    )
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(id) = param_id(req, "id") else {
        return err(&req.id, "bad_params", "missing id", None);
    };
    match ws.files.api().get(id) {
        Ok(Some(file)) => ok(&req.id, json!({ "file": file })),
        Ok(None) => err(&req.id, "not_found", format!("file {id} not found"), None),
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_upload(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let draft: FileDraft = match parse_data(req) {
        Ok(d) => d,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    ws.files.ensure_loaded();
    match ws.files.create(&draft) {
        Ok(file) => ok(&req.id, json!({ "file": file })),
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
    let draft: FileDraft = match parse_data(req) {
        Ok(d) => d,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    ws.files.ensure_loaded();
    match ws.files.update(id, &draft) {
        Ok(file) => ok(&req.id, json!({ "file": file })),
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
    ws.files.ensure_loaded();
    match ws.files.delete(id) {
        Ok(deleted) => ok(&req.id, json!({ "deleted": deleted })),
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_by_entity(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(entity_type) = param_str(req, "entityType") else {
        return err(&req.id, "bad_params", "missing entityType", None);
    };
    let Some(entity_id) = param_id(req, "entityId") else {
        return err(&req.id, "bad_params", "missing entityId", None);
    };
    match ws.files.api().get_by_entity(&entity_type, entity_id) {
        Ok(files) => ok(&req.id, json!({ "files": files })),
        Err(e) => api_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "files.list" => Some(handle_list(state, req)),
        "files.get" => Some(handle_get(state, req)),
        "files.upload" => Some(handle_upload(state, req)),
        "files.update" => Some(handle_update(state, req)),
        "files.delete" => Some(handle_delete(state, req)),
        "files.byEntity" => Some(handle_by_entity(state, req)),
        _ => None,
    }
}
