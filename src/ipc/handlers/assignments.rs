use serde_json::json;

use crate::api::CrudApi;
use crate::ipc::error::{api_err, err, ok};
use crate::ipc::helpers::{list_payload, param_id, param_str, parse_data};
use crate::ipc::types::{AppState, Request};
use crate::model::AssignmentDraft;

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    ws.assignments.ensure_loaded();
    ok(
        &req.id,
        list_payload(
            "assignments",
            ws.assignments.items(),
            ws.assignments.state(),
            ws.assignments.error(),
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
    match ws.assignments.api().get(id) {
        Ok(Some(assignment)) => ok(&req.id, json!({ "assignment": assignment })),
        Ok(None) => err(
            &req.id,
            "not_found",
            format!("assignment {id} not found"),
            None,
        ),
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let draft: AssignmentDraft = match parse_data(req) {
        Ok(d) => d,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    ws.assignments.ensure_loaded();
    match ws.assignments.create(&draft) {
        Ok(assignment) => ok(&req.id, json!({ "assignment": assignment })),
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
    let draft: AssignmentDraft = match parse_data(req) {
        Ok(d) => d,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    ws.assignments.ensure_loaded();
    match ws.assignments.update(id, &draft) {
        Ok(assignment) => ok(&req.id, json!({ "assignment": assignment })),
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
    ws.assignments.ensure_loaded();
    match ws.assignments.delete(id) {
        Ok(deleted) => ok(&req.id, json!({ "deleted": deleted })),
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_by_course(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(course_id) = param_id(req, "courseId") else {
        return err(&req.id, "bad_params", "missing courseId", None);
    };
    match ws.assignments.api().get_by_course(course_id) {
        Ok(assignments) => ok(&req.id, json!({ "assignments": assignments })),
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_by_type(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let kind = param_str(req, "type").unwrap_or_default();
    match ws.assignments.api().get_by_type(&kind) {
        Ok(assignments) => ok(&req.id, json!({ "assignments": assignments })),
        Err(e) => api_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "assignments.list" => Some(handle_list(state, req)),
        "assignments.get" => Some(handle_get(state, req)),
        "assignments.create" => Some(handle_create(state, req)),
        "assignments.update" => Some(handle_update(state, req)),
        "assignments.delete" => Some(handle_delete(state, req)),
        "assignments.byCourse" => Some(handle_by_course(state, req)),
        "assignments.byType" => Some(handle_by_type(state, req)),
        _ => None,
    }
}
