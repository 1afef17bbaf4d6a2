use serde_json::json;

use crate::api::CrudApi;
use crate::ipc::error::{api_err, err, ok};
use crate::ipc::helpers::{list_payload, param_id, param_str, parse_data};
use crate::ipc::types::{AppState, Request};
use crate::model::StudentDraft;

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    ws.students.ensure_loaded();
    ok(
        &req.id,
        list_payload(
            "students",
            ws.students.items(),
            ws.students.state(),
            ws.students.error(),
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
    match ws.students.api().get(id) {
        Ok(Some(student)) => ok(&req.id, json!({ "student": student })),
        Ok(None) => err(&req.id, "not_found", format!("student {id} not found"), None),
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let draft: StudentDraft = match parse_data(req) {
        Ok(d) => d,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    ws.students.ensure_loaded();
    match ws.students.create(&draft) {
        Ok(student) => ok(&req.id, json!({ "student": student })),
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
    let draft: StudentDraft = match parse_data(req) {
        Ok(d) => d,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    ws.students.ensure_loaded();
    match ws.students.update(id, &draft) {
        Ok(student) => ok(&req.id, json!({ "student": student })),
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
    ws.students.ensure_loaded();
    match ws.students.delete(id) {
        Ok(deleted) => ok(&req.id, json!({ "deleted": deleted })),
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_search(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let query = param_str(req, "query").unwrap_or_default();
    // Load failure lands in the store's state pair, same as the original
    // hook; the envelope stays ok.
    let _ = ws.students.load_with(|api| api.search(&query));
    ok(
        &req.id,
        list_payload(
            "students",
            ws.students.items(),
            ws.students.state(),
            ws.students.error(),
        ),
    )
}

fn handle_filter_by_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let status = param_str(req, "status").unwrap_or_default();
    let _ = ws.students.load_with(|api| api.filter_by_status(&status));
    ok(
        &req.id,
        list_payload(
            "students",
            ws.students.items(),
            ws.students.state(),
            ws.students.error(),
        ),
    )
}

fn handle_filter_by_grade_level(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let level = param_str(req, "gradeLevel").unwrap_or_default();
    let _ = ws.students.load_with(|api| api.filter_by_grade_level(&level));
    ok(
        &req.id,
        list_payload(
            "students",
            ws.students.items(),
            ws.students.state(),
            ws.students.error(),
        ),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_list(state, req)),
        "students.get" => Some(handle_get(state, req)),
        "students.create" => Some(handle_create(state, req)),
        "students.update" => Some(handle_update(state, req)),
        "students.delete" => Some(handle_delete(state, req)),
        "students.search" => Some(handle_search(state, req)),
        "students.filterByStatus" => Some(handle_filter_by_status(state, req)),
        "students.filterByGradeLevel" => Some(handle_filter_by_grade_level(state, req)),
        _ => None,
    }
}
