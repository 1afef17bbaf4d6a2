use serde_json::json;

use crate::api::CrudApi;
use crate::ipc::error::{api_err, err, ok};
use crate::ipc::helpers::{list_payload, param_id, param_str, parse_data};
use crate::ipc::types::{AppState, Request};
use crate::model::GradeDraft;

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    ws.grades.ensure_loaded();
    ok(
        &req.id,
        list_payload(
            "grades",
            ws.grades.items(),
            ws.grades.state(),
            ws.grades.error(),
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
    match ws.grades.api().get(id) {
        Ok(Some(grade)) => ok(&req.id, json!({ "grade": grade })),
        Ok(None) => err(&req.id, "not_found", format!("grade {id} not found"), None),
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let draft: GradeDraft = match parse_data(req) {
        Ok(d) => d,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    ws.grades.ensure_loaded();
    match ws.grades.create(&draft) {
        Ok(grade) => ok(&req.id, json!({ "grade": grade })),
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
    let draft: GradeDraft = match parse_data(req) {
        Ok(d) => d,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    ws.grades.ensure_loaded();
    match ws.grades.update(id, &draft) {
        Ok(grade) => ok(&req.id, json!({ "grade": grade })),
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
    ws.grades.ensure_loaded();
    match ws.grades.delete(id) {
        Ok(deleted) => ok(&req.id, json!({ "deleted": deleted })),
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_by_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(student_id) = param_id(req, "studentId") else {
        return err(&req.id, "bad_params", "missing studentId", None);
    };
    match ws.grades.api().get_by_student(student_id) {
        Ok(grades) => ok(&req.id, json!({ "grades": grades })),
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_by_assignment(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(assignment_id) = param_id(req, "assignmentId") else {
        return err(&req.id, "bad_params", "missing assignmentId", None);
    };
    match ws.grades.api().get_by_assignment(assignment_id) {
        Ok(grades) => ok(&req.id, json!({ "grades": grades })),
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_by_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let status = param_str(req, "status").unwrap_or_default();
    match ws.grades.api().get_by_status(&status) {
        Ok(grades) => ok(&req.id, json!({ "grades": grades })),
        Err(e) => api_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.list" => Some(handle_list(state, req)),
        "grades.get" => Some(handle_get(state, req)),
        "grades.create" => Some(handle_create(state, req)),
        "grades.update" => Some(handle_update(state, req)),
        "grades.delete" => Some(handle_delete(state, req)),
        "grades.byStudent" => Some(handle_by_student(state, req)),
        "grades.byAssignment" => Some(handle_by_assignment(state, req)),
        "grades.byStatus" => Some(handle_by_status(state, req)),
        _ => None,
    }
}
