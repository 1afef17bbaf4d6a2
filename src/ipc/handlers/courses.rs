use serde_json::json;

use crate::api::CrudApi;
use crate::ipc::error::{api_err, err, ok};
use crate::ipc::helpers::{list_payload, param_id, parse_data};
use crate::ipc::types::{AppState, Request};
use crate::model::CourseDraft;

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    ws.courses.ensure_loaded();
    ok(
        &req.id,
        list_payload(
            "courses",
            ws.courses.items(),
            ws.courses.state(),
            ws.courses.error(),
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
    match ws.courses.api().get(id) {
        Ok(Some(course)) => ok(&req.id, json!({ "course": course })),
        Ok(None) => err(&req.id, "not_found", format!("course {id} not found"), None),
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let draft: CourseDraft = match parse_data(req) {
        Ok(d) => d,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    ws.courses.ensure_loaded();
    match ws.courses.create(&draft) {
        Ok(course) => ok(&req.id, json!({ "course": course })),
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
    let draft: CourseDraft = match parse_data(req) {
        Ok(d) => d,
        Err(msg) => return err(&req.id, "bad_params", msg, None),
    };
    ws.courses.ensure_loaded();
    match ws.courses.update(id, &draft) {
        Ok(course) => ok(&req.id, json!({ "course": course })),
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
    ws.courses.ensure_loaded();
    match ws.courses.delete(id) {
        Ok(deleted) => ok(&req.id, json!({ "deleted": deleted })),
        Err(e) => api_err(&req.id, &e),
    }
}

fn handle_membership(state: &mut AppState, req: &Request, add: bool) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let (Some(course_id), Some(student_id)) = (param_id(req, "courseId"), param_id(req, "studentId"))
    else {
        return err(&req.id, "bad_params", "missing courseId or studentId", None);
    };
    ws.courses.ensure_loaded();

    let result = if add {
        ws.courses.api().enroll_student(course_id, student_id)
    } else {
        ws.courses.api().remove_student(course_id, student_id)
    };
    match result {
        Ok(course) => {
            ws.courses.replace(course.clone());
            ok(&req.id, json!({ "course": course }))
        }
        Err(e) => api_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "courses.list" => Some(handle_list(state, req)),
        "courses.get" => Some(handle_get(state, req)),
        "courses.create" => Some(handle_create(state, req)),
        "courses.update" => Some(handle_update(state, req)),
        "courses.delete" => Some(handle_delete(state, req)),
        "courses.enroll" => Some(handle_membership(state, req, true)),
        "courses.removeStudent" => Some(handle_membership(state, req, false)),
        _ => None,
    }
}
