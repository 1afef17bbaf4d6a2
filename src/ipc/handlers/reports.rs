use chrono::{SecondsFormat, Utc};
use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::param_str;
use crate::ipc::types::{AppState, Request};
use crate::reports;
use crate::settings;

fn handle_overview(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    ws.students.ensure_loaded();
    ws.courses.ensure_loaded();
    ws.grades.ensure_loaded();

    let scale = match settings::load_grade_scale(&ws.db) {
        Ok(scale) => scale,
        Err(e) => return err(&req.id, "settings_failed", e.to_string(), None),
    };
    let report = reports::overview(
        ws.students.items(),
        ws.courses.items(),
        ws.grades.items(),
        &scale,
    );
    ok(&req.id, json!({ "report": report }))
}

fn handle_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(kind) = param_str(req, "type") else {
        return err(&req.id, "bad_params", "missing type", None);
    };

    match kind.as_str() {
        "students" => {
            ws.students.ensure_loaded();
            ok(
                &req.id,
                json!({
                    "filename": "students_export.csv",
                    "content": reports::students_csv(ws.students.items()),
                }),
            )
        }
        "summary" => {
            ws.students.ensure_loaded();
            ws.courses.ensure_loaded();
            ws.grades.ensure_loaded();

            let scale = match settings::load_grade_scale(&ws.db) {
                Ok(scale) => scale,
                Err(e) => return err(&req.id, "settings_failed", e.to_string(), None),
            };
            let app_settings = match settings::load_settings(&ws.db) {
                Ok(s) => s,
                Err(e) => return err(&req.id, "settings_failed", e.to_string(), None),
            };
            let report = reports::overview(
                ws.students.items(),
                ws.courses.items(),
                ws.grades.items(),
                &scale,
            );
            let generated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
            ok(
                &req.id,
                json!({
                    "filename": "summary_report.txt",
                    "content": reports::summary_text(
                        &report,
                        &app_settings.school_name,
                        &generated_at,
                    ),
                }),
            )
        }
        other => err(
            &req.id,
            "bad_params",
            format!("unknown export type: {other}"),
            None,
        ),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.overview" => Some(handle_overview(state, req)),
        "reports.export" => Some(handle_export(state, req)),
        _ => None,
    }
}
