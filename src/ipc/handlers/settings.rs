use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::notify::Notifier;
use crate::settings::{self, AppSettings, GradeScale};

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let app_settings = match settings::load_settings(&ws.db) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "settings_failed", e.to_string(), None),
    };
    let scale = match settings::load_grade_scale(&ws.db) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "settings_failed", e.to_string(), None),
    };
    ok(
        &req.id,
        json!({ "settings": app_settings, "gradeScale": scale }),
    )
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let mut app_settings: Option<AppSettings> = None;
    if let Some(raw) = req.params.get("settings") {
        match serde_json::from_value::<AppSettings>(raw.clone()) {
            Ok(s) => app_settings = Some(s),
            Err(e) => return err(&req.id, "bad_params", format!("invalid settings: {e}"), None),
        }
    }
    let mut scale: Option<GradeScale> = None;
    if let Some(raw) = req.params.get("gradeScale") {
        match serde_json::from_value::<GradeScale>(raw.clone()) {
            Ok(s) => scale = Some(s),
            Err(e) => {
                return err(
                    &req.id,
                    "bad_params",
                    format!("invalid gradeScale: {e}"),
                    None,
                )
            }
        }
    }
    if app_settings.is_none() && scale.is_none() {
        return err(&req.id, "bad_params", "nothing to update", None);
    }

    if let Some(s) = &app_settings {
        if let Err(e) = settings::save_settings(&ws.db, s) {
            return err(&req.id, "settings_failed", e.to_string(), None);
        }
        ws.ctx.set_welcome_email_enabled(s.email_notifications);
    }
    if let Some(s) = &scale {
        if let Err(e) = settings::save_grade_scale(&ws.db, s) {
            return err(&req.id, "settings_failed", e.to_string(), None);
        }
    }

    ws.notices.success("Settings saved successfully");
    handle_get(state, req)
}

fn handle_reset(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let defaults = AppSettings::default();
    if let Err(e) = settings::save_settings(&ws.db, &defaults) {
        return err(&req.id, "settings_failed", e.to_string(), None);
    }
    if let Err(e) = settings::save_grade_scale(&ws.db, &GradeScale::default()) {
        return err(&req.id, "settings_failed", e.to_string(), None);
    }
    ws.ctx.set_welcome_email_enabled(defaults.email_notifications);

    ws.notices.success("Settings reset to defaults");
    handle_get(state, req)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "settings.get" => Some(handle_get(state, req)),
        "settings.update" => Some(handle_update(state, req)),
        "settings.reset" => Some(handle_reset(state, req)),
        _ => None,
    }
}
