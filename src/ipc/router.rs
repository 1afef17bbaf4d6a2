use serde_json::json;

use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::err;

pub fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    let mut resp = dispatch(state, &req);

    // Side effects ride behind the request that produced them; their
    // failures become notices, never envelope errors.
    if let Some(ws) = state.workspace.as_ref() {
        if let Err(e) = ws.outbox.process_pending() {
            tracing::warn!(error = %e, "outbox processing failed");
        }
        let notices = ws.notices.drain();
        if !notices.is_empty() && resp.is_object() {
            resp["notices"] = json!(notices);
        }
    }

    resp
}

fn dispatch(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Some(resp) = handlers::core::try_handle(state, req) {
        return resp;
    }
    if let Some(resp) = handlers::students::try_handle(state, req) {
        return resp;
    }
    if let Some(resp) = handlers::courses::try_handle(state, req) {
        return resp;
    }
    if let Some(resp) = handlers::assignments::try_handle(state, req) {
        return resp;
    }
    if let Some(resp) = handlers::grades::try_handle(state, req) {
        return resp;
    }
    if let Some(resp) = handlers::activities::try_handle(state, req) {
        return resp;
    }
    if let Some(resp) = handlers::files::try_handle(state, req) {
        return resp;
    }
    if let Some(resp) = handlers::reports::try_handle(state, req) {
        return resp;
    }
    if let Some(resp) = handlers::settings::try_handle(state, req) {
        return resp;
    }
    if let Some(resp) = handlers::backup::try_handle(state, req) {
        return resp;
    }

    err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    )
}
