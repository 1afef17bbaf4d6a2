//! Entity API modules: one per backend table, each owning its field list
//! and translating operations into exactly one platform call (the
//! enrollment read-modify-write being the documented exception).
//!
//! Everything here is constructed over an injected [`ApiContext`], so the
//! daemon wires the workspace-local platform and tests wire fakes.

pub mod activities;
pub mod assignments;
pub mod courses;
pub mod files;
pub mod grades;
pub mod students;

use std::cell::Cell;
use std::rc::Rc;

use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::model::HasId;
use crate::notify::Notifier;
use crate::outbox::Outbox;
use crate::platform::{BatchResponse, FieldError, QueryParams, Record, RecordService};

pub use activities::ActivitiesApi;
pub use assignments::AssignmentsApi;
pub use courses::CoursesApi;
pub use files::FilesApi;
pub use grades::GradesApi;
pub use students::StudentsApi;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("platform request failed: {0}")]
    Transport(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("record rejected: {message}")]
    Rejected {
        message: String,
        fields: Vec<FieldError>,
    },
    #[error("concurrent update detected for {entity} {id}")]
    Conflict { entity: &'static str, id: i64 },
}

impl ApiError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport_failed",
            Self::NotFound { .. } => "not_found",
            Self::Rejected { .. } => "record_rejected",
            Self::Conflict { .. } => "version_conflict",
        }
    }
}

pub struct ApiContext {
    pub records: Rc<dyn RecordService>,
    pub notifier: Rc<dyn Notifier>,
    pub outbox: Rc<Outbox>,
    /// Mirrors the email-notifications setting; gates welcome emails.
    welcome_email_enabled: Cell<bool>,
}

impl ApiContext {
    pub fn new(records: Rc<dyn RecordService>, notifier: Rc<dyn Notifier>, outbox: Rc<Outbox>) -> Self {
        Self {
            records,
            notifier,
            outbox,
            welcome_email_enabled: Cell::new(true),
        }
    }

    pub fn set_welcome_email_enabled(&self, enabled: bool) {
        self.welcome_email_enabled.set(enabled);
    }

    pub fn welcome_email_enabled(&self) -> bool {
        self.welcome_email_enabled.get()
    }
}

/// Uniform CRUD surface the resource stores bind to.
pub trait CrudApi {
    type Item: HasId + Clone;
    type Draft;

    fn list(&self) -> Result<Vec<Self::Item>, ApiError>;
    fn get(&self, id: i64) -> Result<Option<Self::Item>, ApiError>;
    fn create(&self, draft: &Self::Draft) -> Result<Self::Item, ApiError>;
    fn update(&self, id: i64, draft: &Self::Draft) -> Result<Self::Item, ApiError>;
    fn delete(&self, id: i64) -> Result<bool, ApiError>;
}

pub(crate) fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Run a fetch and map each row; transport and platform-level failures both
/// surface as `Transport`, with the fixed fetch message on the side channel.
pub(crate) fn fetch_mapped<T>(
    ctx: &ApiContext,
    table: &str,
    query: &QueryParams,
    noun: &str,
    map_row: impl Fn(&Record) -> T,
) -> Result<Vec<T>, ApiError> {
    match ctx.records.fetch_records(table, query) {
        Err(e) => {
            tracing::error!(table, error = %e, "fetch failed");
            ctx.notifier.error(&format!("Failed to fetch {noun}"));
            Err(ApiError::Transport(e.to_string()))
        }
        Ok(resp) if !resp.success => {
            let message = resp
                .message
                .unwrap_or_else(|| format!("Failed to fetch {noun}"));
            tracing::error!(table, message = %message, "fetch rejected");
            ctx.notifier.error(&message);
            Err(ApiError::Transport(message))
        }
        Ok(resp) => Ok(resp.data.iter().map(map_row).collect()),
    }
}

/// Pull the first successful record out of a batch response without
/// touching the side channel. Use `report_api_error` when the outcome is
/// final; the enrollment retry loop stays quiet between attempts.
pub(crate) fn first_success(batch: BatchResponse) -> Result<Record, ApiError> {
    if !batch.success {
        return Err(ApiError::Transport(
            batch.message.unwrap_or_else(|| "batch rejected".into()),
        ));
    }

    let mut fields: Vec<FieldError> = Vec::new();
    let mut message: Option<String> = None;
    for result in &batch.results {
        if !result.success {
            fields.extend(result.errors.iter().cloned());
            if message.is_none() {
                message = result.message.clone();
            }
        }
    }

    batch
        .results
        .into_iter()
        .find(|r| r.success)
        .and_then(|r| r.data)
        .and_then(|data| match data {
            Value::Object(rec) => Some(rec),
            _ => None,
        })
        .ok_or(ApiError::Rejected {
            message: message.unwrap_or_else(|| "no record succeeded".into()),
            fields,
        })
}

/// Push an operation's terminal failure onto the side channel, field-level
/// messages included.
pub(crate) fn report_api_error(ctx: &ApiContext, action: &str, err: &ApiError) {
    match err {
        ApiError::Rejected { message, fields } => {
            for field in fields {
                ctx.notifier
                    .error(&format!("{}: {}", field.field_label, field.message_text));
            }
            if fields.is_empty() {
                ctx.notifier.error(message);
            }
        }
        _ => ctx.notifier.error(&format!("Failed to {action}")),
    }
}

pub(crate) fn is_version_conflict(err: &ApiError) -> bool {
    match err {
        ApiError::Rejected { fields, .. } => {
            fields.iter().any(|f| f.field_label == "version_c")
        }
        _ => false,
    }
}

/// Shared transport-failure path for mutations.
pub(crate) fn transport_err(
    ctx: &ApiContext,
    action: &str,
    e: anyhow::Error,
) -> ApiError {
    tracing::error!(error = %e, action, "platform call failed");
    ctx.notifier.error(&format!("Failed to {action}"));
    ApiError::Transport(e.to_string())
}
