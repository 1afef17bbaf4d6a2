use std::rc::Rc;

use serde_json::json;

use crate::map::{self, ASSIGNMENT_FIELDS};
use crate::model::{Assignment, AssignmentDraft};
use crate::platform::{tables, Condition, QueryParams};

use super::{
    fetch_mapped, first_success, report_api_error, transport_err, ApiContext, ApiError, CrudApi,
};

pub struct AssignmentsApi {
    ctx: Rc<ApiContext>,
}

impl AssignmentsApi {
    pub fn new(ctx: Rc<ApiContext>) -> Self {
        Self { ctx }
    }

    fn query(&self) -> QueryParams {
        QueryParams::with_fields(ASSIGNMENT_FIELDS)
    }

    pub fn get_by_course(&self, course_id: i64) -> Result<Vec<Assignment>, ApiError> {
        let query = self
            .query()
            .and_where(Condition::equal_to("course_id_c", json!(course_id)));
        fetch_mapped(
            &self.ctx,
            tables::ASSIGNMENTS,
            &query,
            "assignments",
            map::assignment_from_record,
        )
    }

    pub fn get_by_type(&self, kind: &str) -> Result<Vec<Assignment>, ApiError> {
        if kind.is_empty() {
            return self.list();
        }
        let query = self
            .query()
            .and_where(Condition::equal_to("type_c", json!(kind)));
        fetch_mapped(
            &self.ctx,
            tables::ASSIGNMENTS,
            &query,
            "assignments",
            map::assignment_from_record,
        )
    }
}

impl CrudApi for AssignmentsApi {
    type Item = Assignment;
    type Draft = AssignmentDraft;

    fn list(&self) -> Result<Vec<Assignment>, ApiError> {
        fetch_mapped(
            &self.ctx,
            tables::ASSIGNMENTS,
            &self.query(),
            "assignments",
            map::assignment_from_record,
        )
    }

    fn get(&self, id: i64) -> Result<Option<Assignment>, ApiError> {
        match self
            .ctx
            .records
            .get_record_by_id(tables::ASSIGNMENTS, id, &[])
        {
            Err(e) => Err(transport_err(&self.ctx, "fetch assignment", e)),
            Ok(rec) => Ok(rec.map(|r| map::assignment_from_record(&r))),
        }
    }

    fn create(&self, draft: &AssignmentDraft) -> Result<Assignment, ApiError> {
        let batch = self
            .ctx
            .records
            .create_records(tables::ASSIGNMENTS, vec![map::assignment_to_record(draft)])
            .map_err(|e| transport_err(&self.ctx, "create assignment", e))?;
        let rec = first_success(batch).map_err(|e| {
            report_api_error(&self.ctx, "create assignment", &e);
            e
        })?;
        Ok(map::assignment_from_record(&rec))
    }

    fn update(&self, id: i64, draft: &AssignmentDraft) -> Result<Assignment, ApiError> {
        let mut payload = map::assignment_to_record(draft);
        payload["Id"] = json!(id);
        let batch = self
            .ctx
            .records
            .update_records(tables::ASSIGNMENTS, vec![payload])
            .map_err(|e| transport_err(&self.ctx, "update assignment", e))?;
        let rec = first_success(batch).map_err(|e| {
            report_api_error(&self.ctx, "update assignment", &e);
            e
        })?;
        Ok(map::assignment_from_record(&rec))
    }

    fn delete(&self, id: i64) -> Result<bool, ApiError> {
        let resp = self
            .ctx
            .records
            .delete_records(tables::ASSIGNMENTS, &[id])
            .map_err(|e| transport_err(&self.ctx, "delete assignment", e))?;
        if !resp.success {
            self.ctx.notifier.error("Failed to delete assignment");
            return Err(ApiError::Transport("delete rejected".into()));
        }
        let ok = resp.results.first().map(|r| r.success).unwrap_or(false);
        if !ok {
            if let Some(message) = resp.results.first().and_then(|r| r.message.as_deref()) {
                self.ctx.notifier.error(message);
            }
        }
        Ok(ok)
    }
}
