use std::rc::Rc;

use serde_json::json;

use crate::map::{self, GRADE_FIELDS};
use crate::model::{Grade, GradeDraft, GradeStatus};
use crate::platform::{tables, Condition, QueryParams};

use super::{
    fetch_mapped, first_success, report_api_error, transport_err, ApiContext, ApiError, CrudApi,
};

pub struct GradesApi {
    ctx: Rc<ApiContext>,
}

impl GradesApi {
    pub fn new(ctx: Rc<ApiContext>) -> Self {
        Self { ctx }
    }

    fn query(&self) -> QueryParams {
        QueryParams::with_fields(GRADE_FIELDS)
    }

    pub fn get_by_student(&self, student_id: i64) -> Result<Vec<Grade>, ApiError> {
        let query = self
            .query()
            .and_where(Condition::equal_to("student_id_c", json!(student_id)));
        fetch_mapped(
            &self.ctx,
            tables::GRADES,
            &query,
            "grades",
            map::grade_from_record,
        )
    }

    pub fn get_by_assignment(&self, assignment_id: i64) -> Result<Vec<Grade>, ApiError> {
        let query = self
            .query()
            .and_where(Condition::equal_to("assignment_id_c", json!(assignment_id)));
        fetch_mapped(
            &self.ctx,
            tables::GRADES,
            &query,
            "grades",
            map::grade_from_record,
        )
    }

    pub fn get_by_status(&self, status: &str) -> Result<Vec<Grade>, ApiError> {
        if status.is_empty() {
            return self.list();
        }
        let query = self
            .query()
            .and_where(Condition::equal_to("status_c", json!(status)));
        fetch_mapped(
            &self.ctx,
            tables::GRADES,
            &query,
            "grades",
            map::grade_from_record,
        )
    }
}

impl CrudApi for GradesApi {
    type Item = Grade;
    type Draft = GradeDraft;

    fn list(&self) -> Result<Vec<Grade>, ApiError> {
        fetch_mapped(
            &self.ctx,
            tables::GRADES,
            &self.query(),
            "grades",
            map::grade_from_record,
        )
    }

    fn get(&self, id: i64) -> Result<Option<Grade>, ApiError> {
        match self.ctx.records.get_record_by_id(tables::GRADES, id, &[]) {
            Err(e) => Err(transport_err(&self.ctx, "fetch grade", e)),
            Ok(rec) => Ok(rec.map(|r| map::grade_from_record(&r))),
        }
    }

    fn create(&self, draft: &GradeDraft) -> Result<Grade, ApiError> {
        let mut draft = draft.clone();
        if draft.status.is_none() {
            draft.status = Some(GradeStatus::Pending);
        }
        let batch = self
            .ctx
            .records
            .create_records(tables::GRADES, vec![map::grade_to_record(&draft)])
            .map_err(|e| transport_err(&self.ctx, "create grade", e))?;
        let rec = first_success(batch).map_err(|e| {
            report_api_error(&self.ctx, "create grade", &e);
            e
        })?;
        Ok(map::grade_from_record(&rec))
    }

    fn update(&self, id: i64, draft: &GradeDraft) -> Result<Grade, ApiError> {
        let mut payload = map::grade_to_record(draft);
        payload["Id"] = json!(id);
        let batch = self
            .ctx
            .records
            .update_records(tables::GRADES, vec![payload])
            .map_err(|e| transport_err(&self.ctx, "update grade", e))?;
        let rec = first_success(batch).map_err(|e| {
            report_api_error(&self.ctx, "update grade", &e);
            e
        })?;
        Ok(map::grade_from_record(&rec))
    }

    fn delete(&self, id: i64) -> Result<bool, ApiError> {
        let resp = self
            .ctx
            .records
            .delete_records(tables::GRADES, &[id])
            .map_err(|e| transport_err(&self.ctx, "delete grade", e))?;
        if !resp.success {
            self.ctx.notifier.error("Failed to delete grade");
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
