use std::rc::Rc;

use serde_json::json;

use crate::map::{self, ACTIVITY_FIELDS};
use crate::model::{ActivityDraft, ActivityFilters, ActivityStatus, CurriculumActivity};
use crate::platform::{tables, Condition, QueryParams};

use super::{
    fetch_mapped, first_success, report_api_error, transport_err, ApiContext, ApiError, CrudApi,
};

pub struct ActivitiesApi {
    ctx: Rc<ApiContext>,
}

impl ActivitiesApi {
    pub fn new(ctx: Rc<ApiContext>) -> Self {
        Self { ctx }
    }

    fn query(&self) -> QueryParams {
        QueryParams::with_fields(ACTIVITY_FIELDS)
    }

    /// Text search over title/description/subject/instructor, narrowed by
    /// the dropdown filters (`all`/empty skips a dimension).
    pub fn search(
        &self,
        text: &str,
        filters: &ActivityFilters,
    ) -> Result<Vec<CurriculumActivity>, ApiError> {
        let mut query = self.query();

        if let Some(status) = ActivityFilters::wants(&filters.status) {
            query = query.and_where(Condition::equal_to("status_c", json!(status)));
        }
        if let Some(subject) = ActivityFilters::wants(&filters.subject) {
            query = query.and_where(Condition::equal_to("subject_c", json!(subject)));
        }
        if let Some(kind) = ActivityFilters::wants(&filters.kind) {
            query = query.and_where(Condition::equal_to("type_c", json!(kind)));
        }

        let needle = text.trim();
        if !needle.is_empty() {
            query = query.or_group(vec![
                Condition::contains("title_c", needle),
                Condition::contains("description_c", needle),
                Condition::contains("subject_c", needle),
                Condition::contains("instructor_c", needle),
            ]);
        }

        fetch_mapped(
            &self.ctx,
            tables::ACTIVITIES,
            &query,
            "curriculum activities",
            map::activity_from_record,
        )
    }
}

impl CrudApi for ActivitiesApi {
    type Item = CurriculumActivity;
    type Draft = ActivityDraft;

    fn list(&self) -> Result<Vec<CurriculumActivity>, ApiError> {
        fetch_mapped(
            &self.ctx,
            tables::ACTIVITIES,
            &self.query(),
            "curriculum activities",
            map::activity_from_record,
        )
    }

    fn get(&self, id: i64) -> Result<Option<CurriculumActivity>, ApiError> {
        match self.ctx.records.get_record_by_id(tables::ACTIVITIES, id, &[]) {
            Err(e) => Err(transport_err(&self.ctx, "fetch curriculum activity", e)),
            Ok(rec) => Ok(rec.map(|r| map::activity_from_record(&r))),
        }
    }

    fn create(&self, draft: &ActivityDraft) -> Result<CurriculumActivity, ApiError> {
        let mut draft = draft.clone();
        if draft.status.is_none() {
            draft.status = Some(ActivityStatus::Planning);
        }
        let batch = self
            .ctx
            .records
            .create_records(tables::ACTIVITIES, vec![map::activity_to_record(&draft)])
            .map_err(|e| transport_err(&self.ctx, "create curriculum activity", e))?;
        let rec = first_success(batch).map_err(|e| {
            report_api_error(&self.ctx, "create curriculum activity", &e);
            e
        })?;
        Ok(map::activity_from_record(&rec))
    }

    fn update(&self, id: i64, draft: &ActivityDraft) -> Result<CurriculumActivity, ApiError> {
        let mut payload = map::activity_to_record(draft);
        payload["Id"] = json!(id);
        let batch = self
            .ctx
            .records
            .update_records(tables::ACTIVITIES, vec![payload])
            .map_err(|e| transport_err(&self.ctx, "update curriculum activity", e))?;
        let rec = first_success(batch).map_err(|e| {
            report_api_error(&self.ctx, "update curriculum activity", &e);
            e
        })?;
        Ok(map::activity_from_record(&rec))
    }

    fn delete(&self, id: i64) -> Result<bool, ApiError> {
        let resp = self
            .ctx
            .records
            .delete_records(tables::ACTIVITIES, &[id])
            .map_err(|e| transport_err(&self.ctx, "delete curriculum activity", e))?;
        if !resp.success {
            self.ctx.notifier.error("Failed to delete curriculum activity");
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
