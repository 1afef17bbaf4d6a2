use std::rc::Rc;

use serde_json::json;

use crate::map::{self, COURSE_FIELDS};
use crate::model::{Course, CourseDraft};
use crate::platform::{tables, QueryParams};

use super::{
    fetch_mapped, first_success, is_version_conflict, report_api_error, transport_err, ApiContext,
    ApiError, CrudApi,
};

/// Bounded retry for the membership read-modify-write. Each retry re-reads
/// the course, so a conflict converges unless the course is churning.
const MEMBERSHIP_ATTEMPTS: usize = 3;

pub struct CoursesApi {
    ctx: Rc<ApiContext>,
}

impl CoursesApi {
    pub fn new(ctx: Rc<ApiContext>) -> Self {
        Self { ctx }
    }

    fn query(&self) -> QueryParams {
        QueryParams::with_fields(COURSE_FIELDS)
    }

    /// Dedup add; already-enrolled is a success returning the course as-is.
    pub fn enroll_student(&self, course_id: i64, student_id: i64) -> Result<Course, ApiError> {
        self.adjust_membership(course_id, student_id, true, "enroll student")
    }

    /// Filter remove; not-enrolled is a no-op returning the course as-is.
    pub fn remove_student(&self, course_id: i64, student_id: i64) -> Result<Course, ApiError> {
        self.adjust_membership(course_id, student_id, false, "remove student")
    }

    fn adjust_membership(
        &self,
        course_id: i64,
        student_id: i64,
        add: bool,
        action: &str,
    ) -> Result<Course, ApiError> {
        for _ in 0..MEMBERSHIP_ATTEMPTS {
            let Some(current) = self.get(course_id)? else {
                self.ctx.notifier.error(&format!("Failed to {action}"));
                return Err(ApiError::NotFound {
                    entity: "course",
                    id: course_id,
                });
            };

            let mut ids = current.enrolled_students.clone();
            if add {
                if ids.contains(&student_id) {
                    return Ok(current);
                }
                ids.push(student_id);
            } else {
                if !ids.contains(&student_id) {
                    return Ok(current);
                }
                ids.retain(|id| *id != student_id);
            }

            let payload = json!({
                "Id": course_id,
                "enrolled_students_c": map::join_enrolled(&ids),
                "version_c": current.version,
            });
            let batch = self
                .ctx
                .records
                .update_records(tables::COURSES, vec![payload])
                .map_err(|e| transport_err(&self.ctx, action, e))?;

            match first_success(batch) {
                Ok(rec) => return Ok(map::course_from_record(&rec)),
                Err(e) if is_version_conflict(&e) => {
                    // Someone wrote between our read and write; re-read and
                    // reapply on the fresh membership set.
                    tracing::debug!(course_id, student_id, "membership write lost the race, retrying");
                    continue;
                }
                Err(e) => {
                    report_api_error(&self.ctx, action, &e);
                    return Err(e);
                }
            }
        }

        self.ctx.notifier.error(&format!("Failed to {action}"));
        Err(ApiError::Conflict {
            entity: "course",
            id: course_id,
        })
    }
}

impl CrudApi for CoursesApi {
    type Item = Course;
    type Draft = CourseDraft;

    fn list(&self) -> Result<Vec<Course>, ApiError> {
        fetch_mapped(
            &self.ctx,
            tables::COURSES,
            &self.query(),
            "courses",
            map::course_from_record,
        )
    }

    fn get(&self, id: i64) -> Result<Option<Course>, ApiError> {
        match self.ctx.records.get_record_by_id(tables::COURSES, id, &[]) {
            Err(e) => Err(transport_err(&self.ctx, "fetch course", e)),
            Ok(rec) => Ok(rec.map(|r| map::course_from_record(&r))),
        }
    }

    fn create(&self, draft: &CourseDraft) -> Result<Course, ApiError> {
        // Membership and the version token are server-initialized.
        let mut draft = draft.clone();
        draft.enrolled_students = None;
        draft.version = None;

        let batch = self
            .ctx
            .records
            .create_records(tables::COURSES, vec![map::course_to_record(&draft)])
            .map_err(|e| transport_err(&self.ctx, "create course", e))?;
        let rec = first_success(batch).map_err(|e| {
            report_api_error(&self.ctx, "create course", &e);
            e
        })?;
        Ok(map::course_from_record(&rec))
    }

    fn update(&self, id: i64, draft: &CourseDraft) -> Result<Course, ApiError> {
        let mut draft = draft.clone();
        if draft.version.is_none() {
            // Caller holds no token; anchor the write on the current one.
            let Some(current) = self.get(id)? else {
                self.ctx.notifier.error("Failed to update course");
                return Err(ApiError::NotFound {
                    entity: "course",
                    id,
                });
            };
            draft.version = Some(current.version);
        }

        let mut payload = map::course_to_record(&draft);
        payload["Id"] = json!(id);
        let batch = self
            .ctx
            .records
            .update_records(tables::COURSES, vec![payload])
            .map_err(|e| transport_err(&self.ctx, "update course", e))?;
        let rec = first_success(batch).map_err(|e| {
            report_api_error(&self.ctx, "update course", &e);
            e
        })?;
        Ok(map::course_from_record(&rec))
    }

    fn delete(&self, id: i64) -> Result<bool, ApiError> {
        let resp = self
            .ctx
            .records
            .delete_records(tables::COURSES, &[id])
            .map_err(|e| transport_err(&self.ctx, "delete course", e))?;
        if !resp.success {
            self.ctx.notifier.error("Failed to delete course");
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
