use std::rc::Rc;

use serde_json::json;

use crate::map::{self, STUDENT_FIELDS};
use crate::model::{Student, StudentDraft, StudentStatus};
use crate::outbox::OutboxEvent;
use crate::platform::{tables, Condition, QueryParams};

use super::{
    fetch_mapped, first_success, now_iso, report_api_error, transport_err, ApiContext, ApiError,
    CrudApi,
};

pub struct StudentsApi {
    ctx: Rc<ApiContext>,
}

impl StudentsApi {
    pub fn new(ctx: Rc<ApiContext>) -> Self {
        Self { ctx }
    }

    fn query(&self) -> QueryParams {
        QueryParams::with_fields(STUDENT_FIELDS)
    }

    /// Contains-match across name, email and display code.
    pub fn search(&self, query: &str) -> Result<Vec<Student>, ApiError> {
        let needle = query.trim();
        if needle.is_empty() {
            return self.list();
        }
        let query = self.query().or_group(vec![
            Condition::contains("first_name_c", needle),
            Condition::contains("last_name_c", needle),
            Condition::contains("email_c", needle),
            Condition::contains("student_id_c", needle),
        ]);
        fetch_mapped(
            &self.ctx,
            tables::STUDENTS,
            &query,
            "students",
            map::student_from_record,
        )
    }

    pub fn filter_by_status(&self, status: &str) -> Result<Vec<Student>, ApiError> {
        if status.is_empty() {
            return self.list();
        }
        let query = self
            .query()
            .and_where(Condition::equal_to("status_c", json!(status)));
        fetch_mapped(
            &self.ctx,
            tables::STUDENTS,
            &query,
            "students",
            map::student_from_record,
        )
    }

    pub fn filter_by_grade_level(&self, level: &str) -> Result<Vec<Student>, ApiError> {
        if level.is_empty() {
            return self.list();
        }
        let query = self
            .query()
            .and_where(Condition::equal_to("grade_level_c", json!(level)));
        fetch_mapped(
            &self.ctx,
            tables::STUDENTS,
            &query,
            "students",
            map::student_from_record,
        )
    }
}

impl CrudApi for StudentsApi {
    type Item = Student;
    type Draft = StudentDraft;

    fn list(&self) -> Result<Vec<Student>, ApiError> {
        fetch_mapped(
            &self.ctx,
            tables::STUDENTS,
            &self.query(),
            "students",
            map::student_from_record,
        )
    }

    fn get(&self, id: i64) -> Result<Option<Student>, ApiError> {
        match self.ctx.records.get_record_by_id(tables::STUDENTS, id, &[]) {
            Err(e) => Err(transport_err(&self.ctx, "fetch student", e)),
            Ok(rec) => Ok(rec.map(|r| map::student_from_record(&r))),
        }
    }

    fn create(&self, draft: &StudentDraft) -> Result<Student, ApiError> {
        let mut draft = draft.clone();
        if draft.status.is_none() {
            draft.status = Some(StudentStatus::Active);
        }
        if draft.enrollment_date.as_deref().map_or(true, str::is_empty) {
            draft.enrollment_date = Some(now_iso());
        }

        let batch = self
            .ctx
            .records
            .create_records(tables::STUDENTS, vec![map::student_to_record(&draft)])
            .map_err(|e| transport_err(&self.ctx, "create student", e))?;
        let rec = first_success(batch).map_err(|e| {
            report_api_error(&self.ctx, "create student", &e);
            e
        })?;
        let student = map::student_from_record(&rec);

        // The welcome email rides the outbox; its failure never reaches
        // this return value.
        if self.ctx.welcome_email_enabled() && !student.email.is_empty() {
            self.ctx.outbox.submit(OutboxEvent::WelcomeEmail {
                student_id: student.id,
                email: student.email.clone(),
                first_name: student.first_name.clone(),
            });
        }
        Ok(student)
    }

    fn update(&self, id: i64, draft: &StudentDraft) -> Result<Student, ApiError> {
        let mut payload = map::student_to_record(draft);
        payload["Id"] = json!(id);
        let batch = self
            .ctx
            .records
            .update_records(tables::STUDENTS, vec![payload])
            .map_err(|e| transport_err(&self.ctx, "update student", e))?;
        let rec = first_success(batch).map_err(|e| {
            report_api_error(&self.ctx, "update student", &e);
            e
        })?;
        Ok(map::student_from_record(&rec))
    }

    fn delete(&self, id: i64) -> Result<bool, ApiError> {
        let resp = self
            .ctx
            .records
            .delete_records(tables::STUDENTS, &[id])
            .map_err(|e| transport_err(&self.ctx, "delete student", e))?;
        if !resp.success {
            self.ctx.notifier.error("Failed to delete student");
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
