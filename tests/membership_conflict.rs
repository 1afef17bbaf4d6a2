//! The enrollment read-modify-write window, exercised with a concurrent
//! writer injected between the read and the write. The stale write must be
//! detected (version conflict), and the bounded retry must converge with
//! both memberships intact.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{json, Value};

use rosterd::api::{ApiContext, CoursesApi};
use rosterd::db::SqliteRecordService;
use rosterd::notify::NoticeBuffer;
use rosterd::outbox::{MemoryOutbox, Outbox, OutboxConfig};
use rosterd::platform::{
    BatchResponse, DeleteResponse, DisabledFunctionClient, FetchResponse, QueryParams, Record,
    RecordService,
};

/// Delegating record service that fires a one-shot hook just before the
/// first update call — a concurrent writer landing inside the RMW window.
struct RacingRecords {
    inner: Rc<SqliteRecordService>,
    on_update: RefCell<Option<Box<dyn FnOnce(&SqliteRecordService)>>>,
}

impl RecordService for RacingRecords {
    fn fetch_records(&self, table: &str, query: &QueryParams) -> anyhow::Result<FetchResponse> {
        self.inner.fetch_records(table, query)
    }

    fn get_record_by_id(
        &self,
        table: &str,
        id: i64,
        fields: &[String],
    ) -> anyhow::Result<Option<Record>> {
        self.inner.get_record_by_id(table, id, fields)
    }

    fn create_records(&self, table: &str, records: Vec<Value>) -> anyhow::Result<BatchResponse> {
        self.inner.create_records(table, records)
    }

    fn update_records(&self, table: &str, records: Vec<Value>) -> anyhow::Result<BatchResponse> {
        if let Some(hook) = self.on_update.borrow_mut().take() {
            hook(&self.inner);
        }
        self.inner.update_records(table, records)
    }

    fn delete_records(&self, table: &str, ids: &[i64]) -> anyhow::Result<DeleteResponse> {
        self.inner.delete_records(table, ids)
    }
}

fn context_over(records: Rc<dyn RecordService>) -> Rc<ApiContext> {
    let notifier = Rc::new(NoticeBuffer::new());
    let outbox = Rc::new(Outbox::new(
        Rc::new(MemoryOutbox::new()),
        Rc::new(DisabledFunctionClient),
        records.clone(),
        notifier.clone(),
        OutboxConfig::default(),
    ));
    Rc::new(ApiContext::new(records, notifier, outbox))
}

#[test]
fn interleaved_write_is_detected_and_enrollment_converges() {
    let db = Rc::new(SqliteRecordService::open_in_memory().expect("db"));
    let created = db
        .create_records("course_c", vec![json!({ "name_c": "Chemistry" })])
        .expect("create course");
    let course_id = created.results[0]
        .data
        .as_ref()
        .and_then(|d| d.get("Id"))
        .and_then(Value::as_i64)
        .expect("course id");

    let racing = Rc::new(RacingRecords {
        inner: db.clone(),
        on_update: RefCell::new(Some(Box::new(move |svc: &SqliteRecordService| {
            // The rival reads the current version and enrolls student 77.
            let rec = svc
                .get_record_by_id("course_c", course_id, &[])
                .expect("get")
                .expect("present");
            let version = rec["version_c"].as_i64().expect("version");
            let resp = svc
                .update_records(
                    "course_c",
                    vec![json!({
                        "Id": course_id,
                        "enrolled_students_c": "77",
                        "version_c": version,
                    })],
                )
                .expect("rival update");
            assert!(resp.results[0].success, "rival write lands first");
        }))),
    });

    let api = CoursesApi::new(context_over(racing));
    let course = api.enroll_student(course_id, 5).expect("enrollment converges");

    // Last-write-wins would have dropped 77 silently. The version guard
    // forced a re-read instead, so both memberships survive.
    assert!(course.enrolled_students.contains(&77), "rival write preserved");
    assert!(course.enrolled_students.contains(&5), "our write applied on retry");
    assert_eq!(course.enrolled_students.len(), 2);
}

#[test]
fn conflict_surfaces_when_retries_exhaust() {
    let db = Rc::new(SqliteRecordService::open_in_memory().expect("db"));
    let created = db
        .create_records("course_c", vec![json!({ "name_c": "Physics" })])
        .expect("create course");
    let course_id = created.results[0]
        .data
        .as_ref()
        .and_then(|d| d.get("Id"))
        .and_then(Value::as_i64)
        .expect("course id");

    // A rival that always slips in between read and write.
    struct ChurningRecords {
        inner: Rc<SqliteRecordService>,
        counter: RefCell<i64>,
    }

    impl RecordService for ChurningRecords {
        fn fetch_records(&self, table: &str, query: &QueryParams) -> anyhow::Result<FetchResponse> {
            self.inner.fetch_records(table, query)
        }

        fn get_record_by_id(
            &self,
            table: &str,
            id: i64,
            fields: &[String],
        ) -> anyhow::Result<Option<Record>> {
            self.inner.get_record_by_id(table, id, fields)
        }

        fn create_records(
            &self,
            table: &str,
            records: Vec<Value>,
        ) -> anyhow::Result<BatchResponse> {
            self.inner.create_records(table, records)
        }

        fn update_records(
            &self,
            table: &str,
            records: Vec<Value>,
        ) -> anyhow::Result<BatchResponse> {
            let id = records[0]["Id"].as_i64().expect("Id");
            let rec = self
                .inner
                .get_record_by_id(table, id, &[])
                .expect("get")
                .expect("present");
            let version = rec["version_c"].as_i64().expect("version");
            let n = {
                let mut counter = self.counter.borrow_mut();
                *counter += 1;
                *counter
            };
            let resp = self.inner.update_records(
                table,
                vec![json!({
                    "Id": id,
                    "enrolled_students_c": format!("{}", 100 + n),
                    "version_c": version,
                })],
            )?;
            assert!(resp.results[0].success);
            self.inner.update_records(table, records)
        }

        fn delete_records(&self, table: &str, ids: &[i64]) -> anyhow::Result<DeleteResponse> {
            self.inner.delete_records(table, ids)
        }
    }

    let churning = Rc::new(ChurningRecords {
        inner: db,
        counter: RefCell::new(0),
    });
    let api = CoursesApi::new(context_over(churning));

    let err = api
        .enroll_student(course_id, 5)
        .expect_err("bounded retry gives up under constant churn");
    assert_eq!(err.code(), "version_conflict");
}
