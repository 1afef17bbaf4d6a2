mod common;

use common::{notice_messages, temp_workspace, Sidecar};
use serde_json::json;

fn seed_student(sidecar: &mut Sidecar, id: &str, first: &str) -> i64 {
    let created = sidecar.request_ok(
        id,
        "students.create",
        json!({ "data": { "firstName": first, "lastName": "Test" }}),
    );
    created["student"]["Id"].as_i64().expect("student id")
}

#[test]
fn grades_filter_by_student_assignment_and_status() {
    let workspace = temp_workspace("rosterd-grades");
    let mut sidecar = Sidecar::spawn();
    sidecar.select_workspace(&workspace);

    let course = sidecar.request_ok(
        "c1",
        "courses.create",
        json!({ "data": { "name": "Biology", "code": "SCI201", "credits": 4 }}),
    );
    let course_id = course["course"]["Id"].as_i64().expect("course id");

    // maxPoints omitted: the documented default applies.
    let quiz = sidecar.request_ok(
        "a1",
        "assignments.create",
        json!({ "data": { "title": "Cell Quiz", "type": "quiz", "courseId": course_id }}),
    );
    assert_eq!(quiz["assignment"]["maxPoints"], 100.0);
    let quiz_id = quiz["assignment"]["Id"].as_i64().expect("assignment id");

    let essay = sidecar.request_ok(
        "a2",
        "assignments.create",
        json!({ "data": {
            "title": "Mitosis Essay",
            "type": "essay",
            "courseId": course_id,
            "maxPoints": 50,
        }}),
    );
    let essay_id = essay["assignment"]["Id"].as_i64().expect("assignment id");

    let by_course = sidecar.request_ok(
        "a3",
        "assignments.byCourse",
        json!({ "courseId": course_id }),
    );
    assert_eq!(by_course["assignments"].as_array().map(Vec::len), Some(2));
    let by_type = sidecar.request_ok("a4", "assignments.byType", json!({ "type": "quiz" }));
    assert_eq!(by_type["assignments"].as_array().map(Vec::len), Some(1));

    let ana = seed_student(&mut sidecar, "s1", "Ana");
    let ben = seed_student(&mut sidecar, "s2", "Ben");

    let graded = sidecar.request_ok(
        "g1",
        "grades.create",
        json!({ "data": {
            "score": 92.5,
            "status": "graded",
            "studentId": ana,
            "assignmentId": quiz_id,
            "feedback": "Strong work",
        }}),
    );
    // Relation fields normalize to bare integers whichever shape the
    // platform hands back.
    assert_eq!(graded["grade"]["studentId"], ana);
    assert_eq!(graded["grade"]["assignmentId"], quiz_id);

    // Defaults: pending status, zero score.
    let pending = sidecar.request_ok(
        "g2",
        "grades.create",
        json!({ "data": { "studentId": ben, "assignmentId": essay_id }}),
    );
    assert_eq!(pending["grade"]["status"], "pending");
    assert_eq!(pending["grade"]["score"], 0.0);

    let by_student = sidecar.request_ok("g3", "grades.byStudent", json!({ "studentId": ana }));
    assert_eq!(by_student["grades"].as_array().map(Vec::len), Some(1));
    assert_eq!(by_student["grades"][0]["feedback"], "Strong work");

    let by_assignment = sidecar.request_ok(
        "g4",
        "grades.byAssignment",
        json!({ "assignmentId": essay_id }),
    );
    assert_eq!(by_assignment["grades"].as_array().map(Vec::len), Some(1));
    assert_eq!(by_assignment["grades"][0]["studentId"], ben);

    let by_status = sidecar.request_ok("g5", "grades.byStatus", json!({ "status": "graded" }));
    assert_eq!(by_status["grades"].as_array().map(Vec::len), Some(1));
    let all = sidecar.request_ok("g6", "grades.byStatus", json!({ "status": "" }));
    assert_eq!(all["grades"].as_array().map(Vec::len), Some(2));
}

#[test]
fn out_of_range_score_fails_with_field_level_errors() {
    let workspace = temp_workspace("rosterd-grades-range");
    let mut sidecar = Sidecar::spawn();
    sidecar.select_workspace(&workspace);

    let resp = sidecar.request(
        "1",
        "grades.create",
        json!({ "data": { "score": 250.0, "studentId": 1, "assignmentId": 1 }}),
    );
    assert_eq!(resp["ok"], false);
    assert_eq!(resp["error"]["code"], "record_rejected");
    let fields = resp["error"]["details"]["fields"]
        .as_array()
        .expect("field errors");
    assert!(
        fields
            .iter()
            .any(|f| f["fieldLabel"] == "score_c"),
        "score_c must be flagged: {fields:?}"
    );

    // The same field message also rides the notification side channel.
    let messages = notice_messages(&resp);
    assert!(
        messages.iter().any(|m| m.contains("score_c")),
        "expected field message in notices, got {messages:?}"
    );

    let listed = sidecar.request_ok("2", "grades.list", json!({}));
    assert_eq!(listed["grades"].as_array().map(Vec::len), Some(0));
    assert_eq!(listed["state"], "ready");
}

#[test]
fn grade_update_is_full_record_replace() {
    let workspace = temp_workspace("rosterd-grades-update");
    let mut sidecar = Sidecar::spawn();
    sidecar.select_workspace(&workspace);

    let ana = seed_student(&mut sidecar, "s1", "Ana");
    let created = sidecar.request_ok(
        "1",
        "grades.create",
        json!({ "data": { "score": 55.0, "studentId": ana, "assignmentId": 1 }}),
    );
    let grade_id = created["grade"]["Id"].as_i64().expect("grade id");

    let updated = sidecar.request_ok(
        "2",
        "grades.update",
        json!({ "id": grade_id, "data": {
            "score": 71.0,
            "status": "graded",
            "studentId": ana,
            "assignmentId": 1,
            "feedback": "Resubmission accepted",
        }}),
    );
    assert_eq!(updated["grade"]["score"], 71.0);
    assert_eq!(updated["grade"]["status"], "graded");

    let listed = sidecar.request_ok("3", "grades.list", json!({}));
    let grades = listed["grades"].as_array().expect("grades");
    assert_eq!(grades.len(), 1);
    assert_eq!(grades[0]["Id"], grade_id, "replaced in place");
    assert_eq!(grades[0]["feedback"], "Resubmission accepted");

    let missing = sidecar.request("4", "grades.update", json!({ "id": 999, "data": { "score": 1.0 }}));
    assert_eq!(missing["ok"], false);
    assert_eq!(missing["error"]["code"], "record_rejected");
}
