mod common;

use common::{temp_workspace, Sidecar};
use serde_json::{json, Value};

fn enrolled_ids(course: &Value) -> Vec<i64> {
    course["enrolledStudents"]
        .as_array()
        .expect("enrolledStudents")
        .iter()
        .filter_map(Value::as_i64)
        .collect()
}

#[test]
fn enrollment_is_idempotent_and_removal_of_absent_student_is_a_noop() {
    let workspace = temp_workspace("rosterd-membership");
    let mut sidecar = Sidecar::spawn();
    sidecar.select_workspace(&workspace);

    let course = sidecar.request_ok(
        "1",
        "courses.create",
        json!({ "data": { "name": "Algebra I", "code": "MATH101", "semester": "Fall 2024", "credits": 3 }}),
    );
    let course_id = course["course"]["Id"].as_i64().expect("course id");
    assert_eq!(course["course"]["enrolledStudents"], json!([]));

    let mut student_ids = Vec::new();
    for (i, name) in ["Ana", "Ben"].iter().enumerate() {
        let created = sidecar.request_ok(
            &format!("s{i}"),
            "students.create",
            json!({ "data": { "firstName": name, "lastName": "Test" }}),
        );
        student_ids.push(created["student"]["Id"].as_i64().expect("student id"));
    }

    let first = sidecar.request_ok(
        "2",
        "courses.enroll",
        json!({ "courseId": course_id, "studentId": student_ids[0] }),
    );
    assert_eq!(enrolled_ids(&first["course"]), vec![student_ids[0]]);

    // Enrolling the same student again leaves exactly one membership.
    let again = sidecar.request_ok(
        "3",
        "courses.enroll",
        json!({ "courseId": course_id, "studentId": student_ids[0] }),
    );
    assert_eq!(enrolled_ids(&again["course"]), vec![student_ids[0]]);

    let second = sidecar.request_ok(
        "4",
        "courses.enroll",
        json!({ "courseId": course_id, "studentId": student_ids[1] }),
    );
    assert_eq!(
        enrolled_ids(&second["course"]),
        vec![student_ids[0], student_ids[1]]
    );

    // Removing a never-enrolled student changes nothing.
    let noop = sidecar.request_ok(
        "5",
        "courses.removeStudent",
        json!({ "courseId": course_id, "studentId": 9999 }),
    );
    assert_eq!(
        enrolled_ids(&noop["course"]),
        vec![student_ids[0], student_ids[1]]
    );

    let removed = sidecar.request_ok(
        "6",
        "courses.removeStudent",
        json!({ "courseId": course_id, "studentId": student_ids[0] }),
    );
    assert_eq!(enrolled_ids(&removed["course"]), vec![student_ids[1]]);

    // The cached course list reflects the final membership.
    let listed = sidecar.request_ok("7", "courses.list", json!({}));
    let courses = listed["courses"].as_array().expect("courses");
    assert_eq!(enrolled_ids(&courses[0]), vec![student_ids[1]]);
}

#[test]
fn enrolling_into_a_missing_course_is_not_found() {
    let workspace = temp_workspace("rosterd-membership-missing");
    let mut sidecar = Sidecar::spawn();
    sidecar.select_workspace(&workspace);

    let resp = sidecar.request(
        "1",
        "courses.enroll",
        json!({ "courseId": 42, "studentId": 1 }),
    );
    assert_eq!(resp["ok"], false);
    assert_eq!(resp["error"]["code"], "not_found");
}
