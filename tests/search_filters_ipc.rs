mod common;

use common::{temp_workspace, Sidecar};
use serde_json::json;

fn seed_students(sidecar: &mut Sidecar) {
    let rows = [
        ("Ana", "Ruiz", "ana@school.edu", "active", "9th Grade"),
        ("Ben", "Okoye", "ben@school.edu", "inactive", "10th Grade"),
        ("Briana", "Cole", "bcole@school.edu", "active", "10th Grade"),
    ];
    for (i, (first, last, email, status, level)) in rows.iter().enumerate() {
        let _ = sidecar.request_ok(
            &format!("seed{i}"),
            "students.create",
            json!({ "data": {
                "firstName": first,
                "lastName": last,
                "email": email,
                "status": status,
                "gradeLevel": level,
            }}),
        );
    }
}

#[test]
fn student_search_and_filters_reload_the_cached_list() {
    let workspace = temp_workspace("rosterd-search");
    let mut sidecar = Sidecar::spawn();
    sidecar.select_workspace(&workspace);
    seed_students(&mut sidecar);

    // Contains-match across name, email, and display code.
    let hits = sidecar.request_ok("1", "students.search", json!({ "query": "an" }));
    let names: Vec<&str> = hits["students"]
        .as_array()
        .expect("students")
        .iter()
        .filter_map(|s| s["firstName"].as_str())
        .collect();
    assert_eq!(names, vec!["Ana", "Briana"]);
    assert_eq!(hits["state"], "ready");

    let by_code = sidecar.request_ok("2", "students.search", json!({ "query": "STU002" }));
    assert_eq!(by_code["students"].as_array().map(Vec::len), Some(1));
    assert_eq!(by_code["students"][0]["firstName"], "Ben");

    let inactive =
        sidecar.request_ok("3", "students.filterByStatus", json!({ "status": "inactive" }));
    assert_eq!(inactive["students"].as_array().map(Vec::len), Some(1));

    let tenth = sidecar.request_ok(
        "4",
        "students.filterByGradeLevel",
        json!({ "gradeLevel": "10th Grade" }),
    );
    assert_eq!(tenth["students"].as_array().map(Vec::len), Some(2));

    // Empty filters fall back to the unfiltered list.
    let everyone = sidecar.request_ok("5", "students.filterByStatus", json!({ "status": "" }));
    assert_eq!(everyone["students"].as_array().map(Vec::len), Some(3));
    let everyone = sidecar.request_ok("6", "students.search", json!({ "query": "  " }));
    assert_eq!(everyone["students"].as_array().map(Vec::len), Some(3));
}

#[test]
fn curriculum_search_combines_text_and_dropdown_filters() {
    let workspace = temp_workspace("rosterd-curriculum-search");
    let mut sidecar = Sidecar::spawn();
    sidecar.select_workspace(&workspace);

    let rows = [
        ("Photosynthesis Lab", "Biology", "Lab", "Active"),
        ("Cell Division Lecture", "Biology", "Lecture", "Planning"),
        ("Fractions Workshop", "Math", "Workshop", "Active"),
    ];
    for (i, (title, subject, kind, status)) in rows.iter().enumerate() {
        let _ = sidecar.request_ok(
            &format!("seed{i}"),
            "curriculum.create",
            json!({ "data": {
                "title": title,
                "subject": subject,
                "type": kind,
                "status": status,
                "instructor": "R. Patel",
            }}),
        );
    }

    let biology = sidecar.request_ok(
        "1",
        "curriculum.search",
        json!({ "query": "", "filters": { "subject": "Biology" }}),
    );
    assert_eq!(biology["activities"].as_array().map(Vec::len), Some(2));

    let active_bio = sidecar.request_ok(
        "2",
        "curriculum.search",
        json!({ "query": "", "filters": { "subject": "Biology", "status": "Active" }}),
    );
    assert_eq!(active_bio["activities"].as_array().map(Vec::len), Some(1));
    assert_eq!(active_bio["activities"][0]["title"], "Photosynthesis Lab");

    let text_hit = sidecar.request_ok(
        "3",
        "curriculum.search",
        json!({ "query": "division", "filters": {} }),
    );
    assert_eq!(text_hit["activities"].as_array().map(Vec::len), Some(1));

    // "all" is the dropdown's no-op value.
    let everything = sidecar.request_ok(
        "4",
        "curriculum.search",
        json!({ "query": "", "filters": { "subject": "all", "status": "all", "type": "all" }}),
    );
    assert_eq!(everything["activities"].as_array().map(Vec::len), Some(3));
}
