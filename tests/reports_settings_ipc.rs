mod common;

use common::{notice_messages, temp_workspace, Sidecar};
use serde_json::json;

fn seed(sidecar: &mut Sidecar) {
    for (i, (first, level)) in [("Ana", "9th Grade"), ("Ben", "9th Grade"), ("Cal", "12th Grade")]
        .iter()
        .enumerate()
    {
        let _ = sidecar.request_ok(
            &format!("seed-s{i}"),
            "students.create",
            json!({ "data": { "firstName": first, "lastName": "Test", "gradeLevel": level }}),
        );
    }
    let _ = sidecar.request_ok(
        "seed-c",
        "courses.create",
        json!({ "data": { "name": "Algebra I", "code": "MATH101", "credits": 3 }}),
    );
    for (i, score) in [95.0, 87.0, 42.0].iter().enumerate() {
        let _ = sidecar.request_ok(
            &format!("seed-g{i}"),
            "grades.create",
            json!({ "data": { "score": score, "studentId": 1, "assignmentId": 1, "status": "graded" }}),
        );
    }
}

#[test]
fn overview_follows_the_configured_grade_scale() {
    let workspace = temp_workspace("rosterd-reports");
    let mut sidecar = Sidecar::spawn();
    sidecar.select_workspace(&workspace);
    seed(&mut sidecar);

    let report = sidecar.request_ok("1", "reports.overview", json!({}));
    let overview = &report["report"];
    assert_eq!(overview["totalStudents"], 3);
    assert_eq!(overview["activeStudents"], 3);
    assert_eq!(overview["totalCourses"], 1);
    assert_eq!(overview["totalGrades"], 3);
    // GPA is server-owned and starts at zero for every new student.
    assert_eq!(overview["averageGpa"], 0.0);
    assert_eq!(overview["gradeDistribution"]["A"], 1);
    assert_eq!(overview["gradeDistribution"]["B"], 1);
    assert_eq!(overview["gradeDistribution"]["F"], 1);
    assert_eq!(overview["enrollmentByGrade"][0]["count"], 2, "9th Grade");
    assert_eq!(overview["enrollmentByGrade"][3]["count"], 1, "12th Grade");

    // Lowering the A threshold reclassifies the 87 without touching data.
    let _ = sidecar.request_ok(
        "2",
        "settings.update",
        json!({ "gradeScale": { "aMin": 85, "bMin": 80, "cMin": 70, "dMin": 60 }}),
    );
    let report = sidecar.request_ok("3", "reports.overview", json!({}));
    assert_eq!(report["report"]["gradeDistribution"]["A"], 2);
    assert_eq!(report["report"]["gradeDistribution"]["B"], 0);
}

#[test]
fn exports_cover_roster_csv_and_summary_text() {
    let workspace = temp_workspace("rosterd-exports");
    let mut sidecar = Sidecar::spawn();
    sidecar.select_workspace(&workspace);
    seed(&mut sidecar);

    let csv = sidecar.request_ok("1", "reports.export", json!({ "type": "students" }));
    assert_eq!(csv["filename"], "students_export.csv");
    let content = csv["content"].as_str().expect("csv content");
    assert_eq!(content.lines().count(), 4, "header plus three students");
    assert!(content.lines().nth(1).unwrap().contains("Ana"));

    let summary = sidecar.request_ok("2", "reports.export", json!({ "type": "summary" }));
    assert_eq!(summary["filename"], "summary_report.txt");
    let content = summary["content"].as_str().expect("summary content");
    assert!(content.contains("Lincoln High School"));
    assert!(content.contains("Total Students: 3"));
    assert!(content.contains("9th Grade: 2"));

    let bad = sidecar.request("3", "reports.export", json!({ "type": "holograms" }));
    assert_eq!(bad["ok"], false);
    assert_eq!(bad["error"]["code"], "bad_params");
}

#[test]
fn settings_round_trip_reset_and_email_gate() {
    let workspace = temp_workspace("rosterd-settings");
    let mut sidecar = Sidecar::spawn();
    sidecar.select_workspace(&workspace);

    let current = sidecar.request_ok("1", "settings.get", json!({}));
    assert_eq!(current["settings"]["schoolName"], "Lincoln High School");
    assert_eq!(current["gradeScale"]["aMin"], 90.0);

    let updated = sidecar.request(
        "2",
        "settings.update",
        json!({ "settings": {
            "schoolName": "Westview High",
            "academicYear": "2024-2025",
            "defaultGradingScale": "standard",
            "emailNotifications": false,
            "autoBackup": true,
            "themeMode": "dark",
        }}),
    );
    assert_eq!(updated["ok"], true);
    assert_eq!(updated["result"]["settings"]["schoolName"], "Westview High");
    assert!(notice_messages(&updated)
        .iter()
        .any(|m| m.contains("Settings saved")));

    // Notifications are off: creating a student with an email produces no
    // welcome-email warning.
    let created = sidecar.request(
        "3",
        "students.create",
        json!({ "data": { "firstName": "Dee", "lastName": "Ito", "email": "dee@school.edu" }}),
    );
    assert_eq!(created["ok"], true);
    assert!(
        notice_messages(&created).is_empty(),
        "no welcome email when the toggle is off"
    );

    // Settings persist across a daemon restart (same workspace).
    drop(sidecar);
    let mut sidecar = Sidecar::spawn();
    sidecar.select_workspace(&workspace);
    let reloaded = sidecar.request_ok("4", "settings.get", json!({}));
    assert_eq!(reloaded["settings"]["schoolName"], "Westview High");

    let reset = sidecar.request("5", "settings.reset", json!({}));
    assert_eq!(reset["ok"], true);
    assert_eq!(
        reset["result"]["settings"]["schoolName"],
        "Lincoln High School"
    );
    assert!(notice_messages(&reset)
        .iter()
        .any(|m| m.contains("reset to defaults")));
}
