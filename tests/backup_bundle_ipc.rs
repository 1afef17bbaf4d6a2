mod common;

use common::{temp_workspace, Sidecar};
use serde_json::json;

#[test]
fn export_then_import_restores_the_workspace_elsewhere() {
    let workspace = temp_workspace("rosterd-backup-src");
    let mut sidecar = Sidecar::spawn();
    sidecar.select_workspace(&workspace);

    let _ = sidecar.request_ok(
        "1",
        "students.create",
        json!({ "data": { "firstName": "Ana", "lastName": "Ruiz" }}),
    );
    let _ = sidecar.request_ok(
        "2",
        "settings.update",
        json!({ "gradeScale": { "aMin": 85, "bMin": 80, "cMin": 70, "dMin": 60 }}),
    );

    let bundle_path = temp_workspace("rosterd-backup-out").join("roster-backup.zip");
    let exported = sidecar.request_ok(
        "3",
        "backup.export",
        json!({ "outPath": bundle_path.to_string_lossy() }),
    );
    assert_eq!(exported["bundleFormat"], "roster-workspace-v1");
    assert_eq!(exported["entryCount"], 3);
    assert_eq!(
        exported["dbSha256"].as_str().map(str::len),
        Some(64),
        "hex sha256 in the manifest"
    );
    assert!(bundle_path.is_file(), "bundle written to disk");

    // Import into a fresh workspace; the daemon switches to it.
    let restored_ws = temp_workspace("rosterd-backup-dst");
    let imported = sidecar.request_ok(
        "4",
        "backup.import",
        json!({
            "inPath": bundle_path.to_string_lossy(),
            "workspacePath": restored_ws.to_string_lossy(),
        }),
    );
    assert_eq!(imported["bundleFormatDetected"], "roster-workspace-v1");

    let health = sidecar.request_ok("5", "health", json!({}));
    assert_eq!(
        health["workspacePath"].as_str(),
        Some(restored_ws.to_string_lossy().as_ref())
    );

    let listed = sidecar.request_ok("6", "students.list", json!({}));
    let students = listed["students"].as_array().expect("students");
    assert_eq!(students.len(), 1);
    assert_eq!(students[0]["firstName"], "Ana");

    // Settings rode along inside the database.
    let settings = sidecar.request_ok("7", "settings.get", json!({}));
    assert_eq!(settings["gradeScale"]["aMin"], 85.0);
}

#[test]
fn corrupted_bundle_is_rejected_on_import() {
    let workspace = temp_workspace("rosterd-backup-corrupt");
    let mut sidecar = Sidecar::spawn();
    sidecar.select_workspace(&workspace);
    let _ = sidecar.request_ok(
        "1",
        "students.create",
        json!({ "data": { "firstName": "Ana", "lastName": "Ruiz" }}),
    );

    let bundle_path = temp_workspace("rosterd-backup-corrupt-out").join("bundle.zip");
    let _ = sidecar.request_ok(
        "2",
        "backup.export",
        json!({ "outPath": bundle_path.to_string_lossy() }),
    );

    // Truncate the archive; the import must fail, not half-restore.
    let bytes = std::fs::read(&bundle_path).expect("read bundle");
    std::fs::write(&bundle_path, &bytes[..bytes.len() / 2]).expect("truncate bundle");

    let target = temp_workspace("rosterd-backup-corrupt-dst");
    let resp = sidecar.request(
        "3",
        "backup.import",
        json!({
            "inPath": bundle_path.to_string_lossy(),
            "workspacePath": target.to_string_lossy(),
        }),
    );
    assert_eq!(resp["ok"], false);
    assert_eq!(resp["error"]["code"], "backup_import_failed");
}
