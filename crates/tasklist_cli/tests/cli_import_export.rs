use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("tasklist-{nanos}-{name}"))
}

fn run(store_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tasklist"))
        .args(args)
        .env("TASKLIST_STORE_DIR", store_dir)
        .env("TASKLIST_CONFIG_PATH", store_dir.join("config.json"))
        .output()
        .expect("failed to run tasklist")
}

fn read_store(store_dir: &Path) -> serde_json::Value {
    let content = std::fs::read_to_string(store_dir.join("todo-master-data")).unwrap();
    serde_json::from_str(&content).unwrap()
}

#[test]
fn export_writes_pretty_backup_file() {
    let store_dir = temp_path("cli-export");
    let backup = temp_path("backup.json");
    run(&store_dir, &["add", "first"]);
    run(&store_dir, &["add", "second"]);

    let output = run(&store_dir, &["export", "--output", backup.to_str().unwrap()]);
    let content = std::fs::read_to_string(&backup).unwrap();
    let stored = read_store(&store_dir);
    std::fs::remove_dir_all(&store_dir).ok();
    std::fs::remove_file(&backup).ok();

    assert!(output.status.success());
    assert!(content.starts_with("[\n  {\n    \"id\""));
    let exported: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(exported, stored);
}

#[test]
fn export_to_stdout() {
    let store_dir = temp_path("cli-export-stdout");
    run(&store_dir, &["add", "only"]);

    let output = run(&store_dir, &["export", "--output", "-"]);
    std::fs::remove_dir_all(&store_dir).ok();

    assert!(output.status.success());
    let exported: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(exported[0]["text"], "only");
}

#[test]
fn import_prepends_backup_and_rekeys_duplicates() {
    let source_dir = temp_path("cli-import-source");
    let target_dir = temp_path("cli-import-target");
    let backup = temp_path("import.json");

    run(&source_dir, &["add", "from backup"]);
    run(&source_dir, &["export", "--output", backup.to_str().unwrap()]);
    run(&target_dir, &["add", "existing"]);

    let first = run(&target_dir, &["import", backup.to_str().unwrap()]);
    let second = run(&target_dir, &["import", backup.to_str().unwrap()]);
    let stored = read_store(&target_dir);
    std::fs::remove_dir_all(&source_dir).ok();
    std::fs::remove_dir_all(&target_dir).ok();
    std::fs::remove_file(&backup).ok();

    assert!(first.status.success());
    assert!(String::from_utf8_lossy(&first.stdout).contains("Imported 1 tasks"));
    assert!(String::from_utf8_lossy(&second.stdout).contains("1 given new ids"));

    let tasks = stored.as_array().unwrap();
    let texts: Vec<&str> = tasks.iter().map(|t| t["text"].as_str().unwrap()).collect();
    assert_eq!(texts, ["from backup", "from backup", "existing"]);
    assert_ne!(tasks[0]["id"], tasks[1]["id"]);
}

#[test]
fn import_invalid_file_reports_parse_error() {
    let store_dir = temp_path("cli-import-invalid");
    let backup = temp_path("invalid.json");
    std::fs::write(&backup, "not json").unwrap();
    run(&store_dir, &["add", "existing"]);

    let output = run(&store_dir, &["import", backup.to_str().unwrap()]);
    let stored = read_store(&store_dir);
    std::fs::remove_dir_all(&store_dir).ok();
    std::fs::remove_file(&backup).ok();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: parse_error - Invalid JSON file"));
    assert_eq!(stored.as_array().unwrap().len(), 1);
}

#[test]
fn import_missing_file_reports_io_error() {
    let store_dir = temp_path("cli-import-missing");

    let output = run(
        &store_dir,
        &["import", temp_path("absent.json").to_str().unwrap()],
    );
    std::fs::remove_dir_all(&store_dir).ok();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: io_error - Error reading file"));
}

#[test]
fn import_skips_blank_records_and_trims_text() {
    let store_dir = temp_path("cli-import-blank");
    let backup = temp_path("blank.json");
    let records = serde_json::json!([
        {"id": "x", "text": "   ", "completed": false, "createdAt": "2025-12-20T00:00:00Z"},
        {"id": "y", "text": "  padded  ", "completed": false, "createdAt": "2025-12-20T00:00:00Z"}
    ]);
    std::fs::write(&backup, serde_json::to_string(&records).unwrap()).unwrap();

    let output = run(&store_dir, &["import", backup.to_str().unwrap()]);
    let stored = read_store(&store_dir);
    std::fs::remove_dir_all(&store_dir).ok();
    std::fs::remove_file(&backup).ok();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Imported 1 tasks (1 blank skipped)"));
    let tasks = stored.as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["text"], "padded");
}
