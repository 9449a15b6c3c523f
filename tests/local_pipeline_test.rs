// ==========================================
// 学员管理后台 - 本地模式端到端测试
// ==========================================
// 覆盖: CSV 文件 → 本地预览 → 命令层编辑 → SQLite 提交 → CSV 导出
// ==========================================

mod test_helpers;

use academy_console::app::{commands, AppState, ErrorResponse, ServiceMode};
use academy_console::config::{ConsoleConfig, MemorySettingsStore};
use academy_console::domain::schema::EntityType;
use serde_json::Value;
use std::sync::Arc;
use test_helpers::{create_test_db, write_file};

const ROSTER: &str = "\
First Name,Last Name,Email,Phone Number,Program,Semester
Ada,Obi,ada@example.com,08030000001,Diploma,1
Ben,Eze,,08030000002,Diploma,1
Chi,Nwosu,chi@example.com,08030000003,Certificate,2
";

fn local_state(db_path: std::path::PathBuf) -> AppState {
    let config = ConsoleConfig {
        db_path,
        ..ConsoleConfig::default()
    };
    AppState::new(config, Arc::new(MemorySettingsStore::new()), ServiceMode::Local).unwrap()
}

fn json(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap()
}

#[tokio::test]
async fn test_csv_import_into_sqlite_and_export() {
    let (dir, db_path) = create_test_db();
    let state = local_state(db_path);
    let file = write_file(&dir, "roster.csv", ROSTER);

    let snapshot = json(
        &commands::preview_file(&state, "participants", file.to_str().unwrap())
            .await
            .unwrap(),
    );
    assert_eq!(snapshot["totalRows"], 3);
    assert_eq!(snapshot["selectedCount"], 3);
    assert_eq!(snapshot["invalidCount"], 1);
    assert_eq!(snapshot["view"]["rows"][1]["missing"], serde_json::json!(["Email"]));

    // 缺邮箱的行未修复前，确认被本地拦截
    let outcome = json(&commands::confirm_import(&state, "participant", None).await.unwrap());
    assert_eq!(outcome["outcome"], "REJECTED");
    let store = state.store.as_ref().unwrap();
    assert_eq!(store.count(EntityType::Participant).unwrap(), 0);

    commands::edit_cell(&state, "participant", 1, "email", "ben@example.com").unwrap();
    let outcome = json(&commands::confirm_import(&state, "participant", None).await.unwrap());
    assert_eq!(outcome["outcome"], "COMMITTED");
    assert_eq!(outcome["imported"], 3);
    assert_eq!(store.count(EntityType::Participant).unwrap(), 3);

    let batches = store.list_batches().unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].original_name, "roster.csv");
    assert_eq!(batches[0].file_type, "text/csv");
    assert_eq!(batches[0].size, ROSTER.len() as u64);

    let output = dir.path().join("participants_export.csv");
    let exported = json(
        &commands::export_participants(&state, output.to_str().unwrap())
            .await
            .unwrap(),
    );
    assert_eq!(exported["exported"], 3);

    let content = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[1].contains(r#""Ada","Obi","ada@example.com","08030000001""#));
    assert!(lines[1].ends_with(r#""Diploma","0""#));
}

#[tokio::test]
async fn test_reimport_updates_existing_participants() {
    let (dir, db_path) = create_test_db();
    let state = local_state(db_path);
    let first = write_file(
        &dir,
        "first.csv",
        "First Name,Last Name,Email,Phone Number\nAda,Obi,ada@example.com,0801\n",
    );
    let second = write_file(
        &dir,
        "second.csv",
        "First Name,Last Name,Email,Phone Number\nAdaeze,Obi,ada@example.com,0802\nBen,Eze,ben@example.com,0803\n",
    );

    for file in [&first, &second] {
        commands::preview_file(&state, "participant", file.to_str().unwrap())
            .await
            .unwrap();
        let outcome = json(&commands::confirm_import(&state, "participant", None).await.unwrap());
        assert_eq!(outcome["outcome"], "COMMITTED");
    }

    let store = state.store.as_ref().unwrap();
    assert_eq!(store.count(EntityType::Participant).unwrap(), 2);
    let people = store.list_participants().unwrap();
    assert_eq!(people[0]["firstName"], "Adaeze");
    assert_eq!(people[0]["phoneNumber"], "0802");
    assert_eq!(store.list_batches().unwrap().len(), 2);
}

#[tokio::test]
async fn test_remap_program_columns() {
    let (dir, db_path) = create_test_db();
    let state = local_state(db_path);
    let file = write_file(
        &dir,
        "programs.csv",
        "Course,Term,Length\nDiploma in Theology,1,2 years\n",
    );

    let snapshot = json(
        &commands::preview_file(&state, "program", file.to_str().unwrap())
            .await
            .unwrap(),
    );
    assert_eq!(snapshot["invalidCount"], 1);

    commands::remap_field(&state, "program", "title", Some("Course")).unwrap();
    commands::remap_field(&state, "program", "semester", Some("Term")).unwrap();
    let snapshot = json(&commands::remap_field(&state, "program", "duration", Some("Length")).unwrap());
    assert_eq!(snapshot["invalidCount"], 0);
    assert_eq!(snapshot["view"]["rows"][0]["record"]["title"], "Diploma in Theology");

    let outcome = json(&commands::confirm_import(&state, "program", None).await.unwrap());
    assert_eq!(outcome["imported"], 1);
    assert_eq!(state.store.as_ref().unwrap().count(EntityType::Program).unwrap(), 1);
}

#[tokio::test]
async fn test_unsupported_file_is_reported_in_status() {
    let (dir, db_path) = create_test_db();
    let state = local_state(db_path);
    let file = write_file(&dir, "notes.txt", "hello");

    let snapshot = json(
        &commands::preview_file(&state, "module", file.to_str().unwrap())
            .await
            .unwrap(),
    );
    assert_eq!(snapshot["phase"]["phase"], "FAILED");
    assert!(snapshot["status"]["error"].as_str().unwrap().contains("unsupported file format"));
    assert!(snapshot["view"].is_null());
}

#[tokio::test]
async fn test_export_with_empty_store_reports_no_participants() {
    let (dir, db_path) = create_test_db();
    let state = local_state(db_path);
    let output = dir.path().join("out.csv");

    let err = commands::export_participants(&state, output.to_str().unwrap())
        .await
        .unwrap_err();
    let response: ErrorResponse = serde_json::from_str(&err).unwrap();
    assert_eq!(response.code, "NO_PARTICIPANTS");
    assert_eq!(response.message, "No participants to export.");
    assert!(!output.exists());
}

#[tokio::test]
async fn test_short_first_row_keeps_trailing_column_mapped() {
    let (dir, db_path) = create_test_db();
    let state = local_state(db_path);
    let file = write_file(
        &dir,
        "ragged.csv",
        "First Name,Last Name,Phone Number,Email\nAda,Lovelace,0801\nAlan,Turing,0802,alan@example.com\n",
    );

    let snapshot = json(
        &commands::preview_file(&state, "participant", file.to_str().unwrap())
            .await
            .unwrap(),
    );
    assert_eq!(snapshot["mapping"][2]["key"], "email");
    assert_eq!(snapshot["mapping"][2]["header"], "Email");
    assert_eq!(snapshot["view"]["rows"][0]["record"]["email"], "");
    assert_eq!(snapshot["view"]["rows"][1]["record"]["email"], "alan@example.com");
    assert_eq!(snapshot["invalidCount"], 1);
}

#[tokio::test]
async fn test_second_preview_sends_its_own_file_details() {
    let (dir, db_path) = create_test_db();
    let state = local_state(db_path);
    let first_content = "First Name,Last Name,Email,Phone Number\nAda,Obi,ada@example.com,0801\n";
    let second_content =
        "First Name,Last Name,Email,Phone Number\nBen,Eze,ben@example.com,0802\nChi,Nwosu,chi@example.com,0803\n";
    let first = write_file(&dir, "first.csv", first_content);
    let second = write_file(&dir, "second.csv", second_content);

    for file in [&first, &second] {
        commands::preview_file(&state, "participant", file.to_str().unwrap())
            .await
            .unwrap();
    }
    let outcome = json(&commands::confirm_import(&state, "participant", None).await.unwrap());
    assert_eq!(outcome["imported"], 2);

    let batches = state.store.as_ref().unwrap().list_batches().unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].original_name, "second.csv");
    assert_eq!(batches[0].size, second_content.len() as u64);
}
