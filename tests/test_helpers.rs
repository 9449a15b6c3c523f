// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的行数据生成、mock 服务、临时数据库与文件
// ==========================================

#![allow(dead_code)]

use academy_console::domain::import::{ConfirmRequest, ConfirmResponse, FileUpload, PreviewPayload};
use academy_console::domain::schema::EntityType;
use academy_console::domain::types::{CellValue, SourceRow};
use academy_console::engine::ImportController;
use academy_console::importer::{CommitService, ImportError, ImportResult, PreviewService};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ==========================================
// 行数据
// ==========================================

/// 一行完整的学员数据（表头为常见的导出格式）
pub fn participant_row(i: usize) -> SourceRow {
    let mut row = SourceRow::new();
    row.insert("First Name".into(), CellValue::from(format!("First{}", i)));
    row.insert("Last Name".into(), CellValue::from(format!("Last{}", i)));
    row.insert("Email".into(), CellValue::from(format!("p{}@example.com", i)));
    row.insert("Phone Number".into(), CellValue::Number(8_030_000_000.0 + i as f64));
    row.insert("Division".into(), CellValue::from("North"));
    row.insert("Parish".into(), CellValue::Null);
    row
}

/// 生成预览载荷；preview 取前 10 行
pub fn payload(rows: Vec<SourceRow>) -> PreviewPayload {
    PreviewPayload {
        model: "participant".to_string(),
        total_rows: rows.len(),
        preview: rows.iter().take(10).cloned().collect(),
        full_data: rows,
    }
}

pub fn participant_payload(count: usize) -> PreviewPayload {
    payload((0..count).map(participant_row).collect())
}

pub fn csv_upload(name: &str) -> FileUpload {
    FileUpload::new(name, b"ignored by mock".to_vec()).with_content_type("text/csv")
}

// ==========================================
// Mock 服务
// ==========================================

/// 返回固定结果的预览服务
pub struct MockPreviewService {
    result: Mutex<Option<ImportResult<PreviewPayload>>>,
    pub calls: AtomicUsize,
}

impl MockPreviewService {
    pub fn returning(payload: PreviewPayload) -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(Some(Ok(payload))),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(Some(Err(ImportError::Remote(message.to_string())))),
            calls: AtomicUsize::new(0),
        })
    }

    /// 替换下一次调用的结果
    pub fn set_next(&self, result: ImportResult<PreviewPayload>) {
        *self.result.lock().unwrap() = Some(result);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PreviewService for MockPreviewService {
    async fn preview(&self, _entity: EntityType, _upload: FileUpload) -> ImportResult<PreviewPayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.result.lock().unwrap().take() {
            Some(result) => result,
            None => Err(ImportError::Remote("no preview result configured".to_string())),
        }
    }
}

/// 记录所有提交请求的提交服务
#[derive(Default)]
pub struct RecordingCommitService {
    pub requests: Mutex<Vec<ConfirmRequest>>,
    fail_with: Mutex<Option<String>>,
}

impl RecordingCommitService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 下一次提交返回错误
    pub fn fail_next(&self, message: &str) {
        *self.fail_with.lock().unwrap() = Some(message.to_string());
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ConfirmRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CommitService for RecordingCommitService {
    async fn confirm(&self, _entity: EntityType, request: ConfirmRequest) -> ImportResult<ConfirmResponse> {
        let imported = request.data.len();
        self.requests.lock().unwrap().push(request);
        match self.fail_with.lock().unwrap().take() {
            Some(message) => Err(ImportError::Remote(message)),
            None => Ok(ConfirmResponse { imported }),
        }
    }
}

pub fn participant_controller(
    preview: Arc<MockPreviewService>,
    commit: Arc<RecordingCommitService>,
) -> ImportController {
    ImportController::new(EntityType::Participant, 10, preview, commit)
}

// ==========================================
// 临时文件
// ==========================================

/// 临时目录 + 数据库路径（目录需要保持存活）
pub fn create_test_db() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let db_path = dir.path().join("academy_test.db");
    (dir, db_path)
}

pub fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("写入测试文件失败");
    path
}
