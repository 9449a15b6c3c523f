// ==========================================
// 学员管理后台 - 导入会话数据结构
// ==========================================
// 职责: 预览/确认接口载荷、上传文件、导入状态
// 序列化: camelCase（与后端接口一致）
// ==========================================

use crate::domain::types::{EditableRecord, SourceRow};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ORIGINAL_NAME: &str = "Imported File";
pub const DEFAULT_FILE_TYPE: &str = "unknown";

// ==========================================
// 上传文件 (File Upload)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// 小写扩展名（无扩展名时为空串）
    pub fn extension(&self) -> String {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase()
    }

    /// 按扩展名补全 MIME 类型（已设置时不覆盖）
    pub fn with_guessed_content_type(mut self) -> Self {
        if self.content_type.is_none() {
            self.content_type = content_type_for_extension(&self.extension()).map(str::to_string);
        }
        self
    }

    /// 由上传文件推导确认时附带的文件元信息
    pub fn details(&self) -> FileDetails {
        FileDetails {
            original_name: self.file_name.clone(),
            size: self.bytes.len() as u64,
            file_type: self
                .content_type
                .clone()
                .unwrap_or_else(|| DEFAULT_FILE_TYPE.to_string()),
        }
    }
}

/// 表格文件扩展名对应的 MIME 类型
pub fn content_type_for_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "csv" => Some("text/csv"),
        "xlsx" => Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        "xls" => Some("application/vnd.ms-excel"),
        "ods" => Some("application/vnd.oasis.opendocument.spreadsheet"),
        _ => None,
    }
}

// ==========================================
// 文件元信息 (File Details)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileDetails {
    pub original_name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub file_type: String,
}

impl Default for FileDetails {
    fn default() -> Self {
        Self {
            original_name: DEFAULT_ORIGINAL_NAME.to_string(),
            size: 0,
            file_type: DEFAULT_FILE_TYPE.to_string(),
        }
    }
}

// ==========================================
// 预览响应 (Preview Payload)
// ==========================================
// preview 为 full_data 的前缀，仅用于展示；归一化始终基于 full_data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewPayload {
    pub model: String,
    pub total_rows: usize,
    #[serde(default)]
    pub preview: Vec<SourceRow>,
    #[serde(default)]
    pub full_data: Vec<SourceRow>,
}

impl PreviewPayload {
    /// 全部行出现过的表头，按首次出现顺序（自动匹配的输入）
    ///
    /// 远端解析可能省略空单元格，只看首行会漏掉后续行才有的列
    pub fn headers(&self) -> Vec<String> {
        let mut headers: IndexSet<String> = IndexSet::new();
        for row in &self.full_data {
            for header in row.keys() {
                if !headers.contains(header) {
                    headers.insert(header.clone());
                }
            }
        }
        headers.into_iter().collect()
    }
}

// ==========================================
// 确认请求 / 响应
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    pub data: Vec<EditableRecord>,
    pub original_name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub file_type: String,
}

impl ConfirmRequest {
    pub fn new(data: Vec<EditableRecord>, details: &FileDetails) -> Self {
        Self {
            data,
            original_name: details.original_name.clone(),
            size: details.size,
            file_type: details.file_type.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmResponse {
    #[serde(default)]
    pub imported: usize,
}

// ==========================================
// 导入状态 (Import Status)
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStatus {
    pub loading: bool,
    pub error: Option<String>,
    pub success: bool,
    pub imported_count: usize,
}

// ==========================================
// 编排状态机阶段 (Import Phase)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "error", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportPhase {
    Idle,
    Previewing,
    PreviewReady,
    Confirming,
    Succeeded,
    Failed(String),
}

impl ImportPhase {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, ImportPhase::Previewing | ImportPhase::Confirming)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ImportPhase::Idle => "IDLE",
            ImportPhase::Previewing => "PREVIEWING",
            ImportPhase::PreviewReady => "PREVIEW_READY",
            ImportPhase::Confirming => "CONFIRMING",
            ImportPhase::Succeeded => "SUCCEEDED",
            ImportPhase::Failed(_) => "FAILED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_payload_deserialize() {
        let json = r#"{
            "model": "participant",
            "totalRows": 2,
            "preview": [{"First Name": "Ada"}],
            "fullData": [{"First Name": "Ada", "Phone": 123}, {"First Name": "Alan", "Phone": null}]
        }"#;

        let payload: PreviewPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.total_rows, 2);
        assert_eq!(payload.full_data.len(), 2);
        assert_eq!(payload.headers(), vec!["First Name", "Phone"]);
    }

    #[test]
    fn test_preview_payload_with_boolean_cells() {
        let json = r#"{
            "model": "module",
            "totalRows": 1,
            "fullData": [{"Module Name": "Greek I", "Credits": 3, "Program": "Diploma", "Active": true}]
        }"#;

        let payload: PreviewPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.full_data[0]["Active"].as_text(), "true");
    }

    #[test]
    fn test_headers_include_columns_missing_from_first_row() {
        let json = r#"{
            "model": "participant",
            "totalRows": 2,
            "fullData": [{"First Name": "Ada"}, {"First Name": "Alan", "Email": "alan@example.com"}]
        }"#;

        let payload: PreviewPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.headers(), vec!["First Name", "Email"]);
    }

    #[test]
    fn test_confirm_request_serialize_shape() {
        let mut record = EditableRecord::new();
        record.insert("email".to_string(), "a@b.com".to_string());
        let request = ConfirmRequest::new(vec![record], &FileDetails::default());

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["originalName"], "Imported File");
        assert_eq!(value["size"], 0);
        assert_eq!(value["type"], "unknown");
        assert_eq!(value["data"][0]["email"], "a@b.com");
    }

    #[test]
    fn test_upload_details() {
        let upload = FileUpload::new("Roster.CSV", b"a,b\n".to_vec()).with_content_type("text/csv");
        assert_eq!(upload.extension(), "csv");
        let details = upload.details();
        assert_eq!(details.original_name, "Roster.CSV");
        assert_eq!(details.size, 4);
        assert_eq!(details.file_type, "text/csv");
    }

    #[test]
    fn test_partial_file_details_use_defaults() {
        let details: FileDetails = serde_json::from_str(r#"{"originalName": "roster.xlsx"}"#).unwrap();
        assert_eq!(details.original_name, "roster.xlsx");
        assert_eq!(details.size, 0);
        assert_eq!(details.file_type, "unknown");

        let upload = FileUpload::new("roster.ods", Vec::new()).with_guessed_content_type();
        assert_eq!(
            upload.content_type.as_deref(),
            Some("application/vnd.oasis.opendocument.spreadsheet")
        );
    }
}
