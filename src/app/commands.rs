// ==========================================
// 学员管理后台 - 命令适配层
// ==========================================
// 职责: 以 JSON 进 / JSON 出的形式暴露 UI 边界
// 约定:
// - 成功返回序列化后的结果
// - 失败返回 ErrorResponse {code, message, details} 的 JSON
// ==========================================

use crate::app::state::AppState;
use crate::config::ConfigError;
use crate::domain::import::{FileDetails, FileUpload, ImportPhase, ImportStatus};
use crate::domain::schema::{EntityType, SchemaField};
use crate::domain::types::EditableRecord;
use crate::engine::{ImportController, ImportOrchestrator, PageView};
use crate::exporter::{export_participants as export_participants_csv, ExportError};
use crate::importer::ImportError;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ==========================================
// 公共工具：错误映射
// ==========================================

/// 错误响应（返回给调用方）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,

    /// 错误消息
    pub message: String,

    /// 详细信息（可选）
    pub details: Option<serde_json::Value>,
}

fn to_json_error(response: ErrorResponse) -> String {
    serde_json::to_string(&response).unwrap_or_else(|_| response.message.clone())
}

fn error_response(code: &str, message: impl Into<String>) -> String {
    to_json_error(ErrorResponse {
        code: code.to_string(),
        message: message.into(),
        details: None,
    })
}

/// 将ImportError转换为JSON字符串
pub fn map_import_error(err: ImportError) -> String {
    let code = match &err {
        ImportError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
        ImportError::FileReadError(_) => "FILE_READ_ERROR",
        ImportError::ExcelParseError(_) => "EXCEL_PARSE_ERROR",
        ImportError::CsvParseError(_) => "CSV_PARSE_ERROR",
        ImportError::MissingHeaderRow => "MISSING_HEADER_ROW",
        ImportError::RowOutOfRange { .. } => "ROW_OUT_OF_RANGE",
        ImportError::UnknownField { .. } => "UNKNOWN_FIELD",
        ImportError::UnknownHeader(_) => "UNKNOWN_HEADER",
        ImportError::NoActiveSession => "NO_ACTIVE_SESSION",
        ImportError::InvalidTransition { .. } => "INVALID_STATE_TRANSITION",
        ImportError::Remote(_) => "REMOTE_ERROR",
        ImportError::CommitStoreError(_) => "COMMIT_STORE_ERROR",
        ImportError::InternalError(_) => "INTERNAL_ERROR",
        ImportError::Other(_) => "OTHER_ERROR",
    };
    let details = match &err {
        ImportError::RowOutOfRange { index, count } => {
            Some(serde_json::json!({ "index": index, "count": count }))
        }
        ImportError::InvalidTransition { from, action } => {
            Some(serde_json::json!({ "from": from, "action": action }))
        }
        _ => None,
    };
    to_json_error(ErrorResponse {
        code: code.to_string(),
        message: err.to_string(),
        details,
    })
}

fn map_export_error(err: ExportError) -> String {
    let code = match &err {
        ExportError::NoParticipants => "NO_PARTICIPANTS",
        ExportError::Api(api) if api.is_session_expired() => "SESSION_EXPIRED",
        _ => "EXPORT_FAILED",
    };
    tracing::error!(error = %err, "导出失败");
    error_response(code, err.user_message())
}

fn map_config_error(err: ConfigError) -> String {
    error_response("SETTINGS_ERROR", err.to_string())
}

fn parse_entity(entity: &str) -> Result<EntityType, String> {
    entity
        .parse::<EntityType>()
        .map_err(|e| error_response("UNKNOWN_ENTITY", e.to_string()))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| error_response("SERIALIZATION_ERROR", format!("序列化失败: {}", e)))
}

// ==========================================
// 快照（UI 渲染所需的全部状态）
// ==========================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMappingView {
    pub key: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub header: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSnapshot {
    pub entity: EntityType,
    pub phase: ImportPhase,
    pub status: ImportStatus,
    pub file_details: Option<FileDetails>,
    pub total_rows: usize,
    pub headers: Vec<String>,
    pub mapping: Vec<FieldMappingView>,
    pub selected_count: usize,
    pub invalid_count: usize,
    pub banner: Option<String>,
    pub view: Option<PageView>,
}

impl ImportSnapshot {
    pub fn capture(entity: EntityType, state: &ImportOrchestrator) -> Self {
        let headers = state.preview_data().map(|p| p.headers()).unwrap_or_default();
        let total_rows = state.preview_data().map(|p| p.total_rows).unwrap_or(0);
        let session = state.session();

        let mapping = entity
            .fields()
            .iter()
            .map(|field: &SchemaField| FieldMappingView {
                key: field.key,
                label: field.label,
                required: field.required,
                header: session
                    .and_then(|s| s.mapping().header_for(field.key))
                    .map(str::to_string),
            })
            .collect();

        Self {
            entity,
            phase: state.phase().clone(),
            status: state.status().clone(),
            file_details: state.file_details().cloned(),
            total_rows,
            headers,
            mapping,
            selected_count: session.map(|s| s.selected_count()).unwrap_or(0),
            invalid_count: session
                .map(|s| s.validation_report().invalid_count())
                .unwrap_or(0),
            banner: session.and_then(|s| s.banner()).map(str::to_string),
            view: session.map(|s| s.current_view()),
        }
    }
}

fn snapshot_of(controller: &ImportController) -> Result<ImportSnapshot, String> {
    let entity = controller.entity();
    controller
        .inspect(|state| ImportSnapshot::capture(entity, state))
        .map_err(map_import_error)
}

fn snapshot_json(controller: &ImportController) -> Result<String, String> {
    to_json(&snapshot_of(controller)?)
}

// ==========================================
// 导入命令
// ==========================================

/// 读取本地文件为上传对象
pub async fn load_upload(file_path: &Path) -> Result<FileUpload, ImportError> {
    let bytes = tokio::fs::read(file_path)
        .await
        .map_err(|e| ImportError::FileReadError(format!("{}: {}", file_path.display(), e)))?;
    let file_name = file_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();
    Ok(FileUpload::new(file_name, bytes).with_guessed_content_type())
}

/// 预览本地文件
pub async fn preview_file(state: &AppState, entity: &str, file_path: &str) -> Result<String, String> {
    tracing::info!("[preview_file] entity={}, file_path={}", entity, file_path);
    let entity = parse_entity(entity)?;
    let upload = load_upload(Path::new(file_path))
        .await
        .map_err(map_import_error)?;
    preview_loaded(state, entity, upload).await
}

/// 预览内存中的上传内容
pub async fn preview_upload(
    state: &AppState,
    entity: &str,
    file_name: &str,
    content_type: Option<String>,
    bytes: Vec<u8>,
) -> Result<String, String> {
    let entity = parse_entity(entity)?;
    let mut upload = FileUpload::new(file_name, bytes);
    upload.content_type = content_type;
    preview_loaded(state, entity, upload.with_guessed_content_type()).await
}

async fn preview_loaded(state: &AppState, entity: EntityType, upload: FileUpload) -> Result<String, String> {
    let controller = state.controller(entity);
    controller.preview_file(upload).await.map_err(|e| {
        tracing::error!("[preview_file] 预览失败: {:?}", e);
        map_import_error(e)
    })?;
    snapshot_json(controller)
}

/// 确认导入
///
/// # 参数
/// - edited_subset_json: 可选的显式记录数组（JSON）；缺省时提交选中的行
pub async fn confirm_import(
    state: &AppState,
    entity: &str,
    edited_subset_json: Option<&str>,
) -> Result<String, String> {
    let entity = parse_entity(entity)?;
    let edited_subset = match edited_subset_json {
        Some(raw) => Some(
            serde_json::from_str::<Vec<EditableRecord>>(raw)
                .map_err(|e| error_response("INVALID_INPUT", format!("记录格式错误: {}", e)))?,
        ),
        None => None,
    };

    let outcome = state
        .controller(entity)
        .confirm_import(edited_subset)
        .await
        .map_err(|e| {
            tracing::error!("[confirm_import] 确认失败: {:?}", e);
            map_import_error(e)
        })?;
    tracing::info!("[confirm_import] 结果: {:?}", outcome);
    to_json(&outcome)
}

pub fn reset_import(state: &AppState, entity: &str) -> Result<String, String> {
    let controller = state.controller(parse_entity(entity)?);
    controller.reset().map_err(map_import_error)?;
    snapshot_json(controller)
}

pub fn set_file_details(state: &AppState, entity: &str, details_json: &str) -> Result<String, String> {
    let controller = state.controller(parse_entity(entity)?);
    let details: FileDetails = serde_json::from_str(details_json)
        .map_err(|e| error_response("INVALID_INPUT", format!("文件信息格式错误: {}", e)))?;
    controller.set_file_details(details).map_err(map_import_error)?;
    snapshot_json(controller)
}

pub fn get_import_snapshot(state: &AppState, entity: &str) -> Result<String, String> {
    snapshot_json(state.controller(parse_entity(entity)?))
}

// ==========================================
// 会话命令
// ==========================================

pub fn toggle_row(state: &AppState, entity: &str, index: usize) -> Result<String, String> {
    let controller = state.controller(parse_entity(entity)?);
    controller
        .with_session(|session| session.toggle(index))
        .map_err(map_import_error)?;
    snapshot_json(controller)
}

pub fn select_all_rows(state: &AppState, entity: &str) -> Result<String, String> {
    let controller = state.controller(parse_entity(entity)?);
    controller
        .with_session(|session| {
            session.select_all();
            Ok(())
        })
        .map_err(map_import_error)?;
    snapshot_json(controller)
}

pub fn select_no_rows(state: &AppState, entity: &str) -> Result<String, String> {
    let controller = state.controller(parse_entity(entity)?);
    controller
        .with_session(|session| {
            session.select_none();
            Ok(())
        })
        .map_err(map_import_error)?;
    snapshot_json(controller)
}

pub fn edit_cell(
    state: &AppState,
    entity: &str,
    index: usize,
    field_key: &str,
    value: &str,
) -> Result<String, String> {
    let controller = state.controller(parse_entity(entity)?);
    controller
        .with_session(|session| session.edit_cell(index, field_key, value))
        .map_err(map_import_error)?;
    snapshot_json(controller)
}

pub fn go_to_page(state: &AppState, entity: &str, page: usize) -> Result<String, String> {
    let controller = state.controller(parse_entity(entity)?);
    let view = controller
        .with_session(|session| Ok(session.page(page)))
        .map_err(map_import_error)?;
    to_json(&view)
}

pub fn remap_field(
    state: &AppState,
    entity: &str,
    field_key: &str,
    header: Option<&str>,
) -> Result<String, String> {
    let controller = state.controller(parse_entity(entity)?);
    controller
        .remap_field(field_key, header)
        .map_err(map_import_error)?;
    snapshot_json(controller)
}

// ==========================================
// 导出与设置
// ==========================================

pub async fn export_participants(state: &AppState, output_path: &str) -> Result<String, String> {
    let source = state
        .participant_source()
        .ok_or_else(|| error_response("EXPORT_FAILED", "没有可用的学员数据来源"))?;
    let count = export_participants_csv(source.as_ref(), output_path)
        .await
        .map_err(map_export_error)?;
    to_json(&serde_json::json!({ "exported": count, "path": output_path }))
}

pub fn get_setting(state: &AppState, key: &str) -> Result<String, String> {
    let value = state.settings.get(key).map_err(map_config_error)?;
    to_json(&serde_json::json!({ "key": key, "value": value }))
}

pub fn set_setting(state: &AppState, key: &str, value: &str) -> Result<String, String> {
    state.settings.set(key, value).map_err(map_config_error)?;
    to_json(&serde_json::json!({ "key": key, "value": value }))
}
