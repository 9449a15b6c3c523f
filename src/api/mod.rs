// ==========================================
// 学员管理后台 - API 层
// ==========================================
// 职责: 远端 REST 接口（导入预览/确认、学员列表），供命令层与 CLI 调用
// ==========================================

pub mod error;
pub mod http_client;
pub mod import_api;
pub mod participant_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use http_client::{interpret_response, ConsoleApiClient};
pub use import_api::HttpImportService;
pub use participant_api::{extract_participant_list, ParticipantApi};
