// ==========================================
// 学员管理后台 - 领域模型层
// ==========================================
// 职责: 导入 Schema、行/单元格类型、接口载荷与状态
// 红线: 不含网络访问，不含持久化逻辑
// ==========================================

pub mod import;
pub mod schema;
pub mod types;

// 重导出核心类型
pub use import::{
    ConfirmRequest, ConfirmResponse, FileDetails, FileUpload, ImportPhase, ImportStatus,
    PreviewPayload,
};
pub use schema::{fields_for, EntityType, SchemaField, UnknownEntityType};
pub use types::{CellValue, EditableRecord, HeaderMapping, SourceRow};
