// ==========================================
// 学员管理后台 - 核心库
// ==========================================
// 职责: 表格导入核对（预览 → 映射 → 编辑/选择 → 校验 → 确认）
// 技术栈: Rust + SQLite / REST
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - Schema 与载荷类型
pub mod domain;

// 导入层 - 表头匹配 / 归一化 / 校验 / 文件解析
pub mod importer;

// 引擎层 - 会话与编排状态机
pub mod engine;

// 数据仓储层 - 本地提交存储
pub mod repository;

// 配置层 - 运行配置与设置存储
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 远端接口
pub mod api;

// 导出层 - 学员 CSV
pub mod exporter;

// 应用层 - 命令适配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{
    CellValue, ConfirmRequest, ConfirmResponse, EditableRecord, EntityType, FileDetails,
    FileUpload, HeaderMapping, ImportPhase, ImportStatus, PreviewPayload, SchemaField, SourceRow,
};
pub use engine::{ConfirmOutcome, ImportController, ImportOrchestrator, ImportSession};
pub use importer::{CommitService, ImportError, ImportResult, PreviewService};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "学员管理后台";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
