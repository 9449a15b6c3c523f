// ==========================================
// 学员管理后台 - 应用层
// ==========================================
// 职责: 组装服务并以命令形式暴露给前端 / CLI
// ==========================================

pub mod commands;
pub mod state;

// 重导出
pub use commands::{ErrorResponse, ImportSnapshot};
pub use state::{AppState, ServiceMode};
