// ==========================================
// 学员管理后台 - 引擎层
// ==========================================
// 职责: 导入会话状态（选择/编辑/分页）与编排状态机
// 红线: 状态机不依赖任何 UI 框架，不直接发起网络调用
// ==========================================

pub mod controller;
pub mod orchestrator;
pub mod session;

// 重导出核心引擎
pub use controller::{ConfirmOutcome, ImportController};
pub use orchestrator::{ConfirmGate, ConfirmRejection, ImportOrchestrator, RequestKind, RequestTicket};
pub use session::{ImportSession, PageRow, PageView, DEFAULT_PAGE_SIZE};
