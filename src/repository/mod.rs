// ==========================================
// 学员管理后台 - 仓储层
// ==========================================
// 职责: 本地 SQLite 数据访问（导入提交、批次记录、学员列表）
// 红线: 不含导入编排逻辑
// ==========================================

pub mod error;
pub mod import_store;

pub use error::{RepositoryError, RepositoryResult};
pub use import_store::{CommitSummary, ImportBatch, ImportStoreRepository, SqliteCommitService};
