// ==========================================
// 学员管理后台 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("unsupported file format: {0} (expected .csv/.xlsx/.xls/.ods)")]
    UnsupportedFormat(String),

    #[error("failed to read file: {0}")]
    FileReadError(String),

    #[error("failed to parse spreadsheet: {0}")]
    ExcelParseError(String),

    #[error("failed to parse CSV: {0}")]
    CsvParseError(String),

    #[error("file contains no header row")]
    MissingHeaderRow,

    // ===== 会话编辑错误 =====
    #[error("row index {index} out of range (rows: {count})")]
    RowOutOfRange { index: usize, count: usize },

    #[error("unknown field '{field}' for {entity}")]
    UnknownField { entity: String, field: String },

    #[error("header '{0}' not present in source data")]
    UnknownHeader(String),

    #[error("no import session is active")]
    NoActiveSession,

    #[error("invalid state transition: from={from} action={action}")]
    InvalidTransition { from: String, action: String },

    // ===== 外部服务错误 =====
    /// 远端服务返回的可读消息（直接展示给操作员）
    #[error("{0}")]
    Remote(String),

    #[error("commit store failed: {0}")]
    CommitStoreError(String),

    // ===== 通用错误 =====
    #[error("internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 展示给操作员的消息；空消息时使用兜底文案
    pub fn user_message(&self, fallback: &str) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
