// ==========================================
// 学员管理后台 - 导出错误类型
// ==========================================

use crate::api::error::ApiError;
use crate::i18n;
use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("{}", i18n::t("export.no_participants"))]
    NoParticipants,

    #[error("CSV 写入失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("文件写入失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("{0}")]
    Repository(#[from] RepositoryError),

    #[error("internal error: {0}")]
    InternalError(String),
}

impl ExportError {
    /// 操作员可见消息：空列表单独提示，其余统一为失败提示
    pub fn user_message(&self) -> String {
        match self {
            ExportError::NoParticipants => self.to_string(),
            _ => i18n::t("export.failed"),
        }
    }
}

pub type ExportResult<T> = Result<T, ExportError>;
