// ==========================================
// 学员管理后台 - API层错误类型
// ==========================================
// 职责: HTTP 传输 / 状态码 / 登录过期 / 响应解码错误
// 转换: ApiError -> ImportError::Remote（供导入状态机显示）
// ==========================================

use crate::config::error::ConfigError;
use crate::i18n;
use crate::importer::error::ImportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// 401 / 403：登录态已清除
    #[error("{}", i18n::t("api.session_expired"))]
    SessionExpired,

    /// 服务端返回的错误消息（响应体 message 字段）
    #[error("{message}")]
    Server { status: u16, message: String },

    /// 非 2xx 且响应体不含 message
    #[error("{}", request_failed_message(.reason))]
    Status { status: u16, reason: String },

    #[error("网络请求失败: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("响应解析失败: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("无效请求: {0}")]
    InvalidRequest(String),

    #[error("设置存储错误: {0}")]
    Settings(#[from] ConfigError),
}

impl ApiError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } | ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

fn request_failed_message(reason: &str) -> String {
    i18n::t_with_args("api.request_failed", &[("status", reason)])
}

// ==========================================
// 转换到导入层错误
// ==========================================
impl From<ApiError> for ImportError {
    fn from(err: ApiError) -> Self {
        ImportError::Remote(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_passes_through_to_import_error() {
        let err: ImportError = ApiError::Server {
            status: 409,
            message: "Email already exists".to_string(),
        }
        .into();
        assert_eq!(err.user_message("Failed to confirm import"), "Email already exists");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::SessionExpired.status_code(), None);
        assert_eq!(
            ApiError::Status {
                status: 500,
                reason: "Internal Server Error".to_string()
            }
            .status_code(),
            Some(500)
        );
    }

    #[test]
    fn test_english_messages() {
        let _guard = i18n::lock_locale();
        i18n::set_locale("en");
        assert_eq!(
            ApiError::SessionExpired.to_string(),
            "Session expired. Please login again."
        );
        assert_eq!(
            ApiError::Status {
                status: 502,
                reason: "Bad Gateway".to_string()
            }
            .to_string(),
            "Request failed: Bad Gateway"
        );
    }
}
