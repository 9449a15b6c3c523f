// ==========================================
// 学员管理后台 - 配置层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置值无效 ({key}={value}): {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },

    #[error("设置文件读写失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("设置文件格式错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("设置存储锁获取失败: {0}")]
    LockError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
