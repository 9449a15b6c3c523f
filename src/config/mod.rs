// ==========================================
// 学员管理后台 - 配置层
// ==========================================
// 职责:
// - 运行配置（环境变量 / .env）
// - 会话级设置存储（token / admin / activeTab / theme）
// ==========================================

pub mod console_config;
pub mod error;
pub mod settings_store;

pub use console_config::{env_keys, ConsoleConfig, DEFAULT_API_BASE_URL};
pub use error::{ConfigError, ConfigResult};
pub use settings_store::{settings_keys, JsonFileSettingsStore, MemorySettingsStore, SettingsStore};
