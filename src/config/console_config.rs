// ==========================================
// 学员管理后台 - 运行配置
// ==========================================
// 来源: 环境变量（启动时先加载 .env）
// 键:
// - ACADEMY_API_BASE_URL（兼容 VITE_API_BASE_URL）
// - ACADEMY_REQUEST_TIMEOUT_SECS
// - ACADEMY_PREVIEW_ROWS
// - ACADEMY_PAGE_SIZE
// - ACADEMY_DB_PATH
// - ACADEMY_SETTINGS_PATH
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::engine::session::DEFAULT_PAGE_SIZE;
use crate::importer::local_service::DEFAULT_PREVIEW_ROWS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:4000/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const APP_DIR: &str = "academy-console";

/// 环境变量键
pub mod env_keys {
    pub const API_BASE_URL: &str = "ACADEMY_API_BASE_URL";
    pub const LEGACY_API_BASE_URL: &str = "VITE_API_BASE_URL";
    pub const REQUEST_TIMEOUT_SECS: &str = "ACADEMY_REQUEST_TIMEOUT_SECS";
    pub const PREVIEW_ROWS: &str = "ACADEMY_PREVIEW_ROWS";
    pub const PAGE_SIZE: &str = "ACADEMY_PAGE_SIZE";
    pub const DB_PATH: &str = "ACADEMY_DB_PATH";
    pub const SETTINGS_PATH: &str = "ACADEMY_SETTINGS_PATH";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsoleConfig {
    /// REST 接口根地址（不含末尾斜杠）
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    /// 本地解析时 preview 的行数
    pub preview_rows: usize,
    pub page_size: usize,
    pub db_path: PathBuf,
    pub settings_path: PathBuf,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            page_size: DEFAULT_PAGE_SIZE,
            db_path: default_data_path("academy.db"),
            settings_path: default_config_path("settings.json"),
        }
    }
}

impl ConsoleConfig {
    /// 从进程环境加载（会先尝试读取 .env）
    pub fn from_env() -> ConfigResult<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, ".env 读取失败，忽略");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载（便于测试）
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let api_base_url = get(env_keys::API_BASE_URL)
            .or_else(|| get(env_keys::LEGACY_API_BASE_URL))
            .unwrap_or(defaults.api_base_url);
        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: env_keys::API_BASE_URL.to_string(),
                value: api_base_url,
                message: "expected an http(s) URL".to_string(),
            });
        }

        let page_size: usize = parse_or(get(env_keys::PAGE_SIZE), env_keys::PAGE_SIZE, defaults.page_size)?;
        if page_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: env_keys::PAGE_SIZE.to_string(),
                value: "0".to_string(),
                message: "page size must be positive".to_string(),
            });
        }

        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            request_timeout_secs: parse_or(
                get(env_keys::REQUEST_TIMEOUT_SECS),
                env_keys::REQUEST_TIMEOUT_SECS,
                defaults.request_timeout_secs,
            )?,
            preview_rows: parse_or(get(env_keys::PREVIEW_ROWS), env_keys::PREVIEW_ROWS, defaults.preview_rows)?,
            page_size,
            db_path: get(env_keys::DB_PATH).map(PathBuf::from).unwrap_or(defaults.db_path),
            settings_path: get(env_keys::SETTINGS_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.settings_path),
        })
    }

    /// 从 JSON 文件加载（缺失的键取默认值）
    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let mut config: Self = serde_json::from_str(&raw)?;
        config.api_base_url = config.api_base_url.trim_end_matches('/').to_string();
        if config.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "pageSize".to_string(),
                value: "0".to_string(),
                message: "page size must be positive".to_string(),
            });
        }
        Ok(config)
    }

    /// 拼接接口地址
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &str, default: T) -> ConfigResult<T>
where
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.parse::<T>().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.clone(),
            message: e.to_string(),
        }),
    }
}

/// 用户数据目录下的文件路径（取不到时回退到当前目录）
fn default_data_path(file: &str) -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR).join(file))
        .unwrap_or_else(|| PathBuf::from(".").join(file))
}

/// 用户配置目录下的文件路径（取不到时回退到当前目录）
fn default_config_path(file: &str) -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(file))
        .unwrap_or_else(|| PathBuf::from(".").join(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ConsoleConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.page_size, 10);
        assert_eq!(config.preview_rows, 10);
    }

    #[test]
    fn test_legacy_base_url_and_trailing_slash() {
        let config = ConsoleConfig::from_lookup(lookup(&[(
            env_keys::LEGACY_API_BASE_URL,
            "https://api.example.org/api/",
        )]))
        .unwrap();
        assert_eq!(config.api_base_url, "https://api.example.org/api");
        assert_eq!(
            config.endpoint("/import/preview/participant"),
            "https://api.example.org/api/import/preview/participant"
        );
    }

    #[test]
    fn test_primary_key_wins_over_legacy() {
        let config = ConsoleConfig::from_lookup(lookup(&[
            (env_keys::API_BASE_URL, "http://primary"),
            (env_keys::LEGACY_API_BASE_URL, "http://legacy"),
        ]))
        .unwrap();
        assert_eq!(config.api_base_url, "http://primary");
    }

    #[test]
    fn test_json_file_with_partial_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console.json");
        std::fs::write(&path, r#"{"apiBaseUrl": "https://academy.example.org/api/", "pageSize": 25}"#).unwrap();

        let config = ConsoleConfig::from_json_file(&path).unwrap();
        assert_eq!(config.api_base_url, "https://academy.example.org/api");
        assert_eq!(config.page_size, 25);
        assert_eq!(config.preview_rows, DEFAULT_PREVIEW_ROWS);
    }

    #[test]
    fn test_invalid_values() {
        assert!(ConsoleConfig::from_lookup(lookup(&[(env_keys::PAGE_SIZE, "abc")])).is_err());
        assert!(ConsoleConfig::from_lookup(lookup(&[(env_keys::PAGE_SIZE, "0")])).is_err());
        assert!(ConsoleConfig::from_lookup(lookup(&[(env_keys::API_BASE_URL, "localhost:4000")])).is_err());
    }
}
