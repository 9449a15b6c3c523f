// ==========================================
// 学员管理后台 - 会话设置存储
// ==========================================
// 职责: 持久化少量键值设置（登录令牌、管理员信息、当前标签页、主题）
// 实现者:
// - MemorySettingsStore（测试 / 一次性命令）
// - JsonFileSettingsStore（写穿到 JSON 文件）
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// 已知设置键
pub mod settings_keys {
    pub const TOKEN: &str = "token";
    pub const ADMIN: &str = "admin";
    pub const ACTIVE_TAB: &str = "activeTab";
    pub const THEME: &str = "theme";
}

// ==========================================
// SettingsStore Trait
// ==========================================
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> ConfigResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> ConfigResult<()>;

    fn remove(&self, key: &str) -> ConfigResult<()>;

    /// 登录令牌（空字符串视为未登录）
    fn token(&self) -> ConfigResult<Option<String>> {
        Ok(self
            .get(settings_keys::TOKEN)?
            .filter(|token| !token.trim().is_empty()))
    }

    /// 清除登录态（401/403 时调用）
    fn clear_session(&self) -> ConfigResult<()> {
        self.remove(settings_keys::TOKEN)?;
        self.remove(settings_keys::ADMIN)
    }
}

fn lock_entries(
    entries: &Mutex<IndexMap<String, String>>,
) -> ConfigResult<MutexGuard<'_, IndexMap<String, String>>> {
    entries
        .lock()
        .map_err(|e| ConfigError::LockError(e.to_string()))
}

// ==========================================
// MemorySettingsStore
// ==========================================
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    entries: Mutex<IndexMap<String, String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> ConfigResult<Option<String>> {
        Ok(lock_entries(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ConfigResult<()> {
        lock_entries(&self.entries)?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> ConfigResult<()> {
        lock_entries(&self.entries)?.shift_remove(key);
        Ok(())
    }
}

// ==========================================
// JsonFileSettingsStore
// ==========================================
#[derive(Debug)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
    entries: Mutex<IndexMap<String, String>>,
}

impl JsonFileSettingsStore {
    /// 打开设置文件（不存在时视为空；格式损坏时告警并以空设置启动）
    pub fn open(path: impl Into<PathBuf>) -> ConfigResult<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                IndexMap::new()
            } else {
                match serde_json::from_str::<IndexMap<String, String>>(&raw) {
                    Ok(entries) => entries,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "设置文件格式错误，以空设置启动");
                        IndexMap::new()
                    }
                }
            }
        } else {
            IndexMap::new()
        };
        debug!(path = %path.display(), count = entries.len(), "设置已加载");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &IndexMap<String, String>) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn get(&self, key: &str) -> ConfigResult<Option<String>> {
        Ok(lock_entries(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ConfigResult<()> {
        let mut entries = lock_entries(&self.entries)?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> ConfigResult<()> {
        let mut entries = lock_entries(&self.entries)?;
        if entries.shift_remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }
}
