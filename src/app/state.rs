// ==========================================
// 学员管理后台 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态
// - 配置 / 设置存储
// - 预览与提交服务（本地或远端）
// - 每种实体一个导入控制器
// ==========================================

use crate::api::{ConsoleApiClient, HttpImportService, ParticipantApi};
use crate::config::{ConsoleConfig, SettingsStore};
use crate::domain::schema::EntityType;
use crate::engine::ImportController;
use crate::exporter::ParticipantSource;
use crate::importer::{CommitService, LocalPreviewService, PreviewService};
use crate::repository::{ImportStoreRepository, SqliteCommitService};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// 服务模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceMode {
    /// 本地解析 + SQLite 提交
    #[default]
    Local,
    /// 远端 REST 服务
    Remote,
}

impl FromStr for ServiceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(ServiceMode::Local),
            "remote" | "http" => Ok(ServiceMode::Remote),
            other => Err(format!("未知服务模式: {}", other)),
        }
    }
}

/// 应用状态
pub struct AppState {
    pub config: ConsoleConfig,
    pub settings: Arc<dyn SettingsStore>,
    pub mode: ServiceMode,

    /// 本地存储（仅 Local 模式）
    pub store: Option<Arc<ImportStoreRepository>>,

    /// 远端客户端（仅 Remote 模式）
    pub api_client: Option<ConsoleApiClient>,

    participant_controller: ImportController,
    program_controller: ImportController,
    module_controller: ImportController,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(
        config: ConsoleConfig,
        settings: Arc<dyn SettingsStore>,
        mode: ServiceMode,
    ) -> Result<Self, String> {
        tracing::info!(mode = ?mode, "初始化AppState");

        match mode {
            ServiceMode::Local => {
                tracing::info!("使用数据库: {}", config.db_path.display());
                let store = Arc::new(
                    ImportStoreRepository::new(&config.db_path)
                        .map_err(|e| format!("无法打开数据库: {}", e))?,
                );
                let preview: Arc<dyn PreviewService> =
                    Arc::new(LocalPreviewService::new(config.preview_rows));
                let commit: Arc<dyn CommitService> =
                    Arc::new(SqliteCommitService::new(Arc::clone(&store)));

                let mut state = Self::with_services(config, settings, preview, commit);
                state.mode = ServiceMode::Local;
                state.store = Some(store);
                Ok(state)
            }
            ServiceMode::Remote => {
                tracing::info!("使用远端服务: {}", config.api_base_url);
                let client = ConsoleApiClient::new(&config, Arc::clone(&settings))
                    .map_err(|e| format!("无法创建 HTTP 客户端: {}", e))?;
                let service = Arc::new(HttpImportService::new(client.clone()));
                let preview: Arc<dyn PreviewService> = service.clone();
                let commit: Arc<dyn CommitService> = service;

                let mut state = Self::with_services(config, settings, preview, commit);
                state.mode = ServiceMode::Remote;
                state.api_client = Some(client);
                Ok(state)
            }
        }
    }

    /// 使用给定服务构建（测试注入 mock）
    pub fn with_services(
        config: ConsoleConfig,
        settings: Arc<dyn SettingsStore>,
        preview: Arc<dyn PreviewService>,
        commit: Arc<dyn CommitService>,
    ) -> Self {
        let controller = |entity| {
            ImportController::new(entity, config.page_size, Arc::clone(&preview), Arc::clone(&commit))
        };
        let participant_controller = controller(EntityType::Participant);
        let program_controller = controller(EntityType::Program);
        let module_controller = controller(EntityType::Module);

        Self {
            config,
            settings,
            mode: ServiceMode::Local,
            store: None,
            api_client: None,
            participant_controller,
            program_controller,
            module_controller,
        }
    }

    pub fn controller(&self, entity: EntityType) -> &ImportController {
        match entity {
            EntityType::Participant => &self.participant_controller,
            EntityType::Program => &self.program_controller,
            EntityType::Module => &self.module_controller,
        }
    }

    /// 学员导出数据来源（远端优先，其次本地库）
    pub fn participant_source(&self) -> Option<Box<dyn ParticipantSource>> {
        if let Some(client) = &self.api_client {
            return Some(Box::new(ParticipantApi::new(client.clone())));
        }
        self.store
            .as_ref()
            .map(|store| Box::new(Arc::clone(store)) as Box<dyn ParticipantSource>)
    }
}
