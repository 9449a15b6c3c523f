// ==========================================
// 学员管理后台 - 导出数据来源
// ==========================================
// 实现者:
// - ParticipantApi（远端 GET /participants）
// - ImportStoreRepository（本地 SQLite）
// ==========================================

use crate::api::participant_api::ParticipantApi;
use crate::exporter::error::{ExportError, ExportResult};
use crate::exporter::participant_csv::write_participants_csv;
use crate::repository::import_store::ImportStoreRepository;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, instrument};

#[async_trait]
pub trait ParticipantSource: Send + Sync {
    async fn fetch_participants(&self) -> ExportResult<Vec<Value>>;
}

#[async_trait]
impl ParticipantSource for ParticipantApi {
    async fn fetch_participants(&self) -> ExportResult<Vec<Value>> {
        Ok(self.list_participants().await?)
    }
}

#[async_trait]
impl ParticipantSource for Arc<ImportStoreRepository> {
    async fn fetch_participants(&self) -> ExportResult<Vec<Value>> {
        let repo = Arc::clone(self);
        tokio::task::spawn_blocking(move || repo.list_participants())
            .await
            .map_err(|e| ExportError::InternalError(format!("export task failed: {}", e)))?
            .map_err(ExportError::from)
    }
}

/// 拉取学员并写出 CSV，返回导出数量
#[instrument(skip(source, path), fields(path = %path.as_ref().display()))]
pub async fn export_participants(
    source: &dyn ParticipantSource,
    path: impl AsRef<Path> + Send,
) -> ExportResult<usize> {
    let participants = source.fetch_participants().await?;
    let result = write_participants_csv(&participants, path);
    if let Err(e) = &result {
        error!(error = %e, "学员导出失败");
    }
    result
}
