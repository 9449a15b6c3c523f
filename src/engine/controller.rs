// ==========================================
// 学员管理后台 - 导入控制器（异步驱动）
// ==========================================
// 职责: 持有状态机与外部协作方，串起 预览 / 确认 两次网络调用
// 约束:
// - 状态锁从不跨 .await 持有
// - 每次 preview_file 恰好一次预览调用；每次通过闸门的确认恰好一次提交调用
// - 无自动重试
// ==========================================

use crate::domain::import::{FileDetails, FileUpload, ImportPhase, ImportStatus, PreviewPayload};
use crate::domain::schema::EntityType;
use crate::domain::types::EditableRecord;
use crate::engine::orchestrator::{ConfirmGate, ConfirmRejection, ImportOrchestrator};
use crate::engine::session::ImportSession;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::import_service_trait::{CommitService, PreviewService};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, instrument};

/// 确认操作结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfirmOutcome {
    /// 提交成功
    Committed { imported: usize },
    /// 本地校验拦截（未发起网络调用）
    Rejected { rejection: ConfirmRejection, message: String },
    /// 提交失败（会话保留）
    Failed { message: String },
    /// 响应到达前会话已被重置，结果被丢弃
    Discarded,
}

#[derive(Clone)]
pub struct ImportController {
    entity: EntityType,
    state: Arc<Mutex<ImportOrchestrator>>,
    preview_service: Arc<dyn PreviewService>,
    commit_service: Arc<dyn CommitService>,
}

impl ImportController {
    pub fn new(
        entity: EntityType,
        page_size: usize,
        preview_service: Arc<dyn PreviewService>,
        commit_service: Arc<dyn CommitService>,
    ) -> Self {
        Self {
            entity,
            state: Arc::new(Mutex::new(ImportOrchestrator::with_page_size(entity, page_size))),
            preview_service,
            commit_service,
        }
    }

    pub fn entity(&self) -> EntityType {
        self.entity
    }

    fn lock(&self) -> ImportResult<MutexGuard<'_, ImportOrchestrator>> {
        self.state
            .lock()
            .map_err(|e| ImportError::InternalError(format!("state lock poisoned: {}", e)))
    }

    // ==========================================
    // UI 边界
    // ==========================================

    /// 上传文件并生成可编辑会话
    #[instrument(skip(self, upload), fields(entity = %self.entity, file = %upload.file_name))]
    pub async fn preview_file(&self, upload: FileUpload) -> ImportResult<ImportStatus> {
        let ticket = {
            let mut state = self.lock()?;
            let ticket = state.begin_preview()?;
            state.fill_file_details_from_upload(upload.details());
            ticket
        };

        let result = self.preview_service.preview(self.entity, upload).await;

        let mut state = self.lock()?;
        if !state.complete_preview(ticket, result) {
            debug!("预览响应已过期");
        }
        Ok(state.status().clone())
    }

    /// 确认导入
    ///
    /// # 参数
    /// - edited_subset: 显式提交的记录；None 时提交会话中选中的行
    #[instrument(skip(self, edited_subset), fields(entity = %self.entity))]
    pub async fn confirm_import(
        &self,
        edited_subset: Option<Vec<EditableRecord>>,
    ) -> ImportResult<ConfirmOutcome> {
        let gate = self.lock()?.begin_confirm(edited_subset)?;
        let (ticket, request) = match gate {
            ConfirmGate::Ready { ticket, request } => (ticket, request),
            ConfirmGate::Rejected(rejection) => {
                let message = rejection.to_string();
                return Ok(ConfirmOutcome::Rejected { rejection, message });
            }
        };

        let result = self.commit_service.confirm(self.entity, request).await;

        let mut state = self.lock()?;
        if !state.complete_confirm(ticket, result) {
            return Ok(ConfirmOutcome::Discarded);
        }
        let outcome = match state.phase() {
            ImportPhase::Succeeded => ConfirmOutcome::Committed {
                imported: state.status().imported_count,
            },
            ImportPhase::Failed(message) => ConfirmOutcome::Failed {
                message: message.clone(),
            },
            other => {
                return Err(ImportError::InternalError(format!(
                    "unexpected phase after confirm: {}",
                    other.name()
                )))
            }
        };
        Ok(outcome)
    }

    pub fn reset(&self) -> ImportResult<()> {
        self.lock()?.reset();
        Ok(())
    }

    pub fn set_file_details(&self, details: FileDetails) -> ImportResult<()> {
        self.lock()?.set_file_details(details);
        Ok(())
    }

    pub fn status(&self) -> ImportResult<ImportStatus> {
        Ok(self.lock()?.status().clone())
    }

    pub fn phase(&self) -> ImportResult<ImportPhase> {
        Ok(self.lock()?.phase().clone())
    }

    pub fn preview_data(&self) -> ImportResult<Option<PreviewPayload>> {
        Ok(self.lock()?.preview_data().cloned())
    }

    pub fn file_details(&self) -> ImportResult<Option<FileDetails>> {
        Ok(self.lock()?.file_details().cloned())
    }

    /// 在同一把锁内读取完整状态（用于生成快照）
    pub fn inspect<R>(&self, f: impl FnOnce(&ImportOrchestrator) -> R) -> ImportResult<R> {
        let state = self.lock()?;
        Ok(f(&state))
    }

    // ==========================================
    // 会话操作
    // ==========================================

    /// 在可编辑会话上执行操作
    pub fn with_session<R>(
        &self,
        f: impl FnOnce(&mut ImportSession) -> ImportResult<R>,
    ) -> ImportResult<R> {
        let mut state = self.lock()?;
        f(state.session_mut()?)
    }

    /// 只读访问会话
    pub fn read_session<R>(&self, f: impl FnOnce(&ImportSession) -> R) -> ImportResult<R> {
        let state = self.lock()?;
        state.session().map(f).ok_or(ImportError::NoActiveSession)
    }

    pub fn remap_field(&self, field_key: &str, header: Option<&str>) -> ImportResult<()> {
        self.lock()?.remap_field(field_key, header)
    }
}
