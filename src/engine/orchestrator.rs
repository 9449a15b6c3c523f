// ==========================================
// 学员管理后台 - 导入编排状态机
// ==========================================
// 状态: Idle → Previewing → PreviewReady → Confirming → Succeeded
//       Idle/Previewing/PreviewReady/Confirming → Failed(error)
//       任意状态 --reset--> Idle
// 约束:
// - 纯状态机，不发起网络调用；请求由调用方持票据执行后回填
// - 每次请求/重置都会推进代次，过期代次的响应直接丢弃
// - 本地校验失败不离开客户端，以会话提示呈现，与 status.error 区分
// ==========================================

use crate::domain::import::{
    ConfirmRequest, ConfirmResponse, FileDetails, ImportPhase, ImportStatus, PreviewPayload,
};
use crate::domain::schema::{fields_for, EntityType};
use crate::domain::types::EditableRecord;
use crate::engine::session::{ImportSession, DEFAULT_PAGE_SIZE};
use crate::i18n;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::row_normalizer::RowNormalizer;
use crate::importer::validator::RequiredFieldValidator;
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

/// 请求类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Preview,
    Confirm,
}

/// 请求票据（代次 + 类型），用于识别过期响应
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    generation: u64,
    kind: RequestKind,
}

impl RequestTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }
}

/// 本地确认拦截原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfirmRejection {
    NoRowsSelected,
    /// rows: 无效记录在本次提交中的位置；提交会话选中行时即会话行号
    InvalidRows { count: usize, rows: Vec<usize> },
}

impl fmt::Display for ConfirmRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfirmRejection::NoRowsSelected => write!(f, "{}", i18n::t("import.no_rows_selected")),
            ConfirmRejection::InvalidRows { count, .. } => write!(
                f,
                "{}",
                i18n::t_with_args("import.rows_missing_required", &[("count", &count.to_string())])
            ),
        }
    }
}

/// 确认闸门结果
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmGate {
    /// 通过本地校验，调用方需发起一次提交
    Ready {
        ticket: RequestTicket,
        request: ConfirmRequest,
    },
    /// 本地拦截，不发起网络调用
    Rejected(ConfirmRejection),
}

pub struct ImportOrchestrator {
    entity: EntityType,
    page_size: usize,
    phase: ImportPhase,
    status: ImportStatus,
    preview: Option<PreviewPayload>,
    session: Option<ImportSession>,
    file_details: Option<FileDetails>,
    /// file_details 是否取自上传文件（调用方显式设置的优先，不被覆盖）
    details_from_upload: bool,
    generation: u64,
}

impl ImportOrchestrator {
    pub fn new(entity: EntityType) -> Self {
        Self::with_page_size(entity, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(entity: EntityType, page_size: usize) -> Self {
        Self {
            entity,
            page_size,
            phase: ImportPhase::Idle,
            status: ImportStatus::default(),
            preview: None,
            session: None,
            file_details: None,
            details_from_upload: false,
            generation: 0,
        }
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn entity(&self) -> EntityType {
        self.entity
    }

    pub fn phase(&self) -> &ImportPhase {
        &self.phase
    }

    pub fn status(&self) -> &ImportStatus {
        &self.status
    }

    pub fn preview_data(&self) -> Option<&PreviewPayload> {
        self.preview.as_ref()
    }

    pub fn session(&self) -> Option<&ImportSession> {
        self.session.as_ref()
    }

    pub fn file_details(&self) -> Option<&FileDetails> {
        self.file_details.as_ref()
    }

    /// 可编辑会话（请求进行中不可编辑）
    pub fn session_mut(&mut self) -> ImportResult<&mut ImportSession> {
        if self.phase.is_in_flight() {
            return Err(self.invalid_transition("edit"));
        }
        self.session.as_mut().ok_or(ImportError::NoActiveSession)
    }

    // ==========================================
    // 文件元信息
    // ==========================================

    pub fn set_file_details(&mut self, details: FileDetails) {
        self.file_details = Some(details);
        self.details_from_upload = false;
    }

    /// 用上传文件的信息填充；仅当调用方未显式设置时生效，每次新上传都会刷新
    pub(crate) fn fill_file_details_from_upload(&mut self, details: FileDetails) {
        if self.file_details.is_none() || self.details_from_upload {
            self.file_details = Some(details);
            self.details_from_upload = true;
        }
    }

    fn clear_file_details(&mut self) {
        self.file_details = None;
        self.details_from_upload = false;
    }

    // ==========================================
    // 预览
    // ==========================================

    /// 开始预览：丢弃旧会话，进入 Previewing
    pub fn begin_preview(&mut self) -> ImportResult<RequestTicket> {
        if self.phase.is_in_flight() {
            return Err(self.invalid_transition("preview"));
        }

        self.generation += 1;
        self.preview = None;
        self.session = None;
        self.phase = ImportPhase::Previewing;
        self.status.loading = true;
        self.status.error = None;
        self.status.success = false;

        info!(entity = %self.entity, generation = self.generation, "开始预览");
        Ok(self.ticket(RequestKind::Preview))
    }

    /// 回填预览结果；返回 false 表示响应已过期被丢弃
    pub fn complete_preview(
        &mut self,
        ticket: RequestTicket,
        result: ImportResult<PreviewPayload>,
    ) -> bool {
        if !self.accepts(ticket, RequestKind::Preview) {
            return false;
        }

        self.status.loading = false;
        match result {
            Ok(payload) => {
                let session = ImportSession::from_payload(self.entity, &payload, self.page_size);
                info!(
                    entity = %self.entity,
                    total_rows = payload.total_rows,
                    records = session.len(),
                    mapped = session.mapping().len(),
                    "预览完成"
                );
                self.session = Some(session);
                self.preview = Some(payload);
                self.phase = ImportPhase::PreviewReady;
            }
            Err(err) => {
                let message = err.user_message(&i18n::t("import.preview_failed"));
                warn!(entity = %self.entity, error = %message, "预览失败");
                self.status.error = Some(message.clone());
                self.phase = ImportPhase::Failed(message);
            }
        }
        true
    }

    // ==========================================
    // 确认
    // ==========================================

    /// 确认闸门
    ///
    /// # 参数
    /// - edited_subset: 调用方显式给出的提交记录；None 时取会话中选中的行
    ///
    /// # 返回
    /// - Ok(Ready): 通过校验，进入 Confirming
    /// - Ok(Rejected): 本地拦截，状态不变，会话提示已设置
    /// - Err: 当前状态不允许确认
    pub fn begin_confirm(
        &mut self,
        edited_subset: Option<Vec<EditableRecord>>,
    ) -> ImportResult<ConfirmGate> {
        let can_confirm = matches!(self.phase, ImportPhase::PreviewReady | ImportPhase::Failed(_));
        if !can_confirm || self.session.is_none() {
            return Err(self.invalid_transition("confirm"));
        }

        let entity = self.entity;
        let fields = fields_for(entity);
        let Some(session) = self.session.as_mut() else {
            return Err(ImportError::NoActiveSession);
        };

        let (records, report) = match edited_subset {
            Some(records) => {
                // 显式提交的记录同样只能携带 schema 字段
                let records = records
                    .iter()
                    .map(|record| RowNormalizer.conform_record(record, entity, fields))
                    .collect::<ImportResult<Vec<_>>>()?;
                let report = RequiredFieldValidator.validate_all(&records, fields);
                (records, report)
            }
            None => (session.selected_records(), session.validation_report()),
        };

        let rejection = if records.is_empty() {
            Some(ConfirmRejection::NoRowsSelected)
        } else if !report.is_clean() {
            Some(ConfirmRejection::InvalidRows {
                count: report.invalid_count(),
                rows: report.invalid.iter().map(|issue| issue.index).collect(),
            })
        } else {
            None
        };

        if let Some(rejection) = rejection {
            warn!(entity = %self.entity, rejection = %rejection, "确认被本地校验拦截");
            session.set_banner(rejection.to_string());
            return Ok(ConfirmGate::Rejected(rejection));
        }

        session.clear_banner();
        let details = self.file_details.clone().unwrap_or_default();
        let request = ConfirmRequest::new(records, &details);

        self.generation += 1;
        self.phase = ImportPhase::Confirming;
        self.status.loading = true;
        self.status.error = None;

        info!(
            entity = %self.entity,
            generation = self.generation,
            rows = request.data.len(),
            "开始提交"
        );
        Ok(ConfirmGate::Ready {
            ticket: self.ticket(RequestKind::Confirm),
            request,
        })
    }

    /// 回填提交结果；返回 false 表示响应已过期被丢弃
    pub fn complete_confirm(
        &mut self,
        ticket: RequestTicket,
        result: ImportResult<ConfirmResponse>,
    ) -> bool {
        if !self.accepts(ticket, RequestKind::Confirm) {
            return false;
        }

        match result {
            Ok(response) => {
                info!(entity = %self.entity, imported = response.imported, "导入成功");
                self.status = ImportStatus {
                    loading: false,
                    error: None,
                    success: true,
                    imported_count: response.imported,
                };
                // 已确认的数据不在客户端保留
                self.preview = None;
                self.session = None;
                self.clear_file_details();
                self.phase = ImportPhase::Succeeded;
            }
            Err(err) => {
                let message = err.user_message(&i18n::t("import.confirm_failed"));
                warn!(entity = %self.entity, error = %message, "提交失败，保留会话以便重试");
                self.status.loading = false;
                self.status.error = Some(message.clone());
                self.phase = ImportPhase::Failed(message);
            }
        }
        true
    }

    // ==========================================
    // 列重映射
    // ==========================================

    pub fn remap_field(&mut self, field_key: &str, header: Option<&str>) -> ImportResult<()> {
        if self.phase.is_in_flight() {
            return Err(self.invalid_transition("remap"));
        }
        let (Some(preview), Some(session)) = (self.preview.as_ref(), self.session.as_mut()) else {
            return Err(ImportError::NoActiveSession);
        };
        session.remap_field(field_key, header, &preview.full_data)
    }

    // ==========================================
    // 重置
    // ==========================================

    /// 回到 Idle，丢弃会话、预览与文件信息；进行中的请求响应将被丢弃
    pub fn reset(&mut self) {
        self.generation += 1;
        self.phase = ImportPhase::Idle;
        self.status = ImportStatus::default();
        self.preview = None;
        self.session = None;
        self.clear_file_details();
        info!(entity = %self.entity, generation = self.generation, "导入会话已重置");
    }

    fn ticket(&self, kind: RequestKind) -> RequestTicket {
        RequestTicket {
            generation: self.generation,
            kind,
        }
    }

    fn accepts(&self, ticket: RequestTicket, kind: RequestKind) -> bool {
        let expected_phase = match kind {
            RequestKind::Preview => ImportPhase::Previewing,
            RequestKind::Confirm => ImportPhase::Confirming,
        };
        let current = ticket.kind == kind
            && ticket.generation == self.generation
            && self.phase == expected_phase;
        if !current {
            warn!(
                entity = %self.entity,
                ticket_generation = ticket.generation,
                generation = self.generation,
                phase = self.phase.name(),
                "丢弃过期响应"
            );
        }
        current
    }

    fn invalid_transition(&self, action: &str) -> ImportError {
        ImportError::InvalidTransition {
            from: self.phase.name().to_string(),
            action: action.to_string(),
        }
    }
}
