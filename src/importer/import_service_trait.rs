// ==========================================
// 学员管理后台 - 导入外部协作方 Trait
// ==========================================
// 职责: 定义文件解析服务 / 提交服务接口（不包含实现）
// 实现者:
// - HttpImportService（远端 REST 接口）
// - LocalPreviewService（本地 csv/calamine 解析）
// - SqliteCommitService（本地 SQLite 落库）
// ==========================================

use crate::domain::import::{ConfirmRequest, ConfirmResponse, FileUpload, PreviewPayload};
use crate::domain::schema::EntityType;
use crate::domain::types::SourceRow;
use crate::importer::error::ImportResult;
use async_trait::async_trait;

// ==========================================
// PreviewService Trait
// ==========================================
// 对应接口: POST /import/preview/{entity}
#[async_trait]
pub trait PreviewService: Send + Sync {
    /// 上传文件并获取解析结果
    ///
    /// # 返回
    /// - Ok(PreviewPayload): { model, totalRows, preview, fullData }
    /// - Err: 解析失败 / 网络失败（消息直接展示给操作员）
    async fn preview(&self, entity: EntityType, upload: FileUpload) -> ImportResult<PreviewPayload>;
}

// ==========================================
// CommitService Trait
// ==========================================
// 对应接口: POST /import/confirm/{entity}
// 说明: 提交是否原子由实现方决定，调用方不做假设
#[async_trait]
pub trait CommitService: Send + Sync {
    /// 提交选中且校验通过的记录
    ///
    /// # 返回
    /// - Ok(ConfirmResponse): { imported }
    /// - Err: 提交失败（会话保留，允许操作员重试）
    async fn confirm(&self, entity: EntityType, request: ConfirmRequest)
        -> ImportResult<ConfirmResponse>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 本地解析（CSV / Excel / ODS）
pub trait FileParser: Send + Sync {
    /// 解析为有序行记录
    fn parse_to_rows(&self, upload: &FileUpload) -> ImportResult<Vec<SourceRow>>;
}
