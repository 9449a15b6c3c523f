// ==========================================
// 学员管理后台 - 本地文件解析服务
// ==========================================
// 职责: 在本机完成 /import/preview 的等价处理（离线导入 / 测试）
// 输出: 与远端接口一致的 PreviewPayload
// ==========================================

use crate::domain::import::{FileUpload, PreviewPayload};
use crate::domain::schema::EntityType;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::import_service_trait::{FileParser, PreviewService};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 预览行数默认值
pub const DEFAULT_PREVIEW_ROWS: usize = 10;

pub struct LocalPreviewService {
    parser: Arc<dyn FileParser>,
    preview_rows: usize,
}

impl LocalPreviewService {
    pub fn new(preview_rows: usize) -> Self {
        Self::with_parser(Arc::new(UniversalFileParser), preview_rows)
    }

    pub fn with_parser(parser: Arc<dyn FileParser>, preview_rows: usize) -> Self {
        Self {
            parser,
            preview_rows,
        }
    }
}

impl Default for LocalPreviewService {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_ROWS)
    }
}

#[async_trait]
impl PreviewService for LocalPreviewService {
    #[instrument(skip(self, upload), fields(file = %upload.file_name, bytes = upload.bytes.len()))]
    async fn preview(&self, entity: EntityType, upload: FileUpload) -> ImportResult<PreviewPayload> {
        let extension = upload.extension();
        if !UniversalFileParser::is_supported(&extension) {
            warn!(extension = %extension, "不支持的文件格式");
            return Err(ImportError::UnsupportedFormat(extension));
        }

        // 解析属于 CPU 密集操作，放到阻塞线程池
        let parser = Arc::clone(&self.parser);
        let full_data = tokio::task::spawn_blocking(move || parser.parse_to_rows(&upload))
            .await
            .map_err(|e| ImportError::InternalError(format!("parser task failed: {}", e)))??;

        let preview = full_data.iter().take(self.preview_rows).cloned().collect();
        info!(entity = %entity, total_rows = full_data.len(), "本地解析完成");

        Ok(PreviewPayload {
            model: entity.model_name().to_string(),
            total_rows: full_data.len(),
            preview,
            full_data,
        })
    }
}
