// ==========================================
// 学员管理后台 - 导入接口（远端）
// ==========================================
// 预览: POST {base}/import/preview/{entity}  multipart 字段 file
// 确认: POST {base}/import/confirm/{entity}  JSON {data, originalName, size, type}
// 注意: 远端提交是否原子由服务端决定，这里不做假设
// ==========================================

use crate::api::http_client::ConsoleApiClient;
use crate::domain::import::{ConfirmRequest, ConfirmResponse, FileUpload, PreviewPayload};
use crate::domain::schema::EntityType;
use crate::importer::error::ImportResult;
use crate::importer::import_service_trait::{CommitService, PreviewService};
use async_trait::async_trait;
use tracing::{info, instrument};

pub const UPLOAD_FIELD: &str = "file";

pub fn preview_endpoint(entity: EntityType) -> String {
    format!("/import/preview/{}", entity.model_name())
}

pub fn confirm_endpoint(entity: EntityType) -> String {
    format!("/import/confirm/{}", entity.model_name())
}

#[derive(Clone)]
pub struct HttpImportService {
    client: ConsoleApiClient,
}

impl HttpImportService {
    pub fn new(client: ConsoleApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PreviewService for HttpImportService {
    #[instrument(skip(self, upload), fields(entity = %entity, file = %upload.file_name))]
    async fn preview(&self, entity: EntityType, upload: FileUpload) -> ImportResult<PreviewPayload> {
        let FileUpload {
            file_name,
            content_type,
            bytes,
        } = upload;
        let payload: PreviewPayload = self
            .client
            .post_multipart(
                &preview_endpoint(entity),
                UPLOAD_FIELD,
                &file_name,
                content_type.as_deref(),
                bytes,
            )
            .await?;
        info!(total_rows = payload.total_rows, "远端预览完成");
        Ok(payload)
    }
}

#[async_trait]
impl CommitService for HttpImportService {
    #[instrument(skip(self, request), fields(entity = %entity, rows = request.data.len()))]
    async fn confirm(&self, entity: EntityType, request: ConfirmRequest) -> ImportResult<ConfirmResponse> {
        let response: ConfirmResponse = self
            .client
            .post(&confirm_endpoint(entity), &request)
            .await?;
        info!(imported = response.imported, "远端导入完成");
        Ok(response)
    }
}
