// ==========================================
// 学员管理后台 - HTTP 客户端
// ==========================================
// 职责:
// - 拼接接口地址、附带 Bearer 令牌
// - JSON 请求（GET / POST）与 multipart 上传
// - 统一响应解释：401/403 清除登录态；错误体 message 透传
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::console_config::ConsoleConfig;
use crate::config::settings_store::SettingsStore;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const USER_AGENT: &str = concat!("academy-console/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct ConsoleApiClient {
    base_url: String,
    http: reqwest::Client,
    settings: Arc<dyn SettingsStore>,
}

impl ConsoleApiClient {
    pub fn new(config: &ConsoleConfig, settings: Arc<dyn SettingsStore>) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self::with_client(config.api_base_url.clone(), http, settings))
    }

    /// 使用自定义 reqwest::Client
    pub fn with_client(
        base_url: impl Into<String>,
        http: reqwest::Client,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            settings,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn settings(&self) -> &Arc<dyn SettingsStore> {
        &self.settings
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    fn request(&self, method: Method, endpoint: &str) -> ApiResult<RequestBuilder> {
        let builder = self.http.request(method, self.url(endpoint));
        let builder = match self.settings.token()? {
            Some(token) => {
                let value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| ApiError::InvalidRequest(format!("invalid token: {}", e)))?;
                builder.header(AUTHORIZATION, value)
            }
            None => builder,
        };
        Ok(builder)
    }

    async fn send(&self, builder: RequestBuilder) -> ApiResult<Value> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "收到响应");

        let result = interpret_response(status, &body);
        if let Err(ApiError::SessionExpired) = &result {
            warn!(status = status.as_u16(), "登录已过期，清除本地令牌");
            self.settings.clear_session()?;
        }
        result
    }

    // ==========================================
    // JSON 请求
    // ==========================================

    #[instrument(skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResult<T> {
        let value = self.send(self.request(Method::GET, endpoint)?).await?;
        Ok(serde_json::from_value(value)?)
    }

    #[instrument(skip(self, body))]
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.send_json(Method::POST, endpoint, body).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: &B,
    ) -> ApiResult<T> {
        let value = self.send(self.request(method, endpoint)?.json(body)).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// multipart 上传单个文件
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        field: &str,
        file_name: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> ApiResult<T> {
        let mut part = Part::bytes(bytes).file_name(file_name.to_string());
        if let Some(mime) = content_type {
            part = part
                .mime_str(mime)
                .map_err(|e| ApiError::InvalidRequest(format!("invalid content type: {}", e)))?;
        }
        let form = Form::new().part(field.to_string(), part);
        let value = self
            .send(self.request(Method::POST, endpoint)?.multipart(form))
            .await?;
        Ok(serde_json::from_value(value)?)
    }
}

// ==========================================
// 响应解释（纯函数）
// ==========================================

/// 根据状态码与响应体得到 JSON 结果
///
/// - 2xx: 空响应体视为 null
/// - 401 / 403: SessionExpired
/// - 其他: 响应体 message 字段优先，否则 "Request failed: <reason>"
pub fn interpret_response(status: StatusCode, body: &str) -> ApiResult<Value> {
    if status.is_success() {
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        return Ok(serde_json::from_str(body)?);
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ApiError::SessionExpired);
    }

    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .filter(|m| !m.trim().is_empty());

    match message {
        Some(message) => Err(ApiError::Server {
            status: status.as_u16(),
            message,
        }),
        None => Err(ApiError::Status {
            status: status.as_u16(),
            reason: status
                .canonical_reason()
                .unwrap_or("Unknown Status")
                .to_string(),
        }),
    }
}
