// ==========================================
// 学员管理后台 - 学员接口
// ==========================================
// GET {base}/participants
// 响应可能是数组，也可能是 {results: [...]}；其他形状视为空列表
// ==========================================

use crate::api::error::ApiResult;
use crate::api::http_client::ConsoleApiClient;
use serde_json::Value;
use tracing::{debug, instrument};

pub const PARTICIPANTS_ENDPOINT: &str = "/participants";

#[derive(Clone)]
pub struct ParticipantApi {
    client: ConsoleApiClient,
}

impl ParticipantApi {
    pub fn new(client: ConsoleApiClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn list_participants(&self) -> ApiResult<Vec<Value>> {
        let body: Value = self.client.get(PARTICIPANTS_ENDPOINT).await?;
        let participants = extract_participant_list(body);
        debug!(count = participants.len(), "学员列表已获取");
        Ok(participants)
    }
}

/// 从响应体中取出学员数组
pub fn extract_participant_list(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_accepts_both_shapes() {
        assert_eq!(extract_participant_list(json!([{"id": "1"}])).len(), 1);
        assert_eq!(
            extract_participant_list(json!({"results": [{"id": "1"}, {"id": "2"}], "total": 2})).len(),
            2
        );
        assert!(extract_participant_list(json!({"results": "nope"})).is_empty());
        assert!(extract_participant_list(Value::Null).is_empty());
    }
}
