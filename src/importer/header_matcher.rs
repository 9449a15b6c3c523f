// ==========================================
// 学员管理后台 - 表头匹配器
// ==========================================
// 职责: 源文件表头 → Schema 字段 的自动映射
// 规则: (a) 归一化后与字段标签完全相等
//       (b) 归一化后的表头包含字段 key
//       (a) 优先于 (b)，同一表头最多被一个字段占用
// ==========================================

use crate::domain::schema::SchemaField;
use crate::domain::types::HeaderMapping;
use tracing::debug;

/// 归一化: 小写 + 仅保留字母数字
pub fn normalize_header(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

pub struct HeaderMatcher;

impl HeaderMatcher {
    /// 计算表头映射
    ///
    /// # 参数
    /// - headers: 首行表头（文件列顺序）
    /// - fields: 目标字段（schema 顺序）
    ///
    /// # 返回
    /// - HeaderMapping（未匹配字段不出现，不会失败）
    pub fn match_headers(&self, headers: &[String], fields: &[SchemaField]) -> HeaderMapping {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
        let mut mapping = HeaderMapping::new();

        // 第一轮: 标签精确匹配
        for field in fields {
            let label = normalize_header(field.label);
            if label.is_empty() {
                continue;
            }
            if let Some(idx) = Self::first_unclaimed(headers, &normalized, &mapping, |h| h == label) {
                mapping.insert(field.key, headers[idx].clone());
            }
        }

        // 第二轮: key 包含匹配（仅处理第一轮未命中的字段）
        for field in fields {
            if mapping.header_for(field.key).is_some() {
                continue;
            }
            let key = normalize_header(field.key);
            if key.is_empty() {
                continue;
            }
            if let Some(idx) =
                Self::first_unclaimed(headers, &normalized, &mapping, |h| h.contains(&key))
            {
                mapping.insert(field.key, headers[idx].clone());
            }
        }

        debug!(
            matched = mapping.len(),
            fields = fields.len(),
            headers = headers.len(),
            "表头匹配完成"
        );
        mapping
    }

    fn first_unclaimed<F>(
        headers: &[String],
        normalized: &[String],
        mapping: &HeaderMapping,
        predicate: F,
    ) -> Option<usize>
    where
        F: Fn(&str) -> bool,
    {
        normalized
            .iter()
            .enumerate()
            .find(|(idx, h)| !h.is_empty() && predicate(h) && !mapping.is_claimed(&headers[*idx]))
            .map(|(idx, _)| idx)
    }
}
