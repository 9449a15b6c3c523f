// ==========================================
// 学员管理后台 - 领域类型定义
// ==========================================
// 职责: 导入管道中流转的行/单元格/映射类型
// 约束: 源文件行是动态表头，这里收敛为封闭的单元格联合类型
// ==========================================

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

// ==========================================
// 单元格值 (Cell Value)
// ==========================================
// 单元格收敛为 文本 / 数字 / 空；其余 JSON 标量（布尔等）按文本承载
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Null,
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(CellValue::from_json)
    }
}

impl CellValue {
    /// JSON 值 → 单元格（不会失败）
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => CellValue::Null,
            Value::String(s) => CellValue::Text(s),
            Value::Number(n) => match n.as_f64() {
                Some(f) => CellValue::Number(f),
                None => CellValue::Text(n.to_string()),
            },
            Value::Bool(b) => CellValue::Text(b.to_string()),
            other => CellValue::Text(other.to_string()),
        }
    }

    /// 转为展示用文本（空值 → 空字符串）
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Null => String::new(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
            CellValue::Null => true,
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Null
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// 整数值不带小数点（12 而不是 12.0），与表格里看到的一致
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

// ==========================================
// 源文件行 (Source Row)
// ==========================================
// 表头 → 原始值，保持文件中的列顺序
pub type SourceRow = IndexMap<String, CellValue>;

// ==========================================
// 可编辑记录 (Editable Record)
// ==========================================
// 字段 key → 当前文本值，键集合恰好等于 schema 字段集合
pub type EditableRecord = IndexMap<String, String>;

// ==========================================
// 表头映射 (Header Mapping)
// ==========================================
// 字段 key → 匹配到的源表头；未匹配的字段不出现
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderMapping {
    entries: IndexMap<String, String>,
}

impl HeaderMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header_for(&self, field_key: &str) -> Option<&str> {
        self.entries.get(field_key).map(String::as_str)
    }

    /// 查询某个表头当前被哪个字段占用
    pub fn field_for_header(&self, header: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, h)| h.as_str() == header)
            .map(|(k, _)| k.as_str())
    }

    pub fn is_claimed(&self, header: &str) -> bool {
        self.field_for_header(header).is_some()
    }

    pub fn insert(&mut self, field_key: impl Into<String>, header: impl Into<String>) {
        self.entries.insert(field_key.into(), header.into());
    }

    pub fn remove(&mut self, field_key: &str) -> Option<String> {
        self.entries.shift_remove(field_key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
