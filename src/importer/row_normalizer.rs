// ==========================================
// 学员管理后台 - 行归一化器
// ==========================================
// 职责: 原始行 → 目标 schema 形状的可编辑记录
// 约束: 输出条数/顺序与输入一致；每条记录恰好包含 schema 全部 key
//       此阶段不做类型转换，一律按文本承载
// ==========================================

use crate::domain::schema::{EntityType, SchemaField};
use crate::domain::types::{EditableRecord, HeaderMapping, SourceRow};
use crate::importer::error::{ImportError, ImportResult};

pub struct RowNormalizer;

impl RowNormalizer {
    /// 归一化单行
    pub fn normalize_row(
        &self,
        row: &SourceRow,
        mapping: &HeaderMapping,
        fields: &[SchemaField],
    ) -> EditableRecord {
        fields
            .iter()
            .map(|field| (field.key.to_string(), Self::project(row, mapping, field.key)))
            .collect()
    }

    /// 归一化整批
    pub fn normalize_rows(
        &self,
        rows: &[SourceRow],
        mapping: &HeaderMapping,
        fields: &[SchemaField],
    ) -> Vec<EditableRecord> {
        rows.iter()
            .map(|row| self.normalize_row(row, mapping, fields))
            .collect()
    }

    /// 单列投影（列重映射时使用）
    pub fn project_column(
        &self,
        rows: &[SourceRow],
        mapping: &HeaderMapping,
        field_key: &str,
    ) -> Vec<String> {
        rows.iter()
            .map(|row| Self::project(row, mapping, field_key))
            .collect()
    }

    /// 对齐调用方直接提交的记录：按 schema 顺序输出，缺失字段补空串
    ///
    /// schema 之外的 key 返回 UnknownField
    pub fn conform_record(
        &self,
        record: &EditableRecord,
        entity: EntityType,
        fields: &[SchemaField],
    ) -> ImportResult<EditableRecord> {
        if let Some(unknown) = record
            .keys()
            .find(|key| !fields.iter().any(|field| field.key == key.as_str()))
        {
            return Err(ImportError::UnknownField {
                entity: entity.to_string(),
                field: unknown.clone(),
            });
        }

        Ok(fields
            .iter()
            .map(|field| {
                let value = record.get(field.key).cloned().unwrap_or_default();
                (field.key.to_string(), value)
            })
            .collect())
    }

    fn project(row: &SourceRow, mapping: &HeaderMapping, field_key: &str) -> String {
        mapping
            .header_for(field_key)
            .and_then(|header| row.get(header))
            .map(|cell| cell.as_text())
            .unwrap_or_default()
    }
}
