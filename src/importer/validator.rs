// ==========================================
// 学员管理后台 - 必填字段校验器
// ==========================================
// 职责: 单行必填校验 + 选中行汇总报告
// 约束: 纯函数，每次调用基于当前记录重新计算，不缓存
// ==========================================

use crate::domain::schema::SchemaField;
use crate::domain::types::EditableRecord;
use serde::Serialize;
use std::collections::BTreeSet;

/// 单行校验问题
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    pub index: usize,
    pub missing: Vec<String>,
}

/// 选中行校验报告
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// 参与校验的行数
    pub checked: usize,
    /// 不完整的行（按行号升序）
    pub invalid: Vec<RowIssue>,
}

impl ValidationReport {
    pub fn invalid_count(&self) -> usize {
        self.invalid.len()
    }

    pub fn is_clean(&self) -> bool {
        self.invalid.is_empty()
    }
}

pub struct RequiredFieldValidator;

impl RequiredFieldValidator {
    /// 返回缺失的必填字段标签（schema 顺序）
    pub fn validate(&self, record: &EditableRecord, fields: &[SchemaField]) -> Vec<String> {
        fields
            .iter()
            .filter(|field| field.required)
            .filter(|field| {
                record
                    .get(field.key)
                    .map(|value| value.trim().is_empty())
                    .unwrap_or(true)
            })
            .map(|field| field.label.to_string())
            .collect()
    }

    pub fn is_valid(&self, record: &EditableRecord, fields: &[SchemaField]) -> bool {
        self.validate(record, fields).is_empty()
    }

    /// 汇总选中行中的不完整行（越界下标忽略）
    pub fn validate_selected(
        &self,
        records: &[EditableRecord],
        selection: &BTreeSet<usize>,
        fields: &[SchemaField],
    ) -> ValidationReport {
        let mut report = ValidationReport::default();
        for &index in selection {
            let Some(record) = records.get(index) else {
                continue;
            };
            report.checked += 1;
            let missing = self.validate(record, fields);
            if !missing.is_empty() {
                report.invalid.push(RowIssue { index, missing });
            }
        }
        report
    }

    /// 汇总一组记录（显式提交子集时使用）
    pub fn validate_all(&self, records: &[EditableRecord], fields: &[SchemaField]) -> ValidationReport {
        let selection: BTreeSet<usize> = (0..records.len()).collect();
        self.validate_selected(records, &selection, fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::{fields_for, EntityType};

    fn participant(first: &str, last: &str, email: &str, phone: &str) -> EditableRecord {
        let mut record: EditableRecord = fields_for(EntityType::Participant)
            .iter()
            .map(|f| (f.key.to_string(), String::new()))
            .collect();
        record.insert("firstName".to_string(), first.to_string());
        record.insert("lastName".to_string(), last.to_string());
        record.insert("email".to_string(), email.to_string());
        record.insert("phoneNumber".to_string(), phone.to_string());
        record
    }

    #[test]
    fn test_missing_first_name_exact_list() {
        let fields = fields_for(EntityType::Participant);
        let record = participant("", "Lovelace", "ada@example.com", "0801");

        let missing = RequiredFieldValidator.validate(&record, fields);
        assert_eq!(missing, vec!["First Name".to_string()]);
        assert!(!RequiredFieldValidator.is_valid(&record, fields));
    }

    #[test]
    fn test_whitespace_counts_as_missing() {
        let fields = fields_for(EntityType::Participant);
        let record = participant("Ada", "   ", "ada@example.com", "\t");

        let missing = RequiredFieldValidator.validate(&record, fields);
        assert_eq!(missing, vec!["Last Name".to_string(), "Phone Number".to_string()]);
    }

    #[test]
    fn test_absent_key_counts_as_missing() {
        let fields = fields_for(EntityType::Participant);
        let mut record = participant("Ada", "Lovelace", "ada@example.com", "0801");
        record.shift_remove("email");

        assert_eq!(RequiredFieldValidator.validate(&record, fields), vec!["Email".to_string()]);
    }

    #[test]
    fn test_optional_fields_never_reported() {
        let fields = fields_for(EntityType::Participant);
        let record = participant("Ada", "Lovelace", "ada@example.com", "0801");
        assert!(RequiredFieldValidator.is_valid(&record, fields));
    }

    #[test]
    fn test_validate_selected_only_checks_selection() {
        let fields = fields_for(EntityType::Participant);
        let records = vec![
            participant("Ada", "Lovelace", "ada@example.com", "0801"),
            participant("", "Turing", "alan@example.com", "0802"),
            participant("", "", "", ""),
        ];
        let selection: BTreeSet<usize> = [0, 1, 7].into_iter().collect();

        let report = RequiredFieldValidator.validate_selected(&records, &selection, fields);
        assert_eq!(report.checked, 2);
        assert_eq!(report.invalid_count(), 1);
        assert_eq!(report.invalid[0].index, 1);
    }
}
